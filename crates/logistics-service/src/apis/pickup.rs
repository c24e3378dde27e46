//! Pickup request endpoints.

use super::{ok, parse_body, reject, ApiResult};
use crate::server::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use logistics_types::{
	APIError, ActionResult, EntityKind, NewPickup, PickupRequest, PickupStatus, StatusLog,
	TransitionRequest,
};

/// POST /api/pickups
pub async fn create(
	State(state): State<AppState>,
	payload: Result<Json<NewPickup>, JsonRejection>,
) -> Result<(StatusCode, Json<ActionResult<PickupRequest>>), APIError> {
	let input = parse_body(payload)?;
	let pickup = state
		.engine
		.create_pickup(input)
		.await
		.map_err(|e| reject("create_pickup", e))?;
	Ok((StatusCode::CREATED, Json(ActionResult::ok(pickup))))
}

/// GET /api/pickups/{id}
pub async fn get(Path(id): Path<String>, State(state): State<AppState>) -> ApiResult<PickupRequest> {
	let pickup = state
		.engine
		.get_pickup(&id)
		.await
		.map_err(|e| reject("get_pickup", e))?;
	ok(pickup)
}

/// POST /api/pickups/{id}/status
pub async fn transition(
	Path(id): Path<String>,
	State(state): State<AppState>,
	payload: Result<Json<TransitionRequest<PickupStatus>>, JsonRejection>,
) -> ApiResult<PickupRequest> {
	let request = parse_body(payload)?;
	let pickup = state
		.engine
		.transition_pickup(&id, request)
		.await
		.map_err(|e| reject("transition_pickup", e))?;
	ok(pickup)
}

/// GET /api/pickups/{id}/history
pub async fn history(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> ApiResult<Vec<StatusLog>> {
	let history = state
		.engine
		.history(EntityKind::PickupRequest, &id)
		.await
		.map_err(|e| reject("pickup_history", e))?;
	ok(history.entries)
}
