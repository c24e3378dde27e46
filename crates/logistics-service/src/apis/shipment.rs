//! Shipment endpoints.

use super::{ok, parse_body, reject, ApiResult};
use crate::server::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use logistics_types::{
	APIError, ActionResult, EntityKind, EstimateRequest, NewShipment, Shipment, ShipmentStatus,
	StatusLog, TransitionRequest,
};

/// POST /api/shipments
pub async fn create(
	State(state): State<AppState>,
	payload: Result<Json<NewShipment>, JsonRejection>,
) -> Result<(StatusCode, Json<ActionResult<Shipment>>), APIError> {
	let input = parse_body(payload)?;
	let shipment = state
		.engine
		.create_shipment(input)
		.await
		.map_err(|e| reject("create_shipment", e))?;
	Ok((StatusCode::CREATED, Json(ActionResult::ok(shipment))))
}

/// GET /api/shipments/{id}
pub async fn get(Path(id): Path<String>, State(state): State<AppState>) -> ApiResult<Shipment> {
	let shipment = state
		.engine
		.get_shipment(&id)
		.await
		.map_err(|e| reject("get_shipment", e))?;
	ok(shipment)
}

/// POST /api/shipments/{id}/status
pub async fn transition(
	Path(id): Path<String>,
	State(state): State<AppState>,
	payload: Result<Json<TransitionRequest<ShipmentStatus>>, JsonRejection>,
) -> ApiResult<Shipment> {
	let request = parse_body(payload)?;
	let shipment = state
		.engine
		.transition_shipment(&id, request)
		.await
		.map_err(|e| reject("transition_shipment", e))?;
	ok(shipment)
}

/// GET /api/shipments/{id}/history
pub async fn history(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> ApiResult<Vec<StatusLog>> {
	let history = state
		.engine
		.history(EntityKind::Shipment, &id)
		.await
		.map_err(|e| reject("shipment_history", e))?;
	ok(history.entries)
}

/// POST /api/shipments/{id}/estimate
pub async fn estimate(
	Path(id): Path<String>,
	State(state): State<AppState>,
	payload: Result<Json<EstimateRequest>, JsonRejection>,
) -> ApiResult<Shipment> {
	let request = parse_body(payload)?;
	let shipment = state
		.engine
		.estimate_shipment_cost(&id, request.transport_mode)
		.await
		.map_err(|e| reject("estimate_shipment_cost", e))?;
	ok(shipment)
}
