//! Purchase request endpoints.

use super::{ok, parse_body, reject, ApiResult};
use crate::server::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use logistics_types::{
	APIError, ActionResult, EntityKind, NewPurchase, PurchaseRequest, PurchaseStatus, StatusLog,
	TransitionRequest,
};

/// POST /api/purchases
pub async fn create(
	State(state): State<AppState>,
	payload: Result<Json<NewPurchase>, JsonRejection>,
) -> Result<(StatusCode, Json<ActionResult<PurchaseRequest>>), APIError> {
	let input = parse_body(payload)?;
	let purchase = state
		.engine
		.create_purchase(input)
		.await
		.map_err(|e| reject("create_purchase", e))?;
	Ok((StatusCode::CREATED, Json(ActionResult::ok(purchase))))
}

/// GET /api/purchases/{id}
pub async fn get(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> ApiResult<PurchaseRequest> {
	let purchase = state
		.engine
		.get_purchase(&id)
		.await
		.map_err(|e| reject("get_purchase", e))?;
	ok(purchase)
}

/// POST /api/purchases/{id}/status
pub async fn transition(
	Path(id): Path<String>,
	State(state): State<AppState>,
	payload: Result<Json<TransitionRequest<PurchaseStatus>>, JsonRejection>,
) -> ApiResult<PurchaseRequest> {
	let request = parse_body(payload)?;
	let purchase = state
		.engine
		.transition_purchase(&id, request)
		.await
		.map_err(|e| reject("transition_purchase", e))?;
	ok(purchase)
}

/// GET /api/purchases/{id}/history
pub async fn history(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> ApiResult<Vec<StatusLog>> {
	let history = state
		.engine
		.history(EntityKind::PurchaseRequest, &id)
		.await
		.map_err(|e| reject("purchase_history", e))?;
	ok(history.entries)
}
