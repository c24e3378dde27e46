//! Tariff administration endpoints.

use super::{ok, parse_body, reject, ApiResult};
use crate::server::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use logistics_types::TransportRate;

/// GET /api/tariffs
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<TransportRate>> {
	let rates = state
		.engine
		.list_tariffs()
		.await
		.map_err(|e| reject("list_tariffs", e))?;
	ok(rates)
}

/// PUT /api/tariffs
///
/// Creates or replaces the rate of the route named in the body.
pub async fn upsert(
	State(state): State<AppState>,
	payload: Result<Json<TransportRate>, JsonRejection>,
) -> ApiResult<TransportRate> {
	let rate = parse_body(payload)?;
	let rate = state
		.engine
		.upsert_tariff(rate)
		.await
		.map_err(|e| reject("upsert_tariff", e))?;
	ok(rate)
}
