//! Quote endpoint.

use super::{ok, parse_body, reject, ApiResult};
use crate::server::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use logistics_types::{QuoteRequest, QuoteResponse};

/// POST /api/quotes
///
/// Prices every requested transport mode. Modes without a tariff come back
/// with an `error` entry unless none of them could be priced.
pub async fn create(
	State(state): State<AppState>,
	payload: Result<Json<QuoteRequest>, JsonRejection>,
) -> ApiResult<QuoteResponse> {
	let request = parse_body(payload)?;
	let response = state
		.engine
		.quote(&request)
		.await
		.map_err(|e| reject("quote", e))?;
	ok(response)
}
