//! Request handlers of the HTTP API.
//!
//! Handlers answer with the [`ActionResult`] envelope on success and with an
//! [`APIError`] otherwise, which renders the same envelope with the mapped
//! status code.

pub mod pickup;
pub mod purchase;
pub mod quote;
pub mod shipment;
pub mod tariff;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use logistics_core::LogisticsError;
use logistics_types::{APIError, ActionResult};

pub(crate) type ApiResult<T> = Result<Json<ActionResult<T>>, APIError>;

/// Unwraps a JSON body, turning malformed input into a 400 envelope.
pub(crate) fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, APIError> {
	match payload {
		Ok(Json(value)) => Ok(value),
		Err(rejection) => {
			tracing::warn!(error = %rejection.body_text(), "Rejected request body");
			Err(APIError::BadRequest {
				message: rejection.body_text(),
				field: None,
			})
		},
	}
}

/// Logs a failed operation and converts its error.
pub(crate) fn reject(operation: &str, error: LogisticsError) -> APIError {
	tracing::warn!(operation, error = %error, "Request failed");
	error.into()
}

pub(crate) fn ok<T>(data: T) -> ApiResult<T> {
	Ok(Json(ActionResult::ok(data)))
}
