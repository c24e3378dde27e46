//! Shipping cost estimation and purchase cost breakdowns.
//!
//! [`RateCalculator`] prices one transport mode against one tariff row and
//! is free of I/O. [`QuoteService`] validates caller input, looks tariffs up
//! and runs the calculator once per requested mode.

pub mod calculator;
pub mod purchase;
pub mod quote;

pub use calculator::RateCalculator;
pub use purchase::compute_purchase_cost;
pub use quote::QuoteService;

use logistics_types::{APIError, ShipmentStatus, TransportMode};
use thiserror::Error;

/// Errors produced while pricing.
#[derive(Debug, Error)]
pub enum PricingError {
	#[error("Invalid {field}: {message}")]
	Validation { field: String, message: String },
	#[error("No tariff for {origin} -> {destination} ({mode})")]
	TariffNotFound {
		origin: String,
		destination: String,
		mode: TransportMode,
	},
	#[error("Tariff error: {0}")]
	Tariff(String),
	#[error("Shipment not found: {0}")]
	NotFound(String),
	/// The shipment is in a terminal status and can no longer change.
	#[error("Shipment {id} is {status} and can no longer be estimated")]
	Closed { id: String, status: ShipmentStatus },
	/// The priced record changed while the estimate was being written.
	#[error("Shipment {0} was modified concurrently")]
	Conflict(String),
	#[error("Storage error: {0}")]
	Storage(String),
}

impl PricingError {
	pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
		Self::Validation {
			field: field.to_string(),
			message: message.into(),
		}
	}
}

impl From<PricingError> for APIError {
	fn from(err: PricingError) -> Self {
		let message = err.to_string();
		match err {
			PricingError::Validation { field, .. } => APIError::BadRequest {
				message,
				field: Some(field),
			},
			PricingError::TariffNotFound { .. } => APIError::UnprocessableEntity {
				message,
				field: Some("transportModes".to_string()),
			},
			PricingError::Closed { .. } => APIError::UnprocessableEntity {
				message,
				field: Some("status".to_string()),
			},
			PricingError::NotFound(_) => APIError::NotFound { message },
			PricingError::Conflict(_) => APIError::Conflict { message },
			PricingError::Tariff(_) | PricingError::Storage(_) => {
				APIError::InternalServerError { message }
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_error_status_mapping() {
		let api: APIError = PricingError::TariffNotFound {
			origin: "FR".into(),
			destination: "SN".into(),
			mode: TransportMode::Rail,
		}
		.into();
		assert_eq!(api.status_code(), 422);
		assert_eq!(api.field(), Some("transportModes"));

		let api: APIError = PricingError::invalid("weight", "is required").into();
		assert_eq!(api.status_code(), 400);
		assert_eq!(api.field(), Some("weight"));

		let api: APIError = PricingError::NotFound("s1".into()).into();
		assert_eq!(api.status_code(), 404);

		let api: APIError = PricingError::Closed {
			id: "s1".into(),
			status: ShipmentStatus::Delivered,
		}
		.into();
		assert_eq!(api.status_code(), 422);
		assert_eq!(api.field(), Some("status"));
	}
}
