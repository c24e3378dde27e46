//! API types for the logistics HTTP API.
//!
//! Every endpoint answers with the same [`ActionResult`] envelope so that UI
//! layers can attach an error to a specific form field when `field` is set.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{
	CargoType, Contact, Dimensions, Location, Priority, ProductDetails, TransportMode,
};

/// Uniform caller-facing result.
///
/// Serialises as `{ "success": true, "data": T }` or
/// `{ "success": false, "error": "...", "field": "..." }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult<T> {
	pub success: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub field: Option<String>,
}

impl<T> ActionResult<T> {
	pub fn ok(data: T) -> Self {
		Self {
			success: true,
			data: Some(data),
			error: None,
			field: None,
		}
	}

	pub fn err(error: impl Into<String>, field: Option<String>) -> Self {
		Self {
			success: false,
			data: None,
			error: Some(error.into()),
			field,
		}
	}
}

/// Structured API error type with HTTP status mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum APIError {
	/// Input failed validation (400).
	BadRequest {
		message: String,
		field: Option<String>,
	},
	/// Referenced record does not exist (404).
	NotFound { message: String },
	/// The record changed since the caller read it (409).
	Conflict { message: String },
	/// Input is well formed but the business rules reject it (422).
	UnprocessableEntity {
		message: String,
		field: Option<String>,
	},
	/// Internal server error (500).
	InternalServerError { message: String },
}

impl APIError {
	/// Get the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			APIError::BadRequest { .. } => 400,
			APIError::NotFound { .. } => 404,
			APIError::Conflict { .. } => 409,
			APIError::UnprocessableEntity { .. } => 422,
			APIError::InternalServerError { .. } => 500,
		}
	}

	pub fn message(&self) -> &str {
		match self {
			APIError::BadRequest { message, .. }
			| APIError::NotFound { message }
			| APIError::Conflict { message }
			| APIError::UnprocessableEntity { message, .. }
			| APIError::InternalServerError { message } => message,
		}
	}

	pub fn field(&self) -> Option<&str> {
		match self {
			APIError::BadRequest { field, .. } | APIError::UnprocessableEntity { field, .. } => {
				field.as_deref()
			},
			_ => None,
		}
	}

	/// Convert to the uniform result envelope.
	pub fn to_action_result<T>(&self) -> ActionResult<T> {
		ActionResult::err(self.message(), self.field().map(str::to_string))
	}
}

impl fmt::Display for APIError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			APIError::BadRequest { message, .. } => write!(f, "Bad Request: {}", message),
			APIError::NotFound { message } => write!(f, "Not Found: {}", message),
			APIError::Conflict { message } => write!(f, "Conflict: {}", message),
			APIError::UnprocessableEntity { message, .. } => {
				write!(f, "Unprocessable Entity: {}", message)
			},
			APIError::InternalServerError { message } => {
				write!(f, "Internal Server Error: {}", message)
			},
		}
	}
}

impl std::error::Error for APIError {}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for APIError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status = StatusCode::from_u16(self.status_code())
			.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		let body: ActionResult<serde_json::Value> = self.to_action_result();
		(status, Json(body)).into_response()
	}
}

/// Request to move an entity to a new status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRequest<S> {
	/// Requested target status.
	pub status: S,
	/// Free-text note stored in the history entry.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub notes: Option<String>,
	/// Justification, required when cancelling or holding.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub reason: Option<String>,
	/// Required when scheduling a pickup.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scheduled_date: Option<DateTime<Utc>>,
	/// Required when completing or delivering.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub actual_date: Option<DateTime<Utc>>,
	/// User performing the change.
	pub actor: String,
	/// Version the caller last saw; the transition fails if it moved on.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expected_version: Option<u64>,
}

impl<S> TransitionRequest<S> {
	/// Bare request with only the target status and actor set.
	pub fn new(status: S, actor: impl Into<String>) -> Self {
		Self {
			status,
			notes: None,
			reason: None,
			scheduled_date: None,
			actual_date: None,
			actor: actor.into(),
			expected_version: None,
		}
	}

	pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
		self.notes = Some(notes.into());
		self
	}

	pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
		self.reason = Some(reason.into());
		self
	}

	pub fn with_scheduled_date(mut self, date: DateTime<Utc>) -> Self {
		self.scheduled_date = Some(date);
		self
	}

	pub fn with_actual_date(mut self, date: DateTime<Utc>) -> Self {
		self.actual_date = Some(date);
		self
	}

	pub fn with_expected_version(mut self, version: u64) -> Self {
		self.expected_version = Some(version);
		self
	}
}

/// Payload to register a new shipment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewShipment {
	pub origin: Location,
	pub destination: Location,
	pub weight: Decimal,
	#[serde(default)]
	pub volume: Option<Decimal>,
	#[serde(default)]
	pub dimensions: Option<Dimensions>,
	#[serde(default)]
	pub cargo_type: CargoType,
	#[serde(default)]
	pub is_dangerous: bool,
	#[serde(default)]
	pub is_fragile: bool,
	#[serde(default)]
	pub priority: Priority,
	#[serde(default)]
	pub transport_modes: Vec<TransportMode>,
	pub actor: String,
}

/// Payload to register a new pickup request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPickup {
	#[serde(default)]
	pub shipment_id: Option<String>,
	pub address: Location,
	pub contact: Contact,
	pub actor: String,
}

/// Payload to register a new purchase request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPurchase {
	pub product: ProductDetails,
	pub delivery_address: Location,
	pub product_cost: Decimal,
	pub delivery_cost: Decimal,
	pub actor: String,
}

/// Request for a shipping cost estimate.
///
/// Every field is optional on the wire so that missing values surface as
/// field-level validation errors rather than parse failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
	#[serde(default)]
	pub origin_country_code: Option<String>,
	#[serde(default)]
	pub destination_country_code: Option<String>,
	#[serde(default)]
	pub transport_modes: Vec<TransportMode>,
	/// Gross weight in kilograms.
	#[serde(default)]
	pub weight: Option<Decimal>,
	/// Volume in cubic metres; derived from `dimensions` when absent.
	#[serde(default)]
	pub volume: Option<Decimal>,
	#[serde(default)]
	pub dimensions: Option<Dimensions>,
	#[serde(default)]
	pub cargo_type: CargoType,
	#[serde(default)]
	pub priority: Priority,
}

/// Which dimension produced the chargeable base cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingBasis {
	Weight,
	Volume,
}

/// Result of pricing one transport mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostEstimate {
	pub transport_mode: TransportMode,
	/// `max(weight × ratePerKg, volume × ratePerM3)` before surcharges.
	pub base_cost: Decimal,
	pub billed_on: BillingBasis,
	pub cargo_type_surcharge: Decimal,
	pub priority_surcharge: Decimal,
	/// Final amount, rounded to 2 decimal places.
	pub estimated_cost: Decimal,
}

/// Outcome of pricing a single mode inside a multi-mode quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeQuote {
	pub transport_mode: TransportMode,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub estimate: Option<CostEstimate>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

/// Response to a quote request: one outcome per requested mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
	pub currency: String,
	pub quotes: Vec<ModeQuote>,
}

/// Request to price a stored shipment for one mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
	pub transport_mode: TransportMode,
}
