//! Pickup request types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Location, PickupStatus};

/// Person to meet at the pickup address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
	pub name: String,
	pub phone: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
}

/// A request to collect goods at an address.
///
/// `scheduled_date` is only set once the request reaches `SCHEDULED`, and
/// `actual_pickup_date` once it reaches `COMPLETED`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupRequest {
	pub id: String,
	/// Shipment this pickup feeds, if any.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub shipment_id: Option<String>,
	pub address: Location,
	pub contact: Contact,
	pub status: PickupStatus,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scheduled_date: Option<DateTime<Utc>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub actual_pickup_date: Option<DateTime<Utc>>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	#[serde(default)]
	pub version: u64,
}
