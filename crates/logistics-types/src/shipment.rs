//! Shipment types for the logistics system.
//!
//! This module defines the shipment record together with the cargo
//! attributes used by pricing: weight, volume or dimensions, cargo type,
//! priority and the requested transport modes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ShipmentStatus;

/// A postal location used as shipment origin or destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
	/// Street address line.
	pub address: String,
	/// City name.
	#[serde(default)]
	pub city: String,
	/// ISO 3166-1 alpha-2 country code.
	pub country_code: String,
}

/// Parcel dimensions in centimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
	pub length: Decimal,
	pub width: Decimal,
	pub height: Decimal,
}

impl Dimensions {
	/// Volume in cubic metres (`length × width × height / 1_000_000`).
	///
	/// `None` when the product does not fit a `Decimal`.
	pub fn volume_m3(&self) -> Option<Decimal> {
		self.length
			.checked_mul(self.width)?
			.checked_mul(self.height)?
			.checked_div(Decimal::from(1_000_000))
	}
}

/// Transport mode a tariff applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransportMode {
	Road,
	Sea,
	Air,
	Rail,
}

impl TransportMode {
	/// Returns the wire representation of the mode.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Road => "ROAD",
			Self::Sea => "SEA",
			Self::Air => "AIR",
			Self::Rail => "RAIL",
		}
	}
}

impl fmt::Display for TransportMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Nature of the goods, used to select a cargo surcharge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CargoType {
	#[default]
	General,
	Fragile,
	Dangerous,
	Perishable,
	Oversized,
}

/// Requested handling speed, used to select a priority surcharge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
	#[default]
	Standard,
	Express,
	Urgent,
}

/// A shipment moving goods from an origin to a destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
	/// Unique identifier for this shipment.
	pub id: String,
	pub origin: Location,
	pub destination: Location,
	/// Gross weight in kilograms.
	pub weight: Decimal,
	/// Volume in cubic metres, when declared directly.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub volume: Option<Decimal>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub dimensions: Option<Dimensions>,
	#[serde(default)]
	pub cargo_type: CargoType,
	#[serde(default)]
	pub is_dangerous: bool,
	#[serde(default)]
	pub is_fragile: bool,
	#[serde(default)]
	pub priority: Priority,
	/// Transport modes the customer asked to be quoted for.
	#[serde(default)]
	pub transport_modes: Vec<TransportMode>,
	/// Current lifecycle status. Only the transition engine writes it.
	pub status: ShipmentStatus,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub estimated_cost: Option<Decimal>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub actual_cost: Option<Decimal>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub actual_delivery_date: Option<DateTime<Utc>>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	/// Incremented on every accepted transition.
	#[serde(default)]
	pub version: u64,
}

impl Shipment {
	/// Volume used for pricing: the declared volume, else the volume derived
	/// from dimensions.
	pub fn chargeable_volume(&self) -> Option<Decimal> {
		self.volume
			.or_else(|| self.dimensions.as_ref().and_then(Dimensions::volume_m3))
	}
}
