//! Delegated purchase types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Location, PurchaseStatus};

/// What the customer asked us to buy on their behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetails {
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,
	pub quantity: u32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub notes: Option<String>,
}

/// Monetary breakdown of a purchase.
///
/// `service_fee` is a fraction of `product_cost + delivery_cost` and
/// `total_cost` is the subtotal plus the fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
	pub product_cost: Decimal,
	pub delivery_cost: Decimal,
	pub service_fee: Decimal,
	pub total_cost: Decimal,
}

/// A purchase the back office performs for a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
	pub id: String,
	pub product: ProductDetails,
	pub delivery_address: Location,
	#[serde(flatten)]
	pub cost: CostBreakdown,
	pub status: PurchaseStatus,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub actual_delivery_date: Option<DateTime<Utc>>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	#[serde(default)]
	pub version: u64,
}
