//! Status enumerations for tracked entities.
//!
//! Each entity type owns a closed enum; the allowed edges between variants
//! live in the workflow tables of the core crate, never in ad hoc string
//! comparisons.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
	/// Created but not yet submitted.
	Draft,
	/// Submitted and waiting for an operator to approve it.
	PendingApproval,
	/// Collected from the sender.
	PickedUp,
	/// Moving between origin and destination.
	InTransit,
	/// Held at customs clearance.
	AtCustoms,
	/// Available for the consignee to collect.
	ReadyForPickup,
	/// Handed over to the consignee.
	Delivered,
	/// Paused by an operator.
	OnHold,
	/// Abandoned before delivery.
	Cancelled,
	/// Something went wrong in transit.
	Exception,
}

impl ShipmentStatus {
	/// All variants, in lifecycle order.
	pub const ALL: [ShipmentStatus; 10] = [
		Self::Draft,
		Self::PendingApproval,
		Self::PickedUp,
		Self::InTransit,
		Self::AtCustoms,
		Self::ReadyForPickup,
		Self::Delivered,
		Self::OnHold,
		Self::Cancelled,
		Self::Exception,
	];

	/// Returns the wire representation of the status.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Draft => "DRAFT",
			Self::PendingApproval => "PENDING_APPROVAL",
			Self::PickedUp => "PICKED_UP",
			Self::InTransit => "IN_TRANSIT",
			Self::AtCustoms => "AT_CUSTOMS",
			Self::ReadyForPickup => "READY_FOR_PICKUP",
			Self::Delivered => "DELIVERED",
			Self::OnHold => "ON_HOLD",
			Self::Cancelled => "CANCELLED",
			Self::Exception => "EXCEPTION",
		}
	}
}

/// Lifecycle status of a pickup request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PickupStatus {
	Requested,
	Scheduled,
	InProgress,
	Completed,
	Canceled,
}

impl PickupStatus {
	/// All variants, in lifecycle order.
	pub const ALL: [PickupStatus; 5] = [
		Self::Requested,
		Self::Scheduled,
		Self::InProgress,
		Self::Completed,
		Self::Canceled,
	];

	/// Returns the wire representation of the status.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Requested => "REQUESTED",
			Self::Scheduled => "SCHEDULED",
			Self::InProgress => "IN_PROGRESS",
			Self::Completed => "COMPLETED",
			Self::Canceled => "CANCELED",
		}
	}
}

/// Lifecycle status of a delegated purchase.
///
/// The wire names are the French labels used by the back office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseStatus {
	/// New request (`NOUVEAU`).
	Nouveau,
	/// Being purchased and shipped (`EN_COURS`).
	EnCours,
	/// Delivered (`LIVRE`).
	Livre,
	/// Cancelled (`ANNULE`).
	Annule,
}

impl PurchaseStatus {
	/// All variants, in lifecycle order.
	pub const ALL: [PurchaseStatus; 4] = [Self::Nouveau, Self::EnCours, Self::Livre, Self::Annule];

	/// Returns the wire representation of the status.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Nouveau => "NOUVEAU",
			Self::EnCours => "EN_COURS",
			Self::Livre => "LIVRE",
			Self::Annule => "ANNULE",
		}
	}
}

/// Kind of entity a history entry or error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
	Shipment,
	PickupRequest,
	PurchaseRequest,
}

impl EntityKind {
	/// Returns the wire representation of the kind.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Shipment => "SHIPMENT",
			Self::PickupRequest => "PICKUP_REQUEST",
			Self::PurchaseRequest => "PURCHASE_REQUEST",
		}
	}
}

/// Error returned when parsing an unknown status label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown status: {0}")]
pub struct UnknownStatus(pub String);

macro_rules! impl_status_text {
	($($ty:ty),* $(,)?) => {
		$(
			impl fmt::Display for $ty {
				fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
					f.write_str(self.as_str())
				}
			}

			impl FromStr for $ty {
				type Err = UnknownStatus;

				fn from_str(s: &str) -> Result<Self, Self::Err> {
					<$ty>::ALL
						.iter()
						.copied()
						.find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
						.ok_or_else(|| UnknownStatus(s.to_string()))
				}
			}
		)*
	};
}

impl_status_text!(ShipmentStatus, PickupStatus, PurchaseStatus);

impl fmt::Display for EntityKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
