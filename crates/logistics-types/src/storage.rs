//! Storage-related types for the logistics system.

use crate::EntityKind;

/// Storage keys for different data collections.
///
/// This enum provides type safety for storage operations by replacing
/// string literals with strongly typed variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
	/// Key for storing shipment records
	Shipments,
	/// Key for storing pickup requests
	PickupRequests,
	/// Key for storing purchase requests
	PurchaseRequests,
	/// Key for storing per-entity status histories
	StatusLogs,
	/// Key for storing transport tariffs
	TransportRates,
}

impl StorageKey {
	/// Returns the string representation of the storage key.
	pub fn as_str(&self) -> &'static str {
		match self {
			StorageKey::Shipments => "shipments",
			StorageKey::PickupRequests => "pickup_requests",
			StorageKey::PurchaseRequests => "purchase_requests",
			StorageKey::StatusLogs => "status_logs",
			StorageKey::TransportRates => "transport_rates",
		}
	}

	/// Namespace holding records of the given entity kind.
	pub fn for_entity(kind: EntityKind) -> Self {
		match kind {
			EntityKind::Shipment => Self::Shipments,
			EntityKind::PickupRequest => Self::PickupRequests,
			EntityKind::PurchaseRequest => Self::PurchaseRequests,
		}
	}

	/// Identifier of the history record of an entity inside `status_logs`.
	pub fn history_id(kind: EntityKind, entity_id: &str) -> String {
		format!("{}/{}", kind.as_str().to_ascii_lowercase(), entity_id)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_entity_namespaces() {
		assert_eq!(
			StorageKey::for_entity(EntityKind::PickupRequest).as_str(),
			"pickup_requests"
		);
		assert_eq!(
			StorageKey::history_id(EntityKind::Shipment, "abc"),
			"shipment/abc"
		);
	}
}
