//! Shipment lifecycle.
//!
//! ```text
//! DRAFT -> PENDING_APPROVAL -> PICKED_UP -> IN_TRANSIT -> AT_CUSTOMS
//!       -> READY_FOR_PICKUP -> DELIVERED
//! ```
//!
//! Any non-terminal status may be put ON_HOLD or CANCELLED. A held shipment
//! resumes at PENDING_APPROVAL. Once picked up and until delivery a shipment
//! may be flagged EXCEPTION, from where it can only be held or cancelled.

use super::{
	build_table, normalise_location, validate_location, Lifecycle, Requirement, WorkflowEntity,
	WorkflowError,
};
use chrono::{DateTime, Utc};
use logistics_types::{EntityKind, NewShipment, Shipment, ShipmentStatus, TransitionRequest};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};

static TRANSITIONS: Lazy<HashMap<ShipmentStatus, HashSet<ShipmentStatus>>> = Lazy::new(|| {
	use ShipmentStatus::*;
	build_table(
		&ShipmentStatus::ALL,
		&[
			Draft,
			PendingApproval,
			PickedUp,
			InTransit,
			AtCustoms,
			ReadyForPickup,
			Delivered,
		],
		&[OnHold, Cancelled],
		&[Delivered, Cancelled],
		&[
			(OnHold, PendingApproval),
			(PickedUp, Exception),
			(InTransit, Exception),
			(AtCustoms, Exception),
			(ReadyForPickup, Exception),
		],
	)
});

impl Lifecycle for ShipmentStatus {
	fn initial() -> Self {
		ShipmentStatus::Draft
	}

	fn transitions() -> &'static HashMap<Self, HashSet<Self>> {
		&TRANSITIONS
	}

	fn requirement(self) -> Requirement {
		match self {
			ShipmentStatus::Delivered => Requirement::ActualDate,
			ShipmentStatus::Cancelled | ShipmentStatus::OnHold => Requirement::Reason,
			_ => Requirement::None,
		}
	}

	fn label(self) -> &'static str {
		self.as_str()
	}
}

impl WorkflowEntity for Shipment {
	type Status = ShipmentStatus;

	const KIND: EntityKind = EntityKind::Shipment;

	fn id(&self) -> &str {
		&self.id
	}

	fn status(&self) -> ShipmentStatus {
		self.status
	}

	fn version(&self) -> u64 {
		self.version
	}

	fn set_status(&mut self, request: &TransitionRequest<ShipmentStatus>) {
		self.status = request.status;
		if request.status == ShipmentStatus::Delivered {
			self.actual_delivery_date = request.actual_date;
		}
	}

	fn touch(&mut self, at: DateTime<Utc>) {
		self.updated_at = at;
		self.version += 1;
	}
}

/// Builds a new DRAFT shipment from caller input.
pub fn new_shipment(
	id: String,
	input: NewShipment,
	now: DateTime<Utc>,
) -> Result<Shipment, WorkflowError> {
	validate_location("origin", &input.origin)?;
	validate_location("destination", &input.destination)?;
	if input.weight <= Decimal::ZERO {
		return Err(WorkflowError::invalid("weight", "must be greater than zero"));
	}
	if input.volume.is_some_and(|volume| volume.is_sign_negative()) {
		return Err(WorkflowError::invalid("volume", "cannot be negative"));
	}
	if let Some(dimensions) = &input.dimensions {
		if [dimensions.length, dimensions.width, dimensions.height]
			.iter()
			.any(|side| *side <= Decimal::ZERO)
		{
			return Err(WorkflowError::invalid(
				"dimensions",
				"every side must be greater than zero",
			));
		}
		if dimensions.volume_m3().is_none() {
			return Err(WorkflowError::invalid("dimensions", "volume is too large"));
		}
	}

	let mut transport_modes = Vec::with_capacity(input.transport_modes.len());
	for mode in input.transport_modes {
		if !transport_modes.contains(&mode) {
			transport_modes.push(mode);
		}
	}

	Ok(Shipment {
		id,
		origin: normalise_location(input.origin),
		destination: normalise_location(input.destination),
		weight: input.weight,
		volume: input.volume,
		dimensions: input.dimensions,
		cargo_type: input.cargo_type,
		is_dangerous: input.is_dangerous,
		is_fragile: input.is_fragile,
		priority: input.priority,
		transport_modes,
		status: ShipmentStatus::initial(),
		estimated_cost: None,
		actual_cost: None,
		actual_delivery_date: None,
		created_at: now,
		updated_at: now,
		version: 0,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use logistics_types::{Dimensions, Location, TransportMode};
	use rust_decimal_macros::dec;
	use ShipmentStatus::*;

	fn input() -> NewShipment {
		NewShipment {
			origin: Location {
				address: "12 rue de Rivoli".into(),
				city: "Paris".into(),
				country_code: "fr".into(),
			},
			destination: Location {
				address: "Route de Ngor".into(),
				city: "Dakar".into(),
				country_code: "SN".into(),
			},
			weight: dec!(10),
			volume: None,
			dimensions: None,
			cargo_type: Default::default(),
			is_dangerous: false,
			is_fragile: false,
			priority: Default::default(),
			transport_modes: vec![TransportMode::Air, TransportMode::Sea, TransportMode::Air],
			actor: "clerk".into(),
		}
	}

	#[test]
	fn test_linear_chain() {
		let chain = [
			Draft,
			PendingApproval,
			PickedUp,
			InTransit,
			AtCustoms,
			ReadyForPickup,
			Delivered,
		];
		for pair in chain.windows(2) {
			assert!(ShipmentStatus::is_allowed(pair[0], pair[1]), "{} -> {}", pair[0], pair[1]);
		}
		assert!(!ShipmentStatus::is_allowed(Draft, PickedUp));
		assert!(!ShipmentStatus::is_allowed(InTransit, PickedUp));
	}

	#[test]
	fn test_hold_and_cancel_from_every_open_status() {
		for status in ShipmentStatus::ALL {
			if status.is_terminal() {
				continue;
			}
			assert!(ShipmentStatus::is_allowed(status, Cancelled), "{status}");
			if status != OnHold {
				assert!(ShipmentStatus::is_allowed(status, OnHold), "{status}");
			}
		}
	}

	#[test]
	fn test_hold_resumes_at_pending_approval() {
		assert!(ShipmentStatus::is_allowed(OnHold, PendingApproval));
		assert!(!ShipmentStatus::is_allowed(OnHold, InTransit));
	}

	#[test]
	fn test_exception_branch() {
		for from in [PickedUp, InTransit, AtCustoms, ReadyForPickup] {
			assert!(ShipmentStatus::is_allowed(from, Exception), "{from}");
		}
		assert!(!ShipmentStatus::is_allowed(Draft, Exception));
		assert!(!ShipmentStatus::is_allowed(PendingApproval, Exception));

		let from_exception: HashSet<_> = ShipmentStatus::transitions()[&Exception].clone();
		assert_eq!(from_exception, HashSet::from([OnHold, Cancelled]));
	}

	#[test]
	fn test_new_shipment_defaults() {
		let shipment = new_shipment("s1".into(), input(), Utc::now()).unwrap();
		assert_eq!(shipment.status, Draft);
		assert_eq!(shipment.version, 0);
		assert_eq!(shipment.origin.country_code, "FR");
		assert_eq!(
			shipment.transport_modes,
			vec![TransportMode::Air, TransportMode::Sea]
		);
	}

	#[test]
	fn test_new_shipment_rejects_bad_input() {
		let mut bad = input();
		bad.weight = dec!(0);
		let err = new_shipment("s1".into(), bad, Utc::now()).unwrap_err();
		assert!(matches!(err, WorkflowError::Validation { field, .. } if field == "weight"));

		let mut bad = input();
		bad.destination.country_code = "SEN".into();
		let err = new_shipment("s1".into(), bad, Utc::now()).unwrap_err();
		assert!(
			matches!(err, WorkflowError::Validation { field, .. } if field == "destination.countryCode")
		);

		let side = Decimal::from(10_000_000_000_000_i64);
		let mut bad = input();
		bad.dimensions = Some(Dimensions {
			length: side,
			width: side,
			height: side,
		});
		let err = new_shipment("s1".into(), bad, Utc::now()).unwrap_err();
		assert!(matches!(err, WorkflowError::Validation { field, .. } if field == "dimensions"));
	}

	#[test]
	fn test_delivery_sets_actual_date() {
		let mut shipment = new_shipment("s1".into(), input(), Utc::now()).unwrap();
		shipment.status = ReadyForPickup;
		let delivered_at = Utc::now();
		let request = TransitionRequest::new(Delivered, "driver").with_actual_date(delivered_at);
		shipment.apply(&request, Utc::now());
		assert_eq!(shipment.status, Delivered);
		assert_eq!(shipment.actual_delivery_date, Some(delivered_at));
		assert_eq!(shipment.version, 1);
	}
}
