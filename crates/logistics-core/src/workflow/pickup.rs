//! Pickup request lifecycle.
//!
//! `REQUESTED -> SCHEDULED -> IN_PROGRESS -> COMPLETED`, with CANCELED
//! reachable from every non-terminal status.

use super::{
	build_table, normalise_location, validate_location, Lifecycle, Requirement, WorkflowEntity,
	WorkflowError,
};
use chrono::{DateTime, Utc};
use logistics_types::{EntityKind, NewPickup, PickupRequest, PickupStatus, TransitionRequest};
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

static TRANSITIONS: Lazy<HashMap<PickupStatus, HashSet<PickupStatus>>> = Lazy::new(|| {
	use PickupStatus::*;
	build_table(
		&PickupStatus::ALL,
		&[Requested, Scheduled, InProgress, Completed],
		&[Canceled],
		&[Completed, Canceled],
		&[],
	)
});

impl Lifecycle for PickupStatus {
	fn initial() -> Self {
		PickupStatus::Requested
	}

	fn transitions() -> &'static HashMap<Self, HashSet<Self>> {
		&TRANSITIONS
	}

	fn requirement(self) -> Requirement {
		match self {
			PickupStatus::Scheduled => Requirement::ScheduledDate,
			PickupStatus::Completed => Requirement::ActualDate,
			PickupStatus::Canceled => Requirement::Reason,
			_ => Requirement::None,
		}
	}

	fn label(self) -> &'static str {
		self.as_str()
	}
}

impl WorkflowEntity for PickupRequest {
	type Status = PickupStatus;

	const KIND: EntityKind = EntityKind::PickupRequest;

	fn id(&self) -> &str {
		&self.id
	}

	fn status(&self) -> PickupStatus {
		self.status
	}

	fn version(&self) -> u64 {
		self.version
	}

	fn set_status(&mut self, request: &TransitionRequest<PickupStatus>) {
		self.status = request.status;
		match request.status {
			PickupStatus::Scheduled => self.scheduled_date = request.scheduled_date,
			PickupStatus::Completed => self.actual_pickup_date = request.actual_date,
			_ => {},
		}
	}

	fn touch(&mut self, at: DateTime<Utc>) {
		self.updated_at = at;
		self.version += 1;
	}
}

/// Builds a new REQUESTED pickup from caller input.
pub fn new_pickup(
	id: String,
	input: NewPickup,
	now: DateTime<Utc>,
) -> Result<PickupRequest, WorkflowError> {
	validate_location("address", &input.address)?;
	if input.contact.name.trim().is_empty() {
		return Err(WorkflowError::missing("contact.name"));
	}
	if input.contact.phone.trim().is_empty() {
		return Err(WorkflowError::missing("contact.phone"));
	}

	Ok(PickupRequest {
		id,
		shipment_id: input
			.shipment_id
			.map(|id| id.trim().to_string())
			.filter(|id| !id.is_empty()),
		address: normalise_location(input.address),
		contact: input.contact,
		status: PickupStatus::initial(),
		scheduled_date: None,
		actual_pickup_date: None,
		created_at: now,
		updated_at: now,
		version: 0,
	})
}
