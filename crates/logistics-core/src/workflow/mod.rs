//! Status workflows for shipments, pickups and purchases.
//!
//! Each status enum carries a static transition table behind the
//! [`Lifecycle`] trait. [`validate_transition`] checks a requested move
//! against that table and against the auxiliary fields the target status
//! needs; it is pure so that callers can dry-run a transition. The
//! [`TransitionEngine`] applies accepted transitions and records history.

pub mod engine;
pub mod pickup;
pub mod purchase;
pub mod shipment;

pub use engine::TransitionEngine;

use chrono::{DateTime, Utc};
use logistics_types::{APIError, EntityKind, TransitionRequest};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use thiserror::Error;

/// Errors produced by status workflows.
#[derive(Debug, Error)]
pub enum WorkflowError {
	#[error("Invalid transition from {from} to {to}")]
	InvalidTransition { from: String, to: String },
	#[error("{field} is required")]
	MissingField { field: String },
	#[error("{field} must be at least {min} characters")]
	ReasonTooShort { field: String, min: usize },
	#[error("{kind} not found: {id}")]
	NotFound { kind: EntityKind, id: String },
	#[error("Version conflict: expected {expected}, found {actual}")]
	VersionConflict { expected: u64, actual: u64 },
	/// The record changed between read and commit without a new version,
	/// e.g. a cost estimate was recorded on it.
	#[error("{kind} {id} was modified concurrently")]
	ConcurrentUpdate { kind: EntityKind, id: String },
	#[error("Invalid {field}: {message}")]
	Validation { field: String, message: String },
	#[error("Storage error: {0}")]
	Storage(String),
}

impl WorkflowError {
	pub(crate) fn missing(field: &str) -> Self {
		Self::MissingField {
			field: field.to_string(),
		}
	}

	pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
		Self::Validation {
			field: field.to_string(),
			message: message.into(),
		}
	}
}

impl From<WorkflowError> for APIError {
	fn from(err: WorkflowError) -> Self {
		let message = err.to_string();
		match err {
			WorkflowError::InvalidTransition { .. } => APIError::UnprocessableEntity {
				message,
				field: Some("status".to_string()),
			},
			WorkflowError::MissingField { field }
			| WorkflowError::ReasonTooShort { field, .. }
			| WorkflowError::Validation { field, .. } => APIError::BadRequest {
				message,
				field: Some(field),
			},
			WorkflowError::NotFound { .. } => APIError::NotFound { message },
			WorkflowError::VersionConflict { .. } | WorkflowError::ConcurrentUpdate { .. } => {
				APIError::Conflict { message }
			},
			WorkflowError::Storage(_) => APIError::InternalServerError { message },
		}
	}
}

/// Auxiliary input a target status demands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
	None,
	/// `scheduledDate` must be given.
	ScheduledDate,
	/// `actualDate` must be given.
	ActualDate,
	/// `reason` must be given and long enough.
	Reason,
}

/// Closed status set with a static transition table.
pub trait Lifecycle:
	Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static
{
	/// Status assigned on creation.
	fn initial() -> Self;

	/// Allowed targets per status. Terminal statuses map to an empty set.
	fn transitions() -> &'static HashMap<Self, HashSet<Self>>;

	/// What entering this status requires from the caller.
	fn requirement(self) -> Requirement;

	/// Wire label, e.g. `PENDING_APPROVAL`.
	fn label(self) -> &'static str;

	fn is_allowed(from: Self, to: Self) -> bool {
		Self::transitions()
			.get(&from)
			.is_some_and(|targets| targets.contains(&to))
	}

	fn is_terminal(self) -> bool {
		Self::transitions()
			.get(&self)
			.is_none_or(|targets| targets.is_empty())
	}
}

/// Builds a transition table from a linear chain plus escape statuses.
///
/// Every status in `chain` moves to the next one and `extra` edges are
/// added. Every status of `all` that is not terminal also moves to each of
/// `escapes` other than itself.
pub(crate) fn build_table<S: Lifecycle>(
	all: &[S],
	chain: &[S],
	escapes: &[S],
	terminal: &[S],
	extra: &[(S, S)],
) -> HashMap<S, HashSet<S>> {
	let mut table: HashMap<S, HashSet<S>> = all.iter().map(|s| (*s, HashSet::new())).collect();
	for pair in chain.windows(2) {
		table.entry(pair[0]).or_default().insert(pair[1]);
	}
	for (from, to) in extra {
		table.entry(*from).or_default().insert(*to);
	}
	for (status, targets) in table.iter_mut() {
		if terminal.contains(status) {
			targets.clear();
			continue;
		}
		targets.extend(escapes.iter().copied().filter(|escape| escape != status));
	}
	table
}

/// A record moved through a [`Lifecycle`].
pub trait WorkflowEntity: Serialize + DeserializeOwned + Clone + Send + Sync {
	type Status: Lifecycle + Serialize + DeserializeOwned;

	const KIND: EntityKind;

	fn id(&self) -> &str;
	fn status(&self) -> Self::Status;
	fn version(&self) -> u64;

	/// Sets the new status and the date fields the request carries for it.
	fn set_status(&mut self, request: &TransitionRequest<Self::Status>);

	fn touch(&mut self, at: DateTime<Utc>);

	/// Records an accepted transition: status, dates, `updated_at` and a
	/// version bump.
	fn apply(&mut self, request: &TransitionRequest<Self::Status>, at: DateTime<Utc>) {
		self.set_status(request);
		self.touch(at);
	}
}

/// Checks a requested transition without touching storage.
///
/// Edge legality is checked first, so a terminal or same-status request is
/// always reported as an invalid transition.
pub fn validate_transition<S: Lifecycle>(
	from: S,
	request: &TransitionRequest<S>,
	min_reason_length: usize,
) -> Result<(), WorkflowError> {
	let to = request.status;
	if from.is_terminal() || !S::is_allowed(from, to) {
		return Err(WorkflowError::InvalidTransition {
			from: from.label().to_string(),
			to: to.label().to_string(),
		});
	}

	match to.requirement() {
		Requirement::None => {},
		Requirement::ScheduledDate => {
			if request.scheduled_date.is_none() {
				return Err(WorkflowError::missing("scheduledDate"));
			}
		},
		Requirement::ActualDate => {
			if request.actual_date.is_none() {
				return Err(WorkflowError::missing("actualDate"));
			}
		},
		Requirement::Reason => {
			let reason = request.reason.as_deref().map(str::trim).unwrap_or_default();
			if reason.is_empty() {
				return Err(WorkflowError::missing("reason"));
			}
			if reason.chars().count() < min_reason_length {
				return Err(WorkflowError::ReasonTooShort {
					field: "reason".to_string(),
					min: min_reason_length,
				});
			}
		},
	}

	if request.actor.trim().is_empty() {
		return Err(WorkflowError::missing("actor"));
	}

	Ok(())
}

/// Note stored with a history entry: the trimmed notes, or the reason when
/// no notes were given.
pub(crate) fn history_note<S>(request: &TransitionRequest<S>) -> Option<String> {
	let trimmed = |value: &Option<String>| {
		value
			.as_deref()
			.map(str::trim)
			.filter(|s| !s.is_empty())
			.map(str::to_string)
	};
	trimmed(&request.notes).or_else(|| trimmed(&request.reason))
}

/// Checks a caller-supplied location; `field` prefixes error field names.
pub(crate) fn validate_location(
	field: &str,
	location: &logistics_types::Location,
) -> Result<(), WorkflowError> {
	if location.address.trim().is_empty() {
		return Err(WorkflowError::missing(&format!("{}.address", field)));
	}
	let code = location.country_code.trim();
	if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
		return Err(WorkflowError::invalid(
			&format!("{}.countryCode", field),
			format!("expected a two-letter country code, got '{}'", code),
		));
	}
	Ok(())
}

/// Copy of `location` with a trimmed, upper-case country code.
pub(crate) fn normalise_location(location: logistics_types::Location) -> logistics_types::Location {
	logistics_types::Location {
		country_code: location.country_code.trim().to_ascii_uppercase(),
		..location
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use logistics_types::{PickupStatus, PurchaseStatus, ShipmentStatus};

	fn request<S>(status: S) -> TransitionRequest<S> {
		TransitionRequest::new(status, "agent-7")
	}

	#[test]
	fn test_terminal_statuses_have_no_targets() {
		for status in ShipmentStatus::ALL {
			let terminal = matches!(status, ShipmentStatus::Delivered | ShipmentStatus::Cancelled);
			assert_eq!(status.is_terminal(), terminal, "{status}");
		}
		for status in PickupStatus::ALL {
			let terminal = matches!(status, PickupStatus::Completed | PickupStatus::Canceled);
			assert_eq!(status.is_terminal(), terminal, "{status}");
		}
		for status in PurchaseStatus::ALL {
			let terminal = matches!(status, PurchaseStatus::Livre | PurchaseStatus::Annule);
			assert_eq!(status.is_terminal(), terminal, "{status}");
		}
	}

	#[test]
	fn test_terminal_rejects_everything_including_same_status() {
		for to in ShipmentStatus::ALL {
			let mut req = request(to)
				.with_reason("customer changed their mind")
				.with_actual_date(Utc::now());
			req.scheduled_date = Some(Utc::now());
			let err = validate_transition(ShipmentStatus::Delivered, &req, 10).unwrap_err();
			assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
		}
	}

	#[test]
	fn test_same_status_is_invalid() {
		let err = validate_transition(
			PickupStatus::Scheduled,
			&request(PickupStatus::Scheduled).with_scheduled_date(Utc::now()),
			10,
		)
		.unwrap_err();
		assert!(matches!(err, WorkflowError::InvalidTransition { from, to } if from == "SCHEDULED" && to == "SCHEDULED"));
	}

	#[test]
	fn test_scheduled_requires_date() {
		let err = validate_transition(PickupStatus::Requested, &request(PickupStatus::Scheduled), 10)
			.unwrap_err();
		assert!(matches!(err, WorkflowError::MissingField { field } if field == "scheduledDate"));
	}

	#[test]
	fn test_completion_requires_actual_date() {
		let err = validate_transition(PickupStatus::InProgress, &request(PickupStatus::Completed), 10)
			.unwrap_err();
		assert!(matches!(err, WorkflowError::MissingField { field } if field == "actualDate"));

		let err = validate_transition(PurchaseStatus::EnCours, &request(PurchaseStatus::Livre), 10)
			.unwrap_err();
		assert!(matches!(err, WorkflowError::MissingField { field } if field == "actualDate"));
	}

	#[test]
	fn test_reason_length_boundary() {
		let nine = request(ShipmentStatus::Cancelled).with_reason("123456789");
		let err = validate_transition(ShipmentStatus::Draft, &nine, 10).unwrap_err();
		assert!(matches!(err, WorkflowError::ReasonTooShort { min: 10, .. }));

		let ten = request(ShipmentStatus::Cancelled).with_reason("1234567890");
		assert!(validate_transition(ShipmentStatus::Draft, &ten, 10).is_ok());

		let padded = request(ShipmentStatus::OnHold).with_reason("   123456789   ");
		assert!(validate_transition(ShipmentStatus::InTransit, &padded, 10).is_err());
	}

	#[test]
	fn test_blank_reason_is_missing() {
		let blank = request(PurchaseStatus::Annule).with_reason("   ");
		let err = validate_transition(PurchaseStatus::Nouveau, &blank, 10).unwrap_err();
		assert!(matches!(err, WorkflowError::MissingField { field } if field == "reason"));
	}

	#[test]
	fn test_actor_required() {
		let req = TransitionRequest::new(PurchaseStatus::EnCours, " ");
		let err = validate_transition(PurchaseStatus::Nouveau, &req, 10).unwrap_err();
		assert!(matches!(err, WorkflowError::MissingField { field } if field == "actor"));
	}

	#[test]
	fn test_history_note_falls_back_to_reason() {
		let req = request(ShipmentStatus::OnHold).with_reason("awaiting customs papers");
		assert_eq!(history_note(&req).as_deref(), Some("awaiting customs papers"));

		let req = req.with_notes("called the broker");
		assert_eq!(history_note(&req).as_deref(), Some("called the broker"));

		assert_eq!(history_note(&request(ShipmentStatus::PickedUp)), None);
	}

	#[test]
	fn test_error_status_mapping() {
		let api: APIError = WorkflowError::InvalidTransition {
			from: "DRAFT".into(),
			to: "DELIVERED".into(),
		}
		.into();
		assert_eq!(api.status_code(), 422);

		let api: APIError = WorkflowError::missing("scheduledDate").into();
		assert_eq!(api.status_code(), 400);
		assert_eq!(api.field(), Some("scheduledDate"));

		let api: APIError = WorkflowError::VersionConflict {
			expected: 1,
			actual: 2,
		}
		.into();
		assert_eq!(api.status_code(), 409);

		let api: APIError = WorkflowError::NotFound {
			kind: EntityKind::Shipment,
			id: "x".into(),
		}
		.into();
		assert_eq!(api.status_code(), 404);
	}
}
