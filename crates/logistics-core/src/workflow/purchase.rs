//! Purchase request lifecycle.
//!
//! `NOUVEAU -> EN_COURS -> LIVRE`, with ANNULE reachable from every
//! non-terminal status.

use super::{
	build_table, normalise_location, validate_location, Lifecycle, Requirement, WorkflowEntity,
	WorkflowError,
};
use chrono::{DateTime, Utc};
use logistics_types::{
	CostBreakdown, EntityKind, NewPurchase, PurchaseRequest, PurchaseStatus, TransitionRequest,
};
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

static TRANSITIONS: Lazy<HashMap<PurchaseStatus, HashSet<PurchaseStatus>>> = Lazy::new(|| {
	use PurchaseStatus::*;
	build_table(
		&PurchaseStatus::ALL,
		&[Nouveau, EnCours, Livre],
		&[Annule],
		&[Livre, Annule],
		&[],
	)
});

impl Lifecycle for PurchaseStatus {
	fn initial() -> Self {
		PurchaseStatus::Nouveau
	}

	fn transitions() -> &'static HashMap<Self, HashSet<Self>> {
		&TRANSITIONS
	}

	fn requirement(self) -> Requirement {
		match self {
			PurchaseStatus::Livre => Requirement::ActualDate,
			PurchaseStatus::Annule => Requirement::Reason,
			_ => Requirement::None,
		}
	}

	fn label(self) -> &'static str {
		self.as_str()
	}
}

impl WorkflowEntity for PurchaseRequest {
	type Status = PurchaseStatus;

	const KIND: EntityKind = EntityKind::PurchaseRequest;

	fn id(&self) -> &str {
		&self.id
	}

	fn status(&self) -> PurchaseStatus {
		self.status
	}

	fn version(&self) -> u64 {
		self.version
	}

	fn set_status(&mut self, request: &TransitionRequest<PurchaseStatus>) {
		self.status = request.status;
		if request.status == PurchaseStatus::Livre {
			self.actual_delivery_date = request.actual_date;
		}
	}

	fn touch(&mut self, at: DateTime<Utc>) {
		self.updated_at = at;
		self.version += 1;
	}
}

/// Builds a new NOUVEAU purchase from caller input and its priced costs.
pub fn new_purchase(
	id: String,
	input: NewPurchase,
	cost: CostBreakdown,
	now: DateTime<Utc>,
) -> Result<PurchaseRequest, WorkflowError> {
	if input.product.name.trim().is_empty() {
		return Err(WorkflowError::missing("product.name"));
	}
	if input.product.quantity == 0 {
		return Err(WorkflowError::invalid(
			"product.quantity",
			"must be at least 1",
		));
	}
	validate_location("deliveryAddress", &input.delivery_address)?;

	Ok(PurchaseRequest {
		id,
		product: input.product,
		delivery_address: normalise_location(input.delivery_address),
		cost,
		status: PurchaseStatus::initial(),
		actual_delivery_date: None,
		created_at: now,
		updated_at: now,
		version: 0,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use PurchaseStatus::*;

	#[test]
	fn test_table() {
		assert!(PurchaseStatus::is_allowed(Nouveau, EnCours));
		assert!(PurchaseStatus::is_allowed(EnCours, Livre));
		assert!(PurchaseStatus::is_allowed(Nouveau, Annule));
		assert!(PurchaseStatus::is_allowed(EnCours, Annule));
		assert!(!PurchaseStatus::is_allowed(Nouveau, Livre));
		assert!(!PurchaseStatus::is_allowed(Livre, Annule));
		assert!(!PurchaseStatus::is_allowed(Annule, Nouveau));
	}

	#[test]
	fn test_initial_is_nouveau() {
		assert_eq!(PurchaseStatus::initial(), Nouveau);
		assert!(!Nouveau.is_terminal());
	}
}
