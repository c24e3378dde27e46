//! Applies validated transitions to stored entities.
//!
//! An entity record and its status history are written in one guarded
//! [`WriteBatch`]: the batch only applies if the entity bytes are still the
//! ones the transition was validated against. A concurrent writer therefore
//! surfaces as a [`WorkflowError::VersionConflict`] (or
//! [`WorkflowError::ConcurrentUpdate`] when the version did not move)
//! instead of a lost update.

use super::{history_note, validate_transition, Lifecycle, WorkflowEntity, WorkflowError};
use chrono::Utc;
use logistics_storage::{StorageError, StorageService, WriteBatch};
use logistics_types::{truncate_id, EntityKind, StatusHistory, StorageKey, TransitionRequest};
use std::sync::Arc;
use tracing::instrument;

/// Moves workflow entities between statuses.
pub struct TransitionEngine {
	storage: Arc<StorageService>,
	min_reason_length: usize,
}

impl TransitionEngine {
	pub fn new(storage: Arc<StorageService>, min_reason_length: usize) -> Self {
		Self {
			storage,
			min_reason_length,
		}
	}

	pub fn min_reason_length(&self) -> usize {
		self.min_reason_length
	}

	/// Loads an entity by id.
	pub async fn get<E: WorkflowEntity>(&self, id: &str) -> Result<E, WorkflowError> {
		self.storage
			.retrieve(StorageKey::for_entity(E::KIND).as_str(), id)
			.await
			.map_err(|e| storage_error(e, E::KIND, id))
	}

	/// Returns the status history of an entity, oldest first.
	pub async fn history(
		&self,
		kind: EntityKind,
		id: &str,
	) -> Result<StatusHistory, WorkflowError> {
		let exists = self
			.storage
			.exists(StorageKey::for_entity(kind).as_str(), id)
			.await
			.map_err(|e| WorkflowError::Storage(e.to_string()))?;
		if !exists {
			return Err(WorkflowError::NotFound {
				kind,
				id: id.to_string(),
			});
		}

		self.storage
			.retrieve_or_default(
				StorageKey::StatusLogs.as_str(),
				&StorageKey::history_id(kind, id),
			)
			.await
			.map_err(|e| WorkflowError::Storage(e.to_string()))
	}

	/// Persists a new entity together with the history entry of its initial
	/// status.
	#[instrument(skip_all, fields(kind = %E::KIND, id = %truncate_id(entity.id())))]
	pub async fn create<E: WorkflowEntity>(
		&self,
		entity: E,
		actor: &str,
		notes: Option<String>,
	) -> Result<E, WorkflowError> {
		if actor.trim().is_empty() {
			return Err(WorkflowError::missing("actor"));
		}

		let namespace = StorageKey::for_entity(E::KIND).as_str();
		let mut history = StatusHistory::default();
		history.append(
			E::KIND,
			entity.id(),
			entity.status().label(),
			Utc::now(),
			actor,
			notes,
		);

		let batch = WriteBatch::new()
			.expect_absent(namespace, entity.id())
			.put(namespace, entity.id(), &entity)
			.and_then(|batch| {
				batch.put(
					StorageKey::StatusLogs.as_str(),
					&StorageKey::history_id(E::KIND, entity.id()),
					&history,
				)
			})
			.map_err(|e| WorkflowError::Storage(e.to_string()))?;

		match self.storage.commit(batch).await {
			Ok(()) => {},
			Err(StorageError::PreconditionFailed(_)) => {
				return Err(WorkflowError::invalid("id", "already exists"));
			},
			Err(e) => return Err(WorkflowError::Storage(e.to_string())),
		}

		tracing::info!(status = %entity.status(), actor = %actor, "Created");
		Ok(entity)
	}

	/// Validates and applies a transition, appending to the entity history.
	///
	/// Nothing is written when the transition is rejected.
	#[instrument(skip_all, fields(kind = %E::KIND, id = %truncate_id(id), to = %request.status))]
	pub async fn transition<E: WorkflowEntity>(
		&self,
		id: &str,
		request: TransitionRequest<E::Status>,
	) -> Result<E, WorkflowError> {
		let namespace = StorageKey::for_entity(E::KIND).as_str();
		let snapshot = self
			.storage
			.retrieve_snapshot::<E>(namespace, id)
			.await
			.map_err(|e| storage_error(e, E::KIND, id))?;

		let mut entity = snapshot.value;
		let read_version = entity.version();
		if let Some(expected) = request.expected_version {
			if expected != read_version {
				return Err(WorkflowError::VersionConflict {
					expected,
					actual: read_version,
				});
			}
		}

		let from = entity.status();
		validate_transition(from, &request, self.min_reason_length)?;

		let now = Utc::now();
		entity.apply(&request, now);

		let history_id = StorageKey::history_id(E::KIND, id);
		let mut history: StatusHistory = self
			.storage
			.retrieve_or_default(StorageKey::StatusLogs.as_str(), &history_id)
			.await
			.map_err(|e| WorkflowError::Storage(e.to_string()))?;
		history.append(
			E::KIND,
			id,
			request.status.label(),
			now,
			&request.actor,
			history_note(&request),
		);

		let batch = WriteBatch::new()
			.expect_unchanged(namespace, id, snapshot.raw)
			.put(namespace, id, &entity)
			.and_then(|batch| batch.put(StorageKey::StatusLogs.as_str(), &history_id, &history))
			.map_err(|e| WorkflowError::Storage(e.to_string()))?;

		match self.storage.commit(batch).await {
			Ok(()) => {},
			Err(StorageError::PreconditionFailed(_)) => {
				let current = self.get::<E>(id).await?;
				tracing::warn!(
					expected = read_version,
					actual = current.version(),
					"Concurrent update detected"
				);
				if current.version() == read_version {
					return Err(WorkflowError::ConcurrentUpdate {
						kind: E::KIND,
						id: id.to_string(),
					});
				}
				return Err(WorkflowError::VersionConflict {
					expected: read_version,
					actual: current.version(),
				});
			},
			Err(e) => return Err(WorkflowError::Storage(e.to_string())),
		}

		tracing::info!(
			from = %from,
			actor = %request.actor,
			version = entity.version(),
			"Status changed"
		);
		Ok(entity)
	}
}

fn storage_error(err: StorageError, kind: EntityKind, id: &str) -> WorkflowError {
	match err {
		StorageError::NotFound => WorkflowError::NotFound {
			kind,
			id: id.to_string(),
		},
		other => WorkflowError::Storage(other.to_string()),
	}
}
