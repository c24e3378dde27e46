//! Status history entries.
//!
//! Every accepted transition appends one [`StatusLog`]. Entries are never
//! edited once written; the full list for an entity is stored under a single
//! history key and only ever grows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::EntityKind;

/// One immutable entry in an entity's status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusLog {
	/// Position of the entry in the history, starting at 0.
	pub sequence: u64,
	pub entity_kind: EntityKind,
	pub entity_id: String,
	/// Status label the entity moved to.
	pub status: String,
	pub timestamp: DateTime<Utc>,
	/// User who performed the change.
	pub actor: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub notes: Option<String>,
}

/// Ordered history of a single entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHistory {
	pub entries: Vec<StatusLog>,
}

impl StatusHistory {
	/// Appends an entry, assigning its sequence number.
	///
	/// The timestamp is clamped so that it never precedes the previous entry,
	/// which keeps the history ordered even if the wall clock steps back.
	pub fn append(
		&mut self,
		entity_kind: EntityKind,
		entity_id: &str,
		status: &str,
		timestamp: DateTime<Utc>,
		actor: &str,
		notes: Option<String>,
	) -> &StatusLog {
		let timestamp = match self.entries.last() {
			Some(last) if last.timestamp > timestamp => last.timestamp,
			_ => timestamp,
		};
		self.entries.push(StatusLog {
			sequence: self.entries.len() as u64,
			entity_kind,
			entity_id: entity_id.to_string(),
			status: status.to_string(),
			timestamp,
			actor: actor.to_string(),
			notes,
		});
		&self.entries[self.entries.len() - 1]
	}

	/// Status label of the most recent entry.
	pub fn last_status(&self) -> Option<&str> {
		self.entries.last().map(|entry| entry.status.as_str())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Duration;

	#[test]
	fn test_append_keeps_timestamps_ordered() {
		let mut history = StatusHistory::default();
		let now = Utc::now();
		history.append(EntityKind::Shipment, "s1", "DRAFT", now, "alice", None);
		let entry = history.append(
			EntityKind::Shipment,
			"s1",
			"PENDING_APPROVAL",
			now - Duration::seconds(30),
			"alice",
			Some("submitted".into()),
		);

		assert_eq!(entry.sequence, 1);
		assert_eq!(entry.timestamp, now);
		assert_eq!(history.last_status(), Some("PENDING_APPROVAL"));
	}
}
