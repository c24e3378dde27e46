//! Storage module for the logistics system.
//!
//! This module provides abstractions for persistent storage of shipments,
//! pickups, purchases, their status histories and the tariff table. Backends
//! only deal in bytes; [`StorageService`] adds typed JSON access and guarded
//! multi-key commits.

use async_trait::async_trait;
use logistics_types::{ConfigSchema, ImplementationRegistry};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// Error that occurs when a requested item is not found.
	#[error("Not found")]
	NotFound,
	/// A batch precondition did not hold; nothing was written.
	#[error("Precondition failed for key {0}")]
	PreconditionFailed(String),
	/// Error that occurs during serialization/deserialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Condition checked by a backend before applying a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
	/// The key must not exist.
	Absent(String),
	/// The key must hold exactly these bytes.
	Unchanged { key: String, expected: Vec<u8> },
}

impl Precondition {
	pub fn key(&self) -> &str {
		match self {
			Precondition::Absent(key) => key,
			Precondition::Unchanged { key, .. } => key,
		}
	}

	/// Checks the condition against the current value of its key.
	pub fn holds(&self, current: Option<&[u8]>) -> bool {
		match (self, current) {
			(Precondition::Absent(_), None) => true,
			(Precondition::Unchanged { expected, .. }, Some(bytes)) => expected == bytes,
			_ => false,
		}
	}
}

/// A set of writes applied all-or-nothing once every precondition holds.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
	preconditions: Vec<Precondition>,
	writes: Vec<(String, Vec<u8>)>,
}

impl WriteBatch {
	pub fn new() -> Self {
		Self::default()
	}

	/// Requires `namespace:id` to still hold `expected`.
	pub fn expect_unchanged(mut self, namespace: &str, id: &str, expected: Vec<u8>) -> Self {
		self.preconditions.push(Precondition::Unchanged {
			key: storage_key(namespace, id),
			expected,
		});
		self
	}

	/// Requires `namespace:id` not to exist yet.
	pub fn expect_absent(mut self, namespace: &str, id: &str) -> Self {
		self.preconditions
			.push(Precondition::Absent(storage_key(namespace, id)));
		self
	}

	/// Adds a JSON-serialised write of `data` to `namespace:id`.
	pub fn put<T: Serialize>(
		mut self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<Self, StorageError> {
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.writes.push((storage_key(namespace, id), bytes));
		Ok(self)
	}

	pub fn preconditions(&self) -> &[Precondition] {
		&self.preconditions
	}

	pub fn writes(&self) -> &[(String, Vec<u8>)] {
		&self.writes
	}

	pub fn into_writes(self) -> Vec<(String, Vec<u8>)> {
		self.writes
	}

	pub fn is_empty(&self) -> bool {
		self.writes.is_empty()
	}
}

/// Builds the backend key of a record.
pub fn storage_key(namespace: &str, id: &str) -> String {
	format!("{}:{}", namespace, id)
}

/// Trait defining the low-level interface for storage backends.
///
/// Backends must make [`StorageInterface::commit`] atomic with respect to
/// other commits: preconditions are checked and all writes applied without
/// another commit interleaving.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	/// Retrieves raw bytes for the given key.
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	/// Stores raw bytes, replacing any previous value.
	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

	/// Deletes the value associated with the given key.
	async fn delete(&self, key: &str) -> Result<(), StorageError>;

	/// Checks if a key exists in storage.
	async fn exists(&self, key: &str) -> Result<bool, StorageError>;

	/// Lists every key starting with `prefix`, sorted.
	async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

	/// Applies a batch of writes once all of its preconditions hold.
	async fn commit(&self, batch: WriteBatch) -> Result<(), StorageError>;

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Type alias for storage factory functions.
pub type StorageFactory = fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>;

/// Registry trait for storage implementations.
pub trait StorageRegistry: ImplementationRegistry<Factory = StorageFactory> {}

/// Get all registered storage implementations.
///
/// Returns a vector of (name, factory) tuples for all available storage implementations.
pub fn get_all_implementations() -> Vec<(&'static str, StorageFactory)> {
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// A typed value together with the exact bytes it was decoded from.
///
/// The bytes are what a later [`WriteBatch::expect_unchanged`] compares
/// against.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
	pub value: T,
	pub raw: Vec<u8>,
}

/// High-level storage service that provides typed operations.
///
/// The StorageService wraps a low-level storage backend and provides
/// convenient methods for storing and retrieving typed data with
/// automatic serialization/deserialization.
pub struct StorageService {
	/// The underlying storage backend implementation.
	backend: Box<dyn StorageInterface>,
}

impl StorageService {
	/// Creates a new StorageService with the specified backend.
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	/// Stores a serializable value, creating or overwriting it.
	pub async fn store<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend
			.set_bytes(&storage_key(namespace, id), bytes)
			.await
	}

	/// Retrieves and deserializes a value from storage.
	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<T, StorageError> {
		Ok(self.retrieve_snapshot(namespace, id).await?.value)
	}

	/// Retrieves a value along with its raw bytes.
	pub async fn retrieve_snapshot<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<Snapshot<T>, StorageError> {
		let raw = self.backend.get_bytes(&storage_key(namespace, id)).await?;
		let value =
			serde_json::from_slice(&raw).map_err(|e| StorageError::Serialization(e.to_string()))?;
		Ok(Snapshot { value, raw })
	}

	/// Retrieves a value, returning `T::default()` when it does not exist.
	pub async fn retrieve_or_default<T: DeserializeOwned + Default>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<T, StorageError> {
		match self.retrieve(namespace, id).await {
			Ok(value) => Ok(value),
			Err(StorageError::NotFound) => Ok(T::default()),
			Err(e) => Err(e),
		}
	}

	/// Retrieves every value of a namespace, in key order.
	///
	/// Keys deleted between listing and reading are skipped.
	pub async fn retrieve_all<T: DeserializeOwned>(
		&self,
		namespace: &str,
	) -> Result<Vec<T>, StorageError> {
		let prefix = storage_key(namespace, "");
		let keys = self.backend.keys_with_prefix(&prefix).await?;
		let mut values = Vec::with_capacity(keys.len());
		for key in keys {
			match self.backend.get_bytes(&key).await {
				Ok(bytes) => values.push(
					serde_json::from_slice(&bytes)
						.map_err(|e| StorageError::Serialization(e.to_string()))?,
				),
				Err(StorageError::NotFound) => continue,
				Err(e) => return Err(e),
			}
		}
		Ok(values)
	}

	/// Checks if a value exists in storage.
	pub async fn exists(&self, namespace: &str, id: &str) -> Result<bool, StorageError> {
		self.backend.exists(&storage_key(namespace, id)).await
	}

	/// Applies a guarded batch of writes atomically.
	pub async fn commit(&self, batch: WriteBatch) -> Result<(), StorageError> {
		if batch.is_empty() {
			return Ok(());
		}
		self.backend.commit(batch).await
	}
}
