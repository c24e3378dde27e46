//! File-based storage backend.
//!
//! Every key is stored as one file under `storage_path`. File names are a
//! reversible escaping of the key so that prefix listings can recover the
//! original keys. Writes go through a temporary file and a rename, and all
//! mutations take both an in-process mutex and an advisory lock on
//! `.lock` so that two services sharing a directory do not interleave
//! commits.
//!
//! A batch is staged first, then the names of its files are recorded in
//! `.journal` before any rename. If the process stops or a rename fails
//! halfway, the next mutation replays the journal and completes the batch.
//! Readers that run before that replay may observe the partial batch.

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry, WriteBatch};
use async_trait::async_trait;
use fs2::FileExt;
use logistics_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::{Mutex, MutexGuard};

const EXTENSION: &str = "json";
const TEMP_EXTENSION: &str = "tmp";
const LOCK_FILE: &str = ".lock";
const JOURNAL_FILE: &str = ".journal";
const DEFAULT_STORAGE_PATH: &str = "./data/storage";

fn backend_error(e: impl std::fmt::Display) -> StorageError {
	StorageError::Backend(e.to_string())
}

/// Escapes a key into a file stem.
///
/// ASCII letters, digits, `_` and `-` are kept; every other byte becomes
/// `%XX`.
fn encode_key(key: &str) -> String {
	let mut encoded = String::with_capacity(key.len());
	for byte in key.bytes() {
		if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
			encoded.push(byte as char);
		} else {
			encoded.push_str(&format!("%{:02X}", byte));
		}
	}
	encoded
}

/// Inverse of [`encode_key`]. Returns `None` for stems it did not produce.
fn decode_key(stem: &str) -> Option<String> {
	let bytes = stem.as_bytes();
	let mut decoded = Vec::with_capacity(bytes.len());
	let mut i = 0;
	while i < bytes.len() {
		if bytes[i] == b'%' {
			let hex = stem.get(i + 1..i + 3)?;
			decoded.push(u8::from_str_radix(hex, 16).ok()?);
			i += 3;
		} else {
			decoded.push(bytes[i]);
			i += 1;
		}
	}
	String::from_utf8(decoded).ok()
}

/// Holds both locks for the duration of a mutation.
struct WriteGuard<'a> {
	_local: MutexGuard<'a, ()>,
	_file: std::fs::File,
}

/// File-based storage implementation.
pub struct FileStorage {
	base_path: PathBuf,
	write_lock: Mutex<()>,
}

impl FileStorage {
	/// Creates a new FileStorage rooted at `base_path`.
	pub fn new(base_path: PathBuf) -> Self {
		Self {
			base_path,
			write_lock: Mutex::new(()),
		}
	}

	fn file_path(&self, key: &str) -> PathBuf {
		self.base_path
			.join(format!("{}.{}", encode_key(key), EXTENSION))
	}

	async fn lock(&self) -> Result<WriteGuard<'_>, StorageError> {
		let local = self.write_lock.lock().await;
		fs::create_dir_all(&self.base_path)
			.await
			.map_err(backend_error)?;

		let lock_path = self.base_path.join(LOCK_FILE);
		let file = tokio::task::spawn_blocking(move || -> std::io::Result<std::fs::File> {
			let file = std::fs::OpenOptions::new()
				.create(true)
				.truncate(false)
				.write(true)
				.open(&lock_path)?;
			file.lock_exclusive()?;
			Ok(file)
		})
		.await
		.map_err(backend_error)?
		.map_err(backend_error)?;

		let guard = WriteGuard {
			_local: local,
			_file: file,
		};
		self.replay_journal().await?;
		Ok(guard)
	}

	fn journal_path(&self) -> PathBuf {
		self.base_path.join(JOURNAL_FILE)
	}

	/// Records the files of a staged batch. The rename of the journal is the
	/// point from which the batch will be completed.
	async fn write_journal(&self, staged: &[(PathBuf, PathBuf)]) -> Result<(), StorageError> {
		let names: Vec<&str> = staged
			.iter()
			.filter_map(|(_, path)| path.file_name().and_then(|name| name.to_str()))
			.collect();
		let bytes =
			serde_json::to_vec(&names).map_err(|e| StorageError::Serialization(e.to_string()))?;
		let journal_path = self.journal_path();
		let temp_path = Self::stage(&journal_path, &bytes).await?;
		fs::rename(&temp_path, &journal_path)
			.await
			.map_err(backend_error)
	}

	/// Completes a batch interrupted between its journal and its last rename.
	///
	/// Must run under the write lock.
	async fn replay_journal(&self) -> Result<(), StorageError> {
		let journal_path = self.journal_path();
		let bytes = match fs::read(&journal_path).await {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
			Err(e) => return Err(backend_error(e)),
		};
		let names: Vec<String> =
			serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))?;

		for name in &names {
			let path = self.base_path.join(name);
			match fs::rename(path.with_extension(TEMP_EXTENSION), &path).await {
				Ok(()) => {},
				// Already renamed before the interruption.
				Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
				Err(e) => return Err(backend_error(e)),
			}
		}
		fs::remove_file(&journal_path)
			.await
			.map_err(backend_error)?;
		tracing::warn!(files = names.len(), "Replayed interrupted commit");
		Ok(())
	}

	async fn read_optional(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
		match fs::read(self.file_path(key)).await {
			Ok(data) => Ok(Some(data)),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(backend_error(e)),
		}
	}

	/// Writes `value` next to `path` and returns the temporary file.
	async fn stage(path: &Path, value: &[u8]) -> Result<PathBuf, StorageError> {
		let temp_path = path.with_extension(TEMP_EXTENSION);
		fs::write(&temp_path, value).await.map_err(backend_error)?;
		Ok(temp_path)
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		self.read_optional(key).await?.ok_or(StorageError::NotFound)
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let _guard = self.lock().await?;
		let path = self.file_path(key);
		let temp_path = Self::stage(&path, &value).await?;
		fs::rename(&temp_path, &path).await.map_err(backend_error)
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let _guard = self.lock().await?;
		match fs::remove_file(self.file_path(key)).await {
			Ok(_) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(backend_error(e)),
		}
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		fs::try_exists(self.file_path(key))
			.await
			.map_err(backend_error)
	}

	async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
		let mut entries = match fs::read_dir(&self.base_path).await {
			Ok(entries) => entries,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
			Err(e) => return Err(backend_error(e)),
		};

		let mut keys = Vec::new();
		while let Some(entry) = entries.next_entry().await.map_err(backend_error)? {
			let path = entry.path();
			if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
				continue;
			}
			let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
				continue;
			};
			match decode_key(stem) {
				Some(key) if key.starts_with(prefix) => keys.push(key),
				Some(_) => {},
				None => tracing::debug!("Skipping file {:?}: not a storage key", path),
			}
		}
		keys.sort();
		Ok(keys)
	}

	async fn commit(&self, batch: WriteBatch) -> Result<(), StorageError> {
		let _guard = self.lock().await?;

		for precondition in batch.preconditions() {
			let current = self.read_optional(precondition.key()).await?;
			if !precondition.holds(current.as_deref()) {
				return Err(StorageError::PreconditionFailed(
					precondition.key().to_string(),
				));
			}
		}

		// Stage every file before renaming any of them so that a failed write
		// leaves the visible records untouched.
		let mut staged = Vec::with_capacity(batch.writes().len());
		for (key, value) in batch.writes() {
			let path = self.file_path(key);
			match Self::stage(&path, value).await {
				Ok(temp_path) => staged.push((temp_path, path)),
				Err(e) => {
					for (temp_path, _) in &staged {
						let _ = fs::remove_file(temp_path).await;
					}
					return Err(e);
				},
			}
		}
		if let Err(e) = self.write_journal(&staged).await {
			for (temp_path, _) in &staged {
				let _ = fs::remove_file(temp_path).await;
			}
			return Err(e);
		}
		for (temp_path, path) in &staged {
			fs::rename(temp_path, path).await.map_err(backend_error)?;
		}
		fs::remove_file(self.journal_path())
			.await
			.map_err(backend_error)
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![Field::new("storage_path", FieldType::String).with_validator(|value| {
				match value.as_str() {
					Some(path) if !path.trim().is_empty() => Ok(()),
					_ => Err("storage_path cannot be empty".to_string()),
				}
			})],
		);
		schema.validate(config)
	}
}

/// Factory function to create a file storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: Base directory for record files (default: "./data/storage")
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	FileStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or(DEFAULT_STORAGE_PATH);

	Ok(Box::new(FileStorage::new(PathBuf::from(storage_path))))
}

/// Registry for the file storage implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}
