//! Tariff module for the logistics system.
//!
//! This module provides the interface used to look up transport rates by
//! route, along with two sources: a read-only table built from
//! configuration and a storage-backed table that can be edited at runtime.
//! Sources follow the same registry and factory pattern as storage backends.

use async_trait::async_trait;
use logistics_storage::StorageService;
use logistics_types::{APIError, ImplementationRegistry, RouteKey, TransportRate};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod storage;
	pub mod table;
}

/// Errors that can occur during tariff operations.
#[derive(Debug, Error)]
pub enum TariffError {
	/// A tariff row failed validation.
	#[error("Invalid tariff: {0}")]
	Invalid(String),
	/// The source cannot be written to at runtime.
	#[error("Tariff source '{0}' is read-only")]
	ReadOnly(String),
	/// Error that occurs in the underlying storage.
	#[error("Storage error: {0}")]
	Storage(String),
	/// Error that occurs when configuration is invalid.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

impl From<TariffError> for APIError {
	fn from(err: TariffError) -> Self {
		let message = err.to_string();
		match err {
			TariffError::Invalid(_) => APIError::BadRequest {
				message,
				field: None,
			},
			TariffError::ReadOnly(_) => APIError::UnprocessableEntity {
				message,
				field: None,
			},
			TariffError::Storage(_) | TariffError::Configuration(_) => {
				APIError::InternalServerError { message }
			},
		}
	}
}

/// Trait defining the interface for tariff sources.
#[async_trait]
pub trait TariffInterface: Send + Sync {
	/// Looks up the rate of an exact route.
	///
	/// `Ok(None)` means no row exists for the route; callers must not treat
	/// it as a zero rate.
	async fn find_rate(&self, route: &RouteKey) -> Result<Option<TransportRate>, TariffError>;

	/// Returns every known rate ordered by route.
	async fn list_rates(&self) -> Result<Vec<TransportRate>, TariffError>;

	/// Creates or replaces the rate of a route.
	async fn upsert_rate(&self, rate: TransportRate) -> Result<TransportRate, TariffError>;

	/// Prepares the source before the service starts answering lookups.
	///
	/// Returns the number of rows written.
	async fn initialize(&self) -> Result<usize, TariffError> {
		Ok(0)
	}
}

/// Type alias for tariff factory functions.
///
/// Factories receive the tariffs listed in configuration and the storage
/// service shared by the rest of the system.
pub type TariffFactory =
	fn(&[TransportRate], Arc<StorageService>) -> Result<Box<dyn TariffInterface>, TariffError>;

/// Registry trait for tariff implementations.
pub trait TariffRegistry: ImplementationRegistry<Factory = TariffFactory> {}

/// Get all registered tariff implementations.
pub fn get_all_implementations() -> Vec<(&'static str, TariffFactory)> {
	use implementations::{storage, table};

	vec![
		(storage::Registry::NAME, storage::Registry::factory()),
		(table::Registry::NAME, table::Registry::factory()),
	]
}

/// Checks a rate and returns it with its country codes normalised.
pub(crate) fn normalise_rate(mut rate: TransportRate) -> Result<TransportRate, TariffError> {
	rate.validate().map_err(TariffError::Invalid)?;
	let route = rate.route_key();
	rate.origin_country_code = route.origin_country_code;
	rate.destination_country_code = route.destination_country_code;
	Ok(rate)
}

/// Service that routes tariff operations to the primary source.
pub struct TariffService {
	implementations: HashMap<String, Arc<dyn TariffInterface>>,
	primary_implementation: String,
}

impl TariffService {
	/// Creates a new TariffService.
	///
	/// Fails if `primary_implementation` is not one of `implementations`.
	pub fn new(
		implementations: HashMap<String, Arc<dyn TariffInterface>>,
		primary_implementation: String,
	) -> Result<Self, TariffError> {
		if !implementations.contains_key(&primary_implementation) {
			return Err(TariffError::Configuration(format!(
				"Primary implementation '{}' not found in available implementations",
				primary_implementation
			)));
		}

		Ok(Self {
			implementations,
			primary_implementation,
		})
	}

	fn implementation(&self) -> Result<&Arc<dyn TariffInterface>, TariffError> {
		self.implementations
			.get(&self.primary_implementation)
			.ok_or_else(|| {
				TariffError::Configuration(format!(
					"Primary implementation '{}' not available",
					self.primary_implementation
				))
			})
	}

	pub async fn find_rate(&self, route: &RouteKey) -> Result<Option<TransportRate>, TariffError> {
		self.implementation()?.find_rate(route).await
	}

	pub async fn list_rates(&self) -> Result<Vec<TransportRate>, TariffError> {
		self.implementation()?.list_rates().await
	}

	pub async fn upsert_rate(&self, rate: TransportRate) -> Result<TransportRate, TariffError> {
		let rate = self.implementation()?.upsert_rate(rate).await?;
		tracing::info!(route = %rate.route_key(), "Tariff updated");
		Ok(rate)
	}

	/// Initialises the primary source.
	pub async fn initialize(&self) -> Result<usize, TariffError> {
		let written = self.implementation()?.initialize().await?;
		if written > 0 {
			tracing::info!(
				source = %self.primary_implementation,
				written,
				"Seeded configured tariffs"
			);
		}
		Ok(written)
	}
}
