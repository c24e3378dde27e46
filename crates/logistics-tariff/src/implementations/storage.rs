//! Storage-backed tariffs.
//!
//! Rows live in the `transport_rates` namespace keyed by route
//! (`FR-SN-AIR`). Tariffs listed in configuration are written on start-up
//! only for routes that have no stored row, so edits made at runtime
//! survive a restart.

use crate::{
	normalise_rate, TariffError, TariffFactory, TariffInterface, TariffRegistry,
};
use async_trait::async_trait;
use logistics_storage::{StorageError, StorageService};
use logistics_types::{ImplementationRegistry, RouteKey, StorageKey, TransportRate};
use std::sync::Arc;

/// Tariffs persisted through the storage service.
pub struct StorageTariffs {
	storage: Arc<StorageService>,
	seed: Vec<TransportRate>,
}

impl StorageTariffs {
	pub fn new(storage: Arc<StorageService>, seed: Vec<TransportRate>) -> Self {
		Self { storage, seed }
	}
}

#[async_trait]
impl TariffInterface for StorageTariffs {
	async fn find_rate(&self, route: &RouteKey) -> Result<Option<TransportRate>, TariffError> {
		match self
			.storage
			.retrieve::<TransportRate>(StorageKey::TransportRates.as_str(), &route.storage_id())
			.await
		{
			Ok(rate) => Ok(Some(rate)),
			Err(StorageError::NotFound) => Ok(None),
			Err(e) => Err(TariffError::Storage(e.to_string())),
		}
	}

	async fn list_rates(&self) -> Result<Vec<TransportRate>, TariffError> {
		let mut rates: Vec<TransportRate> = self
			.storage
			.retrieve_all(StorageKey::TransportRates.as_str())
			.await
			.map_err(|e| TariffError::Storage(e.to_string()))?;
		rates.sort_by_key(|rate| rate.route_key());
		Ok(rates)
	}

	async fn upsert_rate(&self, rate: TransportRate) -> Result<TransportRate, TariffError> {
		let rate = normalise_rate(rate)?;
		self.storage
			.store(
				StorageKey::TransportRates.as_str(),
				&rate.route_key().storage_id(),
				&rate,
			)
			.await
			.map_err(|e| TariffError::Storage(e.to_string()))?;
		Ok(rate)
	}

	async fn initialize(&self) -> Result<usize, TariffError> {
		let mut written = 0;
		for rate in &self.seed {
			let exists = self
				.storage
				.exists(
					StorageKey::TransportRates.as_str(),
					&rate.route_key().storage_id(),
				)
				.await
				.map_err(|e| TariffError::Storage(e.to_string()))?;
			if exists {
				tracing::debug!(route = %rate.route_key(), "Keeping stored tariff");
				continue;
			}
			self.upsert_rate(rate.clone()).await?;
			written += 1;
		}
		Ok(written)
	}
}

/// Factory function for storage-backed tariffs.
///
/// Configured rows are validated here and written by `initialize`.
pub fn create_tariffs(
	rates: &[TransportRate],
	storage: Arc<StorageService>,
) -> Result<Box<dyn TariffInterface>, TariffError> {
	let seed = rates
		.iter()
		.cloned()
		.map(normalise_rate)
		.collect::<Result<Vec<_>, _>>()?;
	Ok(Box::new(StorageTariffs::new(storage, seed)))
}

/// Registry for the storage tariff implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "storage";
	type Factory = TariffFactory;

	fn factory() -> Self::Factory {
		create_tariffs
	}
}

impl TariffRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::rate;
	use logistics_storage::implementations::memory::MemoryStorage;
	use logistics_types::TransportMode;
	use rust_decimal::Decimal;

	fn storage() -> Arc<StorageService> {
		Arc::new(StorageService::new(Box::new(MemoryStorage::new())))
	}

	#[tokio::test]
	async fn test_upsert_then_find() {
		let tariffs = StorageTariffs::new(storage(), Vec::new());
		let stored = tariffs
			.upsert_rate(rate("fr", "ci", TransportMode::Road, 3))
			.await
			.unwrap();
		assert_eq!(stored.destination_country_code, "CI");

		let found = tariffs
			.find_rate(&RouteKey::new("FR", "CI", TransportMode::Road))
			.await
			.unwrap()
			.unwrap();
		assert_eq!(found.rate_per_kg, Decimal::from(3));
		assert!(tariffs
			.find_rate(&RouteKey::new("FR", "CI", TransportMode::Air))
			.await
			.unwrap()
			.is_none());
	}

	#[tokio::test]
	async fn test_upsert_rejects_invalid_surcharge() {
		let tariffs = StorageTariffs::new(storage(), Vec::new());
		let mut invalid = rate("FR", "SN", TransportMode::Air, 2);
		invalid
			.cargo_type_surcharges
			.insert(logistics_types::CargoType::Dangerous, Decimal::from(7));
		assert!(matches!(
			tariffs.upsert_rate(invalid).await,
			Err(TariffError::Invalid(_))
		));
		assert!(tariffs.list_rates().await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_initialize_keeps_stored_rows() {
		let storage = storage();
		let edited = StorageTariffs::new(storage.clone(), Vec::new());
		edited
			.upsert_rate(rate("FR", "SN", TransportMode::Air, 9))
			.await
			.unwrap();

		let factory = Registry::factory();
		let tariffs = factory(
			&[
				rate("FR", "SN", TransportMode::Air, 2),
				rate("FR", "SN", TransportMode::Sea, 1),
			],
			storage,
		)
		.unwrap();
		assert_eq!(tariffs.initialize().await.unwrap(), 1);

		let rates = tariffs.list_rates().await.unwrap();
		assert_eq!(rates.len(), 2);
		let air = rates
			.iter()
			.find(|r| r.transport_mode == TransportMode::Air)
			.unwrap();
		assert_eq!(air.rate_per_kg, Decimal::from(9));
	}
}
