//! Read-only tariff table built from configuration.

use crate::{
	normalise_rate, TariffError, TariffFactory, TariffInterface, TariffRegistry,
};
use async_trait::async_trait;
use logistics_storage::StorageService;
use logistics_types::{ImplementationRegistry, RouteKey, TransportRate};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Tariffs held in memory, keyed by route.
pub struct TableTariffs {
	rates: BTreeMap<RouteKey, TransportRate>,
}

impl TableTariffs {
	/// Builds the table, rejecting invalid rows and duplicate routes.
	pub fn new(rates: &[TransportRate]) -> Result<Self, TariffError> {
		let mut table = BTreeMap::new();
		for rate in rates {
			let rate = normalise_rate(rate.clone())?;
			let route = rate.route_key();
			if table.insert(route.clone(), rate).is_some() {
				return Err(TariffError::Configuration(format!(
					"Duplicate tariff for route {}",
					route
				)));
			}
		}
		Ok(Self { rates: table })
	}
}

#[async_trait]
impl TariffInterface for TableTariffs {
	async fn find_rate(&self, route: &RouteKey) -> Result<Option<TransportRate>, TariffError> {
		Ok(self.rates.get(route).cloned())
	}

	async fn list_rates(&self) -> Result<Vec<TransportRate>, TariffError> {
		Ok(self.rates.values().cloned().collect())
	}

	async fn upsert_rate(&self, _rate: TransportRate) -> Result<TransportRate, TariffError> {
		Err(TariffError::ReadOnly(Registry::NAME.to_string()))
	}
}

/// Factory function for the configuration table.
pub fn create_tariffs(
	rates: &[TransportRate],
	_storage: Arc<StorageService>,
) -> Result<Box<dyn TariffInterface>, TariffError> {
	Ok(Box::new(TableTariffs::new(rates)?))
}

/// Registry for the table tariff implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "table";
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
	use logistics_types::TransportMode;

	#[tokio::test]
	async fn test_lookup_is_exact() {
		let table = TableTariffs::new(&[
			rate("fr", "SN", TransportMode::Air, 2),
			rate("FR", "SN", TransportMode::Sea, 1),
		])
		.unwrap();

		let air = table
			.find_rate(&RouteKey::new("FR", "SN", TransportMode::Air))
			.await
			.unwrap()
			.unwrap();
		assert_eq!(air.origin_country_code, "FR");
		assert!(table
			.find_rate(&RouteKey::new("SN", "FR", TransportMode::Air))
			.await
			.unwrap()
			.is_none());
		assert!(table
			.find_rate(&RouteKey::new("FR", "SN", TransportMode::Rail))
			.await
			.unwrap()
			.is_none());
	}

	#[test]
	fn test_duplicate_routes_rejected() {
		let result = TableTariffs::new(&[
			rate("FR", "SN", TransportMode::Air, 2),
			rate("fr", "sn", TransportMode::Air, 3),
		]);
		assert!(matches!(result, Err(TariffError::Configuration(_))));
	}

	#[test]
	fn test_invalid_row_rejected() {
		let result = TableTariffs::new(&[rate("FRA", "SN", TransportMode::Air, 2)]);
		assert!(matches!(result, Err(TariffError::Invalid(_))));
	}
}
