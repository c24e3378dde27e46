//! Configuration builder for tests and local tooling.

use crate::{
	ApiConfig, Config, PricingConfig, ServiceConfig, StorageConfig, WorkflowConfig,
};
use logistics_types::TransportRate;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Builder for creating `Config` instances with a fluent API.
///
/// Defaults to in-memory storage, the storage tariff source and no API.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	service_id: String,
	storage_primary: String,
	storage_implementations: HashMap<String, toml::Value>,
	min_reason_length: usize,
	pricing: PricingConfig,
	api: Option<ApiConfig>,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigBuilder {
	pub fn new() -> Self {
		let mut storage_implementations = HashMap::new();
		storage_implementations.insert(
			"memory".to_string(),
			toml::Value::Table(toml::map::Map::new()),
		);
		Self {
			service_id: "test-office".to_string(),
			storage_primary: "memory".to_string(),
			storage_implementations,
			min_reason_length: WorkflowConfig::default().min_reason_length,
			pricing: PricingConfig::default(),
			api: None,
		}
	}

	pub fn service_id(mut self, id: impl Into<String>) -> Self {
		self.service_id = id.into();
		self
	}

	/// Adds a storage implementation and makes it primary.
	pub fn storage(mut self, name: impl Into<String>, config: toml::Value) -> Self {
		let name = name.into();
		self.storage_implementations.insert(name.clone(), config);
		self.storage_primary = name;
		self
	}

	pub fn min_reason_length(mut self, length: usize) -> Self {
		self.min_reason_length = length;
		self
	}

	pub fn service_fee_rate(mut self, rate: Decimal) -> Self {
		self.pricing.service_fee_rate = rate;
		self
	}

	pub fn tariff_source(mut self, source: impl Into<String>) -> Self {
		self.pricing.tariff_source = source.into();
		self
	}

	pub fn tariff(mut self, rate: TransportRate) -> Self {
		self.pricing.tariffs.push(rate);
		self
	}

	pub fn api(mut self, api: Option<ApiConfig>) -> Self {
		self.api = api;
		self
	}

	/// Builds the `Config` with the configured values.
	///
	/// The result is not validated.
	pub fn build(self) -> Config {
		Config {
			service: ServiceConfig {
				id: self.service_id,
			},
			storage: StorageConfig {
				primary: self.storage_primary,
				implementations: self.storage_implementations,
			},
			workflow: WorkflowConfig {
				min_reason_length: self.min_reason_length,
			},
			pricing: self.pricing,
			api: self.api,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_builder_output_is_valid() {
		let config = ConfigBuilder::new()
			.service_id("builder")
			.min_reason_length(5)
			.build();
		assert!(config.validate().is_ok());
		assert_eq!(config.storage.primary, "memory");
		assert_eq!(config.workflow.min_reason_length, 5);
	}
}
