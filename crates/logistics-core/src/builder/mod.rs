//! Builder pattern for constructing logistics engines.
//!
//! Provides a way to compose a LogisticsEngine from pluggable storage
//! backends and tariff sources using factory functions.

use crate::pricing::QuoteService;
use crate::workflow::TransitionEngine;
use crate::LogisticsEngine;
use logistics_config::Config;
use logistics_storage::{StorageError, StorageInterface, StorageService};
use logistics_tariff::{TariffError, TariffInterface, TariffService};
use logistics_types::TransportRate;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during engine construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Factory functions needed to build a LogisticsEngine, keyed by
/// implementation name.
pub struct LogisticsFactories<SF, TF> {
	pub storage_factories: HashMap<String, SF>,
	pub tariff_factories: HashMap<String, TF>,
}

/// Builder for constructing a LogisticsEngine with pluggable implementations.
pub struct LogisticsBuilder {
	config: Config,
}

impl LogisticsBuilder {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Builds the engine.
	///
	/// Only the primary storage backend is kept. Every registered tariff
	/// source is created over that storage and the one named by
	/// `pricing.tariff_source` answers lookups; it is initialised before
	/// the engine is returned.
	pub async fn build<SF, TF>(
		self,
		factories: LogisticsFactories<SF, TF>,
	) -> Result<LogisticsEngine, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
		TF: Fn(&[TransportRate], Arc<StorageService>) -> Result<Box<dyn TariffInterface>, TariffError>,
	{
		// Storage
		let mut storage_impls = HashMap::new();
		for (name, config) in &self.config.storage.implementations {
			if let Some(factory) = factories.storage_factories.get(name) {
				match factory(config) {
					Ok(implementation) => {
						storage_impls.insert(name.clone(), implementation);
						let is_primary = &self.config.storage.primary == name;
						tracing::info!(component = "storage", implementation = %name, enabled = %is_primary, "Loaded");
					},
					Err(e) => {
						tracing::error!(
							component = "storage",
							implementation = %name,
							error = %e,
							"Failed to create storage implementation"
						);
						return Err(BuilderError::Config(format!(
							"Failed to create storage implementation '{}': {}",
							name, e
						)));
					},
				}
			}
		}

		let primary_storage = &self.config.storage.primary;
		let storage_backend = storage_impls.remove(primary_storage).ok_or_else(|| {
			BuilderError::MissingComponent(format!(
				"Primary storage '{}' failed to load or has no registered factory",
				primary_storage
			))
		})?;
		let storage = Arc::new(StorageService::new(storage_backend));

		// Tariffs
		let pricing = &self.config.pricing;
		let mut tariff_impls: HashMap<String, Arc<dyn TariffInterface>> = HashMap::new();
		for (name, factory) in &factories.tariff_factories {
			match factory(&pricing.tariffs, storage.clone()) {
				Ok(implementation) => {
					tariff_impls.insert(name.clone(), implementation.into());
					let is_primary = &pricing.tariff_source == name;
					tracing::info!(component = "tariff", implementation = %name, enabled = %is_primary, "Loaded");
				},
				Err(e) => {
					tracing::error!(
						component = "tariff",
						implementation = %name,
						error = %e,
						"Failed to create tariff source"
					);
					return Err(BuilderError::Config(format!(
						"Failed to create tariff source '{}': {}",
						name, e
					)));
				},
			}
		}

		if !tariff_impls.contains_key(&pricing.tariff_source) {
			return Err(BuilderError::MissingComponent(format!(
				"Tariff source '{}' is not registered",
				pricing.tariff_source
			)));
		}
		let tariffs = TariffService::new(tariff_impls, pricing.tariff_source.clone())
			.map_err(|e| BuilderError::Config(e.to_string()))?;
		tariffs.initialize().await.map_err(|e| {
			tracing::error!(component = "tariff", error = %e, "Failed to initialise tariffs");
			BuilderError::Config(format!("Failed to initialise tariffs: {}", e))
		})?;
		let tariffs = Arc::new(tariffs);

		let workflow = TransitionEngine::new(storage.clone(), self.config.workflow.min_reason_length);
		let quotes = QuoteService::new(tariffs.clone(), storage.clone(), pricing.currency.clone());

		Ok(LogisticsEngine::new(
			self.config,
			storage,
			workflow,
			quotes,
			tariffs,
		))
	}
}
