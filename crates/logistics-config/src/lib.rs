//! Configuration module for the logistics back-office service.
//!
//! This module provides structures and utilities for managing service
//! configuration. It supports loading configuration from TOML files and
//! validates that every section is usable before anything is built from it.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files for better organization:
//! - Use `include = ["file1.toml", "file2.toml"]` to include other config files
//! - Each top-level section must be unique across all files (no duplicates allowed)

mod loader;

/// Builders for assembling configurations in tests.
#[cfg(any(test, feature = "testing"))]
pub mod builders {
	pub mod config;
}

use logistics_types::TransportRate;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message, not the echoed input
		let message = err.message().to_string();
		ConfigError::Parse(message)
	}
}

/// Main configuration structure for the logistics service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Identity of this service instance.
	pub service: ServiceConfig,
	/// Configuration for the storage backend.
	pub storage: StorageConfig,
	/// Status workflow rules.
	#[serde(default)]
	pub workflow: WorkflowConfig,
	/// Currency, fees and tariffs.
	#[serde(default)]
	pub pricing: PricingConfig,
	/// Configuration for the HTTP API server.
	pub api: Option<ApiConfig>,
}

/// Configuration specific to the service instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
	/// Unique identifier for this service instance.
	pub id: String,
}

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of storage implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Status workflow rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkflowConfig {
	/// Minimum length, after trimming, of the reason given when cancelling
	/// or putting an entity on hold.
	#[serde(default = "default_min_reason_length")]
	pub min_reason_length: usize,
}

impl Default for WorkflowConfig {
	fn default() -> Self {
		Self {
			min_reason_length: default_min_reason_length(),
		}
	}
}

fn default_min_reason_length() -> usize {
	10
}

/// Pricing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PricingConfig {
	/// Currency every amount is expressed in.
	#[serde(default = "default_currency")]
	pub currency: String,
	/// Fraction of a purchase subtotal charged as service fee.
	#[serde(default = "default_service_fee_rate")]
	pub service_fee_rate: Decimal,
	/// Tariff implementation answering rate lookups ("storage" or "table").
	#[serde(default = "default_tariff_source")]
	pub tariff_source: String,
	/// Tariff rows. Used directly by the `table` source and seeded into
	/// storage by the `storage` source.
	#[serde(default)]
	pub tariffs: Vec<TransportRate>,
}

impl Default for PricingConfig {
	fn default() -> Self {
		Self {
			currency: default_currency(),
			service_fee_rate: default_service_fee_rate(),
			tariff_source: default_tariff_source(),
			tariffs: Vec::new(),
		}
	}
}

fn default_currency() -> String {
	"EUR".to_string()
}

/// 15%.
fn default_service_fee_rate() -> Decimal {
	Decimal::new(15, 2)
}

fn default_tariff_source() -> String {
	"storage".to_string()
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Whether the API server is enabled.
	#[serde(default)]
	pub enabled: bool,
	/// Host address to bind the server to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to bind the server to.
	#[serde(default = "default_api_port")]
	pub port: u16,
	/// Request timeout in seconds.
	#[serde(default = "default_api_timeout")]
	pub timeout_seconds: u64,
	/// Maximum request size in bytes.
	#[serde(default = "default_max_request_size")]
	pub max_request_size: usize,
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	3000
}

fn default_api_timeout() -> u64 {
	30
}

/// 1MB.
fn default_max_request_size() -> usize {
	1024 * 1024
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut output = String::with_capacity(input.len());
	let mut last_end = 0;
	for cap in re.captures_iter(input) {
		let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let value = match (std::env::var(name.as_str()), cap.get(2)) {
			(Ok(value), _) => value,
			(Err(_), Some(default)) => default.as_str().to_string(),
			(Err(_), None) => {
				return Err(ConfigError::Validation(format!(
					"Environment variable '{}' not found",
					name.as_str()
				)))
			},
		};
		output.push_str(&input[last_end..whole.start()]);
		output.push_str(&value);
		last_end = whole.end();
	}
	output.push_str(&input[last_end..]);

	Ok(output)
}

impl Config {
	/// Loads configuration from a file, following `include` directives and
	/// resolving environment variables.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = loader::ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader.load_config(file_name).await
	}

	/// Validates the configuration.
	///
	/// Checks the service id, that the primary storage is configured, the
	/// workflow rules, the fee rate and every configured tariff.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.service.id.trim().is_empty() {
			return Err(ConfigError::Validation("Service ID cannot be empty".into()));
		}

		if self.storage.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one storage implementation must be configured".into(),
			));
		}
		if self.storage.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Storage primary implementation cannot be empty".into(),
			));
		}
		if !self
			.storage
			.implementations
			.contains_key(&self.storage.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Primary storage '{}' not found in implementations",
				self.storage.primary
			)));
		}

		if self.workflow.min_reason_length == 0 {
			return Err(ConfigError::Validation(
				"workflow.min_reason_length must be at least 1".into(),
			));
		}

		self.validate_pricing()
	}

	fn validate_pricing(&self) -> Result<(), ConfigError> {
		let pricing = &self.pricing;
		if pricing.currency.trim().is_empty() {
			return Err(ConfigError::Validation(
				"pricing.currency cannot be empty".into(),
			));
		}
		if pricing.service_fee_rate < Decimal::ZERO || pricing.service_fee_rate > Decimal::ONE {
			return Err(ConfigError::Validation(format!(
				"pricing.service_fee_rate must be between 0 and 1, got {}",
				pricing.service_fee_rate
			)));
		}
		if pricing.tariff_source.trim().is_empty() {
			return Err(ConfigError::Validation(
				"pricing.tariff_source cannot be empty".into(),
			));
		}

		let mut routes = HashSet::new();
		for (index, tariff) in pricing.tariffs.iter().enumerate() {
			tariff.validate().map_err(|message| {
				ConfigError::Validation(format!("pricing.tariffs[{}]: {}", index, message))
			})?;
			let route = tariff.route_key();
			if !routes.insert(route.clone()) {
				return Err(ConfigError::Validation(format!(
					"Duplicate tariff for route {}",
					route
				)));
			}
		}

		Ok(())
	}
}

/// Parses a configuration from a TOML string, resolving environment
/// variables and validating the result.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use logistics_types::{CargoType, Priority, TransportMode};

	const MINIMAL: &str = r#"
[service]
id = "back-office"

[storage]
primary = "memory"
[storage.implementations.memory]
"#;

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("LOGISTICS_TEST_HOST", "localhost");
		std::env::set_var("LOGISTICS_TEST_PORT", "5432");

		let input = "host = \"${LOGISTICS_TEST_HOST}:${LOGISTICS_TEST_PORT}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "host = \"localhost:5432\"");

		std::env::remove_var("LOGISTICS_TEST_HOST");
		std::env::remove_var("LOGISTICS_TEST_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "value = \"${LOGISTICS_MISSING_VAR:-default_value}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "value = \"default_value\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let input = "value = \"${LOGISTICS_MISSING_VAR}\"";
		let result = resolve_env_vars(input);
		assert!(result.unwrap_err().to_string().contains("LOGISTICS_MISSING_VAR"));
	}

	#[test]
	fn test_defaults_applied() {
		let config: Config = MINIMAL.parse().unwrap();
		assert_eq!(config.service.id, "back-office");
		assert_eq!(config.workflow.min_reason_length, 10);
		assert_eq!(config.pricing.currency, "EUR");
		assert_eq!(config.pricing.service_fee_rate, Decimal::new(15, 2));
		assert_eq!(config.pricing.tariff_source, "storage");
		assert!(config.pricing.tariffs.is_empty());
		assert!(config.api.is_none());
	}

	#[test]
	fn test_config_with_env_vars_and_tariffs() {
		std::env::set_var("LOGISTICS_TEST_SERVICE_ID", "paris-office");

		let config_str = r#"
[service]
id = "${LOGISTICS_TEST_SERVICE_ID}"

[storage]
primary = "file"
[storage.implementations.file]
storage_path = "${LOGISTICS_TEST_STORAGE_PATH:-./data/storage}"

[pricing]
service_fee_rate = "0.2"
tariff_source = "table"

[[pricing.tariffs]]
origin_country_code = "fr"
destination_country_code = "SN"
transport_mode = "AIR"
rate_per_kg = "2"
rate_per_m3 = 500
[pricing.tariffs.cargo_type_surcharges]
FRAGILE = "0.1"
[pricing.tariffs.priority_surcharges]
EXPRESS = "0.2"

[api]
enabled = true
port = 8080
"#;

		let config: Config = config_str.parse().unwrap();
		assert_eq!(config.service.id, "paris-office");
		assert_eq!(config.pricing.service_fee_rate, Decimal::new(2, 1));

		let tariff = &config.pricing.tariffs[0];
		assert_eq!(tariff.route_key().origin_country_code, "FR");
		assert_eq!(tariff.transport_mode, TransportMode::Air);
		assert_eq!(tariff.cargo_surcharge(CargoType::Fragile), Decimal::new(1, 1));
		assert_eq!(tariff.priority_surcharge(Priority::Express), Decimal::new(2, 1));
		assert_eq!(tariff.priority_surcharge(Priority::Urgent), Decimal::ZERO);

		let api = config.api.unwrap();
		assert!(api.enabled);
		assert_eq!(api.host, "127.0.0.1");
		assert_eq!(api.port, 8080);

		std::env::remove_var("LOGISTICS_TEST_SERVICE_ID");
	}

	#[test]
	fn test_primary_storage_must_be_configured() {
		let config_str = r#"
[service]
id = "back-office"

[storage]
primary = "file"
[storage.implementations.memory]
"#;
		let err = config_str.parse::<Config>().unwrap_err();
		assert!(err
			.to_string()
			.contains("Primary storage 'file' not found"));
	}

	#[test]
	fn test_service_fee_rate_bounds() {
		let config_str = format!("{}\n[pricing]\nservice_fee_rate = \"1.5\"\n", MINIMAL);
		let err = config_str.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("service_fee_rate"));
	}

	#[test]
	fn test_zero_min_reason_length_rejected() {
		let config_str = format!("{}\n[workflow]\nmin_reason_length = 0\n", MINIMAL);
		assert!(config_str.parse::<Config>().is_err());
	}

	#[test]
	fn test_out_of_range_surcharge_rejected() {
		let config_str = format!(
			r#"{}
[[pricing.tariffs]]
origin_country_code = "FR"
destination_country_code = "SN"
transport_mode = "SEA"
rate_per_kg = "1"
rate_per_m3 = "100"
[pricing.tariffs.cargo_type_surcharges]
DANGEROUS = "6"
"#,
			MINIMAL
		);
		let err = config_str.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("pricing.tariffs[0]"));
	}

	#[test]
	fn test_duplicate_route_rejected() {
		let row = r#"
[[pricing.tariffs]]
origin_country_code = "FR"
destination_country_code = "SN"
transport_mode = "ROAD"
rate_per_kg = "1"
rate_per_m3 = "100"
"#;
		let lower = row.replace("\"FR\"", "\"fr\"");
		let config_str = format!("{}{}{}", MINIMAL, row, lower);
		let err = config_str.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("Duplicate tariff"));
	}
}
