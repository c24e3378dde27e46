//! Main entry point for the logistics back-office service.
//!
//! Loads configuration, assembles the engine from the registered storage
//! backends and tariff sources, and serves the HTTP API.

use clap::Parser;
use logistics_config::Config;
use logistics_core::{LogisticsBuilder, LogisticsEngine, LogisticsFactories};
use std::path::PathBuf;
use std::sync::Arc;

mod apis;
mod server;

/// Command-line arguments for the logistics service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml", env = "LOGISTICS_CONFIG")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started logistics service");

	let config_path = args
		.config
		.to_str()
		.ok_or("Configuration path is not valid UTF-8")?;
	let config = Config::from_file(config_path).await?;
	tracing::info!("Loaded configuration [{}]", config.service.id);

	let engine = Arc::new(build_engine(config.clone()).await?);

	match config.api.filter(|api| api.enabled) {
		Some(api_config) => {
			let server = server::start_server(api_config, engine);
			tokio::select! {
				result = server => {
					tracing::info!("API server finished");
					result?;
				}
				_ = tokio::signal::ctrl_c() => {
					tracing::info!("Shutdown requested");
				}
			}
		},
		None => {
			tracing::warn!("API server disabled, nothing to serve");
		},
	}

	tracing::info!("Stopped logistics service");
	Ok(())
}

/// Macro to create a factory HashMap with the appropriate type aliases
macro_rules! create_factory_map {
	// Variant for tariff sources, which take the configured rates and storage
	($interface:path, $error:path, tariff, $( $name:expr => $factory:expr ),* $(,)?) => {{
		let mut factories = std::collections::HashMap::new();
		$(
			factories.insert(
				$name.to_string(),
				$factory as fn(
					&[logistics_types::TransportRate],
					std::sync::Arc<logistics_storage::StorageService>,
				) -> Result<Box<dyn $interface>, $error>
			);
		)*
		factories
	}};

	($interface:path, $error:path, $( $name:expr => $factory:expr ),* $(,)?) => {{
		let mut factories = std::collections::HashMap::new();
		$(
			factories.insert(
				$name.to_string(),
				$factory as fn(&toml::Value) -> Result<Box<dyn $interface>, $error>
			);
		)*
		factories
	}};
}

/// Builds the engine with every registered storage backend and tariff source.
async fn build_engine(config: Config) -> Result<LogisticsEngine, Box<dyn std::error::Error>> {
	use logistics_storage::implementations::{file, memory};
	use logistics_tariff::implementations::{storage, table};
	use logistics_types::ImplementationRegistry;

	let storage_factories = create_factory_map!(
		logistics_storage::StorageInterface,
		logistics_storage::StorageError,
		file::Registry::NAME => file::create_storage,
		memory::Registry::NAME => memory::create_storage,
	);

	let tariff_factories = create_factory_map!(
		logistics_tariff::TariffInterface,
		logistics_tariff::TariffError,
		tariff,
		storage::Registry::NAME => storage::create_tariffs,
		table::Registry::NAME => table::create_tariffs,
	);

	let factories = LogisticsFactories {
		storage_factories,
		tariff_factories,
	};

	Ok(LogisticsBuilder::new(config).build(factories).await?)
}
