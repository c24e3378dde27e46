//! Core engine for the logistics back office.
//!
//! This crate ties the status workflows, the quote calculator and the tariff
//! table together behind [`LogisticsEngine`], which is what the HTTP layer
//! talks to. Engines are assembled by [`LogisticsBuilder`] from pluggable
//! storage and tariff implementations.

use chrono::Utc;
use logistics_config::Config;
use logistics_storage::StorageService;
use logistics_tariff::{TariffError, TariffService};
use logistics_types::{
	APIError, EntityKind, NewPickup, NewPurchase, NewShipment, PickupRequest, PurchaseRequest,
	QuoteRequest, QuoteResponse, Shipment, StatusHistory, StorageKey, TransitionRequest,
	TransportMode, TransportRate,
};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

pub mod builder;
pub mod pricing;
pub mod workflow;

pub use builder::{BuilderError, LogisticsBuilder, LogisticsFactories};
pub use pricing::{PricingError, QuoteService};
pub use workflow::{TransitionEngine, WorkflowError};

/// Errors returned by [`LogisticsEngine`] operations.
#[derive(Debug, Error)]
pub enum LogisticsError {
	#[error(transparent)]
	Workflow(#[from] WorkflowError),
	#[error(transparent)]
	Pricing(#[from] PricingError),
	#[error(transparent)]
	Tariff(#[from] TariffError),
}

impl From<LogisticsError> for APIError {
	fn from(err: LogisticsError) -> Self {
		match err {
			LogisticsError::Workflow(e) => e.into(),
			LogisticsError::Pricing(e) => e.into(),
			LogisticsError::Tariff(e) => e.into(),
		}
	}
}

/// Entry point for every back-office operation.
pub struct LogisticsEngine {
	config: Config,
	storage: Arc<StorageService>,
	workflow: TransitionEngine,
	pricing: QuoteService,
	tariffs: Arc<TariffService>,
}

impl LogisticsEngine {
	pub fn new(
		config: Config,
		storage: Arc<StorageService>,
		workflow: TransitionEngine,
		pricing: QuoteService,
		tariffs: Arc<TariffService>,
	) -> Self {
		Self {
			config,
			storage,
			workflow,
			pricing,
			tariffs,
		}
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn workflow(&self) -> &TransitionEngine {
		&self.workflow
	}

	pub async fn create_shipment(&self, input: NewShipment) -> Result<Shipment, LogisticsError> {
		let actor = input.actor.clone();
		let shipment = workflow::shipment::new_shipment(new_id(), input, Utc::now())?;
		Ok(self.workflow.create(shipment, &actor, None).await?)
	}

	pub async fn get_shipment(&self, id: &str) -> Result<Shipment, LogisticsError> {
		Ok(self.workflow.get(id).await?)
	}

	pub async fn transition_shipment(
		&self,
		id: &str,
		request: TransitionRequest<logistics_types::ShipmentStatus>,
	) -> Result<Shipment, LogisticsError> {
		Ok(self.workflow.transition(id, request).await?)
	}

	/// Creates a pickup, checking that a referenced shipment exists.
	pub async fn create_pickup(&self, input: NewPickup) -> Result<PickupRequest, LogisticsError> {
		let actor = input.actor.clone();
		let pickup = workflow::pickup::new_pickup(new_id(), input, Utc::now())?;
		if let Some(shipment_id) = &pickup.shipment_id {
			let exists = self
				.storage
				.exists(StorageKey::Shipments.as_str(), shipment_id)
				.await
				.map_err(|e| WorkflowError::Storage(e.to_string()))?;
			if !exists {
				return Err(WorkflowError::Validation {
					field: "shipmentId".to_string(),
					message: format!("shipment {} does not exist", shipment_id),
				}
				.into());
			}
		}
		Ok(self.workflow.create(pickup, &actor, None).await?)
	}

	pub async fn get_pickup(&self, id: &str) -> Result<PickupRequest, LogisticsError> {
		Ok(self.workflow.get(id).await?)
	}

	pub async fn transition_pickup(
		&self,
		id: &str,
		request: TransitionRequest<logistics_types::PickupStatus>,
	) -> Result<PickupRequest, LogisticsError> {
		Ok(self.workflow.transition(id, request).await?)
	}

	/// Creates a purchase, pricing its service fee from configuration.
	pub async fn create_purchase(
		&self,
		input: NewPurchase,
	) -> Result<PurchaseRequest, LogisticsError> {
		let cost = pricing::compute_purchase_cost(
			input.product_cost,
			input.delivery_cost,
			self.config.pricing.service_fee_rate,
		)?;
		let actor = input.actor.clone();
		let purchase = workflow::purchase::new_purchase(new_id(), input, cost, Utc::now())?;
		Ok(self.workflow.create(purchase, &actor, None).await?)
	}

	pub async fn get_purchase(&self, id: &str) -> Result<PurchaseRequest, LogisticsError> {
		Ok(self.workflow.get(id).await?)
	}

	pub async fn transition_purchase(
		&self,
		id: &str,
		request: TransitionRequest<logistics_types::PurchaseStatus>,
	) -> Result<PurchaseRequest, LogisticsError> {
		Ok(self.workflow.transition(id, request).await?)
	}

	pub async fn history(
		&self,
		kind: EntityKind,
		id: &str,
	) -> Result<StatusHistory, LogisticsError> {
		Ok(self.workflow.history(kind, id).await?)
	}

	pub async fn quote(&self, request: &QuoteRequest) -> Result<QuoteResponse, LogisticsError> {
		Ok(self.pricing.quote(request).await?)
	}

	pub async fn estimate_shipment_cost(
		&self,
		shipment_id: &str,
		mode: TransportMode,
	) -> Result<Shipment, LogisticsError> {
		Ok(self.pricing.estimate_shipment_cost(shipment_id, mode).await?)
	}

	pub async fn list_tariffs(&self) -> Result<Vec<TransportRate>, LogisticsError> {
		Ok(self.tariffs.list_rates().await?)
	}

	pub async fn upsert_tariff(&self, rate: TransportRate) -> Result<TransportRate, LogisticsError> {
		Ok(self.tariffs.upsert_rate(rate).await?)
	}
}

fn new_id() -> String {
	Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Duration;
	use logistics_config::builders::config::ConfigBuilder;
	use logistics_storage::get_all_implementations as storage_implementations;
	use logistics_tariff::get_all_implementations as tariff_implementations;
	use logistics_types::{
		CargoType, Contact, Location, Priority, ProductDetails, PurchaseStatus, ShipmentStatus,
	};
	use rust_decimal_macros::dec;
	use std::collections::BTreeMap;

	fn air_rate() -> TransportRate {
		TransportRate {
			origin_country_code: "FR".into(),
			destination_country_code: "SN".into(),
			transport_mode: TransportMode::Air,
			rate_per_kg: dec!(2),
			rate_per_m3: dec!(500),
			cargo_type_surcharges: BTreeMap::from([(CargoType::Fragile, dec!(0.1))]),
			priority_surcharges: BTreeMap::from([(Priority::Express, dec!(0.2))]),
			is_active: true,
		}
	}

	async fn engine() -> LogisticsEngine {
		let config = ConfigBuilder::new().tariff(air_rate()).build();
		let factories = LogisticsFactories {
			storage_factories: storage_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
			tariff_factories: tariff_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
		};
		LogisticsBuilder::new(config)
			.build(factories)
			.await
			.unwrap()
	}

	fn location(code: &str) -> Location {
		Location {
			address: "Zone industrielle".into(),
			city: "Thiès".into(),
			country_code: code.into(),
		}
	}

	fn new_shipment() -> NewShipment {
		NewShipment {
			origin: location("FR"),
			destination: location("SN"),
			weight: dec!(10),
			volume: Some(dec!(0.05)),
			dimensions: None,
			cargo_type: CargoType::Fragile,
			is_dangerous: false,
			is_fragile: true,
			priority: Priority::Express,
			transport_modes: vec![TransportMode::Air],
			actor: "clerk".into(),
		}
	}

	#[tokio::test]
	async fn test_estimate_records_cost_only() {
		let engine = engine().await;
		let shipment = engine.create_shipment(new_shipment()).await.unwrap();

		let priced = engine
			.estimate_shipment_cost(&shipment.id, TransportMode::Air)
			.await
			.unwrap();
		assert_eq!(priced.estimated_cost, Some(dec!(33.00)));
		assert_eq!(priced.status, ShipmentStatus::Draft);
		assert_eq!(priced.version, shipment.version);

		let history = engine
			.history(EntityKind::Shipment, &shipment.id)
			.await
			.unwrap();
		assert_eq!(history.entries.len(), 1);
	}

	#[tokio::test]
	async fn test_pickup_requires_known_shipment() {
		let engine = engine().await;
		let input = NewPickup {
			shipment_id: Some("does-not-exist".into()),
			address: location("SN"),
			contact: Contact {
				name: "Fatou".into(),
				phone: "+221 70 000 00 00".into(),
				email: Some("fatou@example.com".into()),
			},
			actor: "clerk".into(),
		};
		let err: APIError = engine.create_pickup(input).await.unwrap_err().into();
		assert_eq!(err.status_code(), 400);
		assert_eq!(err.field(), Some("shipmentId"));
	}

	#[tokio::test]
	async fn test_purchase_lifecycle() {
		let engine = engine().await;
		let purchase = engine
			.create_purchase(NewPurchase {
				product: ProductDetails {
					name: "Sewing machine".into(),
					url: None,
					quantity: 1,
					notes: None,
				},
				delivery_address: location("sn"),
				product_cost: dec!(200),
				delivery_cost: dec!(40),
				actor: "agent".into(),
			})
			.await
			.unwrap();
		assert_eq!(purchase.status, PurchaseStatus::Nouveau);
		assert_eq!(purchase.cost.service_fee, dec!(36));
		assert_eq!(purchase.cost.total_cost, dec!(276));

		engine
			.transition_purchase(
				&purchase.id,
				TransitionRequest::new(PurchaseStatus::EnCours, "agent"),
			)
			.await
			.unwrap();
		let delivered = engine
			.transition_purchase(
				&purchase.id,
				TransitionRequest::new(PurchaseStatus::Livre, "agent")
					.with_actual_date(Utc::now() - Duration::hours(2)),
			)
			.await
			.unwrap();
		assert!(delivered.actual_delivery_date.is_some());

		let err: APIError = engine
			.transition_purchase(
				&purchase.id,
				TransitionRequest::new(PurchaseStatus::Annule, "agent")
					.with_reason("customer asked for a refund"),
			)
			.await
			.unwrap_err()
			.into();
		assert_eq!(err.status_code(), 422);
	}

	#[tokio::test]
	async fn test_tariff_upsert_is_used_by_quotes() {
		let engine = engine().await;
		assert_eq!(engine.list_tariffs().await.unwrap().len(), 1);

		let mut sea = air_rate();
		sea.transport_mode = TransportMode::Sea;
		sea.rate_per_kg = dec!(0.5);
		sea.rate_per_m3 = dec!(80);
		engine.upsert_tariff(sea).await.unwrap();

		let response = engine
			.quote(&QuoteRequest {
				origin_country_code: Some("FR".into()),
				destination_country_code: Some("SN".into()),
				transport_modes: vec![TransportMode::Sea],
				weight: Some(dec!(100)),
				volume: None,
				dimensions: None,
				cargo_type: CargoType::General,
				priority: Priority::Standard,
			})
			.await
			.unwrap();
		let estimate = response.quotes[0].estimate.as_ref().unwrap();
		assert_eq!(estimate.estimated_cost, dec!(50));
	}
}
