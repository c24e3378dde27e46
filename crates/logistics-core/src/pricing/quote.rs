//! Multi-mode quotes and shipment estimates.

use super::{PricingError, RateCalculator};
use crate::workflow::Lifecycle;
use chrono::Utc;
use logistics_storage::{StorageError, StorageService, WriteBatch};
use logistics_tariff::TariffService;
use logistics_types::{
	format_money, truncate_id, CargoType, CostEstimate, ModeQuote, Priority, QuoteRequest,
	QuoteResponse, RouteKey, Shipment, StorageKey, TransportMode,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::instrument;

/// Quote input after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedQuote {
	pub origin_country_code: String,
	pub destination_country_code: String,
	/// Requested modes, duplicates removed, request order kept.
	pub transport_modes: Vec<TransportMode>,
	pub weight: Decimal,
	pub volume: Decimal,
	pub cargo_type: CargoType,
	pub priority: Priority,
}

/// Prices shipments against the tariff table.
pub struct QuoteService {
	tariffs: Arc<TariffService>,
	storage: Arc<StorageService>,
	currency: String,
}

impl QuoteService {
	pub fn new(tariffs: Arc<TariffService>, storage: Arc<StorageService>, currency: String) -> Self {
		Self {
			tariffs,
			storage,
			currency,
		}
	}

	/// Rejects incomplete quote input before any tariff lookup.
	pub fn validate_request(request: &QuoteRequest) -> Result<ValidatedQuote, PricingError> {
		let weight = request
			.weight
			.ok_or_else(|| PricingError::invalid("weight", "is required"))?;
		if weight <= Decimal::ZERO {
			return Err(PricingError::invalid("weight", "must be greater than zero"));
		}

		let origin_country_code = country_code("originCountryCode", &request.origin_country_code)?;
		let destination_country_code = country_code(
			"destinationCountryCode",
			&request.destination_country_code,
		)?;

		if request.transport_modes.is_empty() {
			return Err(PricingError::invalid(
				"transportModes",
				"at least one transport mode is required",
			));
		}
		let mut transport_modes = Vec::with_capacity(request.transport_modes.len());
		for mode in &request.transport_modes {
			if !transport_modes.contains(mode) {
				transport_modes.push(*mode);
			}
		}

		let volume = match (request.volume, &request.dimensions) {
			(Some(volume), _) if volume.is_sign_negative() => {
				return Err(PricingError::invalid("volume", "cannot be negative"));
			},
			(Some(volume), _) => volume,
			(None, Some(dimensions)) => {
				if [dimensions.length, dimensions.width, dimensions.height]
					.iter()
					.any(|side| *side <= Decimal::ZERO)
				{
					return Err(PricingError::invalid(
						"dimensions",
						"every side must be greater than zero",
					));
				}
				dimensions
					.volume_m3()
					.ok_or_else(|| PricingError::invalid("dimensions", "volume is too large"))?
			},
			(None, None) => Decimal::ZERO,
		};

		Ok(ValidatedQuote {
			origin_country_code,
			destination_country_code,
			transport_modes,
			weight,
			volume,
			cargo_type: request.cargo_type,
			priority: request.priority,
		})
	}

	/// Prices every requested mode.
	///
	/// A mode without an active tariff is reported in its own entry; the
	/// request only fails as a whole when no mode could be priced.
	#[instrument(skip_all)]
	pub async fn quote(&self, request: &QuoteRequest) -> Result<QuoteResponse, PricingError> {
		let input = Self::validate_request(request)?;

		let mut quotes = Vec::with_capacity(input.transport_modes.len());
		let mut first_missing = None;
		for mode in &input.transport_modes {
			let route = RouteKey::new(
				&input.origin_country_code,
				&input.destination_country_code,
				*mode,
			);
			match self
				.price_mode(&route, input.weight, input.volume, input.cargo_type, input.priority)
				.await
			{
				Ok(estimate) => quotes.push(ModeQuote {
					transport_mode: *mode,
					estimate: Some(estimate),
					error: None,
				}),
				Err(e @ PricingError::TariffNotFound { .. }) => {
					tracing::debug!(route = %route, "No tariff for requested mode");
					quotes.push(ModeQuote {
						transport_mode: *mode,
						estimate: None,
						error: Some(e.to_string()),
					});
					if first_missing.is_none() {
						first_missing = Some(e);
					}
				},
				Err(e) => return Err(e),
			}
		}

		if quotes.iter().all(|quote| quote.estimate.is_none()) {
			if let Some(missing) = first_missing {
				return Err(missing);
			}
		}

		Ok(QuoteResponse {
			currency: self.currency.clone(),
			quotes,
		})
	}

	/// Looks up the tariff of one route and prices it.
	///
	/// An inactive row is treated as absent.
	pub async fn price_mode(
		&self,
		route: &RouteKey,
		weight: Decimal,
		volume: Decimal,
		cargo_type: CargoType,
		priority: Priority,
	) -> Result<CostEstimate, PricingError> {
		let rate = self
			.tariffs
			.find_rate(route)
			.await
			.map_err(|e| PricingError::Tariff(e.to_string()))?
			.filter(|rate| rate.is_active)
			.ok_or_else(|| PricingError::TariffNotFound {
				origin: route.origin_country_code.clone(),
				destination: route.destination_country_code.clone(),
				mode: route.transport_mode,
			})?;

		RateCalculator::calculate(&rate, weight, volume, cargo_type, priority)
	}

	/// Prices a stored shipment for one mode and records the estimate on it.
	///
	/// Only `estimated_cost` and `updated_at` change; status and version are
	/// left alone. Shipments in a terminal status are not touched.
	#[instrument(skip_all, fields(shipment_id = %truncate_id(shipment_id), mode = %mode))]
	pub async fn estimate_shipment_cost(
		&self,
		shipment_id: &str,
		mode: TransportMode,
	) -> Result<Shipment, PricingError> {
		let namespace = StorageKey::Shipments.as_str();
		let snapshot = self
			.storage
			.retrieve_snapshot::<Shipment>(namespace, shipment_id)
			.await
			.map_err(|e| match e {
				StorageError::NotFound => PricingError::NotFound(shipment_id.to_string()),
				other => PricingError::Storage(other.to_string()),
			})?;

		let mut shipment = snapshot.value;
		if shipment.status.is_terminal() {
			return Err(PricingError::Closed {
				id: shipment.id,
				status: shipment.status,
			});
		}

		let route = RouteKey::new(
			&shipment.origin.country_code,
			&shipment.destination.country_code,
			mode,
		);
		let estimate = self
			.price_mode(
				&route,
				shipment.weight,
				shipment.chargeable_volume().unwrap_or(Decimal::ZERO),
				shipment.cargo_type,
				shipment.priority,
			)
			.await?;

		shipment.estimated_cost = Some(estimate.estimated_cost);
		shipment.updated_at = Utc::now();

		let batch = WriteBatch::new()
			.expect_unchanged(namespace, shipment_id, snapshot.raw)
			.put(namespace, shipment_id, &shipment)
			.map_err(|e| PricingError::Storage(e.to_string()))?;
		self.storage.commit(batch).await.map_err(|e| match e {
			StorageError::PreconditionFailed(_) => PricingError::Conflict(shipment_id.to_string()),
			other => PricingError::Storage(other.to_string()),
		})?;

		tracing::info!(
			estimated_cost = %format_money(estimate.estimated_cost, &self.currency),
			"Recorded estimate"
		);
		Ok(shipment)
	}
}

fn country_code(field: &str, value: &Option<String>) -> Result<String, PricingError> {
	let code = value.as_deref().map(str::trim).unwrap_or_default();
	if code.is_empty() {
		return Err(PricingError::invalid(field, "is required"));
	}
	if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
		return Err(PricingError::invalid(
			field,
			format!("expected a two-letter country code, got '{}'", code),
		));
	}
	Ok(code.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
	use super::*;
	use logistics_storage::implementations::memory::MemoryStorage;
	use logistics_tariff::implementations::table::TableTariffs;
	use logistics_tariff::TariffInterface;
	use crate::workflow::shipment::new_shipment;
	use logistics_types::{Dimensions, Location, NewShipment, ShipmentStatus, TransportRate};
	use rust_decimal_macros::dec;
	use std::collections::{BTreeMap, HashMap};

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

	fn service(rates: &[TransportRate]) -> QuoteService {
		service_with(Arc::new(StorageService::new(Box::new(MemoryStorage::new()))), rates)
	}

	fn service_with(storage: Arc<StorageService>, rates: &[TransportRate]) -> QuoteService {
		let table = TableTariffs::new(rates).unwrap();
		let mut implementations: HashMap<String, Arc<dyn TariffInterface>> = HashMap::new();
		implementations.insert("table".into(), Arc::new(table));
		let tariffs = Arc::new(TariffService::new(implementations, "table".into()).unwrap());
		QuoteService::new(tariffs, storage, "EUR".into())
	}

	fn request() -> QuoteRequest {
		QuoteRequest {
			origin_country_code: Some("fr".into()),
			destination_country_code: Some("SN".into()),
			transport_modes: vec![TransportMode::Air],
			weight: Some(dec!(10)),
			volume: Some(dec!(0.05)),
			dimensions: None,
			cargo_type: CargoType::Fragile,
			priority: Priority::Express,
		}
	}

	fn rejected_field(request: &QuoteRequest) -> String {
		match QuoteService::validate_request(request) {
			Err(PricingError::Validation { field, .. }) => field,
			other => panic!("expected a validation error, got {other:?}"),
		}
	}

	#[test]
	fn test_validation_names_field() {
		let mut req = request();
		req.weight = None;
		assert_eq!(rejected_field(&req), "weight");

		let mut req = request();
		req.weight = Some(dec!(-1));
		assert_eq!(rejected_field(&req), "weight");

		let mut req = request();
		req.origin_country_code = Some("  ".into());
		assert_eq!(rejected_field(&req), "originCountryCode");

		let mut req = request();
		req.destination_country_code = None;
		assert_eq!(rejected_field(&req), "destinationCountryCode");

		let mut req = request();
		req.transport_modes.clear();
		assert_eq!(rejected_field(&req), "transportModes");
	}

	#[test]
	fn test_volume_from_dimensions() {
		let mut req = request();
		req.volume = None;
		req.dimensions = Some(Dimensions {
			length: dec!(50),
			width: dec!(20),
			height: dec!(50),
		});
		let input = QuoteService::validate_request(&req).unwrap();
		assert_eq!(input.volume, dec!(0.05));
		assert_eq!(input.origin_country_code, "FR");
	}

	#[tokio::test]
	async fn test_quote_reference_case() {
		let response = service(&[air_rate()]).quote(&request()).await.unwrap();
		assert_eq!(response.currency, "EUR");
		assert_eq!(response.quotes.len(), 1);
		let estimate = response.quotes[0].estimate.as_ref().unwrap();
		assert_eq!(estimate.estimated_cost, dec!(33.00));
	}

	#[tokio::test]
	async fn test_missing_tariff_is_never_zero() {
		let mut req = request();
		req.transport_modes = vec![TransportMode::Sea];
		let err = service(&[air_rate()]).quote(&req).await.unwrap_err();
		assert!(matches!(
			err,
			PricingError::TariffNotFound {
				mode: TransportMode::Sea,
				..
			}
		));
	}

	#[tokio::test]
	async fn test_partial_quote_per_mode() {
		let mut req = request();
		req.transport_modes = vec![TransportMode::Air, TransportMode::Rail, TransportMode::Air];
		let response = service(&[air_rate()]).quote(&req).await.unwrap();
		assert_eq!(response.quotes.len(), 2);
		assert!(response.quotes[0].estimate.is_some());
		assert_eq!(response.quotes[1].transport_mode, TransportMode::Rail);
		assert!(response.quotes[1].estimate.is_none());
		assert!(response.quotes[1].error.is_some());
	}

	#[tokio::test]
	async fn test_inactive_tariff_is_absent() {
		let mut rate = air_rate();
		rate.is_active = false;
		let err = service(&[rate]).quote(&request()).await.unwrap_err();
		assert!(matches!(err, PricingError::TariffNotFound { .. }));
	}

	#[tokio::test]
	async fn test_estimate_unknown_shipment() {
		let err = service(&[air_rate()])
			.estimate_shipment_cost("missing", TransportMode::Air)
			.await
			.unwrap_err();
		assert!(matches!(err, PricingError::NotFound(_)));
	}

	#[tokio::test]
	async fn test_oversized_input_is_rejected() {
		let mut req = request();
		req.weight = Some(Decimal::MAX);
		req.volume = None;
		let err = service(&[air_rate()]).quote(&req).await.unwrap_err();
		assert!(matches!(err, PricingError::Validation { field, .. } if field == "weight"));

		let side = Decimal::from(10_000_000_000_000_i64);
		let mut req = request();
		req.weight = Some(dec!(1));
		req.volume = None;
		req.dimensions = Some(Dimensions {
			length: side,
			width: side,
			height: side,
		});
		assert_eq!(rejected_field(&req), "dimensions");
	}

	#[tokio::test]
	async fn test_estimate_leaves_closed_shipment_alone() {
		let storage = Arc::new(StorageService::new(Box::new(MemoryStorage::new())));
		let location = |code: &str| Location {
			address: "Port autonome".into(),
			city: "Dakar".into(),
			country_code: code.into(),
		};
		let mut shipment = new_shipment(
			"s1".into(),
			NewShipment {
				origin: location("FR"),
				destination: location("SN"),
				weight: dec!(10),
				volume: Some(dec!(0.05)),
				dimensions: None,
				cargo_type: CargoType::General,
				is_dangerous: false,
				is_fragile: false,
				priority: Priority::Standard,
				transport_modes: vec![TransportMode::Air],
				actor: "clerk".into(),
			},
			chrono::Utc::now(),
		)
		.unwrap();
		shipment.status = ShipmentStatus::Cancelled;
		storage
			.store(StorageKey::Shipments.as_str(), "s1", &shipment)
			.await
			.unwrap();

		let err = service_with(storage.clone(), &[air_rate()])
			.estimate_shipment_cost("s1", TransportMode::Air)
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			PricingError::Closed {
				status: ShipmentStatus::Cancelled,
				..
			}
		));

		let stored: Shipment = storage
			.retrieve(StorageKey::Shipments.as_str(), "s1")
			.await
			.unwrap();
		assert_eq!(stored.estimated_cost, None);
		assert_eq!(stored.updated_at, shipment.updated_at);
	}
}
