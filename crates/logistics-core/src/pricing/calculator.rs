//! Chargeable-weight rating of a single transport mode.

use super::PricingError;
use logistics_types::{
	round_money, BillingBasis, CargoType, CostEstimate, Priority, TransportRate,
};
use rust_decimal::Decimal;

/// Prices goods against a tariff row.
pub struct RateCalculator;

impl RateCalculator {
	/// Computes `max(weight × ratePerKg, volume × ratePerM3)` and applies
	/// the cargo and priority surcharges multiplicatively.
	///
	/// Only the final amount is rounded. A tie between the weight and
	/// volume costs is billed on weight. Amounts too large for a `Decimal`
	/// are rejected against the quantity that produced them.
	pub fn calculate(
		rate: &TransportRate,
		weight: Decimal,
		volume: Decimal,
		cargo_type: CargoType,
		priority: Priority,
	) -> Result<CostEstimate, PricingError> {
		let weight_cost = weight
			.checked_mul(rate.rate_per_kg)
			.ok_or_else(|| too_large("weight"))?;
		let volume_cost = volume
			.checked_mul(rate.rate_per_m3)
			.ok_or_else(|| too_large("volume"))?;
		let (base_cost, billed_on) = if volume_cost > weight_cost {
			(volume_cost, BillingBasis::Volume)
		} else {
			(weight_cost, BillingBasis::Weight)
		};

		let cargo_type_surcharge = rate.cargo_surcharge(cargo_type);
		let priority_surcharge = rate.priority_surcharge(priority);
		let total = base_cost
			.checked_mul(Decimal::ONE + cargo_type_surcharge)
			.and_then(|cost| cost.checked_mul(Decimal::ONE + priority_surcharge))
			.ok_or_else(|| match billed_on {
				BillingBasis::Weight => too_large("weight"),
				BillingBasis::Volume => too_large("volume"),
			})?;

		Ok(CostEstimate {
			transport_mode: rate.transport_mode,
			base_cost,
			billed_on,
			cargo_type_surcharge,
			priority_surcharge,
			estimated_cost: round_money(total),
		})
	}
}

fn too_large(field: &str) -> PricingError {
	PricingError::invalid(field, "is too large to price")
}

#[cfg(test)]
mod tests {
	use super::*;
	use logistics_types::TransportMode;
	use rust_decimal_macros::dec;
	use std::collections::BTreeMap;

	fn rate() -> TransportRate {
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

	#[test]
	fn test_volume_wins_with_surcharges() {
		let estimate = RateCalculator::calculate(
			&rate(),
			dec!(10),
			dec!(0.05),
			CargoType::Fragile,
			Priority::Express,
		)
		.unwrap();
		assert_eq!(estimate.base_cost, dec!(25));
		assert_eq!(estimate.billed_on, BillingBasis::Volume);
		assert_eq!(estimate.estimated_cost, dec!(33.00));
	}

	#[test]
	fn test_weight_wins_without_surcharges() {
		let estimate = RateCalculator::calculate(
			&rate(),
			dec!(40),
			dec!(0.05),
			CargoType::General,
			Priority::Standard,
		)
		.unwrap();
		assert_eq!(estimate.billed_on, BillingBasis::Weight);
		assert_eq!(estimate.cargo_type_surcharge, Decimal::ZERO);
		assert_eq!(estimate.estimated_cost, dec!(80));
	}

	#[test]
	fn test_rounds_half_away_from_zero() {
		let mut rate = rate();
		rate.rate_per_kg = dec!(0.125);
		let estimate = RateCalculator::calculate(
			&rate,
			dec!(1),
			Decimal::ZERO,
			CargoType::General,
			Priority::Standard,
		)
		.unwrap();
		assert_eq!(estimate.estimated_cost, dec!(0.13));
	}

	#[test]
	fn test_negative_surcharge_discounts() {
		let mut rate = rate();
		rate.priority_surcharges.insert(Priority::Standard, dec!(-0.5));
		let estimate = RateCalculator::calculate(
			&rate,
			dec!(10),
			Decimal::ZERO,
			CargoType::General,
			Priority::Standard,
		)
		.unwrap();
		assert_eq!(estimate.estimated_cost, dec!(10));
	}

	#[test]
	fn test_overflow_is_rejected() {
		let err = RateCalculator::calculate(
			&rate(),
			Decimal::MAX,
			Decimal::ZERO,
			CargoType::General,
			Priority::Standard,
		)
		.unwrap_err();
		assert!(matches!(err, PricingError::Validation { field, .. } if field == "weight"));

		let err = RateCalculator::calculate(
			&rate(),
			dec!(1),
			Decimal::MAX,
			CargoType::General,
			Priority::Standard,
		)
		.unwrap_err();
		assert!(matches!(err, PricingError::Validation { field, .. } if field == "volume"));

		// The base fits but the surcharges push it past the limit.
		let mut steep = rate();
		steep.priority_surcharges.insert(Priority::Express, dec!(5));
		let err = RateCalculator::calculate(
			&steep,
			Decimal::MAX / dec!(4),
			Decimal::ZERO,
			CargoType::Fragile,
			Priority::Express,
		)
		.unwrap_err();
		assert!(matches!(err, PricingError::Validation { field, .. } if field == "weight"));
	}
}
