//! Transport tariff types.
//!
//! A tariff row prices one `(origin country, destination country, mode)`
//! route. Surcharges are fractions applied multiplicatively on top of the
//! chargeable-weight base cost.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::{CargoType, Priority, TransportMode};

/// Lower bound for a configured surcharge fraction (-500%).
pub const MIN_SURCHARGE: Decimal = Decimal::from_parts(5, 0, 0, true, 0);
/// Upper bound for a configured surcharge fraction (+500%).
pub const MAX_SURCHARGE: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// Lookup key of a tariff row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteKey {
	pub origin_country_code: String,
	pub destination_country_code: String,
	pub transport_mode: TransportMode,
}

impl RouteKey {
	/// Builds a key, normalising country codes to upper case.
	pub fn new(origin: &str, destination: &str, mode: TransportMode) -> Self {
		Self {
			origin_country_code: origin.trim().to_ascii_uppercase(),
			destination_country_code: destination.trim().to_ascii_uppercase(),
			transport_mode: mode,
		}
	}

	/// Storage identifier of the route, e.g. `FR-SN-AIR`.
	pub fn storage_id(&self) -> String {
		format!(
			"{}-{}-{}",
			self.origin_country_code, self.destination_country_code, self.transport_mode
		)
	}
}

impl fmt::Display for RouteKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{} -> {} ({})",
			self.origin_country_code, self.destination_country_code, self.transport_mode
		)
	}
}

/// A configured transport rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportRate {
	pub origin_country_code: String,
	pub destination_country_code: String,
	pub transport_mode: TransportMode,
	/// Price per kilogram of gross weight.
	pub rate_per_kg: Decimal,
	/// Price per cubic metre of volume.
	pub rate_per_m3: Decimal,
	/// Surcharge fraction per cargo type; absent types get no surcharge.
	#[serde(default)]
	pub cargo_type_surcharges: BTreeMap<CargoType, Decimal>,
	/// Surcharge fraction per priority; absent priorities get no surcharge.
	#[serde(default)]
	pub priority_surcharges: BTreeMap<Priority, Decimal>,
	#[serde(default = "default_active")]
	pub is_active: bool,
}

fn default_active() -> bool {
	true
}

impl TransportRate {
	/// Returns the normalised lookup key of this rate.
	pub fn route_key(&self) -> RouteKey {
		RouteKey::new(
			&self.origin_country_code,
			&self.destination_country_code,
			self.transport_mode,
		)
	}

	/// Surcharge fraction for a cargo type, `0` when none is configured.
	pub fn cargo_surcharge(&self, cargo_type: CargoType) -> Decimal {
		self.cargo_type_surcharges
			.get(&cargo_type)
			.copied()
			.unwrap_or(Decimal::ZERO)
	}

	/// Surcharge fraction for a priority, `0` when none is configured.
	pub fn priority_surcharge(&self, priority: Priority) -> Decimal {
		self.priority_surcharges
			.get(&priority)
			.copied()
			.unwrap_or(Decimal::ZERO)
	}

	/// Checks the row is usable: two-letter country codes, non-negative
	/// rates and surcharges within `[-5, 5]`.
	pub fn validate(&self) -> Result<(), String> {
		for (name, code) in [
			("origin_country_code", &self.origin_country_code),
			("destination_country_code", &self.destination_country_code),
		] {
			let code = code.trim();
			if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
				return Err(format!("{} must be a two-letter country code, got '{}'", name, code));
			}
		}
		if self.rate_per_kg.is_sign_negative() {
			return Err("rate_per_kg cannot be negative".into());
		}
		if self.rate_per_m3.is_sign_negative() {
			return Err("rate_per_m3 cannot be negative".into());
		}
		let surcharges = self
			.cargo_type_surcharges
			.values()
			.chain(self.priority_surcharges.values());
		for surcharge in surcharges {
			if *surcharge < MIN_SURCHARGE || *surcharge > MAX_SURCHARGE {
				return Err(format!(
					"surcharge {} is outside [{}, {}]",
					surcharge, MIN_SURCHARGE, MAX_SURCHARGE
				));
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rust_decimal_macros::dec;

	fn rate() -> TransportRate {
		TransportRate {
			origin_country_code: "fr".into(),
			destination_country_code: "SN".into(),
			transport_mode: TransportMode::Air,
			rate_per_kg: dec!(2),
			rate_per_m3: dec!(500),
			cargo_type_surcharges: BTreeMap::from([(CargoType::Fragile, dec!(0.1))]),
			priority_surcharges: BTreeMap::new(),
			is_active: true,
		}
	}

	#[test]
	fn test_route_key_normalises_codes() {
		assert_eq!(rate().route_key().storage_id(), "FR-SN-AIR");
	}

	#[test]
	fn test_surcharge_defaults_to_zero() {
		let rate = rate();
		assert_eq!(rate.cargo_surcharge(CargoType::Fragile), dec!(0.1));
		assert_eq!(rate.cargo_surcharge(CargoType::General), Decimal::ZERO);
		assert_eq!(rate.priority_surcharge(Priority::Urgent), Decimal::ZERO);
	}

	#[test]
	fn test_validate_surcharge_bounds() {
		let mut rate = rate();
		rate.priority_surcharges.insert(Priority::Urgent, dec!(5));
		rate.cargo_type_surcharges.insert(CargoType::General, dec!(-5));
		assert!(rate.validate().is_ok());

		rate.priority_surcharges.insert(Priority::Express, dec!(5.01));
		assert!(rate.validate().unwrap_err().contains("outside"));
	}

	#[test]
	fn test_validate_country_code() {
		let mut rate = rate();
		rate.destination_country_code = "SEN".into();
		assert!(rate.validate().is_err());
	}
}
