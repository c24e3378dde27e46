//! Helper utilities for common operations.
//!
//! This module provides utility functions used throughout the logistics
//! system for monetary rounding.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a monetary amount to 2 decimal places, midpoint away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
	amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rust_decimal_macros::dec;

	#[test]
	fn test_round_money_midpoint() {
		assert_eq!(round_money(dec!(2.345)), dec!(2.35));
		assert_eq!(round_money(dec!(-2.345)), dec!(-2.35));
		assert_eq!(round_money(dec!(33.000)), dec!(33));
	}
}
