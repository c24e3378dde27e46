//! String formatting utilities.
//!
//! Provides functions for formatting identifiers and amounts for display
//! in logs and API messages.

use rust_decimal::Decimal;

/// Utility function to truncate an identifier for display purposes.
///
/// Shows only the first 8 characters followed by ".." for longer strings.
pub fn truncate_id(id: &str) -> String {
	match id.char_indices().nth(8) {
		Some((cut, _)) => format!("{}..", &id[..cut]),
		None => id.to_string(),
	}
}

/// Formats an amount with its currency, always showing two decimals.
pub fn format_money(amount: Decimal, currency: &str) -> String {
	let mut rounded = super::round_money(amount);
	rounded.rescale(2);
	format!("{} {}", rounded, currency)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rust_decimal_macros::dec;

	#[test]
	fn test_truncate_id() {
		assert_eq!(truncate_id("12345678"), "12345678");
		assert_eq!(truncate_id("123456789"), "12345678..");
		assert_eq!(
			truncate_id("3f2c9a1e-8b7d-4c6e-9f01-23456789abcd"),
			"3f2c9a1e.."
		);
	}

	#[test]
	fn test_format_money() {
		assert_eq!(format_money(dec!(33), "EUR"), "33.00 EUR");
		assert_eq!(format_money(dec!(12.345), "XOF"), "12.35 XOF");
	}
}
