//! Purchase cost breakdown.

use super::PricingError;
use logistics_types::{round_money, CostBreakdown};
use rust_decimal::Decimal;

/// Splits a purchase into product, delivery and service fee.
///
/// `service_fee = round2((product + delivery) × fee_rate)` and the total is
/// the subtotal plus that fee.
pub fn compute_purchase_cost(
	product_cost: Decimal,
	delivery_cost: Decimal,
	fee_rate: Decimal,
) -> Result<CostBreakdown, PricingError> {
	if product_cost.is_sign_negative() {
		return Err(PricingError::invalid("productCost", "cannot be negative"));
	}
	if delivery_cost.is_sign_negative() {
		return Err(PricingError::invalid("deliveryCost", "cannot be negative"));
	}

	let too_large = || PricingError::invalid("productCost", "is too large to price");
	let subtotal = product_cost
		.checked_add(delivery_cost)
		.ok_or_else(too_large)?;
	let service_fee = round_money(subtotal.checked_mul(fee_rate).ok_or_else(too_large)?);
	let total_cost = subtotal.checked_add(service_fee).ok_or_else(too_large)?;
	Ok(CostBreakdown {
		product_cost,
		delivery_cost,
		service_fee,
		total_cost,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use rust_decimal_macros::dec;

	#[test]
	fn test_default_fee() {
		let cost = compute_purchase_cost(dec!(100), dec!(20), dec!(0.15)).unwrap();
		assert_eq!(cost.service_fee, dec!(18));
		assert_eq!(cost.total_cost, dec!(138));
	}

	#[test]
	fn test_fee_is_rounded() {
		let cost = compute_purchase_cost(dec!(10.03), Decimal::ZERO, dec!(0.15)).unwrap();
		assert_eq!(cost.service_fee, dec!(1.50));
		assert_eq!(cost.total_cost, dec!(11.53));
	}

	#[test]
	fn test_negative_cost_rejected() {
		let err = compute_purchase_cost(dec!(-1), dec!(5), dec!(0.15)).unwrap_err();
		assert!(matches!(err, PricingError::Validation { field, .. } if field == "productCost"));
	}

	#[test]
	fn test_overflow_rejected() {
		let err = compute_purchase_cost(Decimal::MAX, dec!(1), dec!(0.15)).unwrap_err();
		assert!(matches!(err, PricingError::Validation { field, .. } if field == "productCost"));

		let err = compute_purchase_cost(Decimal::MAX, Decimal::ZERO, dec!(0.15)).unwrap_err();
		assert!(matches!(err, PricingError::Validation { .. }));
	}
}
