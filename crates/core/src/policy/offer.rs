//! Cash-offer discount guardrail.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Default maximum discount a cash offer may carry, in percent.
pub const DEFAULT_MAX_DISCOUNT_PCT: Decimal = Decimal::from_parts(9, 0, 0, false, 0);

/// Outcome of the discount-cap check. Returned to the caller on rejection so
/// the customer can revise the offer against a concrete floor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OfferValidation {
    pub is_valid: bool,
    pub min_acceptable: Decimal,
    pub discount_amount: Decimal,
    pub discount_pct: Decimal,
    pub message: String,
}

/// Validate an offered price against the list price.
///
/// `min_acceptable = list_price × (1 − max_discount_pct)`; the offer is valid
/// when it meets or beats that floor. Callers must reject
/// `offered_price <= 0` before calling; zero/negative list prices yield an
/// always-invalid result rather than dividing by zero.
pub fn validate_cash_offer(
    list_price: Decimal,
    offered_price: Decimal,
    max_discount_pct: Decimal,
) -> OfferValidation {
    if list_price <= Decimal::ZERO {
        return OfferValidation {
            is_valid: false,
            min_acceptable: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            discount_pct: Decimal::ZERO,
            message: "vehicle has no list price to offer against".to_string(),
        };
    }

    let min_acceptable =
        (list_price * (Decimal::ONE_HUNDRED - max_discount_pct) / Decimal::ONE_HUNDRED).round_dp(2);
    let discount_amount = list_price - offered_price;
    let discount_pct = (discount_amount / list_price * Decimal::ONE_HUNDRED).round_dp(2);
    let is_valid = offered_price >= min_acceptable;

    let message = if is_valid {
        format!("offer accepted at {discount_pct}% below list price")
    } else {
        format!(
            "offer is {discount_pct}% below list price; maximum discount is \
             {max_discount_pct}%, minimum acceptable price is {min_acceptable}"
        )
    };

    OfferValidation { is_valid, min_acceptable, discount_amount, discount_pct, message }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{validate_cash_offer, DEFAULT_MAX_DISCOUNT_PCT};

    const LIST: Decimal = Decimal::from_parts(200_000_000, 0, 0, false, 0);

    #[test]
    fn offer_within_cap_is_valid_with_exact_percentage() {
        let validation =
            validate_cash_offer(LIST, Decimal::new(185_000_000, 0), DEFAULT_MAX_DISCOUNT_PCT);
        assert!(validation.is_valid);
        assert_eq!(validation.discount_pct, Decimal::new(750, 2));
        assert_eq!(validation.discount_amount, Decimal::new(15_000_000, 0));
    }

    #[test]
    fn offer_below_cap_is_rejected_with_floor_price() {
        let validation =
            validate_cash_offer(LIST, Decimal::new(175_000_000, 0), DEFAULT_MAX_DISCOUNT_PCT);
        assert!(!validation.is_valid);
        assert_eq!(validation.discount_pct, Decimal::new(1250, 2));
        assert_eq!(validation.min_acceptable, Decimal::new(182_000_000, 0).round_dp(2));
        assert!(validation.message.contains("182000000"));
    }

    #[test]
    fn offer_exactly_at_floor_is_valid() {
        let validation =
            validate_cash_offer(LIST, Decimal::new(182_000_000, 0), DEFAULT_MAX_DISCOUNT_PCT);
        assert!(validation.is_valid);
        assert_eq!(validation.discount_pct, Decimal::new(900, 2));
    }

    #[test]
    fn zero_list_price_never_validates() {
        let validation = validate_cash_offer(
            Decimal::ZERO,
            Decimal::new(1_000_000, 0),
            DEFAULT_MAX_DISCOUNT_PCT,
        );
        assert!(!validation.is_valid);
    }

    #[test]
    fn overpaying_is_valid_with_negative_discount() {
        let validation =
            validate_cash_offer(LIST, Decimal::new(210_000_000, 0), DEFAULT_MAX_DISCOUNT_PCT);
        assert!(validation.is_valid);
        assert!(validation.discount_pct < Decimal::ZERO);
    }
}
