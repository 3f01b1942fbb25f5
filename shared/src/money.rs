//! Money helpers
//!
//! Amounts are exact `Decimal` values. Rounding to cents happens only when a
//! value leaves the system (receipt text, API display strings).

use rust_decimal::prelude::*;

/// Cents precision for presentation
pub const DECIMAL_PLACES: u32 = 2;

/// Upper bound for a single unit price or a tendered amount (1,000,000 EUR)
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Round half away from zero to 2 places
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// German-style amount without currency: `5.5` -> `"5,50"`, `-2` -> `"-2,00"`
pub fn format_amount(value: Decimal) -> String {
    let mut rounded = round_money(value);
    if rounded.is_zero() {
        // drop a negative sign on zero
        rounded = Decimal::ZERO;
    }
    rounded.rescale(DECIMAL_PLACES);
    rounded.to_string().replace('.', ",")
}

/// Amount with the currency symbol, as shown on terminals: `"5,50 €"`
pub fn format_eur(value: Decimal) -> String {
    format!("{} €", format_amount(value))
}

/// Parse a user supplied amount, accepting both `12.50` and `12,50`
pub fn parse_amount(input: &str) -> Option<Decimal> {
    let normalized = input.trim().replace(',', ".");
    Decimal::from_str(&normalized).ok()
}
