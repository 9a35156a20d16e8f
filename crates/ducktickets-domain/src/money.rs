//! Monetary arithmetic on two-decimal amounts.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of fractional digits every stored amount carries.
pub const MONEY_SCALE: u32 = 2;

/// Largest accepted unit price. Keeps a 200-ticket order inside `DECIMAL(10, 2)`.
pub const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(9_999_999, 0, 0, false, MONEY_SCALE);

/// Non-negative, at most [`MAX_UNIT_PRICE`], and exact to the cent.
pub fn is_valid_price(value: Decimal) -> bool {
    !value.is_sign_negative() && value <= MAX_UNIT_PRICE && value.normalize().scale() <= MONEY_SCALE
}

/// Round to cents, half away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// `unit_price × quantity`, rounded to cents.
pub fn line_total(unit_price: Decimal, quantity: u32) -> Decimal {
    round_money(unit_price * Decimal::from(quantity))
}

/// Price after a percentage discount and then a fixed discount. Never negative.
///
/// `percent` is clamped to 0–100.
pub fn apply_discount(price: Decimal, percent: Decimal, amount: Decimal) -> Decimal {
    let percent = percent.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
    let discounted = price - price * percent / Decimal::ONE_HUNDRED - amount;
    round_money(discounted.max(Decimal::ZERO))
}
