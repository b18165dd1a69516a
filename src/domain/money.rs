//! Exact currency arithmetic for sale totals.
//!
//! Amounts are `rust_decimal::Decimal` end to end (Postgres `NUMERIC`), so
//! `10.00 * 3` is exactly `30.00` with no binary-float drift.

use rust_decimal::Decimal;

use super::error::DomainError;

/// Compute the total amount of a sale line: `unit_price * quantity`.
///
/// The quantity must be a positive integer; overflow past `Decimal`'s
/// 96-bit mantissa is reported rather than wrapped.
pub fn line_total(unit_price: Decimal, quantity: i32) -> Result<Decimal, DomainError> {
    if quantity <= 0 {
        return Err(DomainError::validation(
            "quantity must be a positive integer",
        ));
    }

    unit_price
        .checked_mul(Decimal::from(quantity))
        .ok_or_else(|| DomainError::invariant("total amount exceeds supported precision"))
}
