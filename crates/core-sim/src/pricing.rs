use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};

use crate::error::InvalidObservation;

pub const PRICE_DECIMALS: u32 = 2;

/// Rounds to cents using the exact binary value of `value` and ties to even,
/// so `0.125` becomes `0.12` and `1.005` (stored just below the tie) becomes `1.0`.
pub fn round_price(value: f64) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }

    Decimal::from_f64_retain(value)?
        .round_dp_with_strategy(PRICE_DECIMALS, RoundingStrategy::MidpointNearestEven)
        .to_f64()
}

/// `round(price * (1 + pct_change), 2)`, rejecting anything that is not a positive finite price.
pub fn apply_return(price: f64, pct_change: f64) -> Result<f64, InvalidObservation> {
    if !pct_change.is_finite() {
        return Err(InvalidObservation::NonFiniteReturn(pct_change));
    }

    let raw = price * (1.0 + pct_change);
    let next = round_price(raw).ok_or(InvalidObservation::Unroundable(raw))?;
    if next <= 0.0 {
        return Err(InvalidObservation::NonPositivePrice {
            price,
            drawn: pct_change,
            next,
        });
    }

    Ok(next)
}
