//! Snapshot reducer
//!
//! Folds one tick into the previous snapshot. Total: never panics and never
//! fails, whatever the prices.

use super::types::{quote, PriceSnapshot};
use crate::feed::RawTick;
use rust_decimal::Decimal;

/// Apply a real feed tick
pub fn reduce(previous: &PriceSnapshot, tick: &RawTick) -> PriceSnapshot {
    fold(previous, tick, true)
}

/// Apply a synthetic tick; identical except `is_live` is false
pub fn reduce_synthetic(previous: &PriceSnapshot, tick: &RawTick) -> PriceSnapshot {
    fold(previous, tick, false)
}

fn fold(previous: &PriceSnapshot, tick: &RawTick, is_live: bool) -> PriceSnapshot {
    let price = tick.price;
    let change = price.checked_sub(previous.price).unwrap_or(Decimal::ZERO);
    let (bid, ask) = quote(price);

    PriceSnapshot {
        price,
        bid,
        ask,
        change,
        change_percent: change_percent(change, previous.price),
        timestamp: tick.trade_time,
        high_24h: previous.high_24h.max(price),
        low_24h: previous.low_24h.min(price),
        volume_24h: tick.volume.unwrap_or(previous.volume_24h),
        is_live,
    }
}

/// `100 * change / previous`, zero when `previous` is zero
fn change_percent(change: Decimal, previous: Decimal) -> Decimal {
    if previous.is_zero() {
        return Decimal::ZERO;
    }

    change
        .checked_div(previous)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
}
