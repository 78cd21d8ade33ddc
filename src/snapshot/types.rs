//! Snapshot value types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Distance from price down to the quoted bid
pub const BID_OFFSET: Decimal = dec!(0.05);

/// Distance from price up to the quoted ask
pub const ASK_OFFSET: Decimal = dec!(0.07);

/// Canonical price state, replaced wholesale on every tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSnapshot {
    /// Last traded (or synthetic) price
    pub price: Decimal,
    /// `price - 0.05`
    pub bid: Decimal,
    /// `price + 0.07`
    pub ask: Decimal,
    /// Delta against the previous snapshot's price
    pub change: Decimal,
    /// `100 * change / previous price`; zero when the previous price was zero
    pub change_percent: Decimal,
    /// Trade time for feed ticks, wall-clock time otherwise
    pub timestamp: DateTime<Utc>,
    /// Running maximum since start
    #[serde(rename = "high24h")]
    pub high_24h: Decimal,
    /// Running minimum since start
    #[serde(rename = "low24h")]
    pub low_24h: Decimal,
    /// Last reported volume
    #[serde(rename = "volume24h")]
    pub volume_24h: Decimal,
    /// True only when derived from a real feed message
    pub is_live: bool,
}

impl PriceSnapshot {
    /// Initial snapshot held before any tick arrives
    pub fn seed(
        price: Decimal,
        high_24h: Decimal,
        low_24h: Decimal,
        volume_24h: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let (bid, ask) = quote(price);
        Self {
            price,
            bid,
            ask,
            change: Decimal::ZERO,
            change_percent: Decimal::ZERO,
            timestamp,
            high_24h,
            low_24h,
            volume_24h,
            is_live: false,
        }
    }

    /// Ask minus bid
    pub fn spread(&self) -> Decimal {
        self.ask - self.bid
    }

    /// Non-negative change
    pub fn is_up(&self) -> bool {
        !self.change.is_sign_negative() || self.change.is_zero()
    }
}

/// Bid and ask around a price; saturates instead of overflowing
pub(crate) fn quote(price: Decimal) -> (Decimal, Decimal) {
    let bid = price.checked_sub(BID_OFFSET).unwrap_or(price);
    let ask = price.checked_add(ASK_OFFSET).unwrap_or(price);
    (bid, ask)
}
