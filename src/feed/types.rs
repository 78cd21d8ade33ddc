//! Price feed types

use crate::ws::WsError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A single trade parsed from one feed message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTick {
    /// Trade price
    pub price: Decimal,
    /// Reported volume, if the message carried one
    pub volume: Option<Decimal>,
    /// Exchange trade time (wall-clock time for synthetic ticks)
    pub trade_time: DateTime<Utc>,
}

impl RawTick {
    /// Create a tick without volume
    pub fn new(price: Decimal, trade_time: DateTime<Utc>) -> Self {
        Self {
            price,
            volume: None,
            trade_time,
        }
    }

    /// Attach a volume
    pub fn with_volume(mut self, volume: Decimal) -> Self {
        self.volume = Some(volume);
        self
    }
}

/// Feed connection status as shown to consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// Waiting for the first trade on a (re)connected feed
    Connecting,
    /// Real trades are flowing
    Live,
    /// Feed unavailable or unconfigured; simulated data is substituted
    Degraded,
}

impl ConnectionStatus {
    /// Lowercase label used in logs and serialized output
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Live => "live",
            ConnectionStatus::Degraded => "degraded",
        }
    }

    /// Check if real trades are flowing
    pub fn is_live(self) -> bool {
        self == ConnectionStatus::Live
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a feed message was discarded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Not JSON, or not an object with a `type` field
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    /// Anything other than a trade message
    #[error("unexpected message type '{0}'")]
    UnexpectedType(String),
    /// The feed reported an error instead of data
    #[error("feed error message: {0}")]
    FeedMessage(String),
    /// Trade message with a missing or empty `data` array
    #[error("trade message carries no trades")]
    EmptyTrades,
    /// First trade record has the wrong shape
    #[error("invalid trade record: {0}")]
    InvalidRecord(String),
    /// A numeric field failed to parse as a decimal
    #[error("invalid {field}: '{value}'")]
    InvalidNumber { field: &'static str, value: String },
    /// Trade time is not a representable instant
    #[error("invalid trade time: {0}")]
    InvalidTime(i64),
}

/// Feed failures; all of them are absorbed by the connector
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// No API key, so no real feed; simulated data for the whole run
    #[error("no feed API key configured")]
    ConfigMissing,
    /// Network or protocol failure; recovered by reconnecting
    #[error("transport error: {0}")]
    Transport(#[from] WsError),
    /// Malformed message; dropped
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_raw_tick_builder() {
        let now = Utc::now();
        let tick = RawTick::new(dec!(2845.32), now).with_volume(dec!(12));
        assert_eq!(tick.price, dec!(2845.32));
        assert_eq!(tick.volume, Some(dec!(12)));
        assert_eq!(tick.trade_time, now);
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(ConnectionStatus::Connecting.to_string(), "connecting");
        assert_eq!(ConnectionStatus::Live.to_string(), "live");
        assert_eq!(ConnectionStatus::Degraded.to_string(), "degraded");
        assert!(ConnectionStatus::Live.is_live());
        assert!(!ConnectionStatus::Degraded.is_live());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&ConnectionStatus::Degraded).unwrap();
        assert_eq!(json, r#""degraded""#);
    }

    #[test]
    fn test_feed_error_wraps_sources() {
        let err: FeedError = WsError::ConnectionFailed("refused".into()).into();
        assert_eq!(err.to_string(), "transport error: Connection failed: refused");

        let err: FeedError = ParseError::EmptyTrades.into();
        assert_eq!(err.to_string(), "parse error: trade message carries no trades");
    }
}
