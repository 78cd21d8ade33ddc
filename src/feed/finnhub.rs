//! Finnhub trade stream protocol

use super::types::{ParseError, RawTick};
use crate::ws::ConnectRequest;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

/// Finnhub WebSocket base URL
pub const FINNHUB_WS_URL: &str = "wss://ws.finnhub.io";

/// Envelope shared by every Finnhub message
#[derive(Debug, Deserialize)]
struct FinnhubMessage {
    /// Message type ("trade", "ping", "error", ...)
    #[serde(rename = "type")]
    kind: String,
    /// Trade records; only the first one is used
    #[serde(default)]
    data: Option<Vec<serde_json::Value>>,
    /// Error text on "error" messages
    #[serde(default)]
    msg: Option<String>,
}

/// One trade record
#[derive(Debug, Deserialize)]
struct FinnhubTrade {
    /// Price
    p: WireNumber,
    /// Trade time (milliseconds)
    t: i64,
    /// Volume
    #[serde(default)]
    v: Option<WireNumber>,
}

/// Numbers arrive as JSON numbers, occasionally as strings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireNumber {
    Number(serde_json::Number),
    Text(String),
}

impl WireNumber {
    fn to_decimal(&self, field: &'static str) -> Result<Decimal, ParseError> {
        let text = match self {
            WireNumber::Number(n) => n.to_string(),
            WireNumber::Text(s) => s.trim().to_string(),
        };

        Decimal::from_str(&text)
            .or_else(|_| Decimal::from_scientific(&text))
            .map_err(|_| ParseError::InvalidNumber { field, value: text })
    }
}

/// Finnhub trade feed for a single symbol
#[derive(Debug, Clone)]
pub struct FinnhubFeed {
    endpoint: String,
    symbol: String,
}

impl FinnhubFeed {
    /// Create a feed for the given endpoint and symbol
    pub fn new(endpoint: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            symbol: symbol.into(),
        }
    }

    /// Subscribed symbol
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Build the authenticated stream URL
    fn build_ws_url(&self, api_key: &str) -> String {
        let separator = if self.endpoint.contains('?') { '&' } else { '?' };
        format!("{}{}token={}", self.endpoint, separator, api_key)
    }

    /// Frame that subscribes the connection to this feed's symbol
    pub fn subscribe_frame(&self) -> String {
        serde_json::json!({ "type": "subscribe", "symbol": self.symbol }).to_string()
    }

    /// Connection request: authenticated URL plus the subscribe frame
    pub fn connect_request(&self, api_key: &str) -> ConnectRequest {
        ConnectRequest::new(self.build_ws_url(api_key)).subscribe_frame(self.subscribe_frame())
    }

    /// Parse one message into a tick
    ///
    /// Only `type == "trade"` with a non-empty `data` array is accepted; the
    /// first record supplies price, time and (optionally) volume.
    pub fn parse_message(msg: &str) -> Result<RawTick, ParseError> {
        let message: FinnhubMessage =
            serde_json::from_str(msg).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

        match message.kind.as_str() {
            "trade" => {}
            "error" => {
                return Err(ParseError::FeedMessage(
                    message.msg.unwrap_or_else(|| "unspecified".to_string()),
                ))
            }
            other => return Err(ParseError::UnexpectedType(other.to_string())),
        }

        let first = message
            .data
            .and_then(|records| records.into_iter().next())
            .ok_or(ParseError::EmptyTrades)?;

        let trade: FinnhubTrade =
            serde_json::from_value(first).map_err(|e| ParseError::InvalidRecord(e.to_string()))?;

        let price = trade.p.to_decimal("price")?;
        let volume = trade
            .v
            .as_ref()
            .map(|v| v.to_decimal("volume"))
            .transpose()?;
        let trade_time = Utc
            .timestamp_millis_opt(trade.t)
            .single()
            .ok_or(ParseError::InvalidTime(trade.t))?;

        Ok(RawTick {
            price,
            volume,
            trade_time,
        })
    }
}
