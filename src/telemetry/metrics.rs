//! Prometheus metrics

use crate::feed::ConnectionStatus;
use metrics_exporter_prometheus::PrometheusBuilder;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::net::{Ipv4Addr, SocketAddr};

/// Feed counters
#[derive(Debug, Clone, Copy)]
pub enum FeedCounter {
    /// Trades parsed from the real feed
    TicksReceived,
    /// Feed messages discarded as malformed or irrelevant
    MessagesDropped,
    /// Connection attempts, including reconnects
    ConnectAttempts,
    /// Connections lost or refused
    Disconnects,
    /// Ticks produced by the simulated generator
    SyntheticTicks,
}

impl FeedCounter {
    fn name(self) -> &'static str {
        match self {
            FeedCounter::TicksReceived => "goldticker_feed_ticks_total",
            FeedCounter::MessagesDropped => "goldticker_feed_messages_dropped_total",
            FeedCounter::ConnectAttempts => "goldticker_feed_connect_attempts_total",
            FeedCounter::Disconnects => "goldticker_feed_disconnects_total",
            FeedCounter::SyntheticTicks => "goldticker_synthetic_ticks_total",
        }
    }
}

/// Increment a counter by one
pub fn increment(counter: FeedCounter) {
    metrics::counter!(counter.name()).increment(1);
}

/// Publish the latest snapshot price
pub fn record_price(price: Decimal) {
    if let Some(value) = price.to_f64() {
        metrics::gauge!("goldticker_last_price").set(value);
    }
}

/// Publish the connection status as 0 (connecting), 1 (live) or 2 (degraded)
pub fn record_status(status: ConnectionStatus) {
    metrics::gauge!("goldticker_connection_status").set(status_code(status));
}

fn status_code(status: ConnectionStatus) -> f64 {
    match status {
        ConnectionStatus::Connecting => 0.0,
        ConnectionStatus::Live => 1.0,
        ConnectionStatus::Degraded => 2.0,
    }
}

/// Serve `/metrics` on the given port
pub fn install_exporter(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics exporter: {}", e))?;

    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}
