//! Price feed module
//!
//! Real-time trades from the Finnhub WebSocket, plus a simulated generator
//! that fills in while the real feed is unavailable.

mod connector;
mod finnhub;
mod simulator;
mod types;

pub use connector::{ConnectorState, FeedConnector};
pub use finnhub::{FinnhubFeed, FINNHUB_WS_URL};
pub use simulator::{perturb, PriceReference, SimulatedGenerator, StatusGate, MIN_SYNTHETIC_PRICE};
pub use types::{ConnectionStatus, FeedError, ParseError, RawTick};

use crate::listener::Subscription;

/// Boxed tick callback, so producers can be used as `dyn TickProducer`
pub type TickListener = Box<dyn Fn(&RawTick) + Send + Sync>;

/// Anything that pushes raw ticks to listeners
pub trait TickProducer: Send + Sync {
    /// Register a tick listener
    fn on_tick(&self, listener: TickListener) -> Subscription;

    /// Stop producing; safe to call repeatedly
    fn stop(&self);

    /// Check if a background task is producing
    fn is_running(&self) -> bool;
}
