//! Shared snapshot and status, with a single active writer

use super::reducer::{reduce, reduce_synthetic};
use super::types::PriceSnapshot;
use crate::feed::{ConnectionStatus, RawTick};
use crate::listener::{Listeners, Subscription};
use crate::telemetry::{record_price, record_status};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Which producer may currently write the snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Writer {
    /// The real feed connector
    Feed,
    /// The simulated generator
    Simulator,
}

struct State {
    snapshot: PriceSnapshot,
    status: ConnectionStatus,
    writer: Writer,
}

/// Owner of the current snapshot and connection status
///
/// The writer token follows the status: `Live` hands it to the feed,
/// `Degraded` to the simulator, `Connecting` leaves it where it is. Ticks
/// from the producer not holding it are dropped.
pub struct PriceStore {
    state: Mutex<State>,
    snapshot_listeners: Listeners<PriceSnapshot>,
    status_listeners: Listeners<ConnectionStatus>,
}

impl PriceStore {
    /// Create a store holding `seed`, status `Connecting`
    pub fn new(seed: PriceSnapshot) -> Self {
        Self {
            state: Mutex::new(State {
                snapshot: seed,
                status: ConnectionStatus::Connecting,
                writer: Writer::Simulator,
            }),
            snapshot_listeners: Listeners::new(),
            status_listeners: Listeners::new(),
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> PriceSnapshot {
        self.state.lock().snapshot.clone()
    }

    /// Current status
    pub fn status(&self) -> ConnectionStatus {
        self.state.lock().status
    }

    /// Current writer token holder
    pub fn writer(&self) -> Writer {
        self.state.lock().writer
    }

    /// Current price
    pub fn price(&self) -> Decimal {
        self.state.lock().snapshot.price
    }

    /// Register a snapshot listener; it is called with the current snapshot
    /// before this returns, then with every update
    pub fn subscribe_snapshot(
        &self,
        listener: impl Fn(&PriceSnapshot) + Send + Sync + 'static,
    ) -> Subscription {
        let listener = Arc::new(listener);
        let (current, subscription) = {
            let state = self.state.lock();
            let registered = Arc::clone(&listener);
            let subscription = self
                .snapshot_listeners
                .subscribe(move |snapshot| registered(snapshot));
            (state.snapshot.clone(), subscription)
        };
        listener(&current);
        subscription
    }

    /// Register a status listener; replays the current status first
    pub fn subscribe_status(
        &self,
        listener: impl Fn(&ConnectionStatus) + Send + Sync + 'static,
    ) -> Subscription {
        let listener = Arc::new(listener);
        let (current, subscription) = {
            let state = self.state.lock();
            let registered = Arc::clone(&listener);
            let subscription = self
                .status_listeners
                .subscribe(move |status| registered(status));
            (state.status, subscription)
        };
        listener(&current);
        subscription
    }

    /// Record a status transition and move the writer token; false if unchanged
    pub fn set_status(&self, status: ConnectionStatus) -> bool {
        {
            let mut state = self.state.lock();
            if state.status == status {
                return false;
            }
            state.status = status;
            match status {
                ConnectionStatus::Live => state.writer = Writer::Feed,
                ConnectionStatus::Degraded => state.writer = Writer::Simulator,
                ConnectionStatus::Connecting => {}
            }
        }

        record_status(status);
        self.status_listeners.emit(&status);
        true
    }

    /// Fold a real feed tick; `None` if the feed does not hold the token
    pub fn apply_live(&self, tick: &RawTick) -> Option<PriceSnapshot> {
        self.apply(Writer::Feed, tick)
    }

    /// Fold a synthetic tick; `None` if the simulator does not hold the token
    pub fn apply_synthetic(&self, tick: &RawTick) -> Option<PriceSnapshot> {
        self.apply(Writer::Simulator, tick)
    }

    /// Fold a tick from `source`; `None` if `source` does not hold the token
    pub fn apply(&self, source: Writer, tick: &RawTick) -> Option<PriceSnapshot> {
        let next = {
            let mut state = self.state.lock();
            if state.writer != source {
                tracing::debug!(?source, writer = ?state.writer, "Dropping tick from inactive writer");
                return None;
            }
            let next = match source {
                Writer::Feed => reduce(&state.snapshot, tick),
                Writer::Simulator => reduce_synthetic(&state.snapshot, tick),
            };
            state.snapshot = next.clone();
            next
        };

        record_price(next.price);
        self.snapshot_listeners.emit(&next);
        Some(next)
    }
}
