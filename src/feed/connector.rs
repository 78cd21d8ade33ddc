//! Feed connection lifecycle
//!
//! `Idle → Connecting → Live ⇄ Degraded`, with `Degraded → Connecting`
//! after a fixed reconnect delay. The connect/read/retry loop runs in one
//! task, so there is never more than one connection or reconnect timer;
//! `start` and `stop` cancel that task before anything else happens.

use super::finnhub::FinnhubFeed;
use super::types::{ConnectionStatus, FeedError, ParseError, RawTick};
use super::{TickListener, TickProducer};
use crate::config::FeedConfig;
use crate::listener::{Listeners, Subscription};
use crate::telemetry::{increment, FeedCounter};
use crate::ws::{ConnectRequest, Transport, WsConnection, WsError, WsMessage};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Internal connector state; `Idle` and `Unconfigured` have no task running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorState {
    /// Not started, or stopped
    Idle,
    /// Started without an API key; simulated data for the whole run
    Unconfigured,
    /// Opening a connection or waiting for its first trade
    Connecting,
    /// Receiving trades
    Live,
    /// Connection lost; reconnect pending
    Degraded,
}

impl ConnectorState {
    /// Status reported to listeners for this state
    pub fn status(self) -> Option<ConnectionStatus> {
        match self {
            ConnectorState::Idle => None,
            ConnectorState::Connecting => Some(ConnectionStatus::Connecting),
            ConnectorState::Live => Some(ConnectionStatus::Live),
            ConnectorState::Unconfigured | ConnectorState::Degraded => {
                Some(ConnectionStatus::Degraded)
            }
        }
    }
}

struct Lifecycle {
    /// Bumped by every start/stop; tasks from an older generation are mute
    generation: u64,
    state: ConnectorState,
    last_error: Option<FeedError>,
}

struct Shared {
    lifecycle: Mutex<Lifecycle>,
    tick_listeners: Listeners<RawTick>,
    status_listeners: Listeners<ConnectionStatus>,
}

impl Shared {
    fn is_current(&self, generation: u64) -> bool {
        self.lifecycle.lock().generation == generation
    }

    /// Move to `next` and notify; false if stale or already there
    fn transition(&self, generation: u64, next: ConnectorState) -> bool {
        let status = {
            let mut lifecycle = self.lifecycle.lock();
            if lifecycle.generation != generation || lifecycle.state == next {
                return false;
            }
            lifecycle.state = next;
            next.status()
        };

        if let Some(status) = status {
            tracing::info!(%status, "Feed status changed");
            self.status_listeners.emit(&status);
        }
        true
    }

    fn publish_tick(&self, generation: u64, tick: &RawTick) {
        if !self.is_current(generation) {
            return;
        }
        increment(FeedCounter::TicksReceived);
        self.tick_listeners.emit(tick);
    }

    fn record_error(&self, generation: u64, error: FeedError) {
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.generation == generation {
            lifecycle.last_error = Some(error);
        }
    }

    /// Invalidate the running generation and return to `Idle`
    fn halt(&self) -> u64 {
        let mut lifecycle = self.lifecycle.lock();
        lifecycle.generation += 1;
        lifecycle.state = ConnectorState::Idle;
        lifecycle.generation
    }
}

struct Running {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Owns the single connection to the price feed
pub struct FeedConnector {
    transport: Arc<dyn Transport>,
    shared: Arc<Shared>,
    running: Mutex<Option<Running>>,
}

impl FeedConnector {
    /// Create an idle connector on the given transport
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            shared: Arc::new(Shared {
                lifecycle: Mutex::new(Lifecycle {
                    generation: 0,
                    state: ConnectorState::Idle,
                    last_error: None,
                }),
                tick_listeners: Listeners::new(),
                status_listeners: Listeners::new(),
            }),
            running: Mutex::new(None),
        }
    }

    /// Begin connecting
    ///
    /// Without an API key no network call is ever made: the connector
    /// reports `Degraded` before returning and stays there. Restarting
    /// cancels any previous connection and pending reconnect. Must be called
    /// from within a Tokio runtime.
    pub fn start(&self, config: FeedConfig) {
        self.stop();
        let generation = self.shared.lifecycle.lock().generation;

        let Some(api_key) = config.api_key() else {
            tracing::warn!(
                symbol = %config.symbol,
                "No feed API key configured; serving simulated data"
            );
            self.shared.record_error(generation, FeedError::ConfigMissing);
            self.shared
                .transition(generation, ConnectorState::Unconfigured);
            return;
        };

        let feed = FinnhubFeed::new(&config.endpoint, &config.symbol);
        let request = feed
            .connect_request(api_key)
            .ping_interval(config.ping_interval())
            .connect_timeout(config.connect_timeout());

        tracing::info!(
            url = %request.redacted_url(),
            symbol = %feed.symbol(),
            "Starting price feed"
        );
        self.shared.transition(generation, ConnectorState::Connecting);

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_connection_loop(
            Arc::clone(&self.shared),
            Arc::clone(&self.transport),
            request,
            config.reconnect_delay(),
            generation,
            cancel.clone(),
        ));

        *self.running.lock() = Some(Running { cancel, task });
    }

    /// Register a status listener, called once per transition
    pub fn on_status_change(
        &self,
        listener: impl Fn(&ConnectionStatus) + Send + Sync + 'static,
    ) -> Subscription {
        self.shared.status_listeners.subscribe(listener)
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectorState {
        self.shared.lifecycle.lock().state
    }

    /// Status as reported to listeners; `None` while idle
    pub fn status(&self) -> Option<ConnectionStatus> {
        self.state().status()
    }

    /// Most recent failure absorbed by the connector
    pub fn last_error(&self) -> Option<FeedError> {
        self.shared.lifecycle.lock().last_error.clone()
    }
}

impl TickProducer for FeedConnector {
    fn on_tick(&self, listener: TickListener) -> Subscription {
        self.shared.tick_listeners.subscribe(listener)
    }

    /// Tear down the connection and any pending reconnect; idempotent
    fn stop(&self) {
        self.shared.halt();
        if let Some(running) = self.running.lock().take() {
            running.cancel.cancel();
            running.task.abort();
            tracing::info!("Price feed stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.running
            .lock()
            .as_ref()
            .is_some_and(|running| !running.task.is_finished())
    }
}

impl Drop for FeedConnector {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Connect, read until the connection fails, wait, repeat
async fn run_connection_loop(
    shared: Arc<Shared>,
    transport: Arc<dyn Transport>,
    request: ConnectRequest,
    reconnect_delay: Duration,
    generation: u64,
    cancel: CancellationToken,
) {
    let mut attempt: u64 = 0;

    loop {
        attempt += 1;
        shared.transition(generation, ConnectorState::Connecting);
        increment(FeedCounter::ConnectAttempts);

        let opened = tokio::select! {
            _ = cancel.cancelled() => return,
            opened = tokio::time::timeout(request.connect_timeout, transport.open(&request)) => {
                opened.unwrap_or_else(|_| Err(WsError::ConnectionFailed("connect timeout".into())))
            }
        };

        let failure = match opened {
            Ok(mut connection) => {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    failure = read_messages(&shared, &mut connection, generation) => failure,
                }
            }
            Err(e) => e,
        };

        if !shared.is_current(generation) {
            return;
        }

        increment(FeedCounter::Disconnects);
        tracing::warn!(
            error = %failure,
            attempt,
            delay_secs = reconnect_delay.as_secs(),
            "Feed connection lost, reconnecting after delay"
        );
        shared.record_error(generation, FeedError::Transport(failure));
        shared.transition(generation, ConnectorState::Degraded);

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(reconnect_delay) => {}
        }
    }
}

/// Forward ticks until the connection ends; returns why it ended
async fn read_messages(shared: &Shared, connection: &mut WsConnection, generation: u64) -> WsError {
    while let Some(msg) = connection.recv().await {
        match msg {
            WsMessage::Text(text) => match FinnhubFeed::parse_message(&text) {
                Ok(tick) => {
                    shared.transition(generation, ConnectorState::Live);
                    shared.publish_tick(generation, &tick);
                }
                Err(ParseError::FeedMessage(reason)) => {
                    increment(FeedCounter::MessagesDropped);
                    tracing::warn!(%reason, "Feed reported an error");
                }
                Err(e) => {
                    increment(FeedCounter::MessagesDropped);
                    tracing::debug!(error = %e, "Dropping feed message");
                }
            },
            WsMessage::Binary(data) => {
                // Finnhub only sends text frames
                tracing::debug!(len = data.len(), "Ignoring binary frame");
            }
            WsMessage::Closed { reason } => return WsError::Closed(reason),
            WsMessage::Error(e) => return WsError::ConnectionFailed(e),
        }
    }

    WsError::Closed(None)
}
