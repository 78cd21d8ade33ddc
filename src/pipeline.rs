//! Ingestion pipeline
//!
//! Wires the feed connector and the simulated generator into one snapshot
//! store. Status transitions drive the hand-off: `Live` gives the feed the
//! writer token and stops the generator, `Degraded` gives it back and starts
//! the generator.

use crate::config::Config;
use crate::feed::{
    ConnectionStatus, ConnectorState, FeedConnector, FeedError, RawTick, SimulatedGenerator,
    TickProducer,
};
use crate::listener::Subscription;
use crate::snapshot::{PriceSnapshot, PriceStore, Writer};
use crate::ws::{Transport, WsClient};
use chrono::Utc;
use std::sync::Arc;

/// Owns the current snapshot and everything that writes it
pub struct PricePipeline {
    config: Config,
    store: Arc<PriceStore>,
    connector: Arc<FeedConnector>,
    generator: Arc<SimulatedGenerator>,
    _wiring: Vec<Subscription>,
}

impl PricePipeline {
    /// Create a stopped pipeline using the real WebSocket transport
    pub fn new(config: Config) -> Self {
        Self::with_transport(config, Arc::new(WsClient::default()))
    }

    /// Create a stopped pipeline on the given transport
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Self {
        let store = Arc::new(PriceStore::new(config.snapshot.seed(Utc::now())));
        let connector = Arc::new(FeedConnector::new(transport));

        let generator = Arc::new(SimulatedGenerator::new(
            config.simulator.clone(),
            {
                let store = Arc::clone(&store);
                Arc::new(move || store.status())
            },
            {
                let store = Arc::clone(&store);
                Arc::new(move || store.price())
            },
        ));

        let on_status = {
            let store = Arc::clone(&store);
            let generator = Arc::clone(&generator);
            connector.on_status_change(move |status| {
                store.set_status(*status);
                match status {
                    ConnectionStatus::Live => generator.stop(),
                    ConnectionStatus::Degraded => generator.start(),
                    ConnectionStatus::Connecting => {}
                }
            })
        };

        let on_live_tick = forward_ticks(connector.as_ref(), &store, Writer::Feed);
        let on_synthetic_tick = forward_ticks(generator.as_ref(), &store, Writer::Simulator);

        Self {
            config,
            store,
            connector,
            generator,
            _wiring: vec![on_status, on_live_tick, on_synthetic_tick],
        }
    }

    /// Start the feed, or the generator alone when no API key is configured
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) {
        tracing::info!(symbol = %self.config.feed.symbol, "Starting price pipeline");
        self.connector.start(self.config.feed.clone());
    }

    /// Stop the feed and the generator; idempotent
    pub fn stop(&self) {
        for producer in self.producers() {
            producer.stop();
        }
    }

    fn producers(&self) -> [&dyn TickProducer; 2] {
        [&*self.connector as &dyn TickProducer, &*self.generator]
    }

    /// Current snapshot
    pub fn snapshot(&self) -> PriceSnapshot {
        self.store.snapshot()
    }

    /// Current connection status
    pub fn status(&self) -> ConnectionStatus {
        self.store.status()
    }

    /// Register a snapshot listener; replays the current snapshot first
    pub fn subscribe_snapshot(
        &self,
        listener: impl Fn(&PriceSnapshot) + Send + Sync + 'static,
    ) -> Subscription {
        self.store.subscribe_snapshot(listener)
    }

    /// Register a status listener; replays the current status first
    pub fn subscribe_status(
        &self,
        listener: impl Fn(&ConnectionStatus) + Send + Sync + 'static,
    ) -> Subscription {
        self.store.subscribe_status(listener)
    }

    /// Most recent failure absorbed by the feed connector
    pub fn last_error(&self) -> Option<FeedError> {
        self.connector.last_error()
    }

    /// Feed connector lifecycle state
    pub fn connector_state(&self) -> ConnectorState {
        self.connector.state()
    }

    /// Check if synthetic ticks are being produced
    pub fn is_simulating(&self) -> bool {
        self.generator.is_running()
    }
}

/// Route a producer's ticks into the store under `writer`
pub fn forward_ticks(
    producer: &dyn TickProducer,
    store: &Arc<PriceStore>,
    writer: Writer,
) -> Subscription {
    let store = Arc::clone(store);
    producer.on_tick(Box::new(move |tick: &RawTick| {
        store.apply(writer, tick);
    }))
}

impl Drop for PricePipeline {
    fn drop(&mut self) {
        self.stop();
    }
}
