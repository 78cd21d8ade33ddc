//! Simulated price generator
//!
//! Stands in for the real feed while it is unconfigured or degraded: one
//! synthetic tick per interval, a random walk around the current price.

use super::types::{ConnectionStatus, RawTick};
use super::{TickListener, TickProducer};
use crate::config::SimulatorConfig;
use crate::listener::{Listeners, Subscription};
use crate::telemetry::{increment, FeedCounter};
use chrono::Utc;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Synthetic prices never drop below one cent
pub const MIN_SYNTHETIC_PRICE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Reads the current connection status before each emission
pub type StatusGate = Arc<dyn Fn() -> ConnectionStatus + Send + Sync>;

/// Reads the price the next step starts from
pub type PriceReference = Arc<dyn Fn() -> Decimal + Send + Sync>;

struct Running {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Random-walk tick producer
pub struct SimulatedGenerator {
    config: SimulatorConfig,
    gate: StatusGate,
    reference: PriceReference,
    rng: Arc<Mutex<StdRng>>,
    listeners: Listeners<RawTick>,
    running: Mutex<Option<Running>>,
}

impl SimulatedGenerator {
    /// Create a stopped generator
    pub fn new(config: SimulatorConfig, gate: StatusGate, reference: PriceReference) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            config,
            gate,
            reference,
            rng: Arc::new(Mutex::new(rng)),
            listeners: Listeners::new(),
            running: Mutex::new(None),
        }
    }

    /// Start emitting; the first tick comes one interval from now
    ///
    /// No-op while already running. Must be called from within a Tokio
    /// runtime.
    pub fn start(&self) {
        let mut running = self.running.lock();
        if running
            .as_ref()
            .is_some_and(|running| !running.task.is_finished())
        {
            return;
        }

        // interval_at panics on a zero period
        let period = self.config.interval().max(Duration::from_millis(1));
        let max_step = self.config.max_step;
        let first_tick = Instant::now() + period;
        let cancel = CancellationToken::new();

        let task = tokio::spawn({
            let cancel = cancel.clone();
            let gate = Arc::clone(&self.gate);
            let reference = Arc::clone(&self.reference);
            let rng = Arc::clone(&self.rng);
            let listeners = self.listeners.clone();

            async move {
                let mut ticker = interval_at(first_tick, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = ticker.tick() => {}
                    }

                    if gate().is_live() {
                        tracing::debug!("Feed is live, skipping synthetic tick");
                        continue;
                    }

                    let price = {
                        let mut rng = rng.lock();
                        perturb(reference(), max_step, &mut *rng)
                    };

                    increment(FeedCounter::SyntheticTicks);
                    listeners.emit(&RawTick::new(price, Utc::now()));
                }
            }
        });

        tracing::info!(interval_ms = period.as_millis() as u64, "Simulated feed started");
        *running = Some(Running { cancel, task });
    }
}

impl TickProducer for SimulatedGenerator {
    fn on_tick(&self, listener: TickListener) -> Subscription {
        self.listeners.subscribe(listener)
    }

    /// Cancel the interval; idempotent
    fn stop(&self) {
        if let Some(running) = self.running.lock().take() {
            running.cancel.cancel();
            running.task.abort();
            tracing::info!("Simulated feed stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.running
            .lock()
            .as_ref()
            .is_some_and(|running| !running.task.is_finished())
    }
}

impl Drop for SimulatedGenerator {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Move `price` by a uniform random step in whole cents within `±max_step`
pub fn perturb(price: Decimal, max_step: Decimal, rng: &mut impl Rng) -> Decimal {
    // Steps too large to express in i64 cents do not move the price
    let max_cents = max_step
        .abs()
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|cents| cents.trunc().to_i64())
        .unwrap_or(0);
    let cents = if max_cents == 0 {
        0
    } else {
        rng.random_range(-max_cents..=max_cents)
    };

    price
        .checked_add(Decimal::new(cents, 2))
        .unwrap_or(price)
        .max(MIN_SYNTHETIC_PRICE)
}
