//! Configuration types for gold-ticker

use crate::feed::FINNHUB_WS_URL;
use crate::snapshot::PriceSnapshot;
use crate::telemetry::LogFormat;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable overriding `feed.api_key`
pub const API_KEY_ENV: &str = "FINNHUB_API_KEY";

/// Largest accepted `simulator.max_step`
pub const MAX_SIMULATOR_STEP: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub feed: FeedConfig,
    pub simulator: SimulatorConfig,
    pub snapshot: SnapshotConfig,
    pub telemetry: TelemetryConfig,
}

/// Price feed configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// WebSocket endpoint, without the token
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Instrument to subscribe to
    #[serde(default = "default_symbol")]
    pub symbol: String,

    /// Feed API key; absent means simulated data only
    #[serde(default)]
    pub api_key: Option<String>,

    /// Delay before reconnecting after a failure (seconds)
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,

    /// Keepalive ping interval (seconds)
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,

    /// Give up on a connect attempt after this long (seconds)
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_endpoint() -> String {
    FINNHUB_WS_URL.to_string()
}
fn default_symbol() -> String {
    "OANDA:XAU_USD".to_string()
}
fn default_reconnect_delay_secs() -> u64 {
    5
}
fn default_ping_interval_secs() -> u64 {
    30
}
fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            symbol: default_symbol(),
            api_key: None,
            reconnect_delay_secs: default_reconnect_delay_secs(),
            ping_interval_secs: default_ping_interval_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl FeedConfig {
    /// API key, if one is set and not blank
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Simulated generator configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SimulatorConfig {
    /// Time between synthetic ticks (milliseconds)
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Largest price move per tick, either direction
    #[serde(default = "default_max_step")]
    pub max_step: Decimal,

    /// RNG seed for reproducible runs
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_interval_ms() -> u64 {
    2_000
}
fn default_max_step() -> Decimal {
    Decimal::new(50, 2) // 0.50
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_step: default_max_step(),
            seed: None,
        }
    }
}

impl SimulatorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Initial snapshot values
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotConfig {
    #[serde(default = "default_seed_price")]
    pub price: Decimal,
    #[serde(default = "default_seed_high")]
    pub high_24h: Decimal,
    #[serde(default = "default_seed_low")]
    pub low_24h: Decimal,
    #[serde(default = "default_seed_volume")]
    pub volume_24h: Decimal,
}

fn default_seed_price() -> Decimal {
    Decimal::new(284532, 2) // 2845.32
}
fn default_seed_high() -> Decimal {
    Decimal::new(284790, 2) // 2847.90
}
fn default_seed_low() -> Decimal {
    Decimal::new(283815, 2) // 2838.15
}
fn default_seed_volume() -> Decimal {
    Decimal::new(45200, 0)
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            price: default_seed_price(),
            high_24h: default_seed_high(),
            low_24h: default_seed_low(),
            volume_24h: default_seed_volume(),
        }
    }
}

impl SnapshotConfig {
    /// Seed snapshot stamped with `timestamp`
    pub fn seed(&self, timestamp: DateTime<Utc>) -> PriceSnapshot {
        PriceSnapshot::seed(
            self.price,
            self.high_24h,
            self.low_24h,
            self.volume_24h,
            timestamp,
        )
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    /// Prometheus exporter port; no exporter when unset
    #[serde(default)]
    pub metrics_port: Option<u16>,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            metrics_port: None,
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

/// Rejected configuration values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),
    #[error("snapshot.price must be positive, got {0}")]
    NonPositivePrice(Decimal),
    #[error("snapshot.price {price} outside [{low}, {high}]")]
    SeedOutsideRange {
        price: Decimal,
        low: Decimal,
        high: Decimal,
    },
    #[error("simulator.max_step must not be negative, got {0}")]
    NegativeStep(Decimal),
    #[error("simulator.max_step must be at most {max}, got {0}", max = MAX_SIMULATOR_STEP)]
    StepTooLarge(Decimal),
    #[error("feed.symbol must not be empty")]
    EmptySymbol,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Apply environment overrides (`FINNHUB_API_KEY`)
    pub fn with_env_overrides(self) -> Self {
        self.with_api_key_override(std::env::var(API_KEY_ENV).ok())
    }

    /// Replace the API key when `key` is set and not blank
    pub fn with_api_key_override(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.feed.api_key = Some(key);
        }
        self
    }

    /// Check values that would otherwise misbehave at runtime
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed.symbol.trim().is_empty() {
            return Err(ConfigError::EmptySymbol);
        }
        if self.feed.reconnect_delay_secs == 0 {
            return Err(ConfigError::ZeroInterval("feed.reconnect_delay_secs"));
        }
        if self.feed.ping_interval_secs == 0 {
            return Err(ConfigError::ZeroInterval("feed.ping_interval_secs"));
        }
        if self.feed.connect_timeout_secs == 0 {
            return Err(ConfigError::ZeroInterval("feed.connect_timeout_secs"));
        }
        if self.simulator.interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("simulator.interval_ms"));
        }
        if self.simulator.max_step.is_sign_negative() && !self.simulator.max_step.is_zero() {
            return Err(ConfigError::NegativeStep(self.simulator.max_step));
        }
        if self.simulator.max_step > MAX_SIMULATOR_STEP {
            return Err(ConfigError::StepTooLarge(self.simulator.max_step));
        }

        let seed = &self.snapshot;
        if seed.price <= Decimal::ZERO {
            return Err(ConfigError::NonPositivePrice(seed.price));
        }
        if seed.price > seed.high_24h || seed.price < seed.low_24h {
            return Err(ConfigError::SeedOutsideRange {
                price: seed.price,
                low: seed.low_24h,
                high: seed.high_24h,
            });
        }

        Ok(())
    }

    /// API key with all but the last four characters hidden
    pub fn masked_api_key(&self) -> String {
        match self.feed.api_key() {
            None => "(not set)".to_string(),
            Some(key) => {
                let chars: Vec<char> = key.chars().collect();
                if chars.len() <= 4 {
                    return "*".repeat(chars.len());
                }
                let hidden = chars.len() - 4;
                let tail: String = chars[hidden..].iter().collect();
                format!("{}{}", "*".repeat(hidden), tail)
            }
        }
    }
}
