//! End-to-end integration tests

use gold_ticker::config::{Config, ConfigError};
use gold_ticker::feed::ConnectionStatus;
use gold_ticker::pipeline::PricePipeline;
use gold_ticker::ws::MemoryTransport;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

#[test]
fn test_config_example_loads() {
    let config: Config = toml::from_str(include_str!("../../config.toml.example")).unwrap();
    assert_ok!(config.validate());
    assert_eq!(config.feed.symbol, "OANDA:XAU_USD");
    assert!(config.feed.api_key().is_none());
    assert_eq!(config.snapshot.price, dec!(2845.32));
}

#[test]
fn test_invalid_config_rejected() {
    let config: Config = toml::from_str(
        r#"
        [snapshot]
        price = 2900
        high_24h = 2850
        low_24h = 2800
        "#,
    )
    .unwrap();

    let err = assert_err!(config.validate());
    assert!(matches!(err, ConfigError::SeedOutsideRange { .. }));
}

#[test]
fn test_new_pipeline_holds_seed() {
    let pipeline = PricePipeline::with_transport(Config::default(), Arc::new(MemoryTransport::new()));
    assert_eq!(pipeline.status(), ConnectionStatus::Connecting);
    assert_eq!(pipeline.snapshot().price, dec!(2845.32));
    assert!(!pipeline.is_simulating());
    assert!(pipeline.last_error().is_none());
}
