//! Integration tests for the ingestion pipeline

use gold_ticker::config::Config;
use gold_ticker::feed::ConnectionStatus;
use gold_ticker::pipeline::PricePipeline;
use gold_ticker::snapshot::PriceSnapshot;
use gold_ticker::ws::{MemoryTransport, WsMessage};
use parking_lot::Mutex;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;

async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

fn config(api_key: Option<&str>) -> Config {
    let mut config = Config::default().with_api_key_override(api_key.map(str::to_string));
    config.simulator.seed = Some(99);
    config
}

#[tokio::test(start_paused = true)]
async fn test_unconfigured_pipeline_is_never_live() {
    let transport = Arc::new(MemoryTransport::new());
    let pipeline = PricePipeline::with_transport(config(None), transport.clone());

    let statuses = Arc::new(Mutex::new(Vec::new()));
    let _sub = {
        let statuses = statuses.clone();
        pipeline.subscribe_status(move |s| statuses.lock().push(*s))
    };

    pipeline.start();
    assert_eq!(pipeline.status(), ConnectionStatus::Degraded);

    tokio::time::advance(Duration::from_secs(60)).await;
    settle().await;

    assert_eq!(transport.attempts(), 0);
    assert_eq!(
        *statuses.lock(),
        vec![ConnectionStatus::Connecting, ConnectionStatus::Degraded]
    );
    assert!(!pipeline.snapshot().is_live);
}

#[tokio::test(start_paused = true)]
async fn test_simulated_snapshots_keep_invariants() {
    let pipeline = PricePipeline::with_transport(config(None), Arc::new(MemoryTransport::new()));

    let snapshots: Arc<Mutex<Vec<PriceSnapshot>>> = Arc::new(Mutex::new(Vec::new()));
    let _sub = {
        let snapshots = snapshots.clone();
        pipeline.subscribe_snapshot(move |s| snapshots.lock().push(s.clone()))
    };

    pipeline.start();
    for _ in 0..50 {
        tokio::time::advance(Duration::from_millis(2_000)).await;
        settle().await;
    }
    pipeline.stop();

    let snapshots = snapshots.lock();
    assert_eq!(snapshots.len(), 51);
    for pair in snapshots.windows(2) {
        let (previous, next) = (&pair[0], &pair[1]);
        assert!(next.high_24h >= next.price && next.price >= next.low_24h);
        assert_eq!(next.bid, next.price - dec!(0.05));
        assert_eq!(next.ask, next.price + dec!(0.07));
        assert_eq!(next.change, next.price - previous.price);
        assert!(next.timestamp >= previous.timestamp);
        assert_eq!(next.volume_24h, dec!(45200));
        assert!(!next.is_live);
    }
}

#[tokio::test(start_paused = true)]
async fn test_live_feed_overrides_simulation() {
    let transport = Arc::new(MemoryTransport::new());
    transport.push_failure("connection refused");
    let tx = transport.push_connection();
    let pipeline = PricePipeline::with_transport(config(Some("key")), transport.clone());

    pipeline.start();
    settle().await;
    assert_eq!(pipeline.status(), ConnectionStatus::Degraded);
    assert!(pipeline.is_simulating());

    tokio::time::advance(Duration::from_secs(5)).await;
    settle().await;
    assert_eq!(pipeline.status(), ConnectionStatus::Connecting);

    tx.send(WsMessage::Text(
        r#"{"type":"trade","data":[{"p":"2900.00","t":1704067260000,"v":"3.5"}]}"#.into(),
    ))
    .await
    .unwrap();
    settle().await;

    let snapshot = pipeline.snapshot();
    assert_eq!(pipeline.status(), ConnectionStatus::Live);
    assert!(snapshot.is_live);
    assert_eq!(snapshot.price, dec!(2900.00));
    assert_eq!(snapshot.high_24h, dec!(2900.00));
    assert_eq!(snapshot.volume_24h, dec!(3.5));

    // Generator is stopped; time passing changes nothing
    tokio::time::advance(Duration::from_secs(10)).await;
    settle().await;
    assert_eq!(pipeline.snapshot(), snapshot);
}
