//! Integration tests for price feed module

use gold_ticker::config::FeedConfig;
use gold_ticker::feed::{
    ConnectionStatus, ConnectorState, FeedConnector, FeedError, FinnhubFeed, RawTick,
    TickProducer,
};
use gold_ticker::ws::{MemoryTransport, WsError, WsMessage};
use parking_lot::Mutex;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;

async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

fn keyed_config() -> FeedConfig {
    FeedConfig {
        api_key: Some("secret".into()),
        symbol: "OANDA:XAU_USD".into(),
        ..FeedConfig::default()
    }
}

#[test]
fn test_parse_finnhub_trade() {
    let tick = FinnhubFeed::parse_message(
        r#"{"type":"trade","data":[{"s":"OANDA:XAU_USD","p":2850.5,"t":1704067200000,"v":0}]}"#,
    )
    .unwrap();
    assert_eq!(tick.price, dec!(2850.5));
    assert_eq!(tick.volume, Some(dec!(0)));
}

#[tokio::test(start_paused = true)]
async fn test_connector_subscribes_with_token() {
    let transport = Arc::new(MemoryTransport::new());
    let _tx = transport.push_connection();
    let connector = FeedConnector::new(transport.clone());

    connector.start(keyed_config());
    settle().await;

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, "wss://ws.finnhub.io?token=secret");
    assert_eq!(requests[0].redacted_url(), "wss://ws.finnhub.io");
    assert_eq!(
        requests[0].subscribe,
        vec![r#"{"symbol":"OANDA:XAU_USD","type":"subscribe"}"#.to_string()]
    );
    assert_eq!(connector.state(), ConnectorState::Connecting);
}

#[tokio::test(start_paused = true)]
async fn test_connector_recovers_after_close() {
    let transport = Arc::new(MemoryTransport::new());
    let first = transport.push_connection();
    let second = transport.push_connection();
    let connector = FeedConnector::new(transport.clone());

    let statuses = Arc::new(Mutex::new(Vec::new()));
    let _sub = {
        let statuses = statuses.clone();
        connector.on_status_change(move |s| statuses.lock().push(*s))
    };
    let prices = Arc::new(Mutex::new(Vec::new()));
    let _ticks = {
        let prices = prices.clone();
        connector.on_tick(Box::new(move |t: &RawTick| prices.lock().push(t.price)))
    };

    connector.start(keyed_config());
    settle().await;

    let trade = |p: &str| WsMessage::Text(format!(r#"{{"type":"trade","data":[{{"p":{p},"t":1704067200000}}]}}"#));
    first.send(trade("2846.10")).await.unwrap();
    first
        .send(WsMessage::Closed {
            reason: Some("server restart".into()),
        })
        .await
        .unwrap();
    settle().await;

    assert_eq!(connector.status(), Some(ConnectionStatus::Degraded));
    assert_eq!(
        connector.last_error(),
        Some(FeedError::Transport(WsError::Closed(Some(
            "server restart".into()
        ))))
    );

    tokio::time::advance(Duration::from_secs(5)).await;
    settle().await;
    second.send(trade("2847.00")).await.unwrap();
    settle().await;

    assert_eq!(transport.attempts(), 2);
    assert_eq!(*prices.lock(), vec![dec!(2846.10), dec!(2847.00)]);
    assert_eq!(
        *statuses.lock(),
        vec![
            ConnectionStatus::Connecting,
            ConnectionStatus::Live,
            ConnectionStatus::Degraded,
            ConnectionStatus::Connecting,
            ConnectionStatus::Live,
        ]
    );

    connector.stop();
    assert!(!connector.is_running());
}
