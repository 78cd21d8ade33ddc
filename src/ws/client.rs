//! WebSocket client built on tokio-tungstenite

use super::types::{ConnectRequest, WsConnection, WsError, WsMessage};
use super::Transport;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens one WebSocket connection per call; reconnection is left to the caller
#[derive(Debug, Clone)]
pub struct WsClient {
    channel_capacity: usize,
}

impl Default for WsClient {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
        }
    }
}

impl WsClient {
    /// Create a new client
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the inbound message buffer size
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Pump frames from the socket into `tx` until the socket or receiver goes away
    ///
    /// Answers pings, sends keepalive pings on `ping_interval`, and treats a
    /// missing pong by the next ping as a dead connection.
    async fn pump(ws_stream: WsStream, tx: mpsc::Sender<WsMessage>, ping_interval: Duration) {
        let (mut write, mut read) = ws_stream.split();
        let ping_interval = ping_interval.max(Duration::from_secs(1));

        let mut ping = interval_at(Instant::now() + ping_interval, ping_interval);
        ping.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut waiting_for_pong = false;

        loop {
            tokio::select! {
                msg = read.next() => {
                    let forward = match msg {
                        Some(Ok(Message::Text(text))) => WsMessage::Text(text),
                        Some(Ok(Message::Binary(data))) => WsMessage::Binary(data),
                        Some(Ok(Message::Ping(data))) => {
                            if let Err(e) = write.send(Message::Pong(data)).await {
                                let _ = tx.send(WsMessage::Error(e.to_string())).await;
                                return;
                            }
                            continue;
                        }
                        Some(Ok(Message::Pong(_))) => {
                            waiting_for_pong = false;
                            continue;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            tracing::info!("Received close frame");
                            let reason = frame
                                .map(|f| f.reason.into_owned())
                                .filter(|r| !r.is_empty());
                            let _ = tx.send(WsMessage::Closed { reason }).await;
                            return;
                        }
                        Some(Ok(Message::Frame(_))) => continue,
                        Some(Err(e)) => {
                            let _ = tx.send(WsMessage::Error(e.to_string())).await;
                            return;
                        }
                        None => {
                            let _ = tx
                                .send(WsMessage::Closed {
                                    reason: Some("Stream ended unexpectedly".into()),
                                })
                                .await;
                            return;
                        }
                    };

                    if tx.send(forward).await.is_err() {
                        tracing::debug!("Receiver dropped, closing connection");
                        return;
                    }
                }

                _ = ping.tick() => {
                    if waiting_for_pong {
                        let _ = tx.send(WsMessage::Error("Pong timeout".into())).await;
                        return;
                    }
                    if let Err(e) = write.send(Message::Ping(vec![])).await {
                        let _ = tx.send(WsMessage::Error(e.to_string())).await;
                        return;
                    }
                    waiting_for_pong = true;
                }

                _ = tx.closed() => {
                    tracing::debug!("Receiver dropped, closing connection");
                    let _ = write.send(Message::Close(None)).await;
                    return;
                }
            }
        }
    }
}

#[async_trait]
impl Transport for WsClient {
    async fn open(&self, request: &ConnectRequest) -> Result<WsConnection, WsError> {
        tracing::info!(url = %request.redacted_url(), "Connecting to WebSocket");

        let (mut ws_stream, _response) = connect_async(request.url.as_str())
            .await
            .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;

        for frame in &request.subscribe {
            ws_stream
                .send(Message::Text(frame.clone()))
                .await
                .map_err(|e| WsError::SendFailed(e.to_string()))?;
        }

        tracing::info!(url = %request.redacted_url(), "WebSocket connected");

        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let ping_interval = request.ping_interval;
        let pump = tokio::spawn(Self::pump(ws_stream, tx, ping_interval));

        Ok(WsConnection::new(rx, pump))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_client_defaults() {
        let client = WsClient::new();
        assert_eq!(client.channel_capacity, 1024);
    }

    #[test]
    fn test_channel_capacity_never_zero() {
        let client = WsClient::new().channel_capacity(0);
        assert_eq!(client.channel_capacity, 1);
    }

    #[tokio::test]
    async fn test_ws_client_connection_failure() {
        // Nothing listens on port 1; the connect must fail rather than hang
        let client = WsClient::new();
        let request = ConnectRequest::new("ws://127.0.0.1:1");

        let result =
            tokio::time::timeout(Duration::from_secs(5), client.open(&request)).await;

        let err = result.expect("connect timed out").unwrap_err();
        assert!(matches!(err, WsError::ConnectionFailed(_)));
    }
}
