//! WebSocket types and configuration

use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Parameters for opening one WebSocket connection
#[derive(Debug, Clone)]
pub struct ConnectRequest {
    /// WebSocket URL to connect to (may carry credentials in its query)
    pub url: String,
    /// Text frames sent right after the handshake
    pub subscribe: Vec<String>,
    /// Interval for sending ping frames
    pub ping_interval: Duration,
    /// Longest the handshake and subscribe may take
    pub connect_timeout: Duration,
}

impl ConnectRequest {
    /// Create a request with no subscribe frames and the default ping interval
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            subscribe: Vec::new(),
            ping_interval: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Queue a text frame to send after connecting
    pub fn subscribe_frame(mut self, frame: impl Into<String>) -> Self {
        self.subscribe.push(frame.into());
        self
    }

    /// Set ping interval
    pub fn ping_interval(mut self, d: Duration) -> Self {
        self.ping_interval = d;
        self
    }

    /// Set connect timeout
    pub fn connect_timeout(mut self, d: Duration) -> Self {
        self.connect_timeout = d;
        self
    }

    /// URL safe for logs: the query string (API token) is dropped
    pub fn redacted_url(&self) -> &str {
        self.url.split('?').next().unwrap_or_default()
    }
}

/// WebSocket message types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsMessage {
    /// Text message
    Text(String),
    /// Binary message
    Binary(Vec<u8>),
    /// Peer closed the connection
    Closed { reason: Option<String> },
    /// Transport failed; the connection is unusable
    Error(String),
}

/// WebSocket errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WsError {
    /// Connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    /// Connection was closed by the peer
    #[error("Connection closed{}", close_suffix(.0))]
    Closed(Option<String>),
    /// Send failed
    #[error("Send failed: {0}")]
    SendFailed(String),
}

fn close_suffix(reason: &Option<String>) -> String {
    reason
        .as_deref()
        .map(|r| format!(": {r}"))
        .unwrap_or_default()
}

/// An open connection: a stream of inbound messages plus the task pumping it
///
/// Dropping the connection aborts the pump task, which closes the socket.
#[derive(Debug)]
pub struct WsConnection {
    events: mpsc::Receiver<WsMessage>,
    pump: Option<JoinHandle<()>>,
}

impl WsConnection {
    /// Wrap a message channel fed by a background pump task
    pub fn new(events: mpsc::Receiver<WsMessage>, pump: JoinHandle<()>) -> Self {
        Self {
            events,
            pump: Some(pump),
        }
    }

    /// Wrap a bare channel (in-process transports)
    pub fn from_channel(events: mpsc::Receiver<WsMessage>) -> Self {
        Self { events, pump: None }
    }

    /// Next inbound message; `None` once the pump has gone away
    pub async fn recv(&mut self) -> Option<WsMessage> {
        self.events.recv().await
    }
}

impl Drop for WsConnection {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_request_defaults() {
        let request = ConnectRequest::new("wss://example.com");
        assert_eq!(request.url, "wss://example.com");
        assert!(request.subscribe.is_empty());
        assert_eq!(request.ping_interval, Duration::from_secs(30));
        assert_eq!(request.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_connect_request_builder() {
        let request = ConnectRequest::new("wss://example.com")
            .subscribe_frame(r#"{"type":"subscribe"}"#)
            .ping_interval(Duration::from_secs(15))
            .connect_timeout(Duration::from_secs(3));

        assert_eq!(request.subscribe.len(), 1);
        assert_eq!(request.ping_interval, Duration::from_secs(15));
        assert_eq!(request.connect_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_redacted_url_drops_token() {
        let request = ConnectRequest::new("wss://ws.finnhub.io?token=secret");
        assert_eq!(request.redacted_url(), "wss://ws.finnhub.io");

        let request = ConnectRequest::new("wss://ws.finnhub.io");
        assert_eq!(request.redacted_url(), "wss://ws.finnhub.io");
    }

    #[test]
    fn test_ws_error_display() {
        let err = WsError::ConnectionFailed("timeout".to_string());
        assert_eq!(err.to_string(), "Connection failed: timeout");

        let err = WsError::Closed(None);
        assert_eq!(err.to_string(), "Connection closed");

        let err = WsError::Closed(Some("going away".to_string()));
        assert_eq!(err.to_string(), "Connection closed: going away");
    }

    #[tokio::test]
    async fn test_connection_from_channel() {
        let (tx, rx) = mpsc::channel(4);
        let mut conn = WsConnection::from_channel(rx);

        tx.send(WsMessage::Text("hello".to_string())).await.unwrap();
        drop(tx);

        assert_eq!(conn.recv().await, Some(WsMessage::Text("hello".to_string())));
        assert_eq!(conn.recv().await, None);
    }
}
