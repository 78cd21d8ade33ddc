//! In-process transport with scripted connections
//!
//! Each `open` consumes the next scripted outcome: either a live connection
//! driven through the returned [`mpsc::Sender`], or a connect failure. Used
//! to exercise the connector and pipeline without a network.

use super::types::{ConnectRequest, WsConnection, WsError, WsMessage};
use super::Transport;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::sync::mpsc;

enum Scripted {
    Connection(mpsc::Receiver<WsMessage>),
    Failure(WsError),
}

/// Transport whose connections are fed by the caller
#[derive(Default)]
pub struct MemoryTransport {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<ConnectRequest>>,
}

impl MemoryTransport {
    /// Create a transport with an empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful connection; messages sent on the returned sender
    /// arrive on it, and dropping the sender ends it
    pub fn push_connection(&self) -> mpsc::Sender<WsMessage> {
        let (tx, rx) = mpsc::channel(64);
        self.script.lock().push_back(Scripted::Connection(rx));
        tx
    }

    /// Queue a failed connect attempt
    pub fn push_failure(&self, reason: impl Into<String>) {
        self.script
            .lock()
            .push_back(Scripted::Failure(WsError::ConnectionFailed(reason.into())));
    }

    /// Number of `open` calls so far
    pub fn attempts(&self) -> usize {
        self.requests.lock().len()
    }

    /// Requests seen so far, in order
    pub fn requests(&self) -> Vec<ConnectRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn open(&self, request: &ConnectRequest) -> Result<WsConnection, WsError> {
        self.requests.lock().push(request.clone());

        let next = self.script.lock().pop_front();
        match next {
            Some(Scripted::Connection(rx)) => Ok(WsConnection::from_channel(rx)),
            Some(Scripted::Failure(e)) => Err(e),
            None => Err(WsError::ConnectionFailed(
                "no scripted connection available".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_outcomes_in_order() {
        let transport = MemoryTransport::new();
        transport.push_failure("refused");
        let tx = transport.push_connection();

        let request = ConnectRequest::new("ws://memory");
        assert!(transport.open(&request).await.is_err());

        let mut conn = transport.open(&request).await.unwrap();
        tx.send(WsMessage::Text("x".into())).await.unwrap();
        assert_eq!(conn.recv().await, Some(WsMessage::Text("x".into())));

        assert!(transport.open(&request).await.is_err());
        assert_eq!(transport.attempts(), 3);
    }
}
