//! WebSocket transport
//!
//! A [`Transport`] opens exactly one connection per call and hands back a
//! stream of [`WsMessage`]s. Retry policy lives with the caller.

mod client;
mod memory;
mod types;

pub use client::WsClient;
pub use memory::MemoryTransport;
pub use types::{ConnectRequest, WsConnection, WsError, WsMessage};

use async_trait::async_trait;

/// Something that can open a message-oriented connection
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a connection and send the request's subscribe frames
    async fn open(&self, request: &ConnectRequest) -> Result<WsConnection, WsError>;
}
