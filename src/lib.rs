//! gold-ticker: live spot price ingestion with simulated fallback
//!
//! This library provides:
//! - A Finnhub trade stream connector with fixed-delay reconnection
//! - A simulated price generator used while the feed is down or unconfigured
//! - A snapshot reducer maintaining quotes, deltas and running extrema
//! - A pipeline that owns the current snapshot and hands the writer token
//!   between the two producers
//! - Logging and Prometheus metrics

pub mod cli;
pub mod config;
pub mod feed;
pub mod listener;
pub mod pipeline;
pub mod snapshot;
pub mod telemetry;
pub mod ws;
