//! # pulse-core
//!
//! Core crate for the coinpulse dashboard, providing:
//!
//! - **Types** (`types`) — price ticks, history points, snapshots, news items
//! - **Errors** (`error`) — domain-specific `PulseError` via thiserror
//! - **Configuration** (`config`) — JSON config deserialization
//! - **Retry** (`retry`) — bounded-retry engine with pluggable backoff
//! - **Epoch** (`epoch`) — generation tokens for invalidating superseded work
//! - **WebSocket** (`ws`) — single-shot live-feed connection
//! - **Time utilities** (`time_util`) — wall clock + hour bucketing
//! - **Logging** (`logging`) — tracing-based structured logging

pub mod config;
pub mod epoch;
pub mod error;
pub mod logging;
pub mod retry;
pub mod time_util;
pub mod types;
pub mod ws;

pub use error::PulseError;

// Re-export types at crate root for convenience.
pub use types::*;
