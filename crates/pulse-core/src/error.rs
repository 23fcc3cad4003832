//! Typed error definitions for the coinpulse data layer.
//!
//! Provides [`PulseError`] for domain-specific errors that are more
//! informative than plain `anyhow::Error` strings. All variants implement
//! `std::error::Error` via `thiserror`, so they integrate seamlessly with
//! `anyhow::Result`.
//!
//! Nothing here is fatal: every variant degrades to "feature temporarily
//! unavailable" at the display layer.

use thiserror::Error;

/// Domain-specific errors for the coinpulse data layer.
#[derive(Debug, Error)]
pub enum PulseError {
    /// Socket or connection-level failure that survived every retry.
    #[error("transport error: {0}")]
    Transport(String),

    /// A frame or payload that could not be understood. Dropped upstream,
    /// never fatal to the stream.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Upstream answered HTTP 429 on the final retry attempt.
    #[error("rate limited by upstream")]
    RateLimited,

    /// Any other non-2xx HTTP status. Surfaced immediately, not retried.
    #[error("http status {0}")]
    Http(u16),

    /// The coin has no symbol mapping on the selected feed provider.
    #[error("no provider symbol for '{0}'")]
    UnsupportedSymbol(String),

    /// Reconnect ceiling reached; only an explicit new connect retries.
    #[error("reconnect attempts exhausted")]
    Exhausted,

    /// Configuration parsing or validation error.
    #[error("config error: {0}")]
    Config(String),

    /// A response body that did not match the expected shape.
    #[error("parse error: {0}")]
    Parse(String),
}
