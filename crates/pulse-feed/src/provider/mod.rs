//! Live-feed provider adapters.
//!
//! One reconnect/backoff engine serves every provider; an adapter supplies
//! only the four things that differ per feed — endpoint, optional
//! subscribe/unsubscribe handshake, frame parser, and symbol table.

pub mod binance;
pub mod kraken;

use std::sync::Arc;

use anyhow::{Result, anyhow};

use crate::resolver::SymbolTable;

/// A live-feed provider adapter.
pub trait FeedProvider: Send + Sync {
    /// Short provider name used in logs and config.
    fn name(&self) -> &'static str;

    /// WebSocket endpoint for the given provider symbol.
    fn ws_url(&self, symbol: &str) -> String;

    /// Mapping from logical coin ids to this provider's symbols.
    fn symbols(&self) -> &SymbolTable;

    /// Handshake sent right after the socket opens. `None` when the
    /// endpoint encodes the subscription in the URL.
    fn subscribe_msg(&self, symbol: &str) -> Option<String>;

    /// Courtesy message sent before an owner-initiated close.
    fn unsubscribe_msg(&self, symbol: &str) -> Option<String>;

    /// Extract the last-traded price from one inbound frame. `None` for
    /// anything that is not a price update.
    fn parse_tick(&self, frame: &str) -> Option<f64>;
}

/// Create a provider adapter by config name.
pub fn create(name: &str) -> Result<Arc<dyn FeedProvider>> {
    match name.to_ascii_lowercase().as_str() {
        "kraken" => Ok(Arc::new(kraken::Kraken::new())),
        "binance" => Ok(Arc::new(binance::Binance::new())),
        other => Err(anyhow!("unknown feed provider: {other}")),
    }
}
