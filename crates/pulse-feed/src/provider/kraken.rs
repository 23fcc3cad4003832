//! Kraken public ticker feed.
//!
//! Protocol (v1 public WebSocket):
//!
//! - subscribe/unsubscribe are JSON envelopes:
//!   `{"event":"subscribe","pair":["XBT/USD"],"subscription":{"name":"ticker"}}`
//! - data frames are arrays: `[channelID, data, "ticker", pair]` where
//!   `data.c` is `["<last price>", "<lot volume>"]`
//! - everything object-shaped (`systemStatus`, `subscriptionStatus`,
//!   `heartbeat`) carries no price

use serde_json::json;

use super::FeedProvider;
use crate::resolver::SymbolTable;

const KRAKEN_WS_URL: &str = "wss://ws.kraken.com";

/// Kraken adapter. Note Kraken's `XBT` notation for Bitcoin.
pub struct Kraken {
    symbols: SymbolTable,
}

impl Kraken {
    pub fn new() -> Self {
        let symbols = SymbolTable::from_pairs(&[
            ("bitcoin", "XBT/USD"),
            ("ethereum", "ETH/USD"),
            ("cardano", "ADA/USD"),
            ("ripple", "XRP/USD"),
            ("solana", "SOL/USD"),
            ("polkadot", "DOT/USD"),
            ("dogecoin", "DOGE/USD"),
            ("avalanche-2", "AVAX/USD"),
            ("matic-network", "MATIC/USD"),
            ("chainlink", "LINK/USD"),
        ]);
        Self { symbols }
    }
}

impl Default for Kraken {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedProvider for Kraken {
    fn name(&self) -> &'static str {
        "kraken"
    }

    fn ws_url(&self, _symbol: &str) -> String {
        KRAKEN_WS_URL.to_string()
    }

    fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    fn subscribe_msg(&self, symbol: &str) -> Option<String> {
        Some(
            json!({
                "event": "subscribe",
                "pair": [symbol],
                "subscription": {"name": "ticker"}
            })
            .to_string(),
        )
    }

    fn unsubscribe_msg(&self, symbol: &str) -> Option<String> {
        Some(
            json!({
                "event": "unsubscribe",
                "pair": [symbol],
                "subscription": {"name": "ticker"}
            })
            .to_string(),
        )
    }

    fn parse_tick(&self, frame: &str) -> Option<f64> {
        let v: serde_json::Value = serde_json::from_str(frame).ok()?;
        // Data frames are arrays; events (heartbeat, acks) are objects.
        let arr = v.as_array()?;
        if arr.get(2)?.as_str()? != "ticker" {
            return None;
        }
        let close = arr.get(1)?.get("c")?.as_array()?;
        let price = close.first()?.as_str()?;
        fast_float2::parse(price).ok()
    }
}
