//! Binance trade stream.
//!
//! The subscription is part of the endpoint path (`/ws/btcusdt@trade`), so
//! there is no handshake in either direction. Trade frames:
//!
//! ```json
//! {"e":"trade","s":"BTCUSDT","p":"30000.10","q":"0.002","T":1672515782136}
//! ```

use super::FeedProvider;
use crate::resolver::SymbolTable;

const BINANCE_WS_BASE: &str = "wss://stream.binance.com:9443/ws";

/// Binance adapter. Stream names are lowercase pair codes.
pub struct Binance {
    symbols: SymbolTable,
}

impl Binance {
    pub fn new() -> Self {
        let symbols = SymbolTable::from_pairs(&[
            ("bitcoin", "btcusdt"),
            ("ethereum", "ethusdt"),
            ("cardano", "adausdt"),
            ("ripple", "xrpusdt"),
            ("solana", "solusdt"),
            ("polkadot", "dotusdt"),
            ("dogecoin", "dogeusdt"),
            ("avalanche-2", "avaxusdt"),
            ("matic-network", "maticusdt"),
            ("chainlink", "linkusdt"),
        ]);
        Self { symbols }
    }
}

impl Default for Binance {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedProvider for Binance {
    fn name(&self) -> &'static str {
        "binance"
    }

    fn ws_url(&self, symbol: &str) -> String {
        format!("{BINANCE_WS_BASE}/{symbol}@trade")
    }

    fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    fn subscribe_msg(&self, _symbol: &str) -> Option<String> {
        None
    }

    fn unsubscribe_msg(&self, _symbol: &str) -> Option<String> {
        None
    }

    fn parse_tick(&self, frame: &str) -> Option<f64> {
        let v: serde_json::Value = serde_json::from_str(frame).ok()?;
        if v.get("e")?.as_str()? != "trade" {
            return None;
        }
        let price = v.get("p")?.as_str()?;
        fast_float2::parse(price).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trade_frame() {
        let binance = Binance::new();
        let frame = r#"{"e":"trade","E":1672515782136,"s":"BTCUSDT","t":12345,
            "p":"30001.50","q":"0.01000000","T":1672515782134,"m":true}"#;
        let price = binance.parse_tick(frame).unwrap();
        assert!((price - 30001.5).abs() < 1e-9);
    }

    #[test]
    fn non_trade_events_are_ignored() {
        let binance = Binance::new();
        assert!(binance.parse_tick(r#"{"e":"aggTrade","p":"30001.50"}"#).is_none());
        assert!(binance.parse_tick(r#"{"result":null,"id":1}"#).is_none());
        assert!(binance.parse_tick("").is_none());
    }

    #[test]
    fn stream_name_is_part_of_the_url() {
        let binance = Binance::new();
        assert_eq!(binance.ws_url("btcusdt"), "wss://stream.binance.com:9443/ws/btcusdt@trade");
        assert!(binance.subscribe_msg("btcusdt").is_none());
    }
}
