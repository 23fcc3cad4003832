//! Logical coin ids to upstream ticker symbols for the REST providers.

/// Ticker symbol for a logical coin id (CryptoCompare notation).
///
/// `None` means history and news are unavailable for the coin; callers
/// skip those panels instead of guessing a default.
pub fn ticker_symbol(coin_id: &str) -> Option<&'static str> {
    match coin_id.to_ascii_lowercase().as_str() {
        "bitcoin" => Some("BTC"),
        "ethereum" => Some("ETH"),
        "cardano" => Some("ADA"),
        "ripple" => Some("XRP"),
        "solana" => Some("SOL"),
        "polkadot" => Some("DOT"),
        "dogecoin" => Some("DOGE"),
        "avalanche" | "avalanche-2" => Some("AVAX"),
        "polygon" | "matic-network" => Some("MATIC"),
        "chainlink" => Some("LINK"),
        _ => None,
    }
}
