//! Wholesale price snapshot from the CoinGecko `simple/price` endpoint.
//!
//! The response is keyed by coin id:
//!
//! ```json
//! {"bitcoin": {"usd": 30000.0, "usd_24h_change": 1.2, "usd_24h_vol": 1.0e10,
//!              "last_updated_at": 1672515782}}
//! ```

use pulse_core::PulseError;
use pulse_core::retry::RetryPolicy;
use pulse_core::types::Snapshot;

use crate::fetch;

pub const DEFAULT_BASE: &str = "https://api.coingecko.com/api/v3";

/// Fetch the current snapshot for one coin.
pub async fn fetch_snapshot(
    client: &reqwest::Client,
    base_url: &str,
    coin_id: &str,
    policy: &RetryPolicy,
) -> Result<Snapshot, PulseError> {
    let url = format!(
        "{base_url}/simple/price?ids={coin_id}&vs_currencies=usd\
         &include_24hr_change=true&include_24hr_vol=true&include_last_updated_at=true"
    );
    let body = fetch::get_json(client, &url, policy).await?;
    parse_snapshot(&body, coin_id)
}

fn parse_snapshot(body: &serde_json::Value, coin_id: &str) -> Result<Snapshot, PulseError> {
    let entry = body
        .get(coin_id)
        .ok_or_else(|| PulseError::Parse(format!("no snapshot data for '{coin_id}'")))?;
    let mut snapshot: Snapshot =
        serde_json::from_value(entry.clone()).map_err(|e| PulseError::Parse(e.to_string()))?;

    // simple/price has no high/low; fall back to the spot price so the
    // stat cards always render.
    if snapshot.usd_24h_high == 0.0 {
        snapshot.usd_24h_high = snapshot.usd;
    }
    if snapshot.usd_24h_low == 0.0 {
        snapshot.usd_24h_low = snapshot.usd;
    }
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_body() {
        let body: serde_json::Value = serde_json::from_str(
            r#"{"bitcoin": {
                "usd": 30000.5,
                "usd_24h_change": -2.25,
                "usd_24h_vol": 12345678.9,
                "last_updated_at": 1672515782
            }}"#,
        )
        .unwrap();
        let snap = parse_snapshot(&body, "bitcoin").unwrap();
        assert!((snap.usd - 30000.5).abs() < 1e-9);
        assert!((snap.usd_24h_change + 2.25).abs() < 1e-9);
        assert_eq!(snap.last_updated_at, 1672515782);
        // high/low backfilled from the spot price
        assert_eq!(snap.usd_24h_high, snap.usd);
        assert_eq!(snap.usd_24h_low, snap.usd);
    }

    #[test]
    fn missing_coin_key_is_a_parse_error() {
        let body: serde_json::Value = serde_json::from_str(r#"{"ethereum": {"usd": 1.0}}"#).unwrap();
        let err = parse_snapshot(&body, "bitcoin").unwrap_err();
        assert!(matches!(err, PulseError::Parse(_)));
    }
}
