//! 24-hour hourly price history from the CryptoCompare `histohour`
//! endpoint.
//!
//! The response nests the rows under `Data.Data`:
//!
//! ```json
//! {"Response": "Success", "Data": {"Data": [
//!   {"time": 1672512000, "close": 30000.0, "open": 29950.0, ...}
//! ]}}
//! ```

use pulse_core::PulseError;
use pulse_core::retry::RetryPolicy;
use pulse_core::types::PricePoint;

use crate::fetch;

pub const DEFAULT_BASE: &str = "https://min-api.cryptocompare.com/data/v2";

/// Fetch the last 24 hourly closes for a ticker symbol.
pub async fn fetch_chart(
    client: &reqwest::Client,
    base_url: &str,
    symbol: &str,
    policy: &RetryPolicy,
) -> Result<Vec<PricePoint>, PulseError> {
    let url =
        format!("{base_url}/histohour?fsym={}&tsym=USD&limit=24", symbol.to_ascii_uppercase());
    let body = fetch::get_json(client, &url, policy).await?;
    parse_chart(&body)
}

fn parse_chart(body: &serde_json::Value) -> Result<Vec<PricePoint>, PulseError> {
    let rows = body
        .pointer("/Data/Data")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| PulseError::Parse("history response missing Data.Data".into()))?;

    let mut points = Vec::with_capacity(rows.len());
    for row in rows {
        let time = row.get("time").and_then(serde_json::Value::as_i64);
        let value = row.get("close").and_then(serde_json::Value::as_f64);
        if let (Some(time), Some(value)) = (time, value) {
            points.push(PricePoint { time, value });
        }
    }

    // a chart with nothing to draw is a failed fetch, not an empty success
    if points.is_empty() {
        return Err(PulseError::Parse("history returned no points".into()));
    }

    points.sort_by_key(|p| p.time);
    Ok(points)
}
