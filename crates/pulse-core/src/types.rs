//! Shared domain types for the acquisition layer.

use serde::Deserialize;

use crate::time_util;

/// Where a price observation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickSource {
    /// Delivered asynchronously by the live feed.
    Stream,
    /// Taken from a periodic REST snapshot.
    Snapshot,
}

/// One asynchronous price observation. Consumed, never persisted.
#[derive(Debug, Clone, Copy)]
pub struct PriceTick {
    /// Last-traded price in USD.
    pub value: f64,
    pub source: TickSource,
    /// Local receive time, milliseconds since the Unix epoch.
    pub observed_at_ms: u64,
}

impl PriceTick {
    /// A tick observed on the live feed right now.
    pub fn from_stream(value: f64) -> Self {
        Self { value, source: TickSource::Stream, observed_at_ms: time_util::now_ms() }
    }
}

/// One point of the hourly price history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    /// Unix timestamp in seconds.
    pub time: i64,
    /// Price in USD.
    pub value: f64,
}

/// Wholesale 24-hour market snapshot for one coin.
///
/// Refreshed as a unit on every poll; fields are never merged individually.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Snapshot {
    pub usd: f64,
    #[serde(default)]
    pub usd_24h_change: f64,
    #[serde(default)]
    pub usd_24h_vol: f64,
    #[serde(default)]
    pub usd_24h_high: f64,
    #[serde(default)]
    pub usd_24h_low: f64,
    /// Upstream update time, seconds since the Unix epoch.
    #[serde(default)]
    pub last_updated_at: u64,
}

/// One news item, normalized across upstream shapes.
#[derive(Debug, Clone)]
pub struct NewsArticle {
    pub id: String,
    pub title: String,
    pub url: String,
    /// Publication time, seconds since the Unix epoch.
    pub published_at: u64,
    pub source_name: String,
    /// Currency codes the article relates to (e.g. `"BTC"`).
    pub currencies: Vec<String>,
}
