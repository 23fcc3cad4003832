//! Configuration for the coinpulse dashboard.
//!
//! A single optional JSON file; every field has a default so the binary runs
//! with no config at all. Knobs the CLI also exposes (coin, provider) are
//! overridden by the CLI.
//!
//! # Example config
//!
//! ```json
//! {
//!   "coin": "bitcoin",
//!   "provider": "kraken",
//!   "stream": {
//!     "max_reconnect_attempts": 3,
//!     "base_backoff_ms": 1000,
//!     "cap_backoff_ms": 10000
//!   },
//!   "rest": {
//!     "snapshot_interval_sec": 30,
//!     "chart_interval_sec": 300,
//!     "news_interval_sec": 60,
//!     "max_attempts": 3,
//!     "base_delay_ms": 1000
//!   },
//!   "analysis": { "api_key": "...", "model": "llama-3.3-70b-versatile" }
//! }
//! ```

use std::time::Duration;

use serde::Deserialize;

/// Top-level application config, deserialized from a JSON file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Logical coin id (CoinGecko notation, e.g. `"bitcoin"`).
    pub coin: Option<String>,

    /// Live feed provider: `"kraken"` or `"binance"`.
    pub provider: Option<String>,

    /// Live-feed reconnect settings.
    pub stream: Option<StreamConfig>,

    /// REST polling and retry settings.
    pub rest: Option<RestConfig>,

    /// AI analysis settings.
    pub analysis: Option<AnalysisConfig>,
}

impl AppConfig {
    pub fn effective_coin(&self) -> String {
        self.coin.clone().unwrap_or_else(|| "bitcoin".to_string())
    }

    pub fn effective_provider(&self) -> String {
        self.provider.clone().unwrap_or_else(|| "kraken".to_string())
    }

    pub fn stream(&self) -> StreamConfig {
        self.stream.clone().unwrap_or_default()
    }

    pub fn rest(&self) -> RestConfig {
        self.rest.clone().unwrap_or_default()
    }
}

/// Live-feed reconnect settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamConfig {
    /// Reconnects per subscription before giving up (default: 3).
    pub max_reconnect_attempts: Option<u32>,

    /// First reconnect delay in milliseconds (default: 1000).
    pub base_backoff_ms: Option<u64>,

    /// Backoff ceiling in milliseconds (default: 10_000).
    pub cap_backoff_ms: Option<u64>,
}

impl StreamConfig {
    pub fn effective_max_reconnect_attempts(&self) -> u32 {
        self.max_reconnect_attempts.unwrap_or(3)
    }

    pub fn effective_base_backoff(&self) -> Duration {
        Duration::from_millis(self.base_backoff_ms.unwrap_or(1000))
    }

    pub fn effective_cap_backoff(&self) -> Duration {
        Duration::from_millis(self.cap_backoff_ms.unwrap_or(10_000))
    }
}

/// REST polling and retry settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RestConfig {
    /// Snapshot refresh interval in seconds (default: 30).
    pub snapshot_interval_sec: Option<u64>,

    /// Chart refresh interval in seconds (default: 300).
    pub chart_interval_sec: Option<u64>,

    /// News refresh interval in seconds (default: 60).
    pub news_interval_sec: Option<u64>,

    /// Attempts per fetch, including the first (default: 3).
    pub max_attempts: Option<u32>,

    /// Base retry delay in milliseconds (default: 1000).
    pub base_delay_ms: Option<u64>,

    /// Price snapshot API base URL (default: CoinGecko v3).
    pub coingecko_base: Option<String>,

    /// History/news API base URL (default: CryptoCompare data/v2).
    pub cryptocompare_base: Option<String>,
}

impl RestConfig {
    pub fn effective_snapshot_interval(&self) -> Duration {
        Duration::from_secs(self.snapshot_interval_sec.unwrap_or(30))
    }

    pub fn effective_chart_interval(&self) -> Duration {
        Duration::from_secs(self.chart_interval_sec.unwrap_or(300))
    }

    pub fn effective_news_interval(&self) -> Duration {
        Duration::from_secs(self.news_interval_sec.unwrap_or(60))
    }

    pub fn effective_max_attempts(&self) -> u32 {
        self.max_attempts.unwrap_or(3)
    }

    pub fn effective_base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms.unwrap_or(1000))
    }
}

/// AI analysis settings. The key may also come from the
/// `COINPULSE_ANALYSIS_KEY` environment variable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

impl AnalysisConfig {
    pub fn effective_api_key(&self) -> Option<String> {
        self.api_key.clone().or_else(|| std::env::var("COINPULSE_ANALYSIS_KEY").ok())
    }
}

/// Load and parse a JSON config file.
pub fn load_config(path: &std::path::Path) -> anyhow::Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}
