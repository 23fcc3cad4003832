//! # pulse-rest
//!
//! REST acquisition layer for the coinpulse dashboard.
//!
//! Every GET endpoint goes through the shared retrying fetcher in
//! [`fetch`]; transport failures and rate limits are retried with linear
//! backoff, everything else surfaces immediately as a typed error.
//!
//! - [`fetch`] — shared client + retrying GET plumbing
//! - [`snapshot`] — wholesale price snapshot (CoinGecko)
//! - [`chart`] — 24-hour hourly history (CryptoCompare)
//! - [`news`] — coin news (CryptoCompare)
//! - [`analysis`] — AI market commentary (single attempt, by design)
//! - [`symbols`] — logical coin ids to upstream ticker symbols

pub mod analysis;
pub mod chart;
pub mod fetch;
pub mod news;
pub mod snapshot;
pub mod symbols;
