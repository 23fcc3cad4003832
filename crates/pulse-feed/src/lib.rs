//! # pulse-feed
//!
//! Live-feed layer for the coinpulse dashboard.
//!
//! ## Architecture
//!
//! Each provider supplies an adapter describing its endpoint, handshake,
//! frame parser, and symbol table. The [`supervisor::StreamSupervisor`]
//! drives one adapter at a time: it owns the single active subscription,
//! reconnects with capped exponential backoff, and invalidates superseded
//! deliveries through an epoch token.
//!
//! - [`provider`] — adapter trait + Kraken/Binance implementations
//! - [`resolver`] — logical-coin-to-provider-symbol tables
//! - [`supervisor`] — subscription lifecycle and reconnect policy
//! - [`series`] — hour-bucketed history and the merged display view

pub mod provider;
pub mod resolver;
pub mod series;
pub mod supervisor;

pub use supervisor::{ConnectionState, ReconnectPolicy, StreamSupervisor, Subscription};
