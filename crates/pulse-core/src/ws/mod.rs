//! WebSocket transport for the live price feed.

pub mod conn;

pub use conn::{ConnClose, ConnConfig, OnTick, TickParser, run_connection};
