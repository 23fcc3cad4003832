//! Single-shot WebSocket connection to a live price feed.
//!
//! One [`run_connection`] call owns exactly one socket lifecycle:
//!
//! 1. Dial the endpoint (TLS).
//! 2. Send the provider's subscribe handshake, if it has one, immediately
//!    after the socket opens.
//! 3. Read frames and deliver parsed prices to the tick callback, in
//!    arrival order.
//! 4. Return once the peer or the owner ends the connection.
//!
//! Reconnect policy lives one layer up in the stream supervisor; this
//! module never redials.

use std::sync::Arc;

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Callback invoked synchronously for each successfully parsed price.
pub type OnTick = Arc<dyn Fn(f64) + Send + Sync>;

/// Frame parser supplied by the provider adapter: `frame -> price?`.
///
/// `None` means the frame carried no price (heartbeats, acks, malformed
/// payloads). Such frames are dropped, never fatal.
pub type TickParser = Arc<dyn Fn(&str) -> Option<f64> + Send + Sync>;

/// Configuration for one connection.
#[derive(Debug, Clone)]
pub struct ConnConfig {
    /// Full WebSocket URL.
    pub url: String,
    /// Handshake message sent immediately after the socket opens. `None`
    /// when the endpoint encodes the subscription in the URL.
    pub subscribe_msg: Option<String>,
    /// Courtesy message sent before an owner-initiated close.
    pub unsubscribe_msg: Option<String>,
    /// Label for log lines (provider + symbol).
    pub label: String,
}

/// Why the connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnClose {
    /// The owner asked us to stop.
    Owner,
    /// The peer closed the socket, or the transport failed mid-stream.
    Remote,
}

/// Run one connection to completion.
///
/// `on_open` fires once, after the socket is established and the subscribe
/// handshake has been sent. Returns `Err` only when the initial dial fails;
/// once open, every outcome is a [`ConnClose`].
pub async fn run_connection(
    config: &ConnConfig,
    parser: &TickParser,
    on_tick: &OnTick,
    on_open: impl FnOnce(),
    shutdown_rx: &mut watch::Receiver<bool>,
) -> Result<ConnClose> {
    let label = &config.label;

    info!("[{label}] connecting to {}", config.url);
    let dial = tokio_tungstenite::connect_async(config.url.as_str());
    let ws_stream = tokio::select! {
        res = dial => res.with_context(|| format!("dial {}", config.url))?.0,
        _ = shutdown_rx.changed() => return Ok(ConnClose::Owner),
    };

    let (mut ws_write, mut ws_read) = ws_stream.split();

    if let Some(ref sub) = config.subscribe_msg {
        debug!("[{label}] subscribing: {sub}");
        ws_write
            .send(Message::Text(sub.clone().into()))
            .await
            .context("subscribe send failed")?;
    }

    info!("[{label}] connected");
    on_open();

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                if let Some(ref unsub) = config.unsubscribe_msg {
                    let _ = ws_write.send(Message::Text(unsub.clone().into())).await;
                }
                let _ = ws_write.close().await;
                info!("[{label}] closed by owner");
                return Ok(ConnClose::Owner);
            }

            msg = ws_read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match parser(&text) {
                            Some(price) => on_tick(price),
                            None => debug!("[{label}] dropped non-tick frame"),
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = ws_write.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) => {
                        warn!("[{label}] peer sent close frame");
                        return Ok(ConnClose::Remote);
                    }
                    Some(Err(e)) => {
                        warn!("[{label}] read error: {e}");
                        return Ok(ConnClose::Remote);
                    }
                    None => {
                        warn!("[{label}] stream ended");
                        return Ok(ConnClose::Remote);
                    }
                    _ => {} // Binary, Pong, Frame — no feed we speak uses them
                }
            }
        }
    }
}
