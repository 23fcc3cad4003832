//! Live-feed subscription lifecycle.
//!
//! A [`StreamSupervisor`] owns at most one logical subscription at a time.
//! It resolves the coin to a provider symbol, drives the single-shot
//! connection from `pulse_core::ws`, and layers reconnect policy on top:
//! capped exponential backoff, an attempt ceiling, and full teardown of the
//! previous subscription before a new one may exist.
//!
//! Delivery invalidation is synchronous: every subscription's tick callback
//! is guarded by an epoch token, so the instant a subscription is replaced
//! or dropped, its ticks become unobservable — even if the old socket task
//! is still flushing its goodbye.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use pulse_core::PulseError;
use pulse_core::epoch::{Epoch, EpochToken};
use pulse_core::retry::Backoff;
use pulse_core::time_util;
use pulse_core::ws::{ConnClose, ConnConfig, OnTick, TickParser, run_connection};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::provider::FeedProvider;

/// How long a replaced connection gets to say goodbye before it is aborted.
const TEARDOWN_GRACE: Duration = Duration::from_secs(2);

/// Lifecycle of the supervisor's current connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Open,
    Closed,
    ReconnectPending,
    Exhausted,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closed => "closed",
            ConnectionState::ReconnectPending => "reconnect-pending",
            ConnectionState::Exhausted => "exhausted",
        };
        f.write_str(s)
    }
}

/// Reconnect policy for one supervisor.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    /// Reconnects per subscription before giving up.
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl ReconnectPolicy {
    pub fn from_config(config: &pulse_core::config::StreamConfig) -> Self {
        Self {
            max_attempts: config.effective_max_reconnect_attempts(),
            backoff: Backoff::Exponential {
                base: config.effective_base_backoff(),
                cap: config.effective_cap_backoff(),
            },
        }
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::Exponential {
                base: Duration::from_secs(1),
                cap: Duration::from_secs(10),
            },
        }
    }
}

/// One active logical subscription.
#[derive(Debug, Clone)]
pub struct Subscription {
    pub coin_id: String,
    pub provider_symbol: String,
    pub created_at_ms: u64,
}

struct ActiveSub {
    sub: Subscription,
    shutdown_tx: watch::Sender<bool>,
    task: tokio::task::JoinHandle<()>,
}

/// Owns one provider connection and its reconnect lifecycle.
///
/// All state transitions go through [`connect`](Self::connect) and
/// [`disconnect`](Self::disconnect); nothing else may mutate the
/// subscription. Supervisors are plain owned values — tests can run any
/// number of them side by side.
pub struct StreamSupervisor {
    provider: Arc<dyn FeedProvider>,
    policy: ReconnectPolicy,
    epoch: Epoch,
    state_tx: watch::Sender<ConnectionState>,
    state_rx: watch::Receiver<ConnectionState>,
    current: Option<ActiveSub>,
}

impl StreamSupervisor {
    pub fn new(provider: Arc<dyn FeedProvider>, policy: ReconnectPolicy) -> Self {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Idle);
        Self { provider, policy, epoch: Epoch::new(), state_tx, state_rx, current: None }
    }

    /// Subscribe to a coin's live feed.
    ///
    /// Resolver misses return [`PulseError::UnsupportedSymbol`] without a
    /// connection attempt — the caller keeps polling snapshots instead.
    /// Re-subscribing to the symbol already streaming is a no-op; anything
    /// else tears the previous subscription down completely first.
    pub async fn connect(&mut self, coin_id: &str, on_tick: OnTick) -> Result<(), PulseError> {
        let coin = coin_id.to_ascii_lowercase();
        let symbol = match self.provider.symbols().resolve(&coin) {
            Some(s) => s.to_string(),
            None => {
                warn!("no live feed mapping for '{coin}' on {}", self.provider.name());
                return Err(PulseError::UnsupportedSymbol(coin));
            }
        };

        if let Some(active) = &self.current {
            if active.sub.provider_symbol == symbol && self.is_connected() {
                debug!("already streaming {symbol}, keeping the connection");
                return Ok(());
            }
        }

        self.teardown().await;

        let token = self.epoch.begin();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let sub = Subscription {
            coin_id: coin,
            provider_symbol: symbol,
            created_at_ms: time_util::now_ms(),
        };

        // Ticks die the instant this subscription is superseded.
        let tick_token = token.clone();
        let guarded: OnTick = Arc::new(move |price| {
            if tick_token.is_current() {
                on_tick(price);
            }
        });

        info!("subscribing to {} via {}", sub.provider_symbol, self.provider.name());
        let task = tokio::spawn(supervise(SuperviseArgs {
            provider: Arc::clone(&self.provider),
            symbol: sub.provider_symbol.clone(),
            on_tick: guarded,
            policy: self.policy.clone(),
            state_tx: self.state_tx.clone(),
            token,
            shutdown_rx,
        }));

        self.current = Some(ActiveSub { sub, shutdown_tx, task });
        Ok(())
    }

    /// Drop the live feed. Idempotent; cancels a pending reconnect and
    /// guarantees no further tick delivery once it returns.
    pub async fn disconnect(&mut self) {
        if self.current.is_none() {
            return;
        }
        self.teardown().await;
        let _ = self.state_tx.send(ConnectionState::Idle);
        info!("live feed disconnected");
    }

    pub fn is_connected(&self) -> bool {
        *self.state_rx.borrow() == ConnectionState::Open
    }

    /// Watch channel carrying every state transition, for status displays.
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    pub fn subscription(&self) -> Option<&Subscription> {
        self.current.as_ref().map(|a| &a.sub)
    }

    /// Invalidate the current subscription and wait for its task to finish.
    async fn teardown(&mut self) {
        self.epoch.bump();
        if let Some(active) = self.current.take() {
            let _ = active.shutdown_tx.send(true);
            let abort = active.task.abort_handle();
            if tokio::time::timeout(TEARDOWN_GRACE, active.task).await.is_err() {
                warn!("teardown of {} timed out, aborting", active.sub.provider_symbol);
                abort.abort();
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Connection task
// ---------------------------------------------------------------------------

struct SuperviseArgs {
    provider: Arc<dyn FeedProvider>,
    symbol: String,
    on_tick: OnTick,
    policy: ReconnectPolicy,
    state_tx: watch::Sender<ConnectionState>,
    token: EpochToken,
    shutdown_rx: watch::Receiver<bool>,
}

/// Publish a state transition unless this subscription has been superseded.
fn set_state(tx: &watch::Sender<ConnectionState>, token: &EpochToken, state: ConnectionState) {
    if token.is_current() {
        let _ = tx.send(state);
    }
}

/// Drive one subscription: connect, deliver, reconnect with backoff, give
/// up at the ceiling.
async fn supervise(args: SuperviseArgs) {
    let SuperviseArgs { provider, symbol, on_tick, policy, state_tx, token, mut shutdown_rx } =
        args;

    let parser: TickParser = {
        let provider = Arc::clone(&provider);
        Arc::new(move |frame| provider.parse_tick(frame))
    };
    let config = ConnConfig {
        url: provider.ws_url(&symbol),
        subscribe_msg: provider.subscribe_msg(&symbol),
        unsubscribe_msg: provider.unsubscribe_msg(&symbol),
        label: format!("{}:{}", provider.name(), symbol),
    };

    // Unexpected closes since the last successful open.
    let mut attempts: u32 = 0;

    loop {
        if *shutdown_rx.borrow() {
            set_state(&state_tx, &token, ConnectionState::Closed);
            return;
        }

        set_state(&state_tx, &token, ConnectionState::Connecting);

        let outcome = run_connection(
            &config,
            &parser,
            &on_tick,
            || {
                attempts = 0;
                set_state(&state_tx, &token, ConnectionState::Open);
            },
            &mut shutdown_rx,
        )
        .await;

        match outcome {
            Ok(ConnClose::Owner) => {
                set_state(&state_tx, &token, ConnectionState::Closed);
                return;
            }
            Ok(ConnClose::Remote) => {
                set_state(&state_tx, &token, ConnectionState::Closed);
            }
            Err(e) => {
                warn!("[{}] connect failed: {e:#}", config.label);
                set_state(&state_tx, &token, ConnectionState::Closed);
            }
        }

        attempts += 1;
        if attempts > policy.max_attempts {
            error!(
                "[{}] live feed lost after {} reconnect attempt(s)",
                config.label, policy.max_attempts
            );
            set_state(&state_tx, &token, ConnectionState::Exhausted);
            return;
        }

        let delay = policy.backoff.delay(attempts);
        info!(
            "[{}] reconnecting in {delay:?} (attempt {attempts}/{})",
            config.label, policy.max_attempts
        );
        set_state(&state_tx, &token, ConnectionState::ReconnectPending);
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown_rx.changed() => {
                set_state(&state_tx, &token, ConnectionState::Closed);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures_util::{SinkExt, StreamExt};
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;
    use tokio_tungstenite::tungstenite::Message;

    use crate::resolver::SymbolTable;

    /// Adapter pointing at a local mock endpoint. Frames are `px:<value>`,
    /// anything else is noise.
    struct TestProvider {
        url: String,
        symbols: SymbolTable,
    }

    impl TestProvider {
        fn new(port: u16) -> Self {
            Self {
                url: format!("ws://127.0.0.1:{port}"),
                symbols: SymbolTable::from_pairs(&[
                    ("bitcoin", "XBT/USD"),
                    ("ethereum", "ETH/USD"),
                ]),
            }
        }
    }

    impl FeedProvider for TestProvider {
        fn name(&self) -> &'static str {
            "test"
        }
        fn ws_url(&self, _symbol: &str) -> String {
            self.url.clone()
        }
        fn symbols(&self) -> &SymbolTable {
            &self.symbols
        }
        fn subscribe_msg(&self, symbol: &str) -> Option<String> {
            Some(format!("sub:{symbol}"))
        }
        fn unsubscribe_msg(&self, symbol: &str) -> Option<String> {
            Some(format!("unsub:{symbol}"))
        }
        fn parse_tick(&self, frame: &str) -> Option<f64> {
            frame.strip_prefix("px:")?.parse().ok()
        }
    }

    fn quick_policy() -> ReconnectPolicy {
        ReconnectPolicy {
            max_attempts: 2,
            backoff: Backoff::Exponential {
                base: Duration::from_millis(10),
                cap: Duration::from_millis(40),
            },
        }
    }

    async fn bind() -> (TcpListener, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    /// Accepts TCP and immediately hangs up, so the WebSocket handshake
    /// always fails. Returns the accept counter.
    fn spawn_refusing_server(listener: TcpListener) -> Arc<AtomicUsize> {
        let accepts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&accepts);
        tokio::spawn(async move {
            loop {
                let (stream, _) = match listener.accept().await {
                    Ok(pair) => pair,
                    Err(_) => return,
                };
                counter.fetch_add(1, Ordering::SeqCst);
                drop(stream);
            }
        });
        accepts
    }

    async fn wait_for(mut cond: impl FnMut() -> bool, timeout: Duration) {
        let deadline = tokio::time::Instant::now() + timeout;
        while !cond() {
            assert!(tokio::time::Instant::now() < deadline, "condition not met in time");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn unknown_coins_never_open_a_socket() {
        let (listener, port) = bind().await;
        let accepts = spawn_refusing_server(listener);

        let mut sup =
            StreamSupervisor::new(Arc::new(TestProvider::new(port)), ReconnectPolicy::default());
        let err = sup.connect("shiba-inu", Arc::new(|_| {})).await.unwrap_err();
        assert!(matches!(err, PulseError::UnsupportedSymbol(_)));
        assert!(!sup.is_connected());

        // disconnect with nothing active is a no-op
        sup.disconnect().await;

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(accepts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn delivers_parsed_ticks_in_order() {
        let (listener, port) = bind().await;
        let inbound = Arc::new(Mutex::new(Vec::<String>::new()));
        {
            let inbound = Arc::clone(&inbound);
            tokio::spawn(async move {
                let (stream, _) = listener.accept().await.unwrap();
                let mut ws = accept_async(stream).await.unwrap();
                let sub = ws.next().await.unwrap().unwrap();
                inbound.lock().unwrap().push(sub.to_text().unwrap().to_string());
                ws.send(Message::Text("px:101.5".to_string().into())).await.unwrap();
                ws.send(Message::Text("noise".to_string().into())).await.unwrap();
                ws.send(Message::Text("px:102.0".to_string().into())).await.unwrap();
                while let Some(Ok(msg)) = ws.next().await {
                    if msg.is_text() {
                        inbound.lock().unwrap().push(msg.to_text().unwrap().to_string());
                    }
                    if msg.is_close() {
                        break;
                    }
                }
            });
        }

        let mut sup = StreamSupervisor::new(Arc::new(TestProvider::new(port)), quick_policy());
        let ticks = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&ticks);
        sup.connect("bitcoin", Arc::new(move |px| sink.lock().unwrap().push(px)))
            .await
            .unwrap();

        wait_for(|| ticks.lock().unwrap().len() >= 2, Duration::from_secs(3)).await;
        assert_eq!(*ticks.lock().unwrap(), vec![101.5, 102.0]);
        assert!(sup.is_connected());
        assert_eq!(sup.subscription().unwrap().provider_symbol, "XBT/USD");

        // re-subscribing to the streaming symbol keeps the connection
        sup.connect("bitcoin", Arc::new(|_| {})).await.unwrap();
        assert!(sup.is_connected());

        sup.disconnect().await;
        assert!(!sup.is_connected());
        wait_for(
            || inbound.lock().unwrap().iter().any(|m| m == "unsub:XBT/USD"),
            Duration::from_secs(3),
        )
        .await;
        assert_eq!(inbound.lock().unwrap()[0], "sub:XBT/USD");
    }

    #[tokio::test]
    async fn switching_coins_replaces_the_subscription() {
        let (listener, port) = bind().await;
        let accepts = Arc::new(AtomicUsize::new(0));
        {
            let accepts = Arc::clone(&accepts);
            tokio::spawn(async move {
                loop {
                    let (stream, _) = match listener.accept().await {
                        Ok(pair) => pair,
                        Err(_) => return,
                    };
                    accepts.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(async move {
                        let mut ws = match accept_async(stream).await {
                            Ok(ws) => ws,
                            Err(_) => return,
                        };
                        // the subscribe message names the pair; stream its price
                        let value = match ws.next().await {
                            Some(Ok(msg)) => {
                                if msg.to_text().map(|t| t.contains("XBT")).unwrap_or(false) {
                                    100.0
                                } else {
                                    200.0
                                }
                            }
                            _ => return,
                        };
                        loop {
                            tokio::select! {
                                msg = ws.next() => match msg {
                                    Some(Ok(m)) if m.is_close() => break,
                                    None | Some(Err(_)) => break,
                                    _ => {}
                                },
                                _ = tokio::time::sleep(Duration::from_millis(5)) => {
                                    if ws.send(Message::Text(format!("px:{value}").into())).await.is_err() {
                                        break;
                                    }
                                }
                            }
                        }
                    });
                }
            });
        }

        let mut sup = StreamSupervisor::new(Arc::new(TestProvider::new(port)), quick_policy());
        let ticks = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&ticks);
        let on_tick: OnTick = Arc::new(move |px| sink.lock().unwrap().push(px));

        sup.connect("bitcoin", Arc::clone(&on_tick)).await.unwrap();
        wait_for(|| ticks.lock().unwrap().contains(&100.0), Duration::from_secs(3)).await;

        // once connect(B) returns, ticks from A's socket are unobservable
        sup.connect("ethereum", Arc::clone(&on_tick)).await.unwrap();
        let cut = ticks.lock().unwrap().len();
        wait_for(|| ticks.lock().unwrap().len() >= cut + 3, Duration::from_secs(3)).await;
        {
            let t = ticks.lock().unwrap();
            assert!(
                t[cut..].iter().all(|&px| px == 200.0),
                "stale ticks after resubscribe: {:?}",
                &t[cut..]
            );
        }

        sup.connect("bitcoin", on_tick).await.unwrap();
        let cut = ticks.lock().unwrap().len();
        wait_for(|| ticks.lock().unwrap().len() >= cut + 3, Duration::from_secs(3)).await;
        {
            let t = ticks.lock().unwrap();
            assert!(t[cut..].iter().all(|&px| px == 100.0));
        }

        sup.disconnect().await;
        assert_eq!(accepts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausts_after_the_reconnect_ceiling() {
        let (listener, port) = bind().await;
        let accepts = spawn_refusing_server(listener);

        let mut sup = StreamSupervisor::new(Arc::new(TestProvider::new(port)), quick_policy());
        sup.connect("bitcoin", Arc::new(|_| {})).await.unwrap();

        let state = sup.state();
        wait_for(|| *state.borrow() == ConnectionState::Exhausted, Duration::from_secs(3)).await;
        // initial dial + max_attempts reconnects
        assert_eq!(accepts.load(Ordering::SeqCst), 3);

        // exhausted means exhausted: nothing redials without a new connect
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(accepts.load(Ordering::SeqCst), 3);
        assert!(!sup.is_connected());
    }

    #[tokio::test]
    async fn a_successful_open_resets_the_attempt_counter() {
        let (listener, port) = bind().await;
        let accepts = Arc::new(AtomicUsize::new(0));
        {
            let accepts = Arc::clone(&accepts);
            tokio::spawn(async move {
                let mut index = 0usize;
                loop {
                    let (stream, _) = match listener.accept().await {
                        Ok(pair) => pair,
                        Err(_) => return,
                    };
                    accepts.fetch_add(1, Ordering::SeqCst);
                    if index == 1 {
                        // let this one reach Open, then kill it
                        tokio::spawn(async move {
                            if let Ok(mut ws) = accept_async(stream).await {
                                let _ = ws.next().await;
                                tokio::time::sleep(Duration::from_millis(150)).await;
                                let _ = ws.close(None).await;
                            }
                        });
                    } else {
                        drop(stream);
                    }
                    index += 1;
                }
            });
        }

        let mut sup = StreamSupervisor::new(Arc::new(TestProvider::new(port)), quick_policy());
        sup.connect("bitcoin", Arc::new(|_| {})).await.unwrap();

        let state = sup.state();
        wait_for(|| *state.borrow() == ConnectionState::Exhausted, Duration::from_secs(5)).await;
        // fail, open (counter reset), then a full fresh round of failures:
        // 1 + 1 + max_attempts accepts in total
        assert_eq!(accepts.load(Ordering::SeqCst), 4, "counter was not reset on reopen");
    }

    #[tokio::test]
    async fn disconnect_cancels_a_pending_reconnect() {
        let (listener, port) = bind().await;
        let accepts = spawn_refusing_server(listener);

        let policy = ReconnectPolicy {
            max_attempts: 3,
            backoff: Backoff::Exponential {
                base: Duration::from_millis(300),
                cap: Duration::from_millis(300),
            },
        };
        let mut sup = StreamSupervisor::new(Arc::new(TestProvider::new(port)), policy);
        sup.connect("bitcoin", Arc::new(|_| {})).await.unwrap();

        let state = sup.state();
        wait_for(|| *state.borrow() == ConnectionState::ReconnectPending, Duration::from_secs(3))
            .await;
        sup.disconnect().await;
        assert_eq!(*state.borrow(), ConnectionState::Idle);

        // the reconnect timer would have fired inside this window
        tokio::time::sleep(Duration::from_millis(700)).await;
        assert_eq!(accepts.load(Ordering::SeqCst), 1);
        assert!(!sup.is_connected());
    }
}
