//! # pulse-runner
//!
//! Terminal dashboard runner for coinpulse.
//!
//! Loads the optional JSON config, opens the live price feed for one coin,
//! polls the REST endpoints on their intervals, and renders the merged view
//! to the log until Ctrl+C.
//!
//! # Usage
//!
//! ```bash
//! coinpulse bitcoin --provider kraken --log-level info
//! coinpulse ethereum --config config.json --analyze
//! ```

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use pulse_core::PulseError;
use pulse_core::config::{self, AppConfig};
use pulse_core::retry::RetryPolicy;
use pulse_core::types::{NewsArticle, PriceTick};
use pulse_core::ws::OnTick;
use pulse_feed::provider;
use pulse_feed::series::MarketView;
use pulse_feed::supervisor::{ConnectionState, ReconnectPolicy, StreamSupervisor};
use pulse_rest::{analysis, chart, fetch, news, snapshot, symbols};
use tracing::{info, warn};

/// Crypto dashboard data runner.
#[derive(Parser)]
#[command(name = "coinpulse", about = "Crypto dashboard data runner")]
struct Cli {
    /// Logical coin id (CoinGecko notation, e.g. `bitcoin`).
    coin: Option<String>,

    /// Live feed provider (kraken, binance).
    #[arg(short, long)]
    provider: Option<String>,

    /// Configuration file path (JSON).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Optional log directory for file output.
    #[arg(long)]
    log_dir: Option<String>,

    /// Run one AI market analysis after the first full data load.
    #[arg(long)]
    analyze: bool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// `"bitcoin"` → `"Bitcoin"` for prompt copy.
fn display_name(coin: &str) -> String {
    let mut chars = coin.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn render(view: &MarketView, news_count: usize, coin: &str) {
    match view.snapshot() {
        Some(snap) => {
            let price = view.current_price().unwrap_or(snap.usd);
            let feed = if view.connected() { "live" } else { "poll" };
            info!(
                "{coin}: ${price:.2} [{feed}] | 24h {:+.2}% | range ${:.2}-${:.2} | chart {} pt(s) | {news_count} article(s)",
                snap.usd_24h_change,
                snap.usd_24h_low,
                snap.usd_24h_high,
                view.series().len(),
            );
        }
        None => info!("{coin}: waiting for first snapshot"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    pulse_core::logging::init_logging(&cli.log_level, cli.log_dir.as_deref(), "coinpulse");

    let app_config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => AppConfig::default(),
    };

    let coin = cli
        .coin
        .clone()
        .unwrap_or_else(|| app_config.effective_coin())
        .to_ascii_lowercase();
    let provider_name =
        cli.provider.clone().unwrap_or_else(|| app_config.effective_provider());

    info!("coinpulse starting — coin={coin}, provider={provider_name}");

    let adapter = provider::create(&provider_name)?;
    let mut supervisor =
        StreamSupervisor::new(adapter, ReconnectPolicy::from_config(&app_config.stream()));

    let view = Arc::new(Mutex::new(MarketView::new()));
    let headlines = Arc::new(Mutex::new(Vec::<NewsArticle>::new()));

    // Live ticks fold straight into the view.
    let tick_view = Arc::clone(&view);
    let on_tick: OnTick = Arc::new(move |price| {
        lock(&tick_view).apply_tick(PriceTick::from_stream(price));
    });

    match supervisor.connect(&coin, on_tick).await {
        Ok(()) => {}
        Err(PulseError::UnsupportedSymbol(_)) => {
            warn!("no live feed for '{coin}' on {provider_name}; relying on snapshot polling");
        }
        Err(e) => return Err(e.into()),
    }

    let mut tasks: Vec<tokio::task::JoinHandle<()>> = Vec::new();

    // Connection status → view.
    {
        let mut state_rx = supervisor.state();
        let view = Arc::clone(&view);
        tasks.push(tokio::spawn(async move {
            loop {
                let state = *state_rx.borrow_and_update();
                lock(&view).set_connected(state == ConnectionState::Open);
                if state == ConnectionState::Exhausted {
                    warn!("live feed exhausted its reconnect budget; restart to resubscribe");
                }
                if state_rx.changed().await.is_err() {
                    return;
                }
            }
        }));
    }

    let client = fetch::build_client()?;
    let rest_config = app_config.rest();
    let policy =
        RetryPolicy::linear(rest_config.effective_max_attempts(), rest_config.effective_base_delay());
    let gecko_base = rest_config
        .coingecko_base
        .clone()
        .unwrap_or_else(|| snapshot::DEFAULT_BASE.to_string());
    let compare_base = rest_config
        .cryptocompare_base
        .clone()
        .unwrap_or_else(|| chart::DEFAULT_BASE.to_string());

    // Snapshot poller.
    {
        let client = client.clone();
        let view = Arc::clone(&view);
        let coin = coin.clone();
        let base = gecko_base.clone();
        let interval = rest_config.effective_snapshot_interval();
        tasks.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                match snapshot::fetch_snapshot(&client, &base, &coin, &policy).await {
                    Ok(snap) => lock(&view).set_snapshot(snap),
                    Err(e) => warn!("snapshot refresh failed: {e}"),
                }
            }
        }));
    }

    let ticker_symbol = symbols::ticker_symbol(&coin);
    if ticker_symbol.is_none() {
        warn!("no ticker symbol for '{coin}'; history and news panels disabled");
    }

    if let Some(symbol) = ticker_symbol {
        // Chart poller.
        {
            let client = client.clone();
            let view = Arc::clone(&view);
            let base = compare_base.clone();
            let interval = rest_config.effective_chart_interval();
            tasks.push(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                loop {
                    ticker.tick().await;
                    match chart::fetch_chart(&client, &base, symbol, &policy).await {
                        Ok(points) => lock(&view).replace_series(points),
                        Err(e) => warn!("chart refresh failed: {e}"),
                    }
                }
            }));
        }

        // News poller.
        {
            let client = client.clone();
            let headlines = Arc::clone(&headlines);
            let base = compare_base.clone();
            let interval = rest_config.effective_news_interval();
            tasks.push(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                loop {
                    ticker.tick().await;
                    match news::fetch_news(&client, &base, symbol, &policy).await {
                        Ok(articles) => *lock(&headlines) = articles,
                        Err(e) => warn!("news refresh failed: {e}"),
                    }
                }
            }));
        }
    }

    // Render loop.
    {
        let view = Arc::clone(&view);
        let headlines = Arc::clone(&headlines);
        let coin = coin.clone();
        tasks.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(15));
            ticker.tick().await; // nothing to show yet
            loop {
                ticker.tick().await;
                let news_count = lock(&headlines).len();
                render(&lock(&view), news_count, &coin);
            }
        }));
    }

    // One-shot market analysis.
    if cli.analyze {
        let analysis_config = app_config.analysis.clone().unwrap_or_default();
        match analysis_config.effective_api_key() {
            None => warn!("analysis requested but no API key configured; skipping"),
            Some(api_key) => {
                let client = client.clone();
                let view = Arc::clone(&view);
                let headlines = Arc::clone(&headlines);
                let coin = coin.clone();
                let base = analysis_config
                    .base_url
                    .clone()
                    .unwrap_or_else(|| analysis::DEFAULT_BASE_URL.to_string());
                let model = analysis_config
                    .model
                    .clone()
                    .unwrap_or_else(|| analysis::DEFAULT_MODEL.to_string());
                tasks.push(tokio::spawn(async move {
                    // wait for the first full data load
                    let deadline = tokio::time::Instant::now() + Duration::from_secs(60);
                    loop {
                        {
                            let v = lock(&view);
                            if v.snapshot().is_some() && !v.series().is_empty() {
                                break;
                            }
                        }
                        if tokio::time::Instant::now() > deadline {
                            warn!("market data never arrived; skipping analysis");
                            return;
                        }
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }

                    let (snap, history) = {
                        let v = lock(&view);
                        let Some(snap) = v.snapshot().copied() else { return };
                        (snap, v.series().points().to_vec())
                    };
                    let articles = lock(&headlines).clone();
                    let coin_name = display_name(&coin);
                    let coin_symbol = symbols::ticker_symbol(&coin)
                        .map(str::to_string)
                        .unwrap_or_else(|| coin.to_ascii_uppercase());
                    let request = analysis::AnalysisRequest {
                        coin_name: &coin_name,
                        coin_symbol: &coin_symbol,
                        snapshot: &snap,
                        history: &history,
                        headlines: &articles,
                    };

                    match analysis::fetch_analysis(&client, &base, &api_key, &model, &request).await
                    {
                        Ok(text) => info!("market analysis:\n{text}"),
                        Err(e) => warn!("analysis unavailable: {e}"),
                    }
                }));
            }
        }
    }

    info!("coinpulse running — press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");

    supervisor.disconnect().await;
    for task in tasks {
        task.abort();
    }

    info!("goodbye");
    Ok(())
}
