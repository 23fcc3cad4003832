//! Logging initialization using the `tracing` ecosystem.
//!
//! Console output for interactive runs, plus an optional daily-rotating file
//! via `tracing-appender`. The level comes from `RUST_LOG` when set,
//! otherwise from the explicit parameter.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber.
///
/// Call once at program start; afterwards all `tracing::info!()` etc. macros
/// produce output.
///
/// - `log_level`: default level when `RUST_LOG` is not set (e.g. `"info"`)
/// - `log_dir`: optional directory for daily-rotating log files
/// - `module_name`: log file prefix (e.g. `"coinpulse"`)
pub fn init_logging(log_level: &str, log_dir: Option<&str>, module_name: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let console_layer = fmt::layer().with_target(true).with_ansi(true);

    match log_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, module_name);
            let file_layer =
                fmt::layer().with_writer(file_appender).with_ansi(false).with_target(true);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(console_layer)
                .with(file_layer)
                .init();
        }
        None => {
            tracing_subscriber::registry().with(env_filter).with(console_layer).init();
        }
    }
}
