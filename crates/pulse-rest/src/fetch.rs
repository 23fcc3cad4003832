//! Retrying GET plumbing shared by every REST endpoint.

use std::time::Duration;

use anyhow::{Context, Result};
use pulse_core::PulseError;
use pulse_core::retry::{self, Attempt, RetryPolicy};
use tracing::warn;

/// Build the shared HTTP client.
pub fn build_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .user_agent(concat!("coinpulse/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("building http client")
}

/// GET with bounded retries.
///
/// Transport failures and 429s are retried per `policy`; any other status
/// is handed straight back without another attempt. A 429 that survives
/// every attempt is also handed back — not raised — so the caller can
/// decide what to log before failing.
pub async fn get_with_retry(
    client: &reqwest::Client,
    url: &str,
    policy: &RetryPolicy,
) -> Result<reqwest::Response, PulseError> {
    retry::run(policy, |_attempt| async move {
        match client.get(url).send().await {
            Ok(resp) if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS => {
                Attempt::RateLimited(resp)
            }
            Ok(resp) => Attempt::Done(resp),
            Err(e) => Attempt::Transport(e.to_string()),
        }
    })
    .await
}

/// GET expecting a JSON body; maps rate limits and other non-2xx statuses
/// to typed errors.
pub async fn get_json(
    client: &reqwest::Client,
    url: &str,
    policy: &RetryPolicy,
) -> Result<serde_json::Value, PulseError> {
    let resp = get_with_retry(client, url, policy).await?;
    let status = resp.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        warn!("rate limited after retries: {url}");
        return Err(PulseError::RateLimited);
    }
    if !status.is_success() {
        return Err(PulseError::Http(status.as_u16()));
    }

    resp.json::<serde_json::Value>().await.map_err(|e| PulseError::Parse(e.to_string()))
}
