//! Bounded-retry engine with pluggable backoff.
//!
//! One engine serves both halves of the acquisition layer: REST fetches use
//! the linear schedule, while the stream supervisor reuses
//! [`Backoff::Exponential`] for reconnect scheduling. Policies are immutable
//! per call and hold no shared state, so concurrent operations never
//! interfere.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::error::PulseError;

/// Delay schedule, keyed by the 1-based attempt number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `base × attempt` — the REST default.
    Linear { base: Duration },
    /// `min(base × 2^(attempt-1), cap)` — used for reconnects.
    Exponential { base: Duration, cap: Duration },
}

impl Backoff {
    /// Delay before retrying after the given attempt.
    pub fn delay(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        match *self {
            Backoff::Linear { base } => base.saturating_mul(attempt),
            Backoff::Exponential { base, cap } => {
                let factor = 2u32.saturating_pow(attempt - 1);
                base.saturating_mul(factor).min(cap)
            }
        }
    }
}

/// Retry policy for one logical operation.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn linear(max_attempts: u32, base: Duration) -> Self {
        Self { max_attempts, backoff: Backoff::Linear { base } }
    }

    pub fn exponential(max_attempts: u32, base: Duration, cap: Duration) -> Self {
        Self { max_attempts, backoff: Backoff::Exponential { base, cap } }
    }
}

impl Default for RetryPolicy {
    /// REST default: 3 attempts with 1 s linear backoff.
    fn default() -> Self {
        Self::linear(3, Duration::from_secs(1))
    }
}

/// Outcome of one attempt, as reported by the operation closure.
pub enum Attempt<T> {
    /// Terminal result — handed back to the caller as-is. Covers success
    /// and every HTTP status that is not worth retrying.
    Done(T),
    /// HTTP 429. Retried while attempts remain; the final one is returned
    /// rather than raised, so the caller decides how to log it.
    RateLimited(T),
    /// Connection-level failure. Retried while attempts remain; the final
    /// one surfaces as [`PulseError::Transport`].
    Transport(String),
}

/// Drive `op` until it produces a terminal result or the policy is
/// exhausted. `op` receives the 1-based attempt number.
pub async fn run<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, PulseError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Attempt<T>>,
{
    let max = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let last = attempt >= max;
        match op(attempt).await {
            Attempt::Done(value) => return Ok(value),
            Attempt::RateLimited(value) => {
                if last {
                    return Ok(value);
                }
                let delay = policy.backoff.delay(attempt);
                debug!("rate limited (attempt {attempt}/{max}), backing off {delay:?}");
                tokio::time::sleep(delay).await;
            }
            Attempt::Transport(err) => {
                if last {
                    return Err(PulseError::Transport(err));
                }
                let delay = policy.backoff.delay(attempt);
                debug!("transport failure (attempt {attempt}/{max}): {err}, backing off {delay:?}");
                tokio::time::sleep(delay).await;
            }
        }
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::linear(max_attempts, Duration::from_millis(1))
    }

    fn scripted(statuses: &[u16], attempt: u32) -> Attempt<u16> {
        match statuses[(attempt - 1) as usize] {
            429 => Attempt::RateLimited(429),
            0 => Attempt::Transport("connection refused".into()),
            status => Attempt::Done(status),
        }
    }

    #[tokio::test]
    async fn rate_limits_then_success_returns_the_success() {
        let statuses = [429, 429, 200];
        let result = run(&quick(3), |n| {
            let outcome = scripted(&statuses, n);
            async move { outcome }
        })
        .await
        .unwrap();
        assert_eq!(result, 200);
    }

    #[tokio::test]
    async fn final_rate_limit_is_returned_not_raised() {
        let statuses = [429, 429, 429];
        let result = run(&quick(3), |n| {
            let outcome = scripted(&statuses, n);
            async move { outcome }
        })
        .await
        .unwrap();
        assert_eq!(result, 429);
    }

    #[tokio::test]
    async fn other_http_statuses_are_not_retried() {
        let statuses = [500, 200];
        let mut calls = 0;
        let result = run(&quick(3), |n| {
            calls += 1;
            let outcome = scripted(&statuses, n);
            async move { outcome }
        })
        .await
        .unwrap();
        assert_eq!(result, 500);
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn transport_failures_exhaust_into_an_error() {
        let statuses = [0, 0, 0];
        let err = run(&quick(3), |n| {
            let outcome = scripted(&statuses, n);
            async move { outcome }
        })
        .await
        .unwrap_err();
        assert!(matches!(err, PulseError::Transport(_)));
    }

    #[tokio::test]
    async fn transport_failure_then_recovery() {
        let statuses = [0, 200];
        let result = run(&quick(3), |n| {
            let outcome = scripted(&statuses, n);
            async move { outcome }
        })
        .await
        .unwrap();
        assert_eq!(result, 200);
    }

    #[test]
    fn linear_delay_grows_with_attempt() {
        let backoff = Backoff::Linear { base: Duration::from_secs(1) };
        assert_eq!(backoff.delay(1), Duration::from_secs(1));
        assert_eq!(backoff.delay(2), Duration::from_secs(2));
        assert_eq!(backoff.delay(3), Duration::from_secs(3));
    }

    #[test]
    fn exponential_delay_doubles_and_caps() {
        let backoff =
            Backoff::Exponential { base: Duration::from_secs(1), cap: Duration::from_secs(10) };
        let delays: Vec<_> = (1..=6).map(|n| backoff.delay(n)).collect();
        assert_eq!(delays[0], Duration::from_secs(1));
        assert_eq!(delays[1], Duration::from_secs(2));
        assert_eq!(delays[2], Duration::from_secs(4));
        assert_eq!(delays[3], Duration::from_secs(8));
        assert_eq!(delays[4], Duration::from_secs(10));
        assert_eq!(delays[5], Duration::from_secs(10));
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    }
}
