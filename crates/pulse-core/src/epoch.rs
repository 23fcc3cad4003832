//! Generation counter for invalidating superseded work.
//!
//! Switching coins replaces the live subscription and makes in-flight work
//! for the old one stale. Components that replace work own an [`Epoch`];
//! every unit of work carries an [`EpochToken`] and checks it before
//! delivering a result. Bumping the epoch invalidates all outstanding tokens
//! synchronously — there is no window in which a stale callback can still
//! observe a current token.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic generation counter owned by a component that replaces work.
#[derive(Debug, Clone, Default)]
pub struct Epoch {
    counter: Arc<AtomicU64>,
}

impl Epoch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidate all outstanding tokens without issuing a new one.
    pub fn bump(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    /// Invalidate outstanding tokens and return a token for the new
    /// generation.
    pub fn begin(&self) -> EpochToken {
        let value = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        EpochToken { counter: Arc::clone(&self.counter), value }
    }
}

/// Handle that can cheaply check whether its generation is still live.
#[derive(Debug, Clone)]
pub struct EpochToken {
    counter: Arc<AtomicU64>,
    value: u64,
}

impl EpochToken {
    pub fn is_current(&self) -> bool {
        self.counter.load(Ordering::SeqCst) == self.value
    }
}
