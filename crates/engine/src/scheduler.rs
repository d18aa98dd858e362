//! Debounce timer bound to a cancellation coordinator.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::cancellation::{CancellationCoordinator, CancellationToken};

/// Owns at most one pending timer. Scheduling again cancels the pending timer
/// and starts a new cycle; work whose timer already fired keeps running and is
/// expected to check its token before publishing.
#[derive(Debug, Default)]
pub struct Scheduler {
    coordinator: CancellationCoordinator,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `work` after `delay` unless another call supersedes it first.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F, Fut>(&self, delay: Duration, work: F) -> CancellationToken
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        // Minting and swapping under one lock keeps the stored timer and the
        // current token from the same call.
        let mut pending = self.pending.lock().expect("scheduler lock poisoned");
        let token = self.coordinator.begin_cycle();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            debug!(%token, "debounce elapsed");
            tokio::spawn(work(token));
        });
        if let Some(previous) = pending.replace(timer) {
            previous.abort();
        }
        token
    }

    /// Drop the pending timer, if any, and invalidate its token.
    pub fn cancel(&self) {
        let mut pending = self.pending.lock().expect("scheduler lock poisoned");
        self.coordinator.begin_cycle();
        if let Some(previous) = pending.take() {
            previous.abort();
        }
    }

    pub fn current_token(&self) -> CancellationToken {
        self.coordinator.current_token()
    }

    pub fn is_current(&self, token: &CancellationToken) -> bool {
        self.coordinator.is_current(token)
    }
}
