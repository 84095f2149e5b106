use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

/// Requests the agent makes of its own registration.
#[async_trait]
pub trait WorkerScope: Send + Sync {
    /// Activate this version immediately instead of waiting for every client to close.
    async fn skip_waiting(&self);
}

/// Records skip-waiting requests.
#[derive(Debug, Default)]
pub struct ScopeState {
    skipped_waiting: AtomicBool,
    requests: AtomicUsize,
}

impl ScopeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skipped_waiting(&self) -> bool {
        self.skipped_waiting.load(Ordering::SeqCst)
    }

    pub fn skip_waiting_requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkerScope for ScopeState {
    async fn skip_waiting(&self) {
        self.skipped_waiting.store(true, Ordering::SeqCst);
        self.requests.fetch_add(1, Ordering::SeqCst);
    }
}
