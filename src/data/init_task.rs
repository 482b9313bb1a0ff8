//! Cancellation and progress plumbing for buffer initialization.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;

/// Shared flag checked by `init` between chunks of records.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Records decoded so far out of the records to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitProgress {
    pub records_done: usize,
    pub records_total: usize,
}

impl InitProgress {
    /// Completion in `0.0..=1.0`. An empty job counts as complete.
    pub fn fraction(&self) -> f64 {
        if self.records_total == 0 {
            1.0
        } else {
            self.records_done as f64 / self.records_total as f64
        }
    }
}

/// What a running `init` reports to and listens for.
#[derive(Clone, Debug, Default)]
pub struct InitControl {
    pub cancel: CancelToken,
    pub progress: Option<Sender<InitProgress>>,
}

impl InitControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress(mut self, tx: Sender<InitProgress>) -> Self {
        self.progress = Some(tx);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub(crate) fn report(&self, progress: InitProgress) {
        if let Some(tx) = &self.progress {
            // receiver may already be gone
            let _ = tx.send(progress);
        }
    }
}
