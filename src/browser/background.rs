//! Buffer initialization on a worker thread.

use std::sync::mpsc::{self, Receiver};
use std::thread::JoinHandle;

use crate::data::buffer::{DecodedChannels, InitRequest};
use crate::data::init_task::{CancelToken, InitControl, InitProgress};
use crate::error::BufferInitError;

/// Handle of a running background init. Hand it back to
/// [`crate::browser::SignalBrowserModel::finish_init_buffer`] to commit.
pub struct InitTask {
    handle: JoinHandle<Result<DecodedChannels, BufferInitError>>,
    cancel: CancelToken,
    progress_rx: Receiver<InitProgress>,
    last_progress: Option<InitProgress>,
}

impl InitTask {
    pub(crate) fn spawn(request: InitRequest) -> Result<Self, BufferInitError> {
        let (tx, progress_rx) = mpsc::channel();
        let cancel = CancelToken::new();
        let control = InitControl::new().with_cancel(cancel.clone()).with_progress(tx);
        let handle = std::thread::Builder::new()
            .name("sigbrowse-init".to_string())
            .spawn(move || request.run(&control))
            .map_err(|_| BufferInitError::WorkerLost)?;
        Ok(Self {
            handle,
            cancel,
            progress_rx,
            last_progress: None,
        })
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Latest progress report, draining anything queued since the last call.
    pub fn progress(&mut self) -> Option<InitProgress> {
        while let Ok(p) = self.progress_rx.try_recv() {
            self.last_progress = Some(p);
        }
        self.last_progress
    }

    /// Block until the worker is done.
    pub(crate) fn wait(self) -> Result<DecodedChannels, BufferInitError> {
        self.handle.join().unwrap_or(Err(BufferInitError::WorkerLost))
    }
}
