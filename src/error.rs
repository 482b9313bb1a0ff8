//! Error types for readers, the signal buffer and the browser model.
//!
//! The browser model never propagates these to its callers for expected
//! conditions; it reports them through the diagnostics sink instead (see
//! [`crate::diagnostics`]). They are still typed so that the guard and buffer
//! logic can be tested on their own.

use crate::browser::BrowserState;
use crate::data::event::EventId;

/// Failure reported by a [`crate::reader::SignalReader`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReaderError {
    #[error("no file open")]
    NotOpen,
    #[error("cannot open '{path}': {message}")]
    Open { path: String, message: String },
    #[error("records {start}..{end} out of range ({available} available)")]
    OutOfRange {
        start: usize,
        end: usize,
        available: usize,
    },
    #[error("channel {0} does not exist")]
    NoSuchChannel(usize),
    #[error("{0}")]
    Io(String),
}

/// Failure of [`crate::data::buffer::SignalBuffer::init`].
///
/// When `init` fails the buffer keeps its previous decoded state.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BufferInitError {
    #[error("signal reader has no open file")]
    NotOpen,
    #[error("signal reader is unavailable (lock poisoned)")]
    ReaderUnavailable,
    #[error("cannot load {count} record(s) starting at {start}: {source}")]
    Records {
        start: usize,
        count: usize,
        #[source]
        source: ReaderError,
    },
    #[error("buffer initialization cancelled")]
    Cancelled,
    #[error("buffer initialization worker terminated unexpectedly")]
    WorkerLost,
}

/// Non-init buffer failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BufferError {
    #[error("channel {0} is not buffered")]
    ChannelNotBuffered(usize),
    #[error("channel {0} has no decoded data")]
    NoData(usize),
    #[error("event channel {channel} is invalid ({channels} channels)")]
    InvalidEventChannel { channel: usize, channels: usize },
    #[error("cannot load window: {0}")]
    Window(#[from] ReaderError),
    #[error("signal reader is unavailable (lock poisoned)")]
    ReaderUnavailable,
}

/// A public model operation was called while the model could not accept it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreconditionError {
    #[error("SignalBrowser not set")]
    NoView { op: &'static str },
    #[error("illegal state ({state:?})")]
    IllegalState {
        op: &'static str,
        state: BrowserState,
    },
}

impl PreconditionError {
    pub fn op(&self) -> &'static str {
        match self {
            PreconditionError::NoView { op } | PreconditionError::IllegalState { op, .. } => op,
        }
    }
}

/// Everything the browser model can report on its diagnostics sink.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BrowserError {
    #[error(transparent)]
    Precondition(#[from] PreconditionError),
    #[error("invalid parameter {name} = {value}")]
    InvalidParameter { name: &'static str, value: f64 },
    #[error("illegal channel number {channel} ({channels} channels)")]
    InvalidChannel { channel: usize, channels: usize },
    #[error("invalid event-id {0}")]
    InvalidEvent(EventId),
    #[error(transparent)]
    Buffer(#[from] BufferError),
    #[error(transparent)]
    BufferInit(#[from] BufferInitError),
}
