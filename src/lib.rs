//! sigbrowse crate root: re-exports and module wiring.
//!
//! Buffering and layout core of a multichannel biosignal viewer:
//! - `reader`: the signal reader capability and an in-memory reader
//! - `data`: signal buffer, min/max downsampling and the event table
//! - `browser`: the browser model driving a host-supplied view
//! - `actions`: menu/toolbar action gating
//! - `config`: persisted browser settings

pub mod actions;
pub mod browser;
pub mod config;
pub mod data;
pub mod diagnostics;
pub mod error;
pub mod hotkeys;
pub mod reader;

// Public re-exports for a compact external API
pub use actions::{ActionGroup, ActionId, ActionManager, GuiState};
pub use browser::{
    BrowserMode, BrowserState, BrowserView, InitTask, ScaleMode, SelectionState, SignalBrowserModel, SignalItem,
};
pub use config::{load_settings_from_path, save_settings_to_path, BrowserSettings};
pub use data::buffer::{SignalBuffer, WholeBufferMode};
pub use data::event::{EventChannel, EventId, SignalEvent, UNDEFINED_CHANNEL};
pub use data::math_utils::round125;
pub use diagnostics::{LogSink, MemoryLog};
pub use error::{BrowserError, BufferError, BufferInitError, PreconditionError, ReaderError};
pub use reader::{shared_reader, BasicHeader, MemorySignalReader, SharedReader, SignalChannel, SignalReader};
