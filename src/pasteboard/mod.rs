//! Pasteboard watching
//!
//! Provides the pasteboard watcher, content models, and access backends

pub mod models;
pub mod source;
pub mod watcher;

pub use models::{CaptureError, ContentKind, PasteboardItem};
pub use source::{PasteboardSnapshot, PasteboardSource, SystemPasteboard};
pub use watcher::{PasteboardWatcher, WatchError};
