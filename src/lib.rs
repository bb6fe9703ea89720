//! clipwatch - a lightweight system pasteboard watcher
//!
//! Watches the system pasteboard for changes, records each new piece of
//! content into a local SQLite history, and delivers change events to
//! subscribers.
//!
//! Most embedders construct and own a [`PasteboardWatcher`] directly:
//!
//! ```no_run
//! use clipwatch::PasteboardWatcher;
//!
//! let watcher = PasteboardWatcher::open_default().unwrap();
//! let events = watcher.subscribe();
//! watcher.begin_listening();
//! for item in events {
//!     println!("captured: {}", item.preview);
//! }
//! ```
//!
//! Hosts that want a fire-and-forget setup can instead use the crate-level
//! [`load`] / [`check_pasteboard`] functions, which operate a single
//! process-wide watcher.

pub mod config;
pub mod pasteboard;
pub mod storage;

pub use config::{HistoryLimit, Settings};
pub use pasteboard::{
    CaptureError, ContentKind, PasteboardItem, PasteboardSnapshot, PasteboardSource,
    PasteboardWatcher, SystemPasteboard, WatchError,
};
pub use storage::{Database, DatabaseError};

use std::sync::mpsc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

/// Process-wide watcher driven by [`load`] and [`check_pasteboard`]
static WATCHER: Lazy<Mutex<Option<PasteboardWatcher>>> = Lazy::new(|| Mutex::new(None));

/// One-time setup of the process-wide watcher
///
/// Opens the default watcher and starts it listening, so the facility is
/// active without further caller action. Repeated calls are a no-op.
/// Failures are logged, never propagated.
pub fn load() {
    let mut slot = WATCHER.lock();
    if slot.is_some() {
        log::debug!("pasteboard watcher already loaded");
        return;
    }

    match PasteboardWatcher::open_default() {
        Ok(watcher) => {
            watcher.begin_listening();
            *slot = Some(watcher);
            log::info!("pasteboard watcher loaded");
        }
        Err(e) => log::error!("failed to load pasteboard watcher: {}", e),
    }
}

/// Check the pasteboard once, synchronously, on the process-wide watcher
///
/// Reads the current content without mutating it and records anything new,
/// exactly as the polling thread would. A warning is logged when [`load`]
/// has not run (or failed).
pub fn check_pasteboard() {
    let slot = WATCHER.lock();
    match slot.as_ref() {
        Some(watcher) => watcher.check_now(),
        None => log::warn!("check_pasteboard called before load"),
    }
}

/// Subscribe to change events from the process-wide watcher
///
/// Returns `None` when [`load`] has not run (or failed).
pub fn subscribe() -> Option<mpsc::Receiver<PasteboardItem>> {
    let slot = WATCHER.lock();
    slot.as_ref().map(|watcher| watcher.subscribe())
}
