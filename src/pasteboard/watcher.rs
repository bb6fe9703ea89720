//! Pasteboard watcher
//!
//! Polls the system pasteboard for changes, records new content into the
//! history database, and fans change events out to subscribers

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::Settings;
use crate::pasteboard::models::{CaptureError, ContentKind, PasteboardItem};
use crate::pasteboard::source::{PasteboardSnapshot, PasteboardSource, SystemPasteboard};
use crate::storage::{Database, DatabaseError};

/// Errors raised while opening a watcher
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// State shared between the watcher handle and its polling thread
struct WatchCore {
    source: Box<dyn PasteboardSource>,
    db: Database,
    data_dir: PathBuf,
    history_limit: i64,
    max_item_bytes: usize,
    /// Hash of the last content seen on the pasteboard
    last_hash: Mutex<String>,
    /// Whether capture is paused (set while the watcher itself writes)
    paused: AtomicBool,
    subscribers: Mutex<Vec<mpsc::Sender<PasteboardItem>>>,
}

/// Pasteboard watcher
///
/// Owns the polling loop and the capture pipeline. Constructed explicitly,
/// torn down explicitly: [`stop`](Self::stop) (or dropping the watcher) ends
/// the polling thread and no further events are delivered.
pub struct PasteboardWatcher {
    core: Arc<WatchCore>,
    /// Whether the polling thread is running
    running: Arc<AtomicBool>,
    poll_interval: Duration,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl PasteboardWatcher {
    /// Create a watcher over an explicit source, database and settings
    pub fn new<S>(source: S, db: Database, settings: &Settings, data_dir: PathBuf) -> Self
    where
        S: PasteboardSource,
    {
        Self {
            core: Arc::new(WatchCore {
                source: Box::new(source),
                db,
                data_dir,
                history_limit: settings.history_limit.as_i64(),
                max_item_bytes: settings.max_item_bytes,
                last_hash: Mutex::new(String::new()),
                paused: AtomicBool::new(false),
                subscribers: Mutex::new(Vec::new()),
            }),
            running: Arc::new(AtomicBool::new(false)),
            poll_interval: Duration::from_millis(settings.poll_interval_ms),
            worker: Mutex::new(None),
        }
    }

    /// Open a watcher over the system pasteboard with persisted settings,
    /// storing history under the platform data directory
    pub fn open_default() -> Result<Self, WatchError> {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("clipwatch");
        fs::create_dir_all(&data_dir)?;

        let db = Database::open(&data_dir.join("data.db"))?;
        let settings = Settings::load(&db);

        Ok(Self::new(SystemPasteboard::new(), db, &settings, data_dir))
    }

    /// Begin listening for pasteboard change notifications
    ///
    /// Spawns the polling thread and returns immediately; capture and event
    /// delivery happen asynchronously until [`stop`](Self::stop) is called or
    /// the watcher is dropped. Calling this on a watcher that is already
    /// listening is a no-op.
    pub fn begin_listening(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            log::warn!("pasteboard watcher is already listening");
            return;
        }

        let core = Arc::clone(&self.core);
        let running = Arc::clone(&self.running);
        let interval = self.poll_interval;

        let handle = std::thread::spawn(move || {
            log::info!(
                "pasteboard watcher started with {}ms interval",
                interval.as_millis()
            );

            while running.load(Ordering::SeqCst) {
                core.poll_once();
                std::thread::sleep(interval);
            }

            log::info!("pasteboard watcher stopped");
        });

        *self.worker.lock() = Some(handle);
    }

    /// Whether the polling thread is currently running
    pub fn is_listening(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Check the pasteboard once, synchronously
    ///
    /// Records and announces new content exactly as the polling thread
    /// would. Usable whether or not the watcher is listening; failures are
    /// logged, never propagated.
    pub fn check_now(&self) {
        self.core.poll_once();
    }

    /// Register a change subscriber
    ///
    /// Every captured item is sent to each live subscriber; receivers whose
    /// channel has disconnected are dropped at the next send.
    pub fn subscribe(&self) -> mpsc::Receiver<PasteboardItem> {
        let (tx, rx) = mpsc::channel();
        self.core.subscribers.lock().push(tx);
        rx
    }

    /// Pause capture (used while the host application writes to the
    /// pasteboard itself)
    pub fn pause(&self) {
        self.core.paused.store(true, Ordering::SeqCst);
    }

    /// Resume capture
    pub fn resume(&self) {
        self.core.paused.store(false, Ordering::SeqCst);
    }

    /// Stop listening
    ///
    /// Ends the polling thread; no further events are delivered. The watcher
    /// can begin listening again afterwards.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.worker.lock().take() {
            if handle.join().is_err() {
                log::error!("pasteboard polling thread panicked");
            }
        }
    }

    /// Restore a history item to the system pasteboard
    ///
    /// The write is excluded from capture, so restoring an item does not
    /// create a fresh history record.
    pub fn copy_item(&self, item: &PasteboardItem) -> Result<(), CaptureError> {
        self.core.paused.store(true, Ordering::SeqCst);
        let result = self.write_item(item);
        // Remember the restored content as already seen, so capture stays
        // quiet once polling resumes.
        *self.core.last_hash.lock() = item.hash.clone();
        self.core.paused.store(false, Ordering::SeqCst);
        result
    }

    /// Fetch the most recent history items, newest first
    pub fn history(&self, limit: Option<u32>) -> Result<Vec<PasteboardItem>, DatabaseError> {
        self.core.db.all_items(limit)
    }

    /// Look up a single history item
    pub fn item(&self, id: i64) -> Result<Option<PasteboardItem>, DatabaseError> {
        self.core.db.item_by_id(id)
    }

    /// Search history items by their text content, newest first
    pub fn search(&self, query: &str, limit: Option<u32>) -> Result<Vec<PasteboardItem>, DatabaseError> {
        self.core.db.search_items(query, limit)
    }

    /// Number of stored history items
    pub fn history_count(&self) -> Result<i64, DatabaseError> {
        self.core.db.item_count()
    }

    /// Delete a single history item
    pub fn delete_item(&self, id: i64) -> Result<bool, DatabaseError> {
        self.core.db.delete_item(id)
    }

    /// Clear the whole history
    pub fn clear_history(&self) -> Result<(), DatabaseError> {
        self.core.db.clear_all()
    }

    fn write_item(&self, item: &PasteboardItem) -> Result<(), CaptureError> {
        match item.kind {
            ContentKind::Text | ContentKind::Url => {
                let text = item.text.as_deref().ok_or(CaptureError::NoItem)?;
                let mut clipboard = arboard::Clipboard::new()?;
                clipboard.set_text(text.to_owned())?;
            }
            ContentKind::RichText => {
                let html = item.html.clone().ok_or(CaptureError::NoItem)?;
                let mut clipboard = arboard::Clipboard::new()?;
                clipboard.set_html(html, item.text.clone())?;
            }
            ContentKind::Image => {
                let relative = item.image_path.as_deref().ok_or(CaptureError::NoItem)?;
                let png = fs::read(self.core.data_dir.join(relative))?;
                let decoded = image::load_from_memory(&png)
                    .map_err(|_| CaptureError::UnsupportedImageFormat)?
                    .to_rgba8();
                let (width, height) = decoded.dimensions();
                let data = arboard::ImageData {
                    width: width as usize,
                    height: height as usize,
                    bytes: decoded.into_raw().into(),
                };
                let mut clipboard = arboard::Clipboard::new()?;
                clipboard.set_image(data)?;
            }
        }
        Ok(())
    }
}

impl Drop for PasteboardWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

impl WatchCore {
    /// One poll step: snapshot, dedup, record, announce
    fn poll_once(&self) {
        if self.paused.load(Ordering::SeqCst) {
            return;
        }

        let Some(snapshot) = self.source.snapshot() else {
            return;
        };

        {
            let mut last = self.last_hash.lock();
            if *last == snapshot.hash {
                return;
            }
            *last = snapshot.hash.clone();
        }

        match self.record(snapshot) {
            Ok(item) => {
                log::debug!("captured pasteboard content: {:?}", item.kind);
                self.broadcast(item);
            }
            Err(CaptureError::DuplicateItem) => {
                log::debug!("pasteboard content already in history");
            }
            Err(e) => log::warn!("failed to record pasteboard content: {}", e),
        }
    }

    /// Persist a snapshot as a history item
    fn record(&self, snapshot: PasteboardSnapshot) -> Result<PasteboardItem, CaptureError> {
        let size = snapshot.approx_size();
        if size > self.max_item_bytes {
            return Err(CaptureError::ItemTooLarge {
                size,
                limit: self.max_item_bytes,
            });
        }

        if self.db.hash_exists(&snapshot.hash)? {
            return Err(CaptureError::DuplicateItem);
        }

        let mut item = match snapshot.kind {
            ContentKind::Text => {
                let text = snapshot.text.ok_or(CaptureError::UnsupportedItem)?;
                PasteboardItem::new_text(0, text, snapshot.hash)
            }
            ContentKind::Url => {
                let url = snapshot.text.ok_or(CaptureError::UnsupportedItem)?;
                PasteboardItem::new_url(0, url, snapshot.hash)
            }
            ContentKind::RichText => {
                let html = snapshot.html.ok_or(CaptureError::UnsupportedItem)?;
                let plain = snapshot.text.unwrap_or_default();
                PasteboardItem::new_rich_text(0, plain, html, snapshot.hash)
            }
            ContentKind::Image => {
                let png = snapshot.image_png.ok_or(CaptureError::UnsupportedItem)?;
                let images_dir = self.data_dir.join("images");
                fs::create_dir_all(&images_dir)?;

                let filename = format!("{}.png", uuid::Uuid::new_v4());
                fs::write(images_dir.join(&filename), &png)?;

                PasteboardItem::new_image(0, format!("images/{}", filename), snapshot.hash)
            }
        };

        item.id = self.db.insert_item(&item)?;

        if self.history_limit > 0 {
            match self.db.purge_to_limit(self.history_limit) {
                Ok(0) => {}
                Ok(purged) => log::debug!("purged {} old history items", purged),
                Err(e) => log::warn!("failed to purge history: {}", e),
            }
        }

        Ok(item)
    }

    /// Deliver an item to every live subscriber
    fn broadcast(&self, item: PasteboardItem) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(item.clone()).is_ok());
    }
}
