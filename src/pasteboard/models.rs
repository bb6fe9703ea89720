//! Pasteboard content data models
//!
//! Defines the history record types captured from the system pasteboard

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::DatabaseError;

/// Pasteboard content kind enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Plain text
    Text,
    /// Rich text (HTML format)
    RichText,
    /// Web URL
    Url,
    /// Image
    Image,
}

impl ContentKind {
    /// Convert from string to ContentKind
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "text" => Some(ContentKind::Text),
            "rich_text" => Some(ContentKind::RichText),
            "url" => Some(ContentKind::Url),
            "image" => Some(ContentKind::Image),
            _ => None,
        }
    }

    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Text => "text",
            ContentKind::RichText => "rich_text",
            ContentKind::Url => "url",
            ContentKind::Image => "image",
        }
    }

    /// Capture priority. When one snapshot carries several representations,
    /// the highest-priority kind names the item.
    pub(crate) fn priority(&self) -> u8 {
        match self {
            ContentKind::RichText => 0,
            ContentKind::Text => 1,
            ContentKind::Url => 2,
            ContentKind::Image => 3,
        }
    }
}

/// Errors raised while capturing pasteboard content or restoring it
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("unsupported image format")]
    UnsupportedImageFormat,
    #[error("unsupported pasteboard item")]
    UnsupportedItem,
    #[error("no pasteboard item")]
    NoItem,
    #[error("item already in history")]
    DuplicateItem,
    #[error("item of {size} bytes exceeds the {limit} byte limit")]
    ItemTooLarge { size: usize, limit: usize },
    #[error("clipboard error: {0}")]
    Clipboard(#[from] arboard::Error),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Pasteboard history record item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasteboardItem {
    /// Unique identifier
    pub id: i64,
    /// Content kind
    pub kind: ContentKind,
    /// Plain text content (text, URL and rich text items all carry this field)
    pub text: Option<String>,
    /// Rich text HTML content
    pub html: Option<String>,
    /// Image path (relative to the data directory)
    pub image_path: Option<String>,
    /// Preview text (for list display)
    pub preview: String,
    /// Content hash (for deduplication)
    pub hash: String,
    /// Capture time
    pub created_at: DateTime<Utc>,
}

impl PasteboardItem {
    /// Create a new text record
    pub fn new_text(id: i64, text: String, hash: String) -> Self {
        let preview = Self::generate_preview(&text, 100);
        Self {
            id,
            kind: ContentKind::Text,
            text: Some(text),
            html: None,
            image_path: None,
            preview,
            hash,
            created_at: Utc::now(),
        }
    }

    /// Create a new URL record
    pub fn new_url(id: i64, url: String, hash: String) -> Self {
        let preview = Self::generate_preview(&url, 100);
        Self {
            id,
            kind: ContentKind::Url,
            text: Some(url),
            html: None,
            image_path: None,
            preview,
            hash,
            created_at: Utc::now(),
        }
    }

    /// Create a new rich text record
    pub fn new_rich_text(id: i64, plain: String, html: String, hash: String) -> Self {
        let preview = Self::generate_preview(&plain, 100);
        Self {
            id,
            kind: ContentKind::RichText,
            text: Some(plain),
            html: Some(html),
            image_path: None,
            preview,
            hash,
            created_at: Utc::now(),
        }
    }

    /// Create a new image record
    pub fn new_image(id: i64, image_path: String, hash: String) -> Self {
        Self {
            id,
            kind: ContentKind::Image,
            text: None,
            html: None,
            image_path: Some(image_path),
            preview: "[Image]".to_string(),
            hash,
            created_at: Utc::now(),
        }
    }

    /// Generate preview text
    fn generate_preview(text: &str, max_len: usize) -> String {
        let text = text.trim();
        if text.chars().count() <= max_len {
            text.to_string()
        } else {
            let truncated: String = text.chars().take(max_len).collect();
            format!("{}...", truncated)
        }
    }
}
