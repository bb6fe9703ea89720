//! Pasteboard access backends
//!
//! The watcher polls the pasteboard through the [`PasteboardSource`] seam,
//! so the capture loop can be driven by a scripted source in tests.

use blake3::Hasher;

use super::models::ContentKind;

/// One read of the pasteboard
#[derive(Debug, Clone)]
pub struct PasteboardSnapshot {
    /// Content kind
    pub kind: ContentKind,
    /// Plain text content
    pub text: Option<String>,
    /// Rich text HTML
    pub html: Option<String>,
    /// Image data (PNG format)
    pub image_png: Option<Vec<u8>>,
    /// Content hash
    pub hash: String,
}

impl PasteboardSnapshot {
    /// Build a snapshot from textual content, classifying URLs by shape
    pub fn from_text(text: String) -> Self {
        let kind = if looks_like_url(&text) {
            ContentKind::Url
        } else {
            ContentKind::Text
        };
        let hash = compute_hash(text.as_bytes());
        Self {
            kind,
            text: Some(text),
            html: None,
            image_png: None,
            hash,
        }
    }

    /// Approximate in-memory size of the carried content
    pub fn approx_size(&self) -> usize {
        self.text.as_ref().map_or(0, |t| t.len())
            + self.html.as_ref().map_or(0, |h| h.len())
            + self.image_png.as_ref().map_or(0, |i| i.len())
    }
}

/// Read access to a pasteboard
///
/// A snapshot read must never mutate the pasteboard.
pub trait PasteboardSource: Send + Sync + 'static {
    /// Read the current content, or `None` when the pasteboard is empty or
    /// holds nothing recognizable
    fn snapshot(&self) -> Option<PasteboardSnapshot>;
}

/// System pasteboard backed by arboard
///
/// A fresh clipboard handle is opened per read; a long-lived handle can miss
/// updates on some platforms.
#[derive(Debug, Default)]
pub struct SystemPasteboard;

impl SystemPasteboard {
    pub fn new() -> Self {
        Self
    }

    fn read(clipboard: &mut arboard::Clipboard) -> Option<PasteboardSnapshot> {
        let image = Self::read_image(clipboard);
        let text = clipboard.get_text().ok().filter(|t| !t.is_empty());

        // A single pasteboard write can expose several representations.
        // The highest-priority kind names the capture.
        let mut kinds = Vec::new();
        if image.is_some() {
            kinds.push(ContentKind::Image);
        }
        if let Some(text) = &text {
            kinds.push(if looks_like_url(text) {
                ContentKind::Url
            } else {
                ContentKind::Text
            });
        }

        match kinds.into_iter().max_by_key(|k| k.priority())? {
            ContentKind::Image => {
                let (png, hash) = image?;
                Some(PasteboardSnapshot {
                    kind: ContentKind::Image,
                    text: None,
                    html: None,
                    image_png: Some(png),
                    hash,
                })
            }
            _ => Some(PasteboardSnapshot::from_text(text?)),
        }
    }

    /// Read image content, returning PNG bytes and the content hash
    fn read_image(clipboard: &mut arboard::Clipboard) -> Option<(Vec<u8>, String)> {
        match clipboard.get_image() {
            Ok(image) => {
                log::debug!(
                    "detected image on pasteboard: {}x{}",
                    image.width,
                    image.height
                );
                // Hash the raw RGBA data so the same pixels always dedup,
                // whatever the encoder produced.
                let hash = compute_hash(&image.bytes);
                let png = rgba_to_png(&image);
                if png.is_empty() {
                    log::error!("failed to encode pasteboard image as PNG");
                    None
                } else {
                    Some((png, hash))
                }
            }
            Err(e) => {
                log::debug!("no direct image on pasteboard: {}", e);
                Self::read_image_fallback()
            }
        }
    }

    #[cfg(windows)]
    fn read_image_fallback() -> Option<(Vec<u8>, String)> {
        Self::read_dib_image().or_else(Self::read_image_file)
    }

    #[cfg(not(windows))]
    fn read_image_fallback() -> Option<(Vec<u8>, String)> {
        None
    }

    /// Read a DIB image through the Windows clipboard API; arboard misses
    /// bitmaps placed by some third-party screenshot tools
    #[cfg(windows)]
    fn read_dib_image() -> Option<(Vec<u8>, String)> {
        use clipboard_win::{formats, get_clipboard};

        let bitmap: Vec<u8> = match get_clipboard(formats::Bitmap) {
            Ok(data) => data,
            Err(e) => {
                log::debug!("no DIB data on pasteboard: {}", e);
                return None;
            }
        };
        if bitmap.is_empty() {
            return None;
        }

        let hash = compute_hash(&bitmap);
        match image::load_from_memory(&bitmap) {
            Ok(img) => {
                let mut png = Vec::new();
                let mut cursor = std::io::Cursor::new(&mut png);
                if img.write_to(&mut cursor, image::ImageFormat::Png).is_ok() {
                    log::debug!("converted DIB to PNG: {} bytes", png.len());
                    Some((png, hash))
                } else {
                    log::error!("failed to convert DIB to PNG");
                    None
                }
            }
            Err(e) => {
                log::debug!("failed to decode DIB data: {}", e);
                None
            }
        }
    }

    /// Read the first image file from a copied file list
    #[cfg(windows)]
    fn read_image_file() -> Option<(Vec<u8>, String)> {
        use std::path::Path;

        let files: Vec<String> =
            clipboard_win::get_clipboard(clipboard_win::formats::FileList).ok()?;

        for file_path in &files {
            let path = Path::new(file_path);
            if !path.is_file() {
                continue;
            }

            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_lowercase();
            match ext.as_str() {
                "png" | "jpg" | "jpeg" | "bmp" | "webp" | "ico" | "gif" => {
                    match image::open(path) {
                        Ok(img) => {
                            let mut png = Vec::new();
                            let mut cursor = std::io::Cursor::new(&mut png);
                            if img.write_to(&mut cursor, image::ImageFormat::Png).is_ok() {
                                log::debug!("read image from copied file: {:?}", path);
                                let hash = compute_hash(&png);
                                return Some((png, hash));
                            }
                        }
                        Err(e) => log::debug!("failed to open image file {:?}: {}", path, e),
                    }
                }
                _ => continue,
            }
        }

        None
    }
}

impl PasteboardSource for SystemPasteboard {
    fn snapshot(&self) -> Option<PasteboardSnapshot> {
        let mut clipboard = match arboard::Clipboard::new() {
            Ok(clipboard) => clipboard,
            Err(e) => {
                log::error!("failed to open clipboard: {}", e);
                return None;
            }
        };
        Self::read(&mut clipboard)
    }
}

/// Convert RGBA image data to PNG
fn rgba_to_png(image: &arboard::ImageData) -> Vec<u8> {
    use image::{ImageBuffer, Rgba};

    let img: ImageBuffer<Rgba<u8>, Vec<u8>> = match ImageBuffer::from_raw(
        image.width as u32,
        image.height as u32,
        image.bytes.to_vec(),
    ) {
        Some(img) => img,
        None => {
            log::error!("pasteboard image dimensions do not match its data");
            return Vec::new();
        }
    };

    let mut png = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut png);
    if let Err(e) = img.write_to(&mut cursor, image::ImageFormat::Png) {
        log::error!("failed to write PNG data: {}", e);
    }

    png
}

/// Compute content hash
pub(crate) fn compute_hash(data: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize().to_hex().to_string()
}

fn looks_like_url(text: &str) -> bool {
    let text = text.trim();
    (text.starts_with("http://") || text.starts_with("https://"))
        && !text.contains(char::is_whitespace)
        && text.len() > "https://".len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_shaped_text_is_classified_as_url() {
        let snapshot = PasteboardSnapshot::from_text("https://example.com/page".into());
        assert_eq!(snapshot.kind, ContentKind::Url);
    }

    #[test]
    fn prose_containing_a_url_stays_text() {
        let snapshot = PasteboardSnapshot::from_text("see https://example.com for details".into());
        assert_eq!(snapshot.kind, ContentKind::Text);
    }

    #[test]
    fn bare_scheme_is_not_a_url() {
        assert!(!looks_like_url("https://"));
        assert!(!looks_like_url("ftp://example.com"));
        assert!(looks_like_url("  https://example.com  "));
    }

    #[test]
    fn identical_text_hashes_identically() {
        let a = PasteboardSnapshot::from_text("hello".into());
        let b = PasteboardSnapshot::from_text("hello".into());
        let c = PasteboardSnapshot::from_text("world".into());
        assert_eq!(a.hash, b.hash);
        assert_ne!(a.hash, c.hash);
    }

    #[test]
    fn rgba_round_trips_through_png() {
        let image = arboard::ImageData {
            width: 2,
            height: 1,
            bytes: vec![255, 0, 0, 255, 0, 255, 0, 255].into(),
        };
        let png = rgba_to_png(&image);
        assert!(!png.is_empty());
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (2, 1));
        assert_eq!(decoded.into_raw(), image.bytes.to_vec());
    }

    #[test]
    fn approx_size_counts_all_payloads() {
        let snapshot = PasteboardSnapshot {
            kind: ContentKind::RichText,
            text: Some("ab".into()),
            html: Some("<b>ab</b>".into()),
            image_png: None,
            hash: "h".into(),
        };
        assert_eq!(snapshot.approx_size(), 11);
    }
}
