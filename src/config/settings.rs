//! Watcher settings module
//!
//! Capture limits and polling cadence, persisted through the settings table

use serde::{Deserialize, Serialize};

use crate::storage::Database;

/// History size options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryLimit {
    /// 10 items
    Limit10 = 10,
    /// 25 items
    Limit25 = 25,
    /// 50 items
    Limit50 = 50,
    /// 100 items
    Limit100 = 100,
    /// Unlimited
    Unlimited = -1,
}

// Custom serialization: serialize as numeric value
impl Serialize for HistoryLimit {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i64(self.as_i64())
    }
}

// Custom deserialization: deserialize from numeric value
impl<'de> Deserialize<'de> for HistoryLimit {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = i64::deserialize(deserializer)?;
        Ok(HistoryLimit::from_i64(value))
    }
}

impl Default for HistoryLimit {
    fn default() -> Self {
        HistoryLimit::Limit25
    }
}

impl HistoryLimit {
    /// Get the numeric value (-1 means unlimited)
    pub fn as_i64(&self) -> i64 {
        match self {
            HistoryLimit::Limit10 => 10,
            HistoryLimit::Limit25 => 25,
            HistoryLimit::Limit50 => 50,
            HistoryLimit::Limit100 => 100,
            HistoryLimit::Unlimited => -1,
        }
    }

    /// Create from a numeric value
    pub fn from_i64(value: i64) -> Self {
        match value {
            10 => HistoryLimit::Limit10,
            25 => HistoryLimit::Limit25,
            50 => HistoryLimit::Limit50,
            100 => HistoryLimit::Limit100,
            _ => HistoryLimit::Unlimited,
        }
    }
}

/// Watcher settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// How many history items to keep
    pub history_limit: HistoryLimit,
    /// Largest item the watcher will record, in bytes
    pub max_item_bytes: usize,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            history_limit: HistoryLimit::Limit25,
            max_item_bytes: 10 * 1024 * 1024,
            poll_interval_ms: 150,
        }
    }
}

impl Settings {
    /// Load settings from the database, falling back to defaults
    pub fn load(db: &Database) -> Self {
        let mut settings = Settings::default();

        if let Ok(Some(limit)) = db.setting("history_limit") {
            if let Ok(limit) = limit.parse::<i64>() {
                settings.history_limit = HistoryLimit::from_i64(limit);
            }
        }

        if let Ok(Some(bytes)) = db.setting("max_item_bytes") {
            if let Ok(bytes) = bytes.parse::<usize>() {
                settings.max_item_bytes = bytes;
            }
        }

        if let Ok(Some(interval)) = db.setting("poll_interval_ms") {
            if let Ok(interval) = interval.parse::<u64>() {
                settings.poll_interval_ms = interval;
            }
        }

        settings
    }

    /// Save settings to the database
    pub fn save(&self, db: &Database) -> Result<(), crate::storage::DatabaseError> {
        db.set_setting("history_limit", &self.history_limit.as_i64().to_string())?;
        db.set_setting("max_item_bytes", &self.max_item_bytes.to_string())?;
        db.set_setting("poll_interval_ms", &self.poll_interval_ms.to_string())?;
        Ok(())
    }
}
