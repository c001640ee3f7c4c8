//! Per-user display timezone, kept apart from the record log.

use crate::storage::{StorageError, UserStorage};

const TIMEZONE_FILE: &str = "food_diary/timezone.txt";

impl UserStorage {
    /// Stored IANA zone name, if any. Not validated here; bad names surface
    /// when a time is formatted.
    pub fn get_timezone(&self, user_id: u64) -> Result<Option<String>, StorageError> {
        let raw = self.read_text(user_id, TIMEZONE_FILE)?;
        let zone = raw.trim();
        Ok(if zone.is_empty() { None } else { Some(zone.to_string()) })
    }

    pub fn set_timezone(&self, user_id: u64, zone: &str) -> Result<(), StorageError> {
        self.write_text(user_id, TIMEZONE_FILE, zone.trim())
    }
}
