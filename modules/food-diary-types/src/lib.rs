//! Shared types for the food diary and notes tools.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of records shown on one page of the records list
pub const PAGE_SIZE: usize = 5;

/// Lowest accepted hunger level
pub const HUNGER_MIN: u8 = 1;

/// Highest accepted hunger level
pub const HUNGER_MAX: u8 = 10;

// =====================================================
// Domain Types
// =====================================================

/// One saved food diary entry, stored as a line of `records.jsonl`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiaryRecord {
    /// Creation-timestamp derived id, unique per user
    pub id: String,
    /// When the food was consumed (not when the record was created)
    pub datetime_utc: DateTime<Utc>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drink: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hunger_before: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hunger_after: Option<u8>,
    /// Opaque platform reference to an attached photo
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

/// The mutable part of a diary record, produced by a finished draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiaryEntry {
    pub datetime_utc: DateTime<Utc>,
    pub text: String,
    pub drink: Option<String>,
    pub hunger_before: Option<u8>,
    pub hunger_after: Option<u8>,
    /// A newly attached photo; `None` leaves an existing one in place
    pub picture: Option<String>,
}

impl DiaryRecord {
    /// Build a new record from a finished entry
    pub fn from_entry(id: String, entry: DiaryEntry) -> Self {
        Self {
            id,
            datetime_utc: entry.datetime_utc,
            text: entry.text,
            drink: entry.drink,
            hunger_before: entry.hunger_before,
            hunger_after: entry.hunger_after,
            picture: entry.picture,
        }
    }

    /// Overwrite the editable fields, keeping `id`. The picture is only
    /// replaced when the entry brings a new one.
    pub fn apply(&mut self, entry: DiaryEntry) {
        self.datetime_utc = entry.datetime_utc;
        self.text = entry.text;
        self.drink = entry.drink;
        self.hunger_before = entry.hunger_before;
        self.hunger_after = entry.hunger_after;
        if entry.picture.is_some() {
            self.picture = entry.picture;
        }
    }
}

/// A free-form note, stored as a line of `notes.jsonl`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub ts: DateTime<Utc>,
    pub text: String,
}

/// Check that a hunger level is within the accepted scale
pub fn is_valid_hunger(level: u8) -> bool {
    (HUNGER_MIN..=HUNGER_MAX).contains(&level)
}
