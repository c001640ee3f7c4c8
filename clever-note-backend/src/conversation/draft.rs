//! In-progress food diary record
//!
//! Each step variant carries exactly the fields collected so far, so a draft
//! can never claim to be at `HungerAfter` without having a text.

use chrono::{DateTime, Utc};
use food_diary_types::{DiaryEntry, DiaryRecord};

/// Whether the draft creates a new record or rewrites an existing one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftTarget {
    New,
    /// Snapshot of the record as it was when editing started
    Edit(DiaryRecord),
}

/// Current prompt of the diary flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftStep {
    Datetime {
        /// The user picked "custom" and we are waiting for a typed date-time
        awaiting_custom: bool,
    },
    Text {
        datetime_utc: DateTime<Utc>,
    },
    Drink {
        datetime_utc: DateTime<Utc>,
        text: String,
    },
    HungerBefore {
        datetime_utc: DateTime<Utc>,
        text: String,
        drink: Option<String>,
    },
    HungerAfter {
        datetime_utc: DateTime<Utc>,
        text: String,
        drink: Option<String>,
        hunger_before: Option<u8>,
    },
}

impl DraftStep {
    pub fn name(&self) -> &'static str {
        match self {
            DraftStep::Datetime { .. } => "datetime",
            DraftStep::Text { .. } => "text",
            DraftStep::Drink { .. } => "drink",
            DraftStep::HungerBefore { .. } => "hunger_before",
            DraftStep::HungerAfter { .. } => "hunger_after",
        }
    }
}

/// At most one of these exists per user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationDraft {
    pub user_id: u64,
    pub target: DraftTarget,
    pub step: DraftStep,
    /// Photo attached while describing the meal
    pub picture: Option<String>,
}

impl ConversationDraft {
    /// Start a new record at the time prompt
    pub fn new_record(user_id: u64) -> Self {
        Self {
            user_id,
            target: DraftTarget::New,
            step: DraftStep::Datetime { awaiting_custom: false },
            picture: None,
        }
    }

    /// Start editing `record` at the time prompt
    pub fn edit_record(user_id: u64, record: DiaryRecord) -> Self {
        Self {
            user_id,
            target: DraftTarget::Edit(record),
            step: DraftStep::Datetime { awaiting_custom: false },
            picture: None,
        }
    }

    pub fn with_step(self, step: DraftStep) -> Self {
        Self { step, ..self }
    }

    pub fn with_picture(self, file_id: &str) -> Self {
        Self {
            picture: Some(file_id.to_string()),
            ..self
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.target, DraftTarget::Edit(_))
    }

    /// The record being edited, as it was before the edit
    pub fn original(&self) -> Option<&DiaryRecord> {
        match &self.target {
            DraftTarget::Edit(record) => Some(record),
            DraftTarget::New => None,
        }
    }
}

/// A draft that passed `HungerAfter` and is ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedDraft {
    pub user_id: u64,
    pub target: DraftTarget,
    pub entry: DiaryEntry,
}
