//! Notes tool: `/note_add` and `/note_list`

use crate::channels::types::Reply;
use crate::i18n::t;
use crate::storage::{StorageError, UserStorage};
use chrono::{DateTime, SecondsFormat, Utc};
use food_diary_types::Note;
use std::sync::Arc;

/// How many of the latest notes `/note_list` shows
pub const NOTE_LIST_LIMIT: usize = 20;

pub struct NotesTool {
    storage: Arc<UserStorage>,
}

impl NotesTool {
    pub fn new(storage: Arc<UserStorage>) -> Self {
        Self { storage }
    }

    pub fn add(
        &self,
        user_id: u64,
        text: &str,
        locale: &str,
        now: DateTime<Utc>,
    ) -> Result<Reply, StorageError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Reply::text(t("notes_usage", locale)));
        }
        let note = Note {
            ts: now,
            text: text.to_string(),
        };
        self.storage.append_note(user_id, &note)?;
        log::debug!("[NOTES] Saved note for user {} ({} chars)", user_id, text.chars().count());
        Ok(Reply::text(t("notes_saved", locale)))
    }

    /// The latest notes, oldest first
    pub fn list(&self, user_id: u64, locale: &str) -> Result<Reply, StorageError> {
        let notes = self.storage.list_notes(user_id)?;
        if notes.is_empty() {
            return Ok(Reply::text(t("notes_empty", locale)));
        }
        let skip = notes.len().saturating_sub(NOTE_LIST_LIMIT);
        let lines: Vec<String> = notes
            .iter()
            .skip(skip)
            .map(|n| format!("- {}: {}", n.ts.to_rfc3339_opts(SecondsFormat::Secs, true), n.text))
            .collect();
        Ok(Reply::text(lines.join("\n")))
    }
}
