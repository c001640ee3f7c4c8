//! Notes log: one `Note` per line.

use crate::storage::{StorageError, UserStorage};
use food_diary_types::Note;

const NOTES_LOG: &str = "notes/notes.jsonl";

impl UserStorage {
    pub fn append_note(&self, user_id: u64, note: &Note) -> Result<(), StorageError> {
        self.append_jsonl(user_id, NOTES_LOG, std::slice::from_ref(note))
    }

    pub fn list_notes(&self, user_id: u64) -> Result<Vec<Note>, StorageError> {
        self.read_jsonl(user_id, NOTES_LOG)
    }
}
