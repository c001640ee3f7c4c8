//! Food diary record log: one `DiaryRecord` per line, oldest first.

use crate::storage::{StorageError, UserStorage};
use food_diary_types::DiaryRecord;

const RECORDS_LOG: &str = "food_diary/records.jsonl";

impl UserStorage {
    /// Add one record to the end of the user's log
    pub fn append_diary_record(&self, user_id: u64, record: &DiaryRecord) -> Result<(), StorageError> {
        self.append_jsonl(user_id, RECORDS_LOG, std::slice::from_ref(record))
    }

    /// All records in append order
    pub fn list_diary_records(&self, user_id: u64) -> Result<Vec<DiaryRecord>, StorageError> {
        self.read_jsonl(user_id, RECORDS_LOG)
    }

    /// Overwrite the whole log (used for edit and delete)
    pub fn replace_diary_records(
        &self,
        user_id: u64,
        records: &[DiaryRecord],
    ) -> Result<(), StorageError> {
        self.replace_jsonl(user_id, RECORDS_LOG, records)
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::UserStorage;
    use chrono::{Duration, TimeZone, Utc};
    use food_diary_types::DiaryRecord;
    use tempfile::TempDir;

    fn record(n: i64) -> DiaryRecord {
        DiaryRecord {
            id: format!("rec-{}", n),
            datetime_utc: Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap() + Duration::hours(n),
            text: format!("meal {}", n),
            drink: if n % 2 == 0 { Some("water".to_string()) } else { None },
            hunger_before: Some(3),
            hunger_after: None,
            picture: None,
        }
    }

    #[test]
    fn test_append_and_list() {
        let dir = TempDir::new().unwrap();
        let storage = UserStorage::open(dir.path()).unwrap();
        assert!(storage.list_diary_records(42).unwrap().is_empty());

        storage.append_diary_record(42, &record(1)).unwrap();
        storage.append_diary_record(42, &record(2)).unwrap();

        let records = storage.list_diary_records(42).unwrap();
        assert_eq!(records, vec![record(1), record(2)]);
    }

    #[test]
    fn test_replace_of_listing_is_noop() {
        let dir = TempDir::new().unwrap();
        let storage = UserStorage::open(dir.path()).unwrap();
        for n in 0..4 {
            storage.append_diary_record(42, &record(n)).unwrap();
        }
        let before = storage.list_diary_records(42).unwrap();
        storage.replace_diary_records(42, &before).unwrap();
        assert_eq!(storage.list_diary_records(42).unwrap(), before);
    }

    #[test]
    fn test_replace_with_empty_list() {
        let dir = TempDir::new().unwrap();
        let storage = UserStorage::open(dir.path()).unwrap();
        storage.append_diary_record(42, &record(1)).unwrap();
        storage.replace_diary_records(42, &[]).unwrap();
        assert!(storage.list_diary_records(42).unwrap().is_empty());
    }
}
