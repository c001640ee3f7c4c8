//! Operations over a user's full record list
//!
//! The log has no in-place update, so edit and delete work on the whole list
//! which the caller then writes back with `replace_diary_records`.

use chrono::{DateTime, Utc};
use food_diary_types::{DiaryEntry, DiaryRecord, PAGE_SIZE};

/// Format of the timestamp-derived record id
const RECORD_ID_FORMAT: &str = "%Y%m%d_%H%M%S";

/// One page of records starting at `offset`; empty past the end
pub fn page(records: &[DiaryRecord], offset: usize) -> &[DiaryRecord] {
    let start = offset.min(records.len());
    let end = offset.saturating_add(PAGE_SIZE).min(records.len());
    &records[start..end]
}

pub fn find<'a>(records: &'a [DiaryRecord], id: &str) -> Option<&'a DiaryRecord> {
    records.iter().find(|r| r.id == id)
}

/// The list without the record `id`; unchanged when `id` is absent
pub fn without_record(records: Vec<DiaryRecord>, id: &str) -> Vec<DiaryRecord> {
    records.into_iter().filter(|r| r.id != id).collect()
}

/// Replace the editable fields of record `id` in place.
///
/// Returns the updated record, or `None` when it no longer exists.
pub fn apply_edit(records: &mut [DiaryRecord], id: &str, entry: DiaryEntry) -> Option<DiaryRecord> {
    let record = records.iter_mut().find(|r| r.id == id)?;
    record.apply(entry);
    Some(record.clone())
}

/// Offset of the page that contains record `id` (0 when absent)
pub fn page_offset_of(records: &[DiaryRecord], id: &str) -> usize {
    records
        .iter()
        .position(|r| r.id == id)
        .map(|idx| idx / PAGE_SIZE * PAGE_SIZE)
        .unwrap_or(0)
}

/// Offset of the last page for `total` records
pub fn last_page_offset(total: usize) -> usize {
    total.saturating_sub(1) / PAGE_SIZE * PAGE_SIZE
}

/// Timestamp id for a record created at `now`, suffixed `-N` if taken
pub fn new_record_id(now: DateTime<Utc>, existing: &[DiaryRecord]) -> String {
    let base = now.format(RECORD_ID_FORMAT).to_string();
    if find(existing, &base).is_none() {
        return base;
    }
    let mut n = 1;
    loop {
        let candidate = format!("{}-{}", base, n);
        if find(existing, &candidate).is_none() {
            return candidate;
        }
        n += 1;
    }
}
