//! Food diary tool
//!
//! Turns button presses and typed messages into diary screens. Draft inputs
//! go through the step machine in [`flow`]; everything else is navigation
//! over the user's saved records.

pub mod action;
pub mod flow;
pub mod records;
pub mod screens;
pub mod time;

use crate::channels::types::Reply;
use crate::conversation::{CompletedDraft, ConversationDraft, DraftStore, DraftTarget};
use crate::storage::{StorageError, UserStorage};
use action::DiaryAction;
use chrono::{DateTime, Utc};
use flow::{DraftInput, Transition};
use food_diary_types::DiaryRecord;
use std::sync::Arc;

pub struct FoodDiaryTool {
    storage: Arc<UserStorage>,
    drafts: Arc<dyn DraftStore>,
}

impl FoodDiaryTool {
    pub fn new(storage: Arc<UserStorage>, drafts: Arc<dyn DraftStore>) -> Self {
        Self { storage, drafts }
    }

    /// Drop the user's draft without saving; true if one existed
    pub fn abort_draft(&self, user_id: u64) -> bool {
        match self.drafts.clear(user_id) {
            Some(draft) => {
                log::info!(
                    "[DIARY] Dropped draft for user {} at step '{}'",
                    user_id,
                    draft.step.name()
                );
                true
            }
            None => false,
        }
    }

    /// Handle a diary button press
    pub fn handle_action(
        &self,
        user_id: u64,
        action: &DiaryAction,
        now: DateTime<Utc>,
    ) -> Result<Reply, StorageError> {
        let is_draft_input = matches!(
            action,
            DiaryAction::Time(_)
                | DiaryAction::Skip
                | DiaryAction::Back
                | DiaryAction::Hunger(_)
                | DiaryAction::Cancel
        );

        if is_draft_input {
            return match self.drafts.get(user_id) {
                Some(draft) => Ok(self
                    .feed(user_id, draft, DraftInput::Action(action), now)?
                    .unwrap_or_else(screens::main_menu)),
                None if *action == DiaryAction::Cancel => Ok(screens::cancelled()),
                None => {
                    log::debug!("[DIARY] Draft input {:?} from user {} with no draft", action, user_id);
                    Ok(screens::no_draft())
                }
            };
        }

        // Navigating away abandons whatever was in progress
        self.abort_draft(user_id);

        match action {
            DiaryAction::Main => Ok(screens::main_menu()),
            DiaryAction::Records { offset } => {
                let all = self.storage.list_diary_records(user_id)?;
                let zone = self.storage.get_timezone(user_id)?;
                Ok(screens::records_page(&all, *offset, zone.as_deref()))
            }
            DiaryAction::Pick { offset } => {
                let all = self.storage.list_diary_records(user_id)?;
                let zone = self.storage.get_timezone(user_id)?;
                Ok(screens::pick_page(&all, *offset, zone.as_deref()))
            }
            DiaryAction::Add => self.start_draft(ConversationDraft::new_record(user_id)),
            DiaryAction::Edit(id) => match self.find_record(user_id, id)? {
                Some(record) => self.start_draft(ConversationDraft::edit_record(user_id, record)),
                None => Ok(screens::record_missing()),
            },
            DiaryAction::Show(id) => {
                let all = self.storage.list_diary_records(user_id)?;
                let zone = self.storage.get_timezone(user_id)?;
                Ok(match records::find(&all, id) {
                    Some(record) => {
                        screens::record_detail(record, records::page_offset_of(&all, id), zone.as_deref())
                    }
                    None => screens::record_missing(),
                })
            }
            DiaryAction::Delete(id) => match self.find_record(user_id, id)? {
                Some(record) => {
                    let zone = self.storage.get_timezone(user_id)?;
                    Ok(screens::confirm_delete(&record, zone.as_deref()))
                }
                None => Ok(screens::record_missing()),
            },
            DiaryAction::ConfirmDelete(id) => self.delete_record(user_id, id),
            DiaryAction::Settings => {
                let zone = self.storage.get_timezone(user_id)?;
                Ok(screens::settings(zone.as_deref()))
            }
            DiaryAction::SetTimezone(zone) => self.set_timezone(user_id, zone),
            DiaryAction::Time(_)
            | DiaryAction::Skip
            | DiaryAction::Back
            | DiaryAction::Hunger(_)
            | DiaryAction::Cancel => Ok(screens::no_draft()),
        }
    }

    /// Handle a typed message while a draft may be in progress.
    ///
    /// `None` means the diary did not consume the message: there is no draft,
    /// or the message was a `/` command that ended the draft.
    pub fn handle_text(
        &self,
        user_id: u64,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Reply>, StorageError> {
        let Some(draft) = self.drafts.get(user_id) else {
            return Ok(None);
        };
        self.feed(user_id, draft, DraftInput::Text(text), now)
    }

    /// Handle a photo; only the meal description step of a draft takes one.
    /// `None` when there is no draft.
    pub fn handle_photo(
        &self,
        user_id: u64,
        file_id: &str,
        caption: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<Reply>, StorageError> {
        let Some(draft) = self.drafts.get(user_id) else {
            return Ok(None);
        };
        self.feed(user_id, draft, DraftInput::Photo { file_id, caption }, now)
    }

    /// Store the timezone name as given; no validation at set time
    pub fn set_timezone(&self, user_id: u64, zone: &str) -> Result<Reply, StorageError> {
        let zone = zone.trim();
        if zone.is_empty() {
            let current = self.storage.get_timezone(user_id)?;
            return Ok(screens::settings(current.as_deref()));
        }
        self.storage.set_timezone(user_id, zone)?;
        log::info!("[DIARY] User {} set timezone to '{}'", user_id, zone);
        Ok(screens::timezone_set(zone))
    }

    fn start_draft(&self, draft: ConversationDraft) -> Result<Reply, StorageError> {
        let zone = self.storage.get_timezone(draft.user_id)?;
        let reply = screens::prompt(&draft, zone.as_deref());
        log::debug!(
            "[DIARY] Started {} draft for user {}",
            if draft.is_editing() { "edit" } else { "new" },
            draft.user_id
        );
        self.drafts.set(draft.user_id, draft);
        Ok(reply)
    }

    /// Run one input through the step machine; `None` when the draft was
    /// aborted by an unrelated command
    fn feed(
        &self,
        user_id: u64,
        draft: ConversationDraft,
        input: DraftInput<'_>,
        now: DateTime<Utc>,
    ) -> Result<Option<Reply>, StorageError> {
        let zone = self.storage.get_timezone(user_id)?;
        let zone = zone.as_deref();

        let reply = match flow::advance(draft, input, now, zone) {
            Transition::Advance(next) => {
                let reply = screens::prompt(&next, zone);
                self.drafts.set(user_id, next);
                reply
            }
            Transition::Reject(current, rejection) => {
                log::debug!(
                    "[DIARY] Rejected input at step '{}' for user {}: {:?}",
                    current.step.name(),
                    user_id,
                    rejection
                );
                screens::rejected(&current, rejection, zone)
            }
            Transition::Complete(done) => self.save(done, now, zone)?,
            Transition::Cancelled => {
                self.drafts.clear(user_id);
                screens::cancelled()
            }
            Transition::Aborted => {
                self.abort_draft(user_id);
                return Ok(None);
            }
        };
        Ok(Some(reply))
    }

    /// Write a finished draft. The draft is cleared once the outcome is
    /// known; a storage failure leaves it in place so the last step can be
    /// retried.
    fn save(&self, done: CompletedDraft, now: DateTime<Utc>, zone: Option<&str>) -> Result<Reply, StorageError> {
        let user_id = done.user_id;
        let mut all = self.storage.list_diary_records(user_id)?;

        match done.target {
            DraftTarget::Edit(original) => {
                let Some(updated) = records::apply_edit(&mut all, &original.id, done.entry) else {
                    log::warn!(
                        "[DIARY] Record {} of user {} vanished during edit, nothing written",
                        original.id,
                        user_id
                    );
                    self.drafts.clear(user_id);
                    return Ok(screens::record_missing());
                };
                self.storage.replace_diary_records(user_id, &all)?;
                self.drafts.clear(user_id);
                log::info!("[DIARY] Updated record {} for user {}", updated.id, user_id);
                Ok(screens::saved(&updated, true, all.len(), zone))
            }
            DraftTarget::New => {
                let id = records::new_record_id(now, &all);
                let record = DiaryRecord::from_entry(id, done.entry);
                self.storage.append_diary_record(user_id, &record)?;
                self.drafts.clear(user_id);
                log::info!("[DIARY] Saved record {} for user {}", record.id, user_id);
                Ok(screens::saved(&record, false, all.len() + 1, zone))
            }
        }
    }

    fn delete_record(&self, user_id: u64, id: &str) -> Result<Reply, StorageError> {
        let all = self.storage.list_diary_records(user_id)?;
        let before = all.len();
        let remaining = records::without_record(all, id);
        if remaining.len() == before {
            log::debug!("[DIARY] Delete of missing record {} for user {}", id, user_id);
            return Ok(screens::record_missing());
        }
        self.storage.replace_diary_records(user_id, &remaining)?;
        log::info!("[DIARY] Deleted record {} for user {}", id, user_id);
        Ok(screens::deleted())
    }

    fn find_record(&self, user_id: u64, id: &str) -> Result<Option<DiaryRecord>, StorageError> {
        let all = self.storage.list_diary_records(user_id)?;
        Ok(records::find(&all, id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{DraftStep, InMemoryDraftStore};
    use action::TimeChoice;
    use chrono::TimeZone;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        storage: Arc<UserStorage>,
        tool: FoodDiaryTool,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let storage = Arc::new(UserStorage::open(dir.path()).unwrap());
        let drafts: Arc<dyn DraftStore> = Arc::new(InMemoryDraftStore::new());
        let tool = FoodDiaryTool::new(storage.clone(), drafts);
        Fixture {
            _dir: dir,
            storage,
            tool,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 0).unwrap()
    }

    fn press(f: &Fixture, action: DiaryAction) -> Reply {
        f.tool.handle_action(1, &action, now()).unwrap()
    }

    fn add_record(f: &Fixture, text: &str) {
        press(f, DiaryAction::Add);
        press(f, DiaryAction::Time(TimeChoice::Now));
        f.tool.handle_text(1, text, now()).unwrap();
        press(f, DiaryAction::Skip);
        press(f, DiaryAction::Skip);
        press(f, DiaryAction::Skip);
    }

    #[test]
    fn test_new_record_is_appended_once() {
        let f = fixture();
        press(&f, DiaryAction::Add);
        press(&f, DiaryAction::Time(TimeChoice::Now));
        f.tool.handle_text(1, "eggs", now()).unwrap();
        f.tool.handle_text(1, "water", now()).unwrap();
        press(&f, DiaryAction::Hunger(3));
        let reply = press(&f, DiaryAction::Hunger(7));

        assert!(reply.text.contains("Record saved"));
        assert!(f.tool.drafts.get(1).is_none());

        let all = f.storage.list_diary_records(1).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, "20240115_143000");
        assert_eq!(all[0].datetime_utc, now());
        assert_eq!(all[0].text, "eggs");
        assert_eq!(all[0].drink.as_deref(), Some("water"));
        assert_eq!(all[0].hunger_before, Some(3));
        assert_eq!(all[0].hunger_after, Some(7));
    }

    #[test]
    fn test_same_second_records_get_distinct_ids() {
        let f = fixture();
        add_record(&f, "first");
        add_record(&f, "second");
        let ids: Vec<String> = f.storage.list_diary_records(1).unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["20240115_143000", "20240115_143000-1"]);
    }

    #[test]
    fn test_edit_replaces_in_place() {
        let f = fixture();
        add_record(&f, "first");
        add_record(&f, "second");
        add_record(&f, "third");
        let before = f.storage.list_diary_records(1).unwrap();
        let target = before[1].id.clone();

        press(&f, DiaryAction::Edit(target.clone()));
        press(&f, DiaryAction::Time(TimeChoice::Skip));
        f.tool.handle_text(1, "pasta", now()).unwrap();
        press(&f, DiaryAction::Skip);
        press(&f, DiaryAction::Hunger(9));
        let reply = press(&f, DiaryAction::Skip);
        assert!(reply.text.contains("Record updated"));

        let after = f.storage.list_diary_records(1).unwrap();
        assert_eq!(after.len(), 3);
        assert_eq!(after[0], before[0]);
        assert_eq!(after[2], before[2]);
        assert_eq!(after[1].id, target);
        assert_eq!(after[1].text, "pasta");
        assert_eq!(after[1].hunger_before, Some(9));
        assert_eq!(after[1].hunger_after, None);
        assert_eq!(after[1].datetime_utc, before[1].datetime_utc);
    }

    #[test]
    fn test_edit_of_deleted_record_writes_nothing() {
        let f = fixture();
        add_record(&f, "first");
        let id = f.storage.list_diary_records(1).unwrap()[0].id.clone();

        press(&f, DiaryAction::Edit(id.clone()));
        press(&f, DiaryAction::Time(TimeChoice::Skip));
        press(&f, DiaryAction::Skip);
        press(&f, DiaryAction::Skip);
        press(&f, DiaryAction::Skip);

        // Deleted behind the draft's back (e.g. from another device)
        f.storage.replace_diary_records(1, &[]).unwrap();

        let reply = press(&f, DiaryAction::Skip);
        assert!(reply.text.contains("no longer exists"));
        assert!(f.storage.list_diary_records(1).unwrap().is_empty());
        assert!(f.tool.drafts.get(1).is_none());
    }

    #[test]
    fn test_edit_of_record_with_drink_resumes_at_drink() {
        let f = fixture();
        press(&f, DiaryAction::Add);
        press(&f, DiaryAction::Time(TimeChoice::Now));
        f.tool.handle_text(1, "eggs", now()).unwrap();
        f.tool.handle_text(1, "water", now()).unwrap();
        press(&f, DiaryAction::Skip);
        press(&f, DiaryAction::Skip);
        let id = f.storage.list_diary_records(1).unwrap()[0].id.clone();

        press(&f, DiaryAction::Edit(id.clone()));
        let reply = press(&f, DiaryAction::Time(TimeChoice::Skip));
        assert!(reply.text.contains("What did you drink?"));
        assert!(reply.text.contains("Current: water"));
        assert_eq!(f.tool.drafts.get(1).map(|d| d.step.name()), Some("drink"));

        f.tool.handle_text(1, "juice", now()).unwrap();
        press(&f, DiaryAction::Skip);
        press(&f, DiaryAction::Skip);

        let all = f.storage.list_diary_records(1).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, id);
        assert_eq!(all[0].text, "eggs");
        assert_eq!(all[0].drink.as_deref(), Some("juice"));
    }

    #[test]
    fn test_failed_save_keeps_draft_for_retry() {
        let f = fixture();
        add_record(&f, "oats");
        let log = f.storage.user_dir(1).unwrap().join("food_diary/records.jsonl");
        let good = std::fs::read_to_string(&log).unwrap();

        press(&f, DiaryAction::Add);
        press(&f, DiaryAction::Time(TimeChoice::Now));
        f.tool.handle_text(1, "eggs", now()).unwrap();
        press(&f, DiaryAction::Skip);
        press(&f, DiaryAction::Hunger(3));

        std::fs::write(&log, "{not json}\n").unwrap();
        let err = f.tool.handle_action(1, &DiaryAction::Hunger(7), now());
        assert!(matches!(err, Err(StorageError::Serialization { .. })));
        assert_eq!(f.tool.drafts.get(1).map(|d| d.step.name()), Some("hunger_after"));

        std::fs::write(&log, good).unwrap();
        let reply = press(&f, DiaryAction::Hunger(7));
        assert!(reply.text.contains("Record saved"));
        assert!(f.tool.drafts.get(1).is_none());

        let all = f.storage.list_diary_records(1).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all.iter().filter(|r| r.text == "eggs").count(), 1);
        assert_eq!(all[1].hunger_after, Some(7));
    }

    #[test]
    fn test_photo_is_saved_as_picture() {
        let f = fixture();
        assert_eq!(f.tool.handle_photo(1, "photo-1", None, now()).unwrap(), None);

        press(&f, DiaryAction::Add);
        press(&f, DiaryAction::Time(TimeChoice::Now));
        let reply = f.tool.handle_photo(1, "photo-1", Some("pizza"), now()).unwrap().unwrap();
        assert!(reply.text.contains("What did you drink?"));
        press(&f, DiaryAction::Skip);
        press(&f, DiaryAction::Skip);
        let saved = press(&f, DiaryAction::Skip);
        assert!(saved.text.contains("📷 Photo attached"));

        let all = f.storage.list_diary_records(1).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].text, "pizza");
        assert_eq!(all[0].picture.as_deref(), Some("photo-1"));
    }

    #[test]
    fn test_delete_flow() {
        let f = fixture();
        add_record(&f, "first");
        add_record(&f, "second");
        let id = f.storage.list_diary_records(1).unwrap()[0].id.clone();

        let confirm = press(&f, DiaryAction::Delete(id.clone()));
        assert!(confirm.tokens().contains(&DiaryAction::ConfirmDelete(id.clone()).token().as_str()));
        assert_eq!(f.storage.list_diary_records(1).unwrap().len(), 2);

        press(&f, DiaryAction::ConfirmDelete(id.clone()));
        let remaining = f.storage.list_diary_records(1).unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(remaining.iter().all(|r| r.id != id));

        let reply = press(&f, DiaryAction::ConfirmDelete("nope".to_string()));
        assert!(reply.text.contains("no longer exists"));
        assert_eq!(f.storage.list_diary_records(1).unwrap().len(), 1);
    }

    #[test]
    fn test_cancel_discards_draft() {
        let f = fixture();
        press(&f, DiaryAction::Add);
        press(&f, DiaryAction::Time(TimeChoice::Ago1h));
        let reply = press(&f, DiaryAction::Cancel);
        assert!(reply.text.contains("Cancelled"));
        assert!(f.tool.drafts.get(1).is_none());
        assert!(f.storage.list_diary_records(1).unwrap().is_empty());

        // Cancel with nothing in progress still lands on a menu
        let reply = press(&f, DiaryAction::Cancel);
        assert!(reply.tokens().contains(&"fd_main"));
    }

    #[test]
    fn test_slash_text_aborts_and_is_not_consumed() {
        let f = fixture();
        press(&f, DiaryAction::Add);
        press(&f, DiaryAction::Time(TimeChoice::Now));
        assert_eq!(f.tool.handle_text(1, "/whatever", now()).unwrap(), None);
        assert!(f.tool.drafts.get(1).is_none());
        assert!(f.storage.list_diary_records(1).unwrap().is_empty());
    }

    #[test]
    fn test_text_without_draft_is_not_consumed() {
        let f = fixture();
        assert_eq!(f.tool.handle_text(1, "hello", now()).unwrap(), None);
    }

    #[test]
    fn test_draft_button_without_draft() {
        let f = fixture();
        let reply = press(&f, DiaryAction::Hunger(5));
        assert!(reply.text.contains("Nothing is in progress"));
    }

    #[test]
    fn test_navigation_abandons_draft() {
        let f = fixture();
        press(&f, DiaryAction::Add);
        assert!(f.tool.drafts.get(1).is_some());
        press(&f, DiaryAction::Records { offset: 0 });
        assert!(f.tool.drafts.get(1).is_none());
    }

    #[test]
    fn test_custom_time_uses_saved_zone() {
        let f = fixture();
        f.tool.set_timezone(1, "Europe/Berlin").unwrap();
        press(&f, DiaryAction::Add);
        press(&f, DiaryAction::Time(TimeChoice::Custom));
        let reply = f.tool.handle_text(1, "2024-01-15 14:30", now()).unwrap().unwrap();
        assert!(reply.text.contains("What did you eat?"));

        let draft = f.tool.drafts.get(1).unwrap();
        assert_eq!(
            draft.step,
            DraftStep::Text {
                datetime_utc: Utc.with_ymd_and_hms(2024, 1, 15, 13, 30, 0).unwrap()
            }
        );
    }

    #[test]
    fn test_set_timezone() {
        let f = fixture();
        let reply = f.tool.set_timezone(1, " Asia/Tokyo ").unwrap();
        assert!(reply.text.contains("Asia/Tokyo"));
        assert_eq!(f.storage.get_timezone(1).unwrap().as_deref(), Some("Asia/Tokyo"));

        // Empty name shows settings and keeps the stored zone
        let reply = f.tool.set_timezone(1, "  ").unwrap();
        assert!(reply.text.contains("Timezone: Asia/Tokyo"));
    }

    #[test]
    fn test_show_record_back_returns_to_its_page() {
        let f = fixture();
        for i in 0..7 {
            add_record(&f, &format!("meal {}", i));
        }
        let all = f.storage.list_diary_records(1).unwrap();
        let reply = press(&f, DiaryAction::Show(all[6].id.clone()));
        assert!(reply.text.contains("meal 6"));
        assert!(reply.tokens().contains(&"fd_records_5"));
    }
}
