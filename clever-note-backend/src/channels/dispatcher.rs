use crate::channels::types::{DispatchResult, Inbound, NormalizedMessage, Reply};
use crate::commands::{self, Command};
use crate::conversation::{DraftStore, UserLaneManager};
use crate::food_diary::FoodDiaryTool;
use crate::food_diary::action::DiaryAction;
use crate::i18n::{self, t};
use crate::notes::NotesTool;
use crate::storage::{StorageError, UserStorage};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Routes inbound events to the tools.
///
/// Each event runs to completion under the sender's lane, so two events from
/// the same user never interleave while different users proceed in parallel.
pub struct MessageDispatcher {
    storage: Arc<UserStorage>,
    diary: FoodDiaryTool,
    notes: NotesTool,
    lanes: Arc<UserLaneManager>,
    default_locale: String,
}

impl MessageDispatcher {
    pub fn new(storage: Arc<UserStorage>, drafts: Arc<dyn DraftStore>, default_locale: impl Into<String>) -> Self {
        Self {
            diary: FoodDiaryTool::new(storage.clone(), drafts),
            notes: NotesTool::new(storage.clone()),
            storage,
            lanes: UserLaneManager::new(),
            default_locale: default_locale.into(),
        }
    }

    /// Dispatch a message and return the reply to show
    pub async fn dispatch(&self, message: NormalizedMessage) -> DispatchResult {
        self.dispatch_at(message, Utc::now()).await
    }

    /// Dispatch with an explicit current instant
    pub async fn dispatch_at(&self, message: NormalizedMessage, now: DateTime<Utc>) -> DispatchResult {
        let user_id = message.user_id;
        let _lane = self.lanes.acquire(user_id).await;

        self.storage
            .set_user_info(user_id, message.username.as_deref(), message.first_name.as_deref());
        let locale = i18n::locale_from(message.language_code.as_deref(), &self.default_locale);

        let result = match &message.input {
            Inbound::Action(token) => {
                log::debug!("[DISPATCH] Action '{}' from user {}", token, user_id);
                self.handle_action(user_id, token, now)
            }
            Inbound::Text(text) => {
                log::debug!("[DISPATCH] Text from user {} ({} chars)", user_id, text.chars().count());
                self.handle_text(user_id, text, &locale, now)
            }
            Inbound::Photo { file_id, caption } => {
                log::debug!("[DISPATCH] Photo from user {}", user_id);
                self.handle_photo(user_id, file_id, caption.as_deref(), &locale, now)
            }
        };

        match result {
            Ok(reply) => DispatchResult::success(reply),
            Err(e) => {
                log::error!("[DISPATCH] Storage failure for user {}: {}", user_id, e);
                DispatchResult::error(Reply::text(t("error_generic", &locale)), e.to_string())
            }
        }
    }

    fn handle_action(&self, user_id: u64, token: &str, now: DateTime<Utc>) -> Result<Reply, StorageError> {
        let action = match DiaryAction::parse(token) {
            Some(action) => action,
            None => {
                log::warn!("[DISPATCH] Unknown action token '{}' from user {}", token, user_id);
                DiaryAction::Main
            }
        };
        self.diary.handle_action(user_id, &action, now)
    }

    fn handle_text(
        &self,
        user_id: u64,
        text: &str,
        locale: &str,
        now: DateTime<Utc>,
    ) -> Result<Reply, StorageError> {
        if let Some(command) = commands::parse(text) {
            // Any known command ends a diary draft in progress
            self.diary.abort_draft(user_id);
            return self.run_command(user_id, command, locale, now);
        }

        if let Some(reply) = self.diary.handle_text(user_id, text, now)? {
            return Ok(reply);
        }

        if text.trim_start().starts_with('/') {
            Ok(Reply::text(t("unknown_command", locale)))
        } else {
            Ok(Reply::text(t("help", locale)))
        }
    }

    fn handle_photo(
        &self,
        user_id: u64,
        file_id: &str,
        caption: Option<&str>,
        locale: &str,
        now: DateTime<Utc>,
    ) -> Result<Reply, StorageError> {
        match self.diary.handle_photo(user_id, file_id, caption, now)? {
            Some(reply) => Ok(reply),
            None => Ok(Reply::text(t("photo_no_draft", locale))),
        }
    }

    fn run_command(
        &self,
        user_id: u64,
        command: Command,
        locale: &str,
        now: DateTime<Utc>,
    ) -> Result<Reply, StorageError> {
        log::info!("[DISPATCH] Command {:?} from user {}", command, user_id);
        match command {
            Command::Start => Ok(Reply::text(t("welcome", locale))),
            Command::Help => Ok(Reply::text(t("help", locale))),
            Command::Tools => Ok(Reply::text(t("tools", locale))),
            Command::FoodDiary => self.diary.handle_action(user_id, &DiaryAction::Main, now),
            Command::Records => self
                .diary
                .handle_action(user_id, &DiaryAction::Records { offset: 0 }, now),
            Command::AddRecord => self.diary.handle_action(user_id, &DiaryAction::Add, now),
            Command::EditRecords => self
                .diary
                .handle_action(user_id, &DiaryAction::Pick { offset: 0 }, now),
            Command::DiarySettings => self.diary.handle_action(user_id, &DiaryAction::Settings, now),
            Command::SetTimezone(zone) => self.diary.set_timezone(user_id, &zone),
            Command::NoteAdd(text) => self.notes.add(user_id, &text, locale, now),
            Command::NoteList => self.notes.list(user_id, locale),
        }
    }
}
