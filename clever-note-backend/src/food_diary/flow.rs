//! Food diary step machine
//!
//! `advance` takes the current draft and one input and returns what happens
//! next. It does no I/O: the caller persists the returned draft, saves a
//! completed entry, or clears the draft.
//!
//! ```text
//! datetime -> text -> drink -> hunger_before -> hunger_after -> (save)
//!                 ^-- back --'       ^---- back ----'
//! ```
//!
//! Editing a record that has a drink resumes at `drink` after the time step,
//! carrying the record's text; back from `drink` reaches `text`.
//!
//! Skip keeps the edited record's value; on a new record it leaves the field
//! empty. A photo answers the `text` step: its caption becomes the text and
//! the photo is kept as the record's picture. A `/`-prefixed message at any step is an unrelated command and
//! aborts the draft.

use super::action::{DiaryAction, TimeChoice};
use super::time;
use crate::conversation::{CompletedDraft, ConversationDraft, DraftStep};
use chrono::{DateTime, Utc};
use food_diary_types::{DiaryEntry, is_valid_hunger};

/// One input to the machine
#[derive(Debug, Clone, Copy)]
pub enum DraftInput<'a> {
    Action(&'a DiaryAction),
    Text(&'a str),
    Photo {
        file_id: &'a str,
        caption: Option<&'a str>,
    },
}

/// Why the current step is shown again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Typed text where a button was expected
    UseButtons,
    /// A button that does nothing at this step
    UnexpectedAction,
    /// Skip on the time step of a new record
    SkipNeedsExistingRecord,
    /// Custom date-time did not parse (or does not exist in the zone)
    BadCustomTime,
    /// Empty description on a new record
    EmptyText,
    EmptyDrink,
    /// Hunger level outside 1-10
    BadHunger,
    /// A photo anywhere but the meal description
    PhotoNotExpected,
}

impl Rejection {
    pub fn message(&self) -> &'static str {
        match self {
            Rejection::UseButtons => "⚠️ Please use the buttons below.",
            Rejection::UnexpectedAction => "⚠️ That option isn't available at this step.",
            Rejection::SkipNeedsExistingRecord => {
                "⚠️ Keeping the current time only works when editing a record."
            }
            Rejection::BadCustomTime => {
                "⚠️ Couldn't read that date and time. Use the format YYYY-MM-DD HH:MM, e.g. 2024-01-15 14:30."
            }
            Rejection::EmptyText => "⚠️ Please describe what you ate.",
            Rejection::EmptyDrink => "⚠️ Please type what you drank, or skip.",
            Rejection::BadHunger => "⚠️ Hunger level must be a number from 1 to 10.",
            Rejection::PhotoNotExpected => "⚠️ A photo can only be added when describing the meal.",
        }
    }
}

/// Outcome of one input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Move to (or stay at) the step in the returned draft and prompt it
    Advance(ConversationDraft),
    /// Input not valid here: prompt the same step again with a reason
    Reject(ConversationDraft, Rejection),
    /// All steps done; save and clear the draft
    Complete(CompletedDraft),
    /// Explicit cancel; clear the draft
    Cancelled,
    /// Unrelated command; clear the draft without saving
    Aborted,
}

/// Feed one input to the draft
///
/// `now` anchors relative time choices; `zone` is the user's timezone
/// preference used to read custom times.
pub fn advance(
    draft: ConversationDraft,
    input: DraftInput<'_>,
    now: DateTime<Utc>,
    zone: Option<&str>,
) -> Transition {
    if let DraftInput::Action(DiaryAction::Cancel) = input {
        return Transition::Cancelled;
    }
    if let DraftInput::Text(text) = input {
        if text.trim_start().starts_with('/') {
            return Transition::Aborted;
        }
    }

    match draft.step.clone() {
        DraftStep::Datetime { awaiting_custom } => datetime_step(draft, awaiting_custom, input, now, zone),
        DraftStep::Text { datetime_utc } => text_step(draft, datetime_utc, input),
        DraftStep::Drink { datetime_utc, text } => drink_step(draft, datetime_utc, text, input),
        DraftStep::HungerBefore {
            datetime_utc,
            text,
            drink,
        } => hunger_before_step(draft, datetime_utc, text, drink, input),
        DraftStep::HungerAfter {
            datetime_utc,
            text,
            drink,
            hunger_before,
        } => hunger_after_step(draft, datetime_utc, text, drink, hunger_before, input),
    }
}

fn datetime_step(
    draft: ConversationDraft,
    awaiting_custom: bool,
    input: DraftInput<'_>,
    now: DateTime<Utc>,
    zone: Option<&str>,
) -> Transition {
    match input {
        DraftInput::Action(DiaryAction::Time(TimeChoice::Custom)) => {
            Transition::Advance(draft.with_step(DraftStep::Datetime { awaiting_custom: true }))
        }
        DraftInput::Action(DiaryAction::Time(TimeChoice::Skip)) => {
            match draft.original().map(|r| r.datetime_utc) {
                Some(datetime_utc) => after_time(draft, datetime_utc),
                None => Transition::Reject(draft, Rejection::SkipNeedsExistingRecord),
            }
        }
        DraftInput::Action(DiaryAction::Time(choice)) => match time::resolve_choice(*choice, now) {
            Some(datetime_utc) => after_time(draft, datetime_utc),
            None => Transition::Reject(draft, Rejection::UnexpectedAction),
        },
        DraftInput::Action(DiaryAction::Back) if awaiting_custom => {
            Transition::Advance(draft.with_step(DraftStep::Datetime { awaiting_custom: false }))
        }
        DraftInput::Action(_) => Transition::Reject(draft, Rejection::UnexpectedAction),
        DraftInput::Text(text) if awaiting_custom => match time::parse_custom(text, zone) {
            Some(datetime_utc) => after_time(draft, datetime_utc),
            None => Transition::Reject(draft, Rejection::BadCustomTime),
        },
        DraftInput::Text(_) => Transition::Reject(draft, Rejection::UseButtons),
        DraftInput::Photo { .. } => Transition::Reject(draft, Rejection::PhotoNotExpected),
    }
}

/// Leave the time step: edits of a record with a drink resume at `drink`
fn after_time(draft: ConversationDraft, datetime_utc: DateTime<Utc>) -> Transition {
    let step = match draft.original() {
        Some(original) if original.drink.is_some() => DraftStep::Drink {
            datetime_utc,
            text: original.text.clone(),
        },
        _ => DraftStep::Text { datetime_utc },
    };
    Transition::Advance(draft.with_step(step))
}

fn text_step(draft: ConversationDraft, datetime_utc: DateTime<Utc>, input: DraftInput<'_>) -> Transition {
    match input {
        DraftInput::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Transition::Reject(draft, Rejection::EmptyText);
            }
            let text = text.to_string();
            Transition::Advance(draft.with_step(DraftStep::Drink { datetime_utc, text }))
        }
        DraftInput::Action(DiaryAction::Skip) => {
            let text = draft.original().map(|r| r.text.clone()).unwrap_or_default();
            Transition::Advance(draft.with_step(DraftStep::Drink { datetime_utc, text }))
        }
        DraftInput::Photo { file_id, caption } => {
            let text = match caption.map(str::trim).filter(|c| !c.is_empty()) {
                Some(caption) => caption.to_string(),
                None => draft.original().map(|r| r.text.clone()).unwrap_or_default(),
            };
            let draft = draft.with_picture(file_id);
            Transition::Advance(draft.with_step(DraftStep::Drink { datetime_utc, text }))
        }
        DraftInput::Action(_) => Transition::Reject(draft, Rejection::UnexpectedAction),
    }
}

fn drink_step(
    draft: ConversationDraft,
    datetime_utc: DateTime<Utc>,
    text: String,
    input: DraftInput<'_>,
) -> Transition {
    match input {
        DraftInput::Text(raw) => {
            let raw = raw.trim();
            if raw.is_empty() {
                return Transition::Reject(draft, Rejection::EmptyDrink);
            }
            let drink = Some(raw.to_string());
            Transition::Advance(draft.with_step(DraftStep::HungerBefore {
                datetime_utc,
                text,
                drink,
            }))
        }
        DraftInput::Action(DiaryAction::Skip) => {
            let drink = draft.original().and_then(|r| r.drink.clone());
            Transition::Advance(draft.with_step(DraftStep::HungerBefore {
                datetime_utc,
                text,
                drink,
            }))
        }
        DraftInput::Action(DiaryAction::Back) => {
            Transition::Advance(draft.with_step(DraftStep::Text { datetime_utc }))
        }
        DraftInput::Action(_) => Transition::Reject(draft, Rejection::UnexpectedAction),
        DraftInput::Photo { .. } => Transition::Reject(draft, Rejection::PhotoNotExpected),
    }
}

fn hunger_before_step(
    draft: ConversationDraft,
    datetime_utc: DateTime<Utc>,
    text: String,
    drink: Option<String>,
    input: DraftInput<'_>,
) -> Transition {
    let hunger_before = match input {
        DraftInput::Action(DiaryAction::Back) => {
            return Transition::Advance(draft.with_step(DraftStep::Text { datetime_utc }));
        }
        DraftInput::Action(DiaryAction::Skip) => draft.original().and_then(|r| r.hunger_before),
        other => match read_hunger(other) {
            Ok(level) => Some(level),
            Err(rejection) => return Transition::Reject(draft, rejection),
        },
    };

    Transition::Advance(draft.with_step(DraftStep::HungerAfter {
        datetime_utc,
        text,
        drink,
        hunger_before,
    }))
}

fn hunger_after_step(
    draft: ConversationDraft,
    datetime_utc: DateTime<Utc>,
    text: String,
    drink: Option<String>,
    hunger_before: Option<u8>,
    input: DraftInput<'_>,
) -> Transition {
    let hunger_after = match input {
        DraftInput::Action(DiaryAction::Back) => {
            return Transition::Advance(draft.with_step(DraftStep::HungerBefore {
                datetime_utc,
                text,
                drink,
            }));
        }
        DraftInput::Action(DiaryAction::Skip) => draft.original().and_then(|r| r.hunger_after),
        other => match read_hunger(other) {
            Ok(level) => Some(level),
            Err(rejection) => return Transition::Reject(draft, rejection),
        },
    };

    Transition::Complete(CompletedDraft {
        user_id: draft.user_id,
        target: draft.target,
        entry: DiaryEntry {
            datetime_utc,
            text,
            drink,
            hunger_before,
            hunger_after,
            picture: draft.picture,
        },
    })
}

/// Hunger from a level button or a typed number
fn read_hunger(input: DraftInput<'_>) -> Result<u8, Rejection> {
    let level = match input {
        DraftInput::Action(DiaryAction::Hunger(level)) => *level,
        DraftInput::Action(_) => return Err(Rejection::UnexpectedAction),
        DraftInput::Photo { .. } => return Err(Rejection::PhotoNotExpected),
        DraftInput::Text(text) => text.trim().parse::<u8>().map_err(|_| Rejection::BadHunger)?,
    };
    if is_valid_hunger(level) { Ok(level) } else { Err(Rejection::BadHunger) }
}
