//! Food diary screens: reply text plus the buttons offered with it.

use super::action::{DiaryAction, TimeChoice};
use super::flow::Rejection;
use super::records;
use super::time;
use crate::channels::types::{ActionMenu, MenuBuilder, Reply};
use crate::conversation::{ConversationDraft, DraftStep};
use food_diary_types::{DiaryRecord, HUNGER_MAX, HUNGER_MIN, PAGE_SIZE};

/// Zones offered as buttons on the settings screen
pub const COMMON_TIMEZONES: [&str; 8] = [
    "UTC",
    "Europe/London",
    "Europe/Berlin",
    "Europe/Moscow",
    "Asia/Dubai",
    "Asia/Tokyo",
    "America/New_York",
    "America/Los_Angeles",
];

/// Longest record text shown on a list button
const BUTTON_TEXT_WIDTH: usize = 24;

const CANCEL_LABEL: &str = "❌ Cancel";
const SKIP_LABEL: &str = "⏭️ Skip";
const BACK_LABEL: &str = "⬅️ Back";
const MENU_LABEL: &str = "🏠 Diary menu";

pub fn main_menu() -> Reply {
    let menu = MenuBuilder::new()
        .add("📋 Records", DiaryAction::Records { offset: 0 }.token())
        .add("➕ Add", DiaryAction::Add.token())
        .add("✏️ Edit", DiaryAction::Pick { offset: 0 }.token())
        .add("⚙️ Settings", DiaryAction::Settings.token())
        .layout(&[2, 2]);
    Reply::with_menu("🍽 Food diary\n\nWhat would you like to do?", menu)
}

/// One page of the records list, oldest first
pub fn records_page(all: &[DiaryRecord], offset: usize, zone: Option<&str>) -> Reply {
    if all.is_empty() {
        let menu = MenuBuilder::new()
            .add("➕ Add", DiaryAction::Add.token())
            .add(MENU_LABEL, DiaryAction::Main.token())
            .layout(&[2]);
        return Reply::with_menu("📋 No records yet.", menu);
    }

    let page = records::page(all, offset);
    if page.is_empty() {
        let menu = MenuBuilder::new()
            .add("⏮️ First page", DiaryAction::Records { offset: 0 }.token())
            .add(MENU_LABEL, DiaryAction::Main.token())
            .layout(&[2]);
        return Reply::with_menu("📋 No records on this page.", menu);
    }

    let mut text = format!(
        "📋 Records {}-{} of {}\n",
        offset + 1,
        offset + page.len(),
        all.len()
    );
    let mut builder = MenuBuilder::new();
    for (i, record) in page.iter().enumerate() {
        text.push_str(&format!(
            "\n{}. {}: {}",
            offset + i + 1,
            time::format_for_user(&record.datetime_utc, zone),
            display_text(&record.text)
        ));
        builder = builder.add(
            format!("{}. {}", offset + i + 1, short_text(&record.text)),
            DiaryAction::Show(record.id.clone()).token(),
        );
    }

    let (builder, nav) = with_page_nav(builder, all.len(), offset, |offset| DiaryAction::Records { offset });
    let builder = builder
        .add("➕ Add", DiaryAction::Add.token())
        .add("✏️ Edit", DiaryAction::Pick { offset }.token())
        .add(MENU_LABEL, DiaryAction::Main.token());

    Reply::with_menu(text, builder.layout(&list_layout(page.len(), nav, &[2, 1])))
}

/// Record picker for the edit flow
pub fn pick_page(all: &[DiaryRecord], offset: usize, zone: Option<&str>) -> Reply {
    if all.is_empty() {
        let menu = MenuBuilder::new()
            .add("➕ Add", DiaryAction::Add.token())
            .add(MENU_LABEL, DiaryAction::Main.token())
            .layout(&[2]);
        return Reply::with_menu("✏️ Nothing to edit yet.", menu);
    }

    let page = records::page(all, offset);
    let mut builder = MenuBuilder::new();
    for (i, record) in page.iter().enumerate() {
        builder = builder.add(
            format!(
                "{}. {} {}",
                offset + i + 1,
                time::format_for_user(&record.datetime_utc, zone),
                short_text(&record.text)
            ),
            DiaryAction::Edit(record.id.clone()).token(),
        );
    }
    let (builder, nav) = with_page_nav(builder, all.len(), offset, |offset| DiaryAction::Pick { offset });
    let builder = builder.add(MENU_LABEL, DiaryAction::Main.token());

    let text = if page.is_empty() {
        "✏️ No records on this page."
    } else {
        "✏️ Choose a record to edit:"
    };
    Reply::with_menu(text, builder.layout(&list_layout(page.len(), nav, &[1])))
}

/// Every field of one record with Edit / Delete / Back
pub fn record_detail(record: &DiaryRecord, back_offset: usize, zone: Option<&str>) -> Reply {
    let menu = MenuBuilder::new()
        .add("✏️ Edit", DiaryAction::Edit(record.id.clone()).token())
        .add("🗑 Delete", DiaryAction::Delete(record.id.clone()).token())
        .add(BACK_LABEL, DiaryAction::Records { offset: back_offset }.token())
        .layout(&[2, 1]);
    Reply::with_menu(record_summary(record, zone), menu)
}

pub fn confirm_delete(record: &DiaryRecord, zone: Option<&str>) -> Reply {
    let menu = MenuBuilder::new()
        .add("🗑 Yes, delete", DiaryAction::ConfirmDelete(record.id.clone()).token())
        .add("↩️ No", DiaryAction::Show(record.id.clone()).token())
        .layout(&[2]);
    Reply::with_menu(
        format!("Delete this record?\n\n{}", record_summary(record, zone)),
        menu,
    )
}

pub fn deleted() -> Reply {
    with_main_menu("🗑 Record deleted.")
}

/// The record a button or draft refers to is gone
pub fn record_missing() -> Reply {
    let menu = MenuBuilder::new()
        .add("📋 Records", DiaryAction::Records { offset: 0 }.token())
        .add(MENU_LABEL, DiaryAction::Main.token())
        .layout(&[2]);
    Reply::with_menu("⚠️ This record no longer exists.", menu)
}

/// A draft-only button arrived with no draft in progress
pub fn no_draft() -> Reply {
    with_main_menu("⚠️ Nothing is in progress. Start again from the menu.")
}

pub fn cancelled() -> Reply {
    with_main_menu("❌ Cancelled. Nothing was saved.")
}

pub fn saved(record: &DiaryRecord, edited: bool, total: usize, zone: Option<&str>) -> Reply {
    let title = if edited { "✅ Record updated" } else { "✅ Record saved" };
    let back_offset = if edited { 0 } else { records::last_page_offset(total) };
    let menu = MenuBuilder::new()
        .add("📋 Records", DiaryAction::Records { offset: back_offset }.token())
        .add("➕ Add another", DiaryAction::Add.token())
        .add(MENU_LABEL, DiaryAction::Main.token())
        .layout(&[2, 1]);
    Reply::with_menu(format!("{}\n\n{}", title, record_summary(record, zone)), menu)
}

pub fn settings(zone: Option<&str>) -> Reply {
    let builder = COMMON_TIMEZONES.iter().fold(MenuBuilder::new(), |b, tz| {
        let label = if Some(*tz) == zone { format!("✅ {}", tz) } else { tz.to_string() };
        b.add(label, DiaryAction::SetTimezone(tz.to_string()).token())
    });
    let menu = builder.add(BACK_LABEL, DiaryAction::Main.token()).layout(&[2]);
    Reply::with_menu(
        format!(
            "⚙️ Settings\n\nTimezone: {}\nPick one below or send /fd_tz <Area/City>.",
            time::zone_label(zone)
        ),
        menu,
    )
}

pub fn timezone_set(zone: &str) -> Reply {
    with_main_menu(format!("✅ Timezone set to {}.", zone))
}

/// Prompt for the draft's current step
pub fn prompt(draft: &ConversationDraft, zone: Option<&str>) -> Reply {
    let original = draft.original();
    let current = |value: Option<String>| match value {
        Some(v) => format!("\n\nCurrent: {}", v),
        None => String::new(),
    };

    match &draft.step {
        DraftStep::Datetime { awaiting_custom: false } => {
            let builder = TimeChoice::RELATIVE.iter().fold(MenuBuilder::new(), |b, c| {
                b.add(c.label(), DiaryAction::Time(*c).token())
            });
            let menu = builder
                .add(TimeChoice::Custom.label(), DiaryAction::Time(TimeChoice::Custom).token())
                .add_if(
                    draft.is_editing(),
                    TimeChoice::Skip.label(),
                    DiaryAction::Time(TimeChoice::Skip).token(),
                )
                .add(CANCEL_LABEL, DiaryAction::Cancel.token())
                .layout(&[2, 2, 2, 1]);
            let text = format!(
                "🕐 When did you eat?{}",
                current(original.map(|r| time::format_for_user(&r.datetime_utc, zone)))
            );
            Reply::with_menu(text, menu)
        }
        DraftStep::Datetime { awaiting_custom: true } => {
            let menu = MenuBuilder::new()
                .add(BACK_LABEL, DiaryAction::Back.token())
                .add(CANCEL_LABEL, DiaryAction::Cancel.token())
                .layout(&[2]);
            let text = format!(
                "✍️ Type the date and time as YYYY-MM-DD HH:MM ({}).",
                time::zone_label(zone)
            );
            Reply::with_menu(text, menu)
        }
        DraftStep::Text { .. } => Reply::with_menu(
            format!(
                "📝 What did you eat? You can also send a photo with a caption.{}",
                current(original.map(|r| display_text(&r.text).to_string()))
            ),
            skip_cancel_menu(false),
        ),
        DraftStep::Drink { .. } => Reply::with_menu(
            format!(
                "🥤 What did you drink?{}",
                current(original.and_then(|r| r.drink.clone()))
            ),
            skip_cancel_menu(true),
        ),
        DraftStep::HungerBefore { .. } => Reply::with_menu(
            format!(
                "😋 How hungry were you before eating? (1 = not at all, 10 = starving){}",
                current(original.and_then(|r| r.hunger_before).map(|h| h.to_string()))
            ),
            hunger_menu(),
        ),
        DraftStep::HungerAfter { .. } => Reply::with_menu(
            format!(
                "😌 How hungry were you after eating? (1 = not at all, 10 = starving){}",
                current(original.and_then(|r| r.hunger_after).map(|h| h.to_string()))
            ),
            hunger_menu(),
        ),
    }
}

/// The same prompt again, led by why the input was not accepted
pub fn rejected(draft: &ConversationDraft, rejection: Rejection, zone: Option<&str>) -> Reply {
    let prompt = prompt(draft, zone);
    Reply {
        text: format!("{}\n\n{}", rejection.message(), prompt.text),
        menu: prompt.menu,
    }
}

/// Multi-line view of every field
pub fn record_summary(record: &DiaryRecord, zone: Option<&str>) -> String {
    let hunger = |h: Option<u8>| h.map(|h| h.to_string()).unwrap_or_else(|| "-".to_string());
    let mut summary = format!(
        "🕐 {}\n🍽 {}\n🥤 {}\n😋 Hunger: {} → {}",
        time::format_for_user(&record.datetime_utc, zone),
        display_text(&record.text),
        record.drink.as_deref().unwrap_or("-"),
        hunger(record.hunger_before),
        hunger(record.hunger_after),
    );
    if record.picture.is_some() {
        summary.push_str("\n📷 Photo attached");
    }
    summary
}

fn display_text(text: &str) -> &str {
    if text.is_empty() { "(no description)" } else { text }
}

fn short_text(text: &str) -> String {
    let text = display_text(text);
    if text.chars().count() <= BUTTON_TEXT_WIDTH {
        return text.to_string();
    }
    let cut: String = text.chars().take(BUTTON_TEXT_WIDTH - 1).collect();
    format!("{}…", cut)
}

fn with_main_menu(text: impl Into<String>) -> Reply {
    let menu = MenuBuilder::new()
        .add("📋 Records", DiaryAction::Records { offset: 0 }.token())
        .add("➕ Add", DiaryAction::Add.token())
        .add(MENU_LABEL, DiaryAction::Main.token())
        .layout(&[2, 1]);
    Reply::with_menu(text, menu)
}

fn skip_cancel_menu(with_back: bool) -> ActionMenu {
    MenuBuilder::new()
        .add(SKIP_LABEL, DiaryAction::Skip.token())
        .add_if(with_back, BACK_LABEL, DiaryAction::Back.token())
        .add(CANCEL_LABEL, DiaryAction::Cancel.token())
        .layout(&[3])
}

fn hunger_menu() -> ActionMenu {
    let builder = (HUNGER_MIN..=HUNGER_MAX).fold(MenuBuilder::new(), |b, level| {
        b.add(level.to_string(), DiaryAction::Hunger(level).token())
    });
    let levels = usize::from(HUNGER_MAX - HUNGER_MIN + 1);
    let per_row = levels.div_ceil(2);
    let mut menu = builder.layout(&[per_row, per_row]);
    menu.rows.extend(skip_cancel_menu(true).rows);
    menu
}

/// Add prev/next buttons where applicable; returns how many were added
fn with_page_nav(
    builder: MenuBuilder,
    total: usize,
    offset: usize,
    action: impl Fn(usize) -> DiaryAction,
) -> (MenuBuilder, usize) {
    let has_prev = offset > 0;
    let has_next = offset.saturating_add(PAGE_SIZE) < total;
    let builder = builder
        .add_if(has_prev, "◀️ Prev", action(offset.saturating_sub(PAGE_SIZE)).token())
        .add_if(has_next, "Next ▶️", action(offset + PAGE_SIZE).token());
    (builder, usize::from(has_prev) + usize::from(has_next))
}

/// One row per record, one row for the page nav, then `tail`
fn list_layout(records: usize, nav: usize, tail: &[usize]) -> Vec<usize> {
    let mut sizes = vec![1; records];
    if nav > 0 {
        sizes.push(nav);
    }
    sizes.extend_from_slice(tail);
    sizes
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn records(n: usize) -> Vec<DiaryRecord> {
        (0..n)
            .map(|i| DiaryRecord {
                id: format!("2024010{}_0000{:02}", 1 + i / 60, i % 60),
                datetime_utc: Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap() + Duration::hours(i as i64),
                text: format!("meal {}", i),
                drink: None,
                hunger_before: None,
                hunger_after: None,
                picture: None,
            })
            .collect()
    }

    #[test]
    fn test_main_menu_layout() {
        let reply = main_menu();
        assert_eq!(reply.tokens(), vec!["fd_records_0", "fd_add", "fd_pick_0", "fd_settings"]);
        assert_eq!(reply.menu.unwrap().row_sizes(), vec![2, 2]);
    }

    #[test]
    fn test_first_page_has_only_next() {
        let all = records(12);
        let reply = records_page(&all, 0, None);
        let tokens = reply.tokens();
        assert!(tokens.contains(&"fd_records_5"));
        assert!(!tokens.iter().any(|t| *t == "fd_records_0"));
        assert_eq!(tokens.iter().filter(|t| t.starts_with("fd_rec_")).count(), 5);
        assert!(reply.text.contains("Records 1-5 of 12"));
    }

    #[test]
    fn test_last_page_has_only_prev() {
        let all = records(12);
        let reply = records_page(&all, 10, None);
        let tokens = reply.tokens();
        assert!(tokens.contains(&"fd_records_5"));
        assert!(!tokens.contains(&"fd_records_15"));
        assert_eq!(tokens.iter().filter(|t| t.starts_with("fd_rec_")).count(), 2);
        assert_eq!(reply.menu.unwrap().row_sizes(), vec![1, 1, 1, 2, 1]);
    }

    #[test]
    fn test_single_page_has_no_nav() {
        let reply = records_page(&records(3), 0, None);
        assert!(!reply.tokens().iter().any(|t| t.starts_with("fd_records_")));
    }

    #[test]
    fn test_out_of_range_page() {
        let reply = records_page(&records(3), 15, None);
        assert!(reply.text.contains("No records on this page"));
        assert!(reply.tokens().contains(&"fd_records_0"));
    }

    #[test]
    fn test_empty_list() {
        let reply = records_page(&[], 0, None);
        assert!(reply.text.contains("No records yet"));
        assert!(reply.tokens().contains(&"fd_add"));
    }

    #[test]
    fn test_detail_actions() {
        let record = &records(1)[0];
        let reply = record_detail(record, 5, Some("Europe/Berlin"));
        let edit = format!("fd_edit_{}", record.id);
        let delete = format!("fd_del_{}", record.id);
        assert_eq!(reply.tokens(), vec![edit.as_str(), delete.as_str(), "fd_records_5"]);
        assert!(reply.text.contains("(Europe/Berlin)"));
    }

    #[test]
    fn test_time_prompt_skip_only_when_editing() {
        let new = prompt(&ConversationDraft::new_record(1), None);
        assert!(!new.tokens().contains(&"fd_time_skip"));
        assert!(new.tokens().contains(&"fd_time_custom"));
        assert!(new.tokens().contains(&"fd_cancel"));

        let edit = prompt(&ConversationDraft::edit_record(1, records(1).remove(0)), None);
        assert!(edit.tokens().contains(&"fd_time_skip"));
        assert!(edit.text.contains("Current: 2024-01-01 08:00 UTC"));
    }

    #[test]
    fn test_drink_prompt_offers_back() {
        let mut record = records(1).remove(0);
        record.drink = Some("tea".to_string());
        let draft = ConversationDraft::edit_record(1, record.clone()).with_step(DraftStep::Drink {
            datetime_utc: record.datetime_utc,
            text: record.text.clone(),
        });
        let reply = prompt(&draft, None);
        assert_eq!(reply.tokens(), vec!["fd_skip", "fd_back", "fd_cancel"]);
        assert!(reply.text.contains("Current: tea"));
    }

    #[test]
    fn test_hunger_prompt_buttons() {
        let draft = ConversationDraft::new_record(1).with_step(DraftStep::HungerBefore {
            datetime_utc: Utc::now(),
            text: "soup".to_string(),
            drink: None,
        });
        let reply = prompt(&draft, None);
        let tokens = reply.tokens();
        assert_eq!(tokens.iter().filter(|t| t.starts_with("fd_hunger_")).count(), 10);
        assert!(tokens.contains(&"fd_hunger_1"));
        assert!(tokens.contains(&"fd_hunger_10"));
        assert!(tokens.contains(&"fd_back"));
        assert_eq!(reply.menu.unwrap().row_sizes(), vec![5, 5, 3]);
    }

    #[test]
    fn test_rejection_keeps_prompt() {
        let draft = ConversationDraft::new_record(1);
        let reply = rejected(&draft, Rejection::UseButtons, None);
        assert!(reply.text.starts_with(Rejection::UseButtons.message()));
        assert_eq!(reply.tokens(), prompt(&draft, None).tokens());
    }

    #[test]
    fn test_settings_marks_current_zone() {
        let reply = settings(Some("Europe/Moscow"));
        assert!(reply.text.contains("Timezone: Europe/Moscow"));
        assert!(reply.tokens().contains(&"fd_tz_America/Los_Angeles"));
        let labels: Vec<&str> = reply.menu.as_ref().unwrap().entries().map(|e| e.label.as_str()).collect();
        assert!(labels.contains(&"✅ Europe/Moscow"));
    }

    #[test]
    fn test_summary_of_skipped_fields() {
        let mut record = records(1).remove(0);
        record.text = String::new();
        let summary = record_summary(&record, None);
        assert!(summary.contains("(no description)"));
        assert!(summary.contains("Hunger: - → -"));
    }

    #[test]
    fn test_long_text_is_shortened_on_buttons() {
        let long = "a very long description of a very large lunch";
        let short = short_text(long);
        assert_eq!(short.chars().count(), BUTTON_TEXT_WIDTH);
        assert!(short.ends_with('…'));
    }
}
