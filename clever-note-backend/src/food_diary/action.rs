//! Food diary action tokens
//!
//! Tokens travel through the chat platform as button payloads and come back
//! verbatim. Every token starts with `fd_`; parameters follow the family
//! prefix after a `_`. Parsing never fails hard: an unreadable offset falls
//! back to 0 and an unknown token parses to `None`.

/// Prefix shared by every diary token
pub const TOKEN_PREFIX: &str = "fd_";

/// How the user picks the time a meal was eaten
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeChoice {
    Now,
    Ago30m,
    Ago1h,
    Ago2h,
    Ago3h,
    Ago4h,
    /// Type a date-time by hand
    Custom,
    /// Keep the edited record's time
    Skip,
}

impl TimeChoice {
    /// Buttons offered on the time prompt, in display order
    pub const RELATIVE: [TimeChoice; 6] = [
        TimeChoice::Now,
        TimeChoice::Ago30m,
        TimeChoice::Ago1h,
        TimeChoice::Ago2h,
        TimeChoice::Ago3h,
        TimeChoice::Ago4h,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeChoice::Now => "now",
            TimeChoice::Ago30m => "30m",
            TimeChoice::Ago1h => "1h",
            TimeChoice::Ago2h => "2h",
            TimeChoice::Ago3h => "3h",
            TimeChoice::Ago4h => "4h",
            TimeChoice::Custom => "custom",
            TimeChoice::Skip => "skip",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "now" => Some(TimeChoice::Now),
            "30m" => Some(TimeChoice::Ago30m),
            "1h" => Some(TimeChoice::Ago1h),
            "2h" => Some(TimeChoice::Ago2h),
            "3h" => Some(TimeChoice::Ago3h),
            "4h" => Some(TimeChoice::Ago4h),
            "custom" => Some(TimeChoice::Custom),
            "skip" => Some(TimeChoice::Skip),
            _ => None,
        }
    }

    /// Minutes before now, for the relative choices
    pub fn minutes_ago(&self) -> Option<i64> {
        match self {
            TimeChoice::Now => Some(0),
            TimeChoice::Ago30m => Some(30),
            TimeChoice::Ago1h => Some(60),
            TimeChoice::Ago2h => Some(120),
            TimeChoice::Ago3h => Some(180),
            TimeChoice::Ago4h => Some(240),
            TimeChoice::Custom | TimeChoice::Skip => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeChoice::Now => "🕐 Now",
            TimeChoice::Ago30m => "30 min ago",
            TimeChoice::Ago1h => "1 hour ago",
            TimeChoice::Ago2h => "2 hours ago",
            TimeChoice::Ago3h => "3 hours ago",
            TimeChoice::Ago4h => "4 hours ago",
            TimeChoice::Custom => "✍️ Custom",
            TimeChoice::Skip => "⏭️ Keep current",
        }
    }
}

/// A button press inside the food diary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiaryAction {
    /// Top-level diary menu
    Main,
    /// Records list starting at `offset`
    Records { offset: usize },
    /// Start a new record
    Add,
    /// Record picker for editing, starting at `offset`
    Pick { offset: usize },
    /// Detail screen of one record
    Show(String),
    /// Start editing a record
    Edit(String),
    /// Ask before deleting a record
    Delete(String),
    /// Delete confirmed
    ConfirmDelete(String),
    Time(TimeChoice),
    Skip,
    Back,
    /// Hunger level button; an unreadable level parses as 0 and is rejected
    /// by the hunger steps
    Hunger(u8),
    Cancel,
    Settings,
    SetTimezone(String),
}

impl DiaryAction {
    /// Parse a token received from the chat platform
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        let body = token.strip_prefix(TOKEN_PREFIX)?;

        match body {
            "main" => return Some(DiaryAction::Main),
            "records" => return Some(DiaryAction::Records { offset: 0 }),
            "add" => return Some(DiaryAction::Add),
            "edit" => return Some(DiaryAction::Pick { offset: 0 }),
            "skip" => return Some(DiaryAction::Skip),
            "back" => return Some(DiaryAction::Back),
            "cancel" => return Some(DiaryAction::Cancel),
            "settings" => return Some(DiaryAction::Settings),
            _ => {}
        }

        let (family, param) = body.split_once('_')?;
        match family {
            "records" => Some(DiaryAction::Records { offset: parse_offset(param) }),
            "pick" => Some(DiaryAction::Pick { offset: parse_offset(param) }),
            "rec" => non_empty(param).map(DiaryAction::Show),
            "edit" => non_empty(param).map(DiaryAction::Edit),
            "del" => non_empty(param).map(DiaryAction::Delete),
            "delok" => non_empty(param).map(DiaryAction::ConfirmDelete),
            "time" => TimeChoice::from_str(param).map(DiaryAction::Time),
            "hunger" => Some(DiaryAction::Hunger(param.parse().unwrap_or(0))),
            "tz" => non_empty(param).map(DiaryAction::SetTimezone),
            _ => None,
        }
    }

    /// Encode as a button payload
    pub fn token(&self) -> String {
        match self {
            DiaryAction::Main => format!("{}main", TOKEN_PREFIX),
            DiaryAction::Records { offset } => format!("{}records_{}", TOKEN_PREFIX, offset),
            DiaryAction::Add => format!("{}add", TOKEN_PREFIX),
            DiaryAction::Pick { offset } => format!("{}pick_{}", TOKEN_PREFIX, offset),
            DiaryAction::Show(id) => format!("{}rec_{}", TOKEN_PREFIX, id),
            DiaryAction::Edit(id) => format!("{}edit_{}", TOKEN_PREFIX, id),
            DiaryAction::Delete(id) => format!("{}del_{}", TOKEN_PREFIX, id),
            DiaryAction::ConfirmDelete(id) => format!("{}delok_{}", TOKEN_PREFIX, id),
            DiaryAction::Time(choice) => format!("{}time_{}", TOKEN_PREFIX, choice.as_str()),
            DiaryAction::Skip => format!("{}skip", TOKEN_PREFIX),
            DiaryAction::Back => format!("{}back", TOKEN_PREFIX),
            DiaryAction::Hunger(level) => format!("{}hunger_{}", TOKEN_PREFIX, level),
            DiaryAction::Cancel => format!("{}cancel", TOKEN_PREFIX),
            DiaryAction::Settings => format!("{}settings", TOKEN_PREFIX),
            DiaryAction::SetTimezone(zone) => format!("{}tz_{}", TOKEN_PREFIX, zone),
        }
    }
}

fn parse_offset(raw: &str) -> usize {
    raw.parse().unwrap_or_else(|_| {
        log::warn!("[DIARY] Malformed offset '{}' in action token, using 0", raw);
        0
    })
}

fn non_empty(raw: &str) -> Option<String> {
    if raw.is_empty() { None } else { Some(raw.to_string()) }
}
