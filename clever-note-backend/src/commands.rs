//! Slash-command parsing

/// Commands understood by the bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Welcome message: `/start`
    Start,
    /// Show help: `/help`
    Help,
    /// List tools: `/tools`
    Tools,
    /// Food diary menu: `/food_diary`
    FoodDiary,
    /// Records list: `/fd_records`
    Records,
    /// Start a new diary record: `/fd_add`
    AddRecord,
    /// Pick a record to edit: `/fd_edit`
    EditRecords,
    /// Diary settings: `/fd_settings`
    DiarySettings,
    /// Set the diary timezone: `/fd_tz Europe/Berlin` (empty shows settings)
    SetTimezone(String),
    /// Save a note: `/note_add <text>` (text may be empty)
    NoteAdd(String),
    /// Latest notes: `/note_list`
    NoteList,
}

/// Parse a command from message text.
///
/// Returns `None` for plain text and for unknown commands. A `@botname`
/// suffix on the command word is ignored.
pub fn parse(text: &str) -> Option<Command> {
    let text = text.trim();
    let rest = text.strip_prefix('/')?;

    let (word, args) = match rest.split_once(char::is_whitespace) {
        Some((word, args)) => (word, args.trim()),
        None => (rest, ""),
    };
    let command = word.split('@').next().unwrap_or(word).to_lowercase();

    log::debug!("Commands: Parsing '{}' -> command '{}' args '{}'", text, command, args);

    match command.as_str() {
        "start" => Some(Command::Start),
        "help" => Some(Command::Help),
        "tools" => Some(Command::Tools),
        "food_diary" => Some(Command::FoodDiary),
        "fd_records" => Some(Command::Records),
        "fd_add" => Some(Command::AddRecord),
        "fd_edit" => Some(Command::EditRecords),
        "fd_settings" => Some(Command::DiarySettings),
        "fd_tz" => Some(Command::SetTimezone(args.to_string())),
        "note_add" => Some(Command::NoteAdd(args.to_string())),
        "note_list" => Some(Command::NoteList),
        _ => {
            log::debug!("Commands: Unknown command '{}'", command);
            None
        }
    }
}
