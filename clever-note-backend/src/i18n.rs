//! Localized strings for top-level bot messages.
//!
//! Lookup order: the requested locale, then English, then the key itself.

use once_cell::sync::Lazy;
use std::collections::HashMap;

pub const FALLBACK_LOCALE: &str = "en";

type Catalog = HashMap<&'static str, &'static str>;

static CATALOGS: Lazy<HashMap<&'static str, Catalog>> = Lazy::new(|| {
    let mut catalogs = HashMap::new();
    catalogs.insert(
        "en",
        HashMap::from([
            ("welcome", "Welcome to Clever Note! Keep notes and a food diary right here in the chat.\n\nSend /help to see what I can do."),
            (
                "help",
                "Available commands:\n\
                 /start - welcome message\n\
                 /help - this help\n\
                 /tools - list of tools\n\
                 /note_add <text> - save a note\n\
                 /note_list - your latest notes\n\
                 /food_diary - food diary menu\n\
                 /fd_records - your diary records\n\
                 /fd_add - add a diary record\n\
                 /fd_edit - edit a diary record\n\
                 /fd_settings - diary settings\n\
                 /fd_tz <Area/City> - set your timezone",
            ),
            ("unknown_command", "Unknown command. Send /help for the list of commands."),
            ("notes_empty", "You have no notes yet."),
            ("notes_saved", "Note saved."),
            ("notes_usage", "Usage: /note_add <text>"),
            ("tools", "Tools: notes, food diary"),
            ("photo_no_draft", "To add a photo to your food diary, press ➕ Add in /food_diary and send it when asked what you ate."),
            ("error_generic", "⚠️ Something went wrong while saving or loading your data. Please try again."),
        ]),
    );
    catalogs.insert(
        "ru",
        HashMap::from([
            ("welcome", "Добро пожаловать в Clever Note! Заметки и дневник питания прямо в чате.\n\nОтправьте /help, чтобы узнать, что я умею."),
            (
                "help",
                "Доступные команды:\n\
                 /start - приветствие\n\
                 /help - эта справка\n\
                 /tools - список инструментов\n\
                 /note_add <текст> - сохранить заметку\n\
                 /note_list - последние заметки\n\
                 /food_diary - меню дневника питания\n\
                 /fd_records - записи дневника\n\
                 /fd_add - добавить запись\n\
                 /fd_edit - изменить запись\n\
                 /fd_settings - настройки дневника\n\
                 /fd_tz <Область/Город> - указать часовой пояс",
            ),
            ("unknown_command", "Неизвестная команда. Отправьте /help, чтобы увидеть список команд."),
            ("notes_empty", "У вас пока нет заметок."),
            ("notes_saved", "Заметка сохранена."),
            ("notes_usage", "Использование: /note_add <текст>"),
            ("tools", "Инструменты: заметки, дневник питания"),
            ("photo_no_draft", "Чтобы добавить фото в дневник питания, нажмите ➕ Add в /food_diary и отправьте его, когда бот спросит, что вы ели."),
            ("error_generic", "⚠️ Не удалось сохранить или загрузить данные. Попробуйте ещё раз."),
        ]),
    );
    catalogs
});

/// Translate `key` for `locale`
pub fn t(key: &str, locale: &str) -> String {
    CATALOGS
        .get(locale)
        .and_then(|c| c.get(key))
        .or_else(|| CATALOGS.get(FALLBACK_LOCALE).and_then(|c| c.get(key)))
        .map(|s| s.to_string())
        .unwrap_or_else(|| key.to_string())
}

/// Locale from a platform language code (`en-US` -> `en`), else `default`
pub fn locale_from(language_code: Option<&str>, default: &str) -> String {
    language_code
        .and_then(|code| code.split(['-', '_']).next())
        .map(|lang| lang.trim().to_lowercase())
        .filter(|lang| !lang.is_empty())
        .unwrap_or_else(|| default.to_string())
}
