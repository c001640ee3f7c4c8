//! Telegram channel
//!
//! Long-polls the Bot API, turns messages, photos and callback queries into
//! [`NormalizedMessage`]s and renders the dispatcher's [`Reply`] back as a
//! message with an inline keyboard.

use crate::channels::dispatcher::MessageDispatcher;
use crate::channels::types::{ActionMenu, Inbound, NormalizedMessage, Reply};
use crate::channels::util::split_message;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, User};
use teloxide::{ApiError, RequestError};

/// Telegram's limit on message text length, in characters
const TELEGRAM_MAX_MESSAGE_CHARS: usize = 4096;

/// Run the bot until Ctrl-C
pub async fn run(bot_token: String, dispatcher: Arc<MessageDispatcher>) -> Result<(), String> {
    let bot = Bot::new(bot_token);

    let me = bot
        .get_me()
        .await
        .map_err(|e| format!("Telegram: Failed to authenticate bot: {}", e))?;
    log::info!("Telegram: Bot connected as @{}", me.username());

    if let Err(e) = bot.delete_webhook().drop_pending_updates(true).await {
        log::warn!("Telegram: Failed to delete webhook: {}", e);
    }

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_callback_query().endpoint(handle_callback));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![dispatcher])
        .default_handler(|update| async move {
            log::debug!("Telegram: Ignoring update {:?}", update.id);
        })
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("Telegram: Polling stopped");
    Ok(())
}

async fn handle_message(bot: Bot, msg: Message, dispatcher: Arc<MessageDispatcher>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    if user.is_bot {
        return Ok(());
    }
    let sender = user.username.as_deref().unwrap_or(&user.first_name);

    let input = if let Some(text) = msg.text() {
        log::info!(
            "Telegram: Message from {} ({}): {}",
            sender,
            user.id.0,
            text.chars().take(50).collect::<String>()
        );
        Inbound::Text(text.to_string())
    } else if let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) {
        // Sizes come smallest first; keep the full-resolution one
        log::info!("Telegram: Photo from {} ({})", sender, user.id.0);
        Inbound::Photo {
            file_id: photo.file.id.clone(),
            caption: msg.caption().map(str::to_string),
        }
    } else {
        log::debug!("Telegram: Ignoring unsupported message from {}", user.id.0);
        return Ok(());
    };

    let normalized = normalize(user, input);
    let result = dispatcher.dispatch(normalized).await;
    log::debug!("Telegram: Dispatch complete, error={:?}", result.error);

    send_reply(&bot, msg.chat.id, &result.reply).await
}

async fn handle_callback(bot: Bot, q: CallbackQuery, dispatcher: Arc<MessageDispatcher>) -> ResponseResult<()> {
    // Always answer so the client stops showing the loading state
    bot.answer_callback_query(q.id.clone()).await?;

    let Some(token) = q.data.clone() else {
        return Ok(());
    };
    log::info!("Telegram: Callback '{}' from {}", token, q.from.id.0);

    let normalized = normalize(&q.from, Inbound::Action(token));
    let result = dispatcher.dispatch(normalized).await;
    log::debug!("Telegram: Dispatch complete, error={:?}", result.error);

    match &q.message {
        Some(message) => {
            let fits = result.reply.text.chars().count() <= TELEGRAM_MAX_MESSAGE_CHARS;
            if fits && edit_reply(&bot, message, &result.reply).await {
                return Ok(());
            }
            send_reply(&bot, message.chat.id, &result.reply).await
        }
        // Inline-mode message: answer in the private chat
        None => send_reply(&bot, ChatId(q.from.id.0 as i64), &result.reply).await,
    }
}

fn normalize(user: &User, input: Inbound) -> NormalizedMessage {
    NormalizedMessage {
        user_id: user.id.0,
        username: user.username.clone(),
        first_name: Some(user.first_name.clone()),
        language_code: user.language_code.clone(),
        input,
    }
}

/// Replace the pressed message in place; false when Telegram refused
async fn edit_reply(bot: &Bot, message: &Message, reply: &Reply) -> bool {
    let request = bot.edit_message_text(message.chat.id, message.id, reply.text.clone());
    let result = match &reply.menu {
        Some(menu) => request.reply_markup(keyboard(menu)).await,
        None => request.await,
    };
    match result {
        Ok(_) => true,
        Err(e) if is_unchanged(&e) => {
            log::debug!("Telegram: Message already shows this reply");
            true
        }
        Err(e) => {
            log::warn!("Telegram: Failed to edit message, sending a new one: {}", e);
            false
        }
    }
}

/// Telegram refuses edits that would leave the message as it is, e.g. the
/// same page button pressed twice
fn is_unchanged(error: &RequestError) -> bool {
    matches!(error, RequestError::Api(ApiError::MessageNotModified))
}

/// Send as new message(s); the keyboard goes on the last chunk
async fn send_reply(bot: &Bot, chat_id: ChatId, reply: &Reply) -> ResponseResult<()> {
    let chunks = split_message(&reply.text, TELEGRAM_MAX_MESSAGE_CHARS);
    let last = chunks.len().saturating_sub(1);

    for (idx, chunk) in chunks.into_iter().enumerate() {
        let request = bot.send_message(chat_id, chunk);
        let sent = match (&reply.menu, idx == last) {
            (Some(menu), true) => request.reply_markup(keyboard(menu)).await,
            _ => request.await,
        };
        if let Err(e) = sent {
            log::error!("Telegram: Failed to send message to chat {}: {}", chat_id.0, e);
            return Err(e);
        }
    }
    Ok(())
}

fn keyboard(menu: &ActionMenu) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(menu.rows.iter().map(|row| {
        row.iter()
            .map(|entry| InlineKeyboardButton::callback(entry.label.clone(), entry.token.clone()))
            .collect::<Vec<_>>()
    }))
}
