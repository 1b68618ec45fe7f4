//! Implements InputPort using the Telegram Bot API (teloxide long polling).
//!
//! Text messages become (user id, first name, text) for the command router;
//! inline button presses go to its callback handler. Whatever replies come
//! back are sent to the originating chat.

use crate::domain::{DomainError, UserId};
use crate::ports::InputPort;
use crate::usecases::{Button, CommandRouter, Reply};
use async_trait::async_trait;
use std::sync::Arc;
use teloxide::Bot;
use teloxide::dispatching::{Dispatcher, UpdateFilterExt};
use teloxide::dptree;
use teloxide::payloads::setters::*;
use teloxide::requests::{Requester, ResponseResult};
use teloxide::types::{
    CallbackQuery, ChatId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, Message, Update,
};
use tracing::{debug, info, warn};

/// Telegram bot adapter.
pub struct TelegramBot {
    bot: Bot,
    router: Arc<CommandRouter>,
}

impl TelegramBot {
    pub fn new(token: String, router: Arc<CommandRouter>) -> Self {
        Self {
            bot: Bot::new(token),
            router,
        }
    }
}

#[async_trait]
impl InputPort for TelegramBot {
    async fn run(&self) -> Result<(), DomainError> {
        let me = self
            .bot
            .get_me()
            .await
            .map_err(|e| DomainError::Telegram(format!("get_me: {}", e)))?;
        info!(
            username = me.user.username.as_deref().unwrap_or("?"),
            "bot connected; long polling (Ctrl+C to stop)"
        );

        let handler = dptree::entry()
            .branch(Update::filter_message().endpoint(on_message))
            .branch(Update::filter_callback_query().endpoint(on_callback));

        Dispatcher::builder(self.bot.clone(), handler)
            .dependencies(dptree::deps![Arc::clone(&self.router)])
            .default_handler(|upd| async move {
                debug!(?upd, "unhandled update");
            })
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        info!("polling stopped");
        Ok(())
    }
}

/// Route one message. Send failures are logged, never propagated.
async fn on_message(bot: Bot, msg: Message, router: Arc<CommandRouter>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        debug!(chat_id = msg.chat.id.0, "ignoring non-text message");
        return Ok(());
    };
    let Some(user) = msg.from.as_ref() else {
        debug!(chat_id = msg.chat.id.0, "ignoring message without sender");
        return Ok(());
    };

    let user_id = UserId(user.id.0 as i64);
    let replies = router.handle(user_id, &user.first_name, text).await;
    send_all(&bot, msg.chat.id, user_id, replies).await;
    Ok(())
}

/// Inline button press. Always answered so the client stops its spinner.
async fn on_callback(
    bot: Bot,
    query: CallbackQuery,
    router: Arc<CommandRouter>,
) -> ResponseResult<()> {
    if let Err(e) = bot.answer_callback_query(query.id.clone()).await {
        warn!(error = %e, "failed to answer callback query");
    }
    let user_id = UserId(query.from.id.0 as i64);
    let (Some(data), Some(chat_id)) = (
        query.data.as_deref(),
        query.message.as_ref().map(|m| m.chat().id),
    ) else {
        debug!(%user_id, "callback without data or message");
        return Ok(());
    };

    info!(%user_id, data, "button pressed");
    let replies = router.handle_callback(user_id, data).await;
    send_all(&bot, chat_id, user_id, replies).await;
    Ok(())
}

async fn send_all(bot: &Bot, chat_id: ChatId, user_id: UserId, replies: Vec<Reply>) {
    for reply in replies {
        if let Err(e) = send_reply(bot, chat_id, reply).await {
            warn!(chat_id = chat_id.0, %user_id, error = %e, "failed to send reply");
        }
    }
}

async fn send_reply(bot: &Bot, chat_id: ChatId, reply: Reply) -> Result<(), DomainError> {
    match reply {
        Reply::Text(body) => {
            bot.send_message(chat_id, body)
                .await
                .map_err(|e| DomainError::Telegram(e.to_string()))?;
        }
        Reply::Keyboard { text, buttons } => {
            let sent = bot
                .send_message(chat_id, text.clone())
                .reply_markup(keyboard(&buttons))
                .await;
            // Telegram refuses some button URLs; the text alone still carries the link.
            if let Err(e) = sent {
                warn!(chat_id = chat_id.0, error = %e, "keyboard rejected, resending as plain text");
                bot.send_message(chat_id, text)
                    .await
                    .map_err(|e| DomainError::Telegram(e.to_string()))?;
            }
        }
        Reply::Photo { url, caption } => {
            let photo_url =
                url::Url::parse(&url).map_err(|e| DomainError::Telegram(format!("photo url: {}", e)))?;
            bot.send_photo(chat_id, InputFile::url(photo_url))
                .caption(caption)
                .await
                .map_err(|e| DomainError::Telegram(e.to_string()))?;
        }
    }
    Ok(())
}

/// One button per row. Link buttons with an unparsable URL are dropped.
fn keyboard(buttons: &[Button]) -> InlineKeyboardMarkup {
    let rows = buttons
        .iter()
        .filter_map(|button| match button {
            Button::Link { label, url } => match url::Url::parse(url) {
                Ok(url) => Some(InlineKeyboardButton::url(label.clone(), url)),
                Err(e) => {
                    warn!(url = %url, error = %e, "dropping link button");
                    None
                }
            },
            Button::Action { label, action } => {
                Some(InlineKeyboardButton::callback(label.clone(), action.encode()))
            }
        })
        .map(|button| vec![button])
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}
