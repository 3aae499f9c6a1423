use async_trait::async_trait;
use teloxide::{
    prelude::*,
    types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, MessageId},
    ApiError, RequestError,
};

use crate::{
    error::GameResult,
    surface::{Prompt, Surface},
};

pub struct TelegramSurface {
    bot: Bot,
}

impl TelegramSurface {
    pub fn new(bot: Bot) -> TelegramSurface {
        TelegramSurface { bot }
    }
}

fn make_keyboard(prompt: &Prompt) -> Option<InlineKeyboardMarkup> {
    if prompt.controls.is_empty() {
        return None;
    }

    let keyboard = prompt.controls.iter().map(|row| {
        row.iter()
            .map(|control| InlineKeyboardButton::callback(control.label.clone(), control.data.clone()))
            .collect::<Vec<_>>()
    });

    Some(InlineKeyboardMarkup::new(keyboard))
}

#[async_trait]
impl Surface for TelegramSurface {
    async fn render(&self, chat_id: ChatId, message: Option<MessageId>, prompt: &Prompt) -> GameResult<MessageId> {
        let keyboard = make_keyboard(prompt);

        match message {
            Some(message_id) => {
                // Leaving out the markup on edit also strips the old buttons.
                let request = self.bot.edit_message_text(chat_id, message_id, prompt.text.clone());
                let result = match keyboard {
                    Some(keyboard) => request.reply_markup(keyboard).await,
                    None => request.await,
                };
                match result {
                    Ok(_) | Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(message_id),
                    Err(err) => {
                        log::warn!("Failed to edit message {} in chat {}: {}", message_id, chat_id, err);
                        Err(err.into())
                    }
                }
            }
            None => {
                let request = self.bot.send_message(chat_id, prompt.text.clone());
                let sent = match keyboard {
                    Some(keyboard) => request.reply_markup(keyboard).await?,
                    None => request.await?,
                };
                Ok(sent.id)
            }
        }
    }

    async fn notify(&self, chat_id: ChatId, text: &str) -> GameResult<()> {
        self.bot.send_message(chat_id, text).await?;
        Ok(())
    }

    async fn dismiss(&self, chat_id: ChatId, message: MessageId) -> GameResult<()> {
        match self.bot.delete_message(chat_id, message).await {
            Ok(_) => Ok(()),
            // Already gone.
            Err(RequestError::Api(ApiError::MessageToDeleteNotFound)) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
