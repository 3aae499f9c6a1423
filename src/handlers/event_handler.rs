//! Feeds raw chat updates into the [`crate::events::EventHub`], where running
//! games pick them up.

use log::debug;
use teloxide::{prelude::*, types::MessageEntityKind};

use super::AsyncBotState;
use crate::{events::Event, participant::Identity};

pub fn get_button_handler() -> Handler<
    'static,
    DependencyMap,
    Result<(), teloxide::RequestError>,
    teloxide::dispatching::DpHandlerDescription,
> {
    Update::filter_callback_query().endpoint(button_handler)
}

/// Catch-all for messages no command handler took.
pub fn get_text_handler() -> Handler<
    'static,
    DependencyMap,
    Result<(), teloxide::RequestError>,
    teloxide::dispatching::DpHandlerDescription,
> {
    dptree::filter(|msg: Message| msg.text().is_some() && msg.from().is_some()).endpoint(text_handler)
}

/// Users named by text mentions, then the author of the replied-to message.
/// Plain `@username` mentions carry no user id and cannot be resolved.
pub fn mentioned_users(msg: &Message) -> Vec<Identity> {
    let mut users: Vec<Identity> = msg
        .entities()
        .unwrap_or_default()
        .iter()
        .filter_map(|entity| match &entity.kind {
            MessageEntityKind::TextMention { user } => Some(Identity::from(user)),
            _ => None,
        })
        .collect();

    if let Some(author) = msg.reply_to_message().and_then(|reply| reply.from()) {
        users.push(Identity::from(author));
    }
    users
}

async fn button_handler(bot_state: AsyncBotState, bot: Bot, q: CallbackQuery) -> Result<(), teloxide::RequestError> {
    bot.answer_callback_query(q.id.clone()).await?;

    let (Some(message), Some(data)) = (q.message.as_ref(), q.data.clone()) else {
        return Ok(());
    };
    let delivered = bot_state.hub.publish(
        message.chat.id,
        Event::Button {
            user: Identity::from(&q.from),
            message: message.id,
            data,
        },
    );
    debug!("Button press in chat {} went to {} collector(s)", message.chat.id, delivered);

    Ok(())
}

async fn text_handler(bot_state: AsyncBotState, msg: Message) -> Result<(), teloxide::RequestError> {
    let (Some(user), Some(text)) = (msg.from(), msg.text()) else {
        return Ok(());
    };
    bot_state.hub.publish(
        msg.chat.id,
        Event::Text {
            user: Identity::from(user),
            text: text.to_string(),
            mentioned: mentioned_users(&msg),
        },
    );

    Ok(())
}
