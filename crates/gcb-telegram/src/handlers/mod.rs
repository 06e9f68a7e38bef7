//! Telegram update handlers.
//!
//! Messages carry either a slash command or one of the reply-keyboard menu
//! buttons; callbacks carry tier selections and payment checks.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message},
};

use crate::router::AppState;

mod callback;
mod commands;
mod menus;

pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    callback::handle_callback(bot, q, state).await
}

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if msg.from().is_none() {
        return Ok(());
    }

    let Some(text) = msg.text() else {
        // Media and other message types have no meaning for this bot.
        return Ok(());
    };

    commands::handle_text(bot, msg.clone(), text, state).await
}
