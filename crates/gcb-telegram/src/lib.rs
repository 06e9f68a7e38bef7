//! Telegram adapter (teloxide).
//!
//! Implements the `gcb-core` `ChannelGate` port over the Telegram Bot API
//! and hosts the dispatcher + handlers for the bot's menu and purchases.

use async_trait::async_trait;

use teloxide::prelude::*;

use tokio::time::sleep;

pub mod handlers;
pub mod router;

use gcb_core::{
    domain::{ChatId, UserId},
    errors::Error,
    ports::ChannelGate,
    Result,
};

#[derive(Clone)]
pub struct TelegramChannelGate {
    bot: Bot,
}

impl TelegramChannelGate {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_user(user: UserId) -> teloxide::types::UserId {
        teloxide::types::UserId(user.0 as u64)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }
}

#[async_trait]
impl ChannelGate for TelegramChannelGate {
    async fn remove_member(&self, channel: ChatId, user: UserId) -> Result<()> {
        self.with_retry(|| {
            self.bot
                .ban_chat_member(Self::tg_chat(channel), Self::tg_user(user))
        })
        .await?;
        Ok(())
    }

    async fn clear_removal(&self, channel: ChatId, user: UserId) -> Result<()> {
        self.with_retry(|| {
            self.bot
                .unban_chat_member(Self::tg_chat(channel), Self::tg_user(user))
        })
        .await?;
        Ok(())
    }
}
