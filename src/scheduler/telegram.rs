use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::ChatId;

use super::Notify;

/// Доставка напоминаний в личный чат Telegram.
#[derive(Clone)]
pub struct TelegramReminder {
    bot: Bot,
}

impl TelegramReminder {
    pub fn new(bot: Bot) -> Self {
        TelegramReminder { bot }
    }
}

#[async_trait]
impl Notify for TelegramReminder {
    async fn notify(
        &self,
        chat_id: i64,
        text: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.bot.send_message(ChatId(chat_id), text).await?;
        Ok(())
    }
}
