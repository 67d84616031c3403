use std::error::Error;

use teloxide::prelude::*;

use crate::bot_state::BotState;

/// Обычный текст вне команд: подсказываем дорогу обратно к кнопкам.
pub async fn message_handler(
    bot: Bot,
    msg: Message,
    state: BotState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    if let Some(text) = msg.text() {
        // Пропускаем команды - они уже обработаны в command_handler
        if text.starts_with('/') {
            return Ok(());
        }

        let reply = if state.dialog(msg.chat.id).await.is_some() {
            "Пожалуйста, продолжайте с помощью кнопок выше\n\
            или отмените бронирование командой /cancel"
        } else {
            "🎨 Это бот бронирования мастерской ArtChaos.\n\n\
            Чтобы записаться, используйте команду /book"
        };

        bot.send_message(msg.chat.id, reply).await?;
    }

    Ok(())
}
