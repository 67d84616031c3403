use std::error::Error;

use chrono::{Local, NaiveDate, NaiveTime};
use teloxide::prelude::*;
use teloxide::types::{ChatId, MessageId};

use crate::bot_state::BotState;
use crate::models::{BookingDialog, TimeSlot};
use crate::storage::Storage;

use crate::handlers::utils::{
    confirmation_text, make_duration_keyboard, make_time_keyboard, rejection_text, DURATIONS,
};

pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    state: BotState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    if let Some(data) = q.data.as_deref() {
        if let Some(ref message) = q.message {
            let chat_id = message.chat().id;
            let message_id = message.id();

            match data {
                "book_cancel" => {
                    state.clear_dialog(chat_id).await;
                    bot.edit_message_text(
                        chat_id,
                        message_id,
                        "❌ Бронирование отменено.\n\n\
                        Если захотите забронировать время, используйте команду /book",
                    )
                    .await?;
                }

                data if data.starts_with("date_") => {
                    handle_date_selected(&bot, chat_id, message_id, &state, data).await?;
                }

                data if data.starts_with("time_") => {
                    handle_time_selected(&bot, chat_id, message_id, &state, data).await?;
                }

                data if data.starts_with("dur_") => {
                    handle_duration_selected(&bot, &q, chat_id, message_id, &state, data).await?;
                }

                _ => {
                    log::warn!("Unknown callback data: {}", data);
                }
            }
        }
    }

    Ok(())
}

/// Ответ на кнопку из устаревшей клавиатуры: диалог уже не на этом шаге.
async fn stale_dialog_reply(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    bot.edit_message_text(
        chat_id,
        message_id,
        "⏳ Эта клавиатура устарела.\n\nНачните бронирование заново: /book",
    )
    .await?;
    Ok(())
}

async fn handle_date_selected(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    state: &BotState,
    data: &str,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    if state.dialog(chat_id).await != Some(BookingDialog::CollectingDate) {
        return stale_dialog_reply(bot, chat_id, message_id).await;
    }

    let date_str = data.strip_prefix("date_").unwrap_or_default();
    let Ok(date) = NaiveDate::parse_from_str(date_str, "%Y-%m-%d") else {
        log::warn!("Malformed date callback: {}", data);
        return Ok(());
    };

    state
        .set_dialog(chat_id, BookingDialog::CollectingTime { date })
        .await;

    bot.edit_message_text(
        chat_id,
        message_id,
        format!(
            "✅ Отлично! Вы выбрали {}\n\n🕐 Теперь выберите время начала:",
            date.format("%d.%m.%Y")
        ),
    )
    .reply_markup(make_time_keyboard())
    .await?;

    Ok(())
}

async fn handle_time_selected(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    state: &BotState,
    data: &str,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let Some(BookingDialog::CollectingTime { date }) = state.dialog(chat_id).await else {
        return stale_dialog_reply(bot, chat_id, message_id).await;
    };

    let time_str = data.strip_prefix("time_").unwrap_or_default();
    let Ok(time) = NaiveTime::parse_from_str(time_str, "%H:%M") else {
        log::warn!("Malformed time callback: {}", data);
        return Ok(());
    };

    state
        .set_dialog(chat_id, BookingDialog::CollectingDuration { date, time })
        .await;

    bot.edit_message_text(
        chat_id,
        message_id,
        format!(
            "✅ Начало {} в {}\n\n⏱️ Выберите длительность:",
            date.format("%d.%m.%Y"),
            time.format("%H:%M")
        ),
    )
    .reply_markup(make_duration_keyboard())
    .await?;

    Ok(())
}

async fn handle_duration_selected(
    bot: &Bot,
    q: &CallbackQuery,
    chat_id: ChatId,
    message_id: MessageId,
    state: &BotState,
    data: &str,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let Some(BookingDialog::CollectingDuration { date, time }) = state.dialog(chat_id).await else {
        return stale_dialog_reply(bot, chat_id, message_id).await;
    };

    let minutes_str = data.strip_prefix("dur_").unwrap_or_default();
    let minutes = match minutes_str.parse::<i64>() {
        // Принимаем только длительности из клавиатуры, 30 минут - 8 часов
        Ok(m) if DURATIONS.iter().any(|(known, _)| *known == m) => m,
        _ => {
            log::warn!("Malformed duration callback: {}", data);
            return Ok(());
        }
    };

    let start = date.and_time(time);
    if start <= Local::now().naive_local() {
        state.clear_dialog(chat_id).await;
        bot.edit_message_text(
            chat_id,
            message_id,
            "❌ Это время уже прошло.\n\nНачните бронирование заново: /book",
        )
        .await?;
        return Ok(());
    }

    // Длительности с клавиатуры положительные, слот здесь есть всегда
    let Some(slot) = TimeSlot::with_duration(start, minutes) else {
        log::error!("Duration {} produced an invalid slot", minutes);
        return Ok(());
    };

    state.clear_dialog(chat_id).await;

    let user = state
        .db
        .get_or_create_user(
            q.from.id.0 as i64,
            q.from.username.as_deref(),
            Some(q.from.first_name.as_str()),
        )
        .await?;

    match state.bookings.book(user.id, slot).await {
        Ok(confirmation) => {
            let planned = state.reminders.schedule(chat_id.0, slot.start);
            log::info!(
                "⏰ Scheduled {} reminders for booking {}",
                planned,
                confirmation.booking.id
            );

            bot.edit_message_text(chat_id, message_id, confirmation_text(&confirmation))
                .await?;
        }
        Err(reason) => {
            bot.edit_message_text(chat_id, message_id, rejection_text(&reason))
                .await?;
        }
    }

    Ok(())
}
