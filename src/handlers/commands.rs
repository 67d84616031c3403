use std::error::Error;

use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::bot_state::BotState;
use crate::config::Config;
use crate::models::BookingDialog;
use crate::storage::Storage;
use crate::Command;

use crate::handlers::utils::{format_booking, make_date_keyboard};

pub async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: BotState,
    config: Config,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    match cmd {
        Command::Start => handle_start(bot, msg).await?,
        Command::Help => handle_help(bot, msg).await?,
        Command::Book => handle_book(bot, msg, state).await?,
        Command::MyBookings => handle_my_bookings(bot, msg, state).await?,
        Command::Balance => handle_balance(bot, msg, state).await?,
        Command::AddVisits(args) => handle_add_visits(bot, msg, state, config, args).await?,
        Command::Cancel => handle_cancel(bot, msg, state).await?,
    }
    Ok(())
}

async fn handle_start(bot: Bot, msg: Message) -> Result<(), Box<dyn Error + Send + Sync>> {
    let start_text = "🎨 *Добро пожаловать в ArtChaos\\!*\n\n\
        Это бот бронирования времени в творческой мастерской\\.\n\n\
        📋 *Команды:*\n\
        /book – забронировать время\n\
        /mybookings – мои бронирования\n\
        /balance – остаток посещений на абонементе\n\
        /help – справка\n\n\
        💡 Первая запись дня списывает одно посещение с абонемента, \
        повторные записи в тот же день бесплатны\\.";

    bot.send_message(msg.chat.id, start_text)
        .parse_mode(ParseMode::MarkdownV2)
        .await?;

    Ok(())
}

async fn handle_help(bot: Bot, msg: Message) -> Result<(), Box<dyn Error + Send + Sync>> {
    bot.send_message(
        msg.chat.id,
        "📋 *Справка по использованию бота:*\n\n\
        /start – начать работу с ботом\n\
        /book – забронировать время в мастерской\n\
        /mybookings – список ваших бронирований\n\
        /balance – остаток посещений\n\
        /cancel – прервать начатое бронирование\n\n\
        *Как это работает:*\n\
        1\\. Выберите дату из предложенных\n\
        2\\. Выберите время начала\n\
        3\\. Выберите длительность\n\n\
        🔔 Перед визитом бот напомнит о записи за сутки и за час\\.",
    )
    .parse_mode(ParseMode::MarkdownV2)
    .await?;

    Ok(())
}

async fn handle_book(
    bot: Bot,
    msg: Message,
    state: BotState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    state
        .set_dialog(msg.chat.id, BookingDialog::CollectingDate)
        .await;

    bot.send_message(
        msg.chat.id,
        "📅 На какой день вы хотите записаться?\n\nВыберите дату из списка ниже:",
    )
    .reply_markup(make_date_keyboard())
    .await?;

    Ok(())
}

async fn handle_my_bookings(
    bot: Bot,
    msg: Message,
    state: BotState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let user = state
        .db
        .get_or_create_user(msg.chat.id.0, msg.chat.username(), msg.chat.first_name())
        .await?;

    let bookings = state.db.user_bookings(user.id).await?;

    if bookings.is_empty() {
        bot.send_message(
            msg.chat.id,
            "У вас пока нет бронирований.\n\nЧтобы записаться, используйте /book",
        )
        .await?;
        return Ok(());
    }

    let mut text = String::from("📋 Ваши бронирования:\n\n");
    for booking in &bookings {
        text.push_str(&format_booking(booking));
        text.push('\n');
    }

    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

async fn handle_balance(
    bot: Bot,
    msg: Message,
    state: BotState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let user = state
        .db
        .get_or_create_user(msg.chat.id.0, msg.chat.username(), msg.chat.first_name())
        .await?;

    let text = match state.bookings.balance(user.id).await {
        Ok(Some(left)) => format!("🎟️ Посещений на абонементе: {}", left),
        Ok(None) => "Абонемент ещё не оформлен.\n\n\
            Обратитесь к администратору мастерской."
            .to_string(),
        Err(e) => {
            log::error!("Balance lookup failed for user {}: {}", user.id, e);
            "❌ Не получилось узнать остаток. Попробуйте позже.".to_string()
        }
    };

    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

/// Пополнение абонемента: /addvisits <telegram_id> <количество>.
/// Доступно только из чата администратора.
async fn handle_add_visits(
    bot: Bot,
    msg: Message,
    state: BotState,
    config: Config,
    args: String,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    if config.admin_chat_id != Some(msg.chat.id.0) {
        bot.send_message(msg.chat.id, "⛔ Команда доступна только администратору.")
            .await?;
        return Ok(());
    }

    let mut parts = args.split_whitespace();
    let parsed = match (
        parts.next().and_then(|v| v.parse::<i64>().ok()),
        parts.next().and_then(|v| v.parse::<i32>().ok()),
    ) {
        (Some(telegram_id), Some(count)) if count > 0 => Some((telegram_id, count)),
        _ => None,
    };

    let Some((telegram_id, count)) = parsed else {
        bot.send_message(
            msg.chat.id,
            "Использование: /addvisits <telegram_id> <количество>",
        )
        .await?;
        return Ok(());
    };

    let user = state.db.get_or_create_user(telegram_id, None, None).await?;

    match state.bookings.add_visits(user.id, count).await {
        Ok(left) => {
            log::info!(
                "💳 Admin topped up abonement of user {} by {}, balance {}",
                telegram_id,
                count,
                left
            );
            bot.send_message(
                msg.chat.id,
                format!(
                    "✅ Абонемент пользователя {} пополнен на {}.\nОстаток: {}",
                    telegram_id, count, left
                ),
            )
            .await?;
        }
        Err(e) => {
            log::error!("Top-up failed for user {}: {}", telegram_id, e);
            bot.send_message(msg.chat.id, "❌ Не получилось пополнить абонемент.")
                .await?;
        }
    }

    Ok(())
}

async fn handle_cancel(
    bot: Bot,
    msg: Message,
    state: BotState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    state.clear_dialog(msg.chat.id).await;

    bot.send_message(
        msg.chat.id,
        "❌ Бронирование отменено.\n\n\
        Если захотите забронировать время, используйте команду /book",
    )
    .await?;

    Ok(())
}
