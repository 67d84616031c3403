use teloxide::{prelude::*, utils::command::BotCommands};
use std::error::Error;

mod booking;
mod bot_state;
mod config;
mod database;
mod handlers;
mod models;
mod scheduler;
mod storage;

use crate::bot_state::BotState;
use crate::config::Config;
use crate::database::Database;
use crate::handlers::{callback_handler, command_handler, message_handler};
use crate::scheduler::telegram::TelegramReminder;
use crate::scheduler::Reminders;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Доступные команды:")]
enum Command {
    #[command(description = "начать работу с ботом")]
    Start,
    #[command(description = "показать справку")]
    Help,
    #[command(description = "забронировать время")]
    Book,
    #[command(description = "мои бронирования")]
    MyBookings,
    #[command(description = "остаток посещений")]
    Balance,
    #[command(description = "пополнить абонемент (администратор)")]
    AddVisits(String),
    #[command(description = "прервать бронирование")]
    Cancel,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    // Загружаем .env и инициализируем логирование
    dotenvy::dotenv().ok();
    env_logger::init();
    log::info!("Starting ArtChaos booking bot...");

    let config = Config::from_env()?;

    // Инициализация базы данных
    let db = Database::new(&config.database_url).await?;
    db.init().await?;
    log::info!("✅ Database initialized");

    let bot = Bot::from_env();

    // Таймеры напоминаний живут в памяти, после перезапуска
    // пересобираем их по будущим бронированиям
    let reminders = Reminders::new(TelegramReminder::new(bot.clone()));
    match reminders.restore(&db).await {
        Ok(count) => log::info!("⏰ Restored {} pending reminders", count),
        Err(e) => log::error!("Failed to restore reminders: {}", e),
    }

    let state = BotState::new(db, reminders);

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(command_handler),
        )
        .branch(Update::filter_callback_query().endpoint(callback_handler))
        .branch(Update::filter_message().endpoint(message_handler));

    log::info!("🚀 Starting dispatcher...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state, config])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
