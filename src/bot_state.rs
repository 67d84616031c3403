use std::collections::HashMap;
use std::sync::Arc;

use teloxide::types::ChatId;
use tokio::sync::RwLock;

use crate::booking::BookingService;
use crate::database::Database;
use crate::models::BookingDialog;
use crate::scheduler::telegram::TelegramReminder;
use crate::scheduler::Reminders;

type DialogMap = Arc<RwLock<HashMap<ChatId, BookingDialog>>>;

/// Общее состояние бота: ручка базы, движок бронирования, напоминания
/// и текущие шаги диалогов. Всё собирается один раз в main и передаётся
/// обработчикам, глобальных подключений нет.
#[derive(Clone)]
pub struct BotState {
    pub db: Arc<Database>,
    pub bookings: BookingService<Database>,
    pub reminders: Reminders<TelegramReminder>,
    dialogs: DialogMap,
}

impl BotState {
    pub fn new(db: Database, reminders: Reminders<TelegramReminder>) -> Self {
        let db = Arc::new(db);
        Self {
            bookings: BookingService::new(Arc::clone(&db)),
            db,
            reminders,
            dialogs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn dialog(&self, chat_id: ChatId) -> Option<BookingDialog> {
        self.dialogs.read().await.get(&chat_id).copied()
    }

    pub async fn set_dialog(&self, chat_id: ChatId, dialog: BookingDialog) {
        self.dialogs.write().await.insert(chat_id, dialog);
    }

    pub async fn clear_dialog(&self, chat_id: ChatId) {
        self.dialogs.write().await.remove(&chat_id);
    }
}
