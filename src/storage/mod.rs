use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::models::{Booking, TimeSlot, User};

#[cfg(test)]
pub mod memory;

#[derive(Debug)]
pub enum StorageError {
    Database(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::Database(err.to_string())
    }
}

/// Ручка хранилища. Движок бронирования строится поверх этого трейта,
/// а не поверх конкретной базы: в проде за ним стоит Postgres, в тестах
/// хранилище в памяти.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Находит пользователя по telegram_id или заводит нового вместе
    /// с пустым абонементом.
    async fn get_or_create_user(
        &self,
        telegram_id: i64,
        username: Option<&str>,
        first_name: Option<&str>,
    ) -> Result<User, StorageError>;

    /// Все бронирования мастерской. Помещение сдаётся целиком,
    /// поэтому проверка конфликтов смотрит на весь набор.
    async fn read_bookings(&self) -> Result<Vec<Booking>, StorageError>;

    async fn user_bookings(&self, user_id: i64) -> Result<Vec<Booking>, StorageError>;

    /// Сколько бронирований пользователя начинается в указанный
    /// календарный день.
    async fn count_user_bookings_on(
        &self,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<i64, StorageError>;

    async fn write_booking(&self, user_id: i64, slot: &TimeSlot) -> Result<Booking, StorageError>;

    /// Бронирования, начинающиеся после `after`, вместе с telegram_id
    /// владельца. Нужно для восстановления напоминаний после перезапуска.
    async fn upcoming_bookings(
        &self,
        after: NaiveDateTime,
    ) -> Result<Vec<(Booking, i64)>, StorageError>;

    /// Остаток посещений; None, если абонемент никогда не заводился.
    async fn visits_left(&self, user_id: i64) -> Result<Option<i32>, StorageError>;

    /// Атомарное списание одного посещения: проверка остатка и декремент
    /// выполняются одним действием, баланс не уходит ниже нуля даже при
    /// конкурентных вызовах. Some(новый остаток) при успехе, None, если
    /// посещений не осталось или абонемента нет.
    async fn spend_visit(&self, user_id: i64) -> Result<Option<i32>, StorageError>;

    /// Пополнение абонемента на count посещений (count > 0), с созданием
    /// записи при отсутствии. Возвращает новый остаток.
    async fn add_visits(&self, user_id: i64, count: i32) -> Result<i32, StorageError>;
}
