use std::sync::Arc;

use chrono::NaiveDate;

use crate::storage::{Storage, StorageError};

/// Учёт посещений по абонементу. Первое бронирование дня списывает одно
/// посещение, дальнейшие записи в тот же день бесплатны.
pub struct VisitCredits<S> {
    storage: Arc<S>,
}

impl<S> Clone for VisitCredits<S> {
    fn clone(&self) -> Self {
        VisitCredits {
            storage: Arc::clone(&self.storage),
        }
    }
}

impl<S: Storage> VisitCredits<S> {
    pub fn new(storage: Arc<S>) -> Self {
        VisitCredits { storage }
    }

    /// None, если абонемент никогда не заводился.
    pub async fn balance(&self, user_id: i64) -> Result<Option<i32>, StorageError> {
        self.storage.visits_left(user_id).await
    }

    /// Списывает одно посещение, если остаток положительный.
    /// Some(новый остаток) при успехе, None при пустом или отсутствующем
    /// абонементе. Атомарность обеспечивает хранилище.
    pub async fn spend(&self, user_id: i64) -> Result<Option<i32>, StorageError> {
        self.storage.spend_visit(user_id).await
    }

    /// Пополнение: и административное, и компенсация несостоявшейся записи.
    pub async fn add(&self, user_id: i64, count: i32) -> Result<i32, StorageError> {
        self.storage.add_visits(user_id, count).await
    }

    /// Считается строго до записи нового бронирования, иначе само
    /// бронирование сделает ответ ложным.
    pub async fn is_first_booking_of_day(
        &self,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<bool, StorageError> {
        let count = self.storage.count_user_bookings_on(user_id, date).await?;
        Ok(count == 0)
    }
}
