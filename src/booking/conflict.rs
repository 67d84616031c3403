use std::sync::Arc;

use crate::models::TimeSlot;
use crate::storage::{Storage, StorageError};

/// Проверка пересечений с существующими бронированиями. Мастерская сдаётся
/// целиком, поэтому сверка идёт по всему набору, без деления по
/// пользователям.
pub struct ConflictDetector<S> {
    storage: Arc<S>,
}

impl<S> Clone for ConflictDetector<S> {
    fn clone(&self) -> Self {
        ConflictDetector {
            storage: Arc::clone(&self.storage),
        }
    }
}

impl<S: Storage> ConflictDetector<S> {
    pub fn new(storage: Arc<S>) -> Self {
        ConflictDetector { storage }
    }

    /// Пустые и перевёрнутые интервалы сюда не доходят: их отсекает
    /// TimeSlot::new на входном слое. Ошибка чтения отдаётся наверх,
    /// где трактуется как отказ (fail-closed).
    pub async fn has_conflict(&self, slot: &TimeSlot) -> Result<bool, StorageError> {
        let bookings = self.storage.read_bookings().await?;
        Ok(bookings.iter().any(|b| b.slot().overlaps(slot)))
    }
}
