pub mod conflict;
pub mod credits;

pub use conflict::ConflictDetector;
pub use credits::VisitCredits;

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::models::{Booking, TimeSlot};
use crate::storage::{Storage, StorageError};

/// Причина отказа в бронировании. Каждая из них возвращается пользователю
/// текстом, наружу как необработанная ошибка не уходит ни одна.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingError {
    /// Интервал пересекается с существующим бронированием.
    SlotTaken,
    /// Абонемент пуст или не заводился.
    NoCreditsLeft,
    /// Бронирование не удалось сохранить.
    PersistFailed,
    /// Хранилище недоступно во время проверок. Отказываем, а не пропускаем:
    /// ложный отказ безопаснее двойной записи.
    StorageUnavailable,
}

impl fmt::Display for BookingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingError::SlotTaken => write!(f, "slot is already taken"),
            BookingError::NoCreditsLeft => write!(f, "no visits left on abonement"),
            BookingError::PersistFailed => write!(f, "failed to persist booking"),
            BookingError::StorageUnavailable => write!(f, "storage unavailable"),
        }
    }
}

impl Error for BookingError {}

/// Подтверждённое бронирование вместе с данными для ответа пользователю.
#[derive(Debug, Clone)]
pub struct Confirmation {
    pub booking: Booking,
    /// Списано ли посещение (первая запись этого дня).
    pub credit_spent: bool,
    /// Остаток после списания; None, если посещение не списывалось.
    pub visits_left: Option<i32>,
}

/// Оркестратор бронирования: конфликт, списание, запись, компенсация.
pub struct BookingService<S> {
    storage: Arc<S>,
    conflicts: ConflictDetector<S>,
    credits: VisitCredits<S>,
}

impl<S> Clone for BookingService<S> {
    fn clone(&self) -> Self {
        BookingService {
            storage: Arc::clone(&self.storage),
            conflicts: self.conflicts.clone(),
            credits: self.credits.clone(),
        }
    }
}

impl<S: Storage> BookingService<S> {
    pub fn new(storage: Arc<S>) -> Self {
        BookingService {
            conflicts: ConflictDetector::new(Arc::clone(&storage)),
            credits: VisitCredits::new(Arc::clone(&storage)),
            storage,
        }
    }

    /// Решение по заявке. Порядок шагов фиксированный: конфликт проверяется
    /// до списания, чтобы занятый слот не стоил посещения; списание идёт
    /// до записи, чтобы сбой записи было чем компенсировать.
    pub async fn book(&self, user_id: i64, slot: TimeSlot) -> Result<Confirmation, BookingError> {
        match self.conflicts.has_conflict(&slot).await {
            Ok(true) => return Err(BookingError::SlotTaken),
            Ok(false) => {}
            Err(e) => {
                log::error!("Conflict check failed, rejecting booking: {}", e);
                return Err(BookingError::StorageUnavailable);
            }
        }

        let credit_required = match self
            .credits
            .is_first_booking_of_day(user_id, slot.date())
            .await
        {
            Ok(first) => first,
            Err(e) => {
                log::error!("First-of-day check failed, rejecting booking: {}", e);
                return Err(BookingError::StorageUnavailable);
            }
        };

        let mut visits_left = None;
        if credit_required {
            match self.credits.spend(user_id).await {
                Ok(Some(left)) => visits_left = Some(left),
                Ok(None) => return Err(BookingError::NoCreditsLeft),
                Err(e) => {
                    log::error!("Credit spend failed for user {}: {}", user_id, e);
                    return Err(BookingError::StorageUnavailable);
                }
            }
        }

        let booking = match self.storage.write_booking(user_id, &slot).await {
            Ok(booking) => booking,
            Err(e) => {
                log::error!("Failed to persist booking for user {}: {}", user_id, e);
                if credit_required {
                    // Возвращаем списанное посещение. Если не вышло и это,
                    // в учёте остаётся расхождение: фиксируем его в логе
                    if let Err(refund_err) = self.credits.add(user_id, 1).await {
                        log::error!(
                            "Credit refund failed for user {}, one visit lost: {}",
                            user_id,
                            refund_err
                        );
                    }
                }
                return Err(BookingError::PersistFailed);
            }
        };

        log::info!(
            "📌 Booking {} confirmed for user {} ({} - {})",
            booking.id,
            user_id,
            booking.start_time,
            booking.end_time
        );

        Ok(Confirmation {
            booking,
            credit_spent: credit_required,
            visits_left,
        })
    }

    pub async fn balance(&self, user_id: i64) -> Result<Option<i32>, StorageError> {
        self.credits.balance(user_id).await
    }

    pub async fn add_visits(&self, user_id: i64, count: i32) -> Result<i32, StorageError> {
        self.credits.add(user_id, count).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStorage;
    use chrono::{NaiveDate, NaiveDateTime};

    fn day_at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn slot(day: u32, hour: u32, hours: i64) -> TimeSlot {
        TimeSlot::with_duration(day_at(day, hour), hours * 60).unwrap()
    }

    async fn setup(visits: i32) -> (BookingService<MemoryStorage>, Arc<MemoryStorage>, i64) {
        let storage = Arc::new(MemoryStorage::new());
        let user = storage
            .get_or_create_user(1001, Some("masha"), Some("Мария"))
            .await
            .unwrap();
        if visits > 0 {
            storage.add_visits(user.id, visits).await.unwrap();
        }
        let service = BookingService::new(Arc::clone(&storage));
        (service, storage, user.id)
    }

    #[tokio::test]
    async fn first_booking_of_day_spends_one_visit() {
        let (service, storage, user_id) = setup(3).await;

        let confirmation = service.book(user_id, slot(2, 10, 2)).await.unwrap();

        assert!(confirmation.credit_spent);
        assert_eq!(confirmation.visits_left, Some(2));
        assert_eq!(storage.read_bookings().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn second_booking_same_day_is_free() {
        let (service, storage, user_id) = setup(3).await;

        service.book(user_id, slot(2, 10, 2)).await.unwrap();
        let second = service.book(user_id, slot(2, 14, 1)).await.unwrap();

        assert!(!second.credit_spent);
        assert_eq!(second.visits_left, None);
        assert_eq!(storage.visits_left(user_id).await.unwrap(), Some(2));
        assert_eq!(storage.read_bookings().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn next_day_booking_spends_again() {
        let (service, storage, user_id) = setup(3).await;

        service.book(user_id, slot(2, 10, 2)).await.unwrap();
        let next_day = service.book(user_id, slot(3, 10, 2)).await.unwrap();

        assert!(next_day.credit_spent);
        assert_eq!(storage.visits_left(user_id).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn taken_slot_rejected_without_charge() {
        let (service, storage, user_id) = setup(3).await;
        let other = storage
            .get_or_create_user(1002, Some("vanya"), None)
            .await
            .unwrap();
        storage.add_visits(other.id, 5).await.unwrap();

        service.book(user_id, slot(2, 10, 2)).await.unwrap();
        // Частичное пересечение 11:00-13:00 с занятым 10:00-12:00
        let result = service.book(other.id, slot(2, 11, 2)).await;

        assert_eq!(result.unwrap_err(), BookingError::SlotTaken);
        assert_eq!(storage.visits_left(other.id).await.unwrap(), Some(5));
        assert_eq!(storage.read_bookings().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn touching_slot_is_not_a_conflict() {
        let (service, storage, user_id) = setup(3).await;

        service.book(user_id, slot(2, 10, 2)).await.unwrap();
        let adjacent = service.book(user_id, slot(2, 12, 1)).await;

        assert!(adjacent.is_ok());
        assert_eq!(storage.read_bookings().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn empty_abonement_rejected_without_booking() {
        let (service, storage, user_id) = setup(0).await;

        let result = service.book(user_id, slot(2, 10, 2)).await;

        assert_eq!(result.unwrap_err(), BookingError::NoCreditsLeft);
        assert_eq!(storage.read_bookings().await.unwrap().len(), 0);
        assert_eq!(storage.visits_left(user_id).await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn missing_abonement_rejected_without_booking() {
        let storage = Arc::new(MemoryStorage::new());
        let service = BookingService::new(Arc::clone(&storage));

        // Пользователь, которого никто не заводил: абонемента нет вовсе
        let result = service.book(999, slot(2, 10, 2)).await;

        assert_eq!(result.unwrap_err(), BookingError::NoCreditsLeft);
        assert_eq!(storage.read_bookings().await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn persist_failure_refunds_the_spent_visit() {
        let (service, storage, user_id) = setup(1).await;
        storage.fail_booking_writes(true);

        let result = service.book(user_id, slot(2, 10, 2)).await;

        assert_eq!(result.unwrap_err(), BookingError::PersistFailed);
        assert_eq!(storage.visits_left(user_id).await.unwrap(), Some(1));

        storage.fail_booking_writes(false);
        assert_eq!(storage.read_bookings().await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn persist_failure_on_free_booking_changes_nothing() {
        let (service, storage, user_id) = setup(2).await;

        service.book(user_id, slot(2, 10, 1)).await.unwrap();
        storage.fail_booking_writes(true);
        let result = service.book(user_id, slot(2, 15, 1)).await;
        storage.fail_booking_writes(false);

        assert_eq!(result.unwrap_err(), BookingError::PersistFailed);
        // Повторная запись дня посещение не списывала, компенсировать нечего
        assert_eq!(storage.visits_left(user_id).await.unwrap(), Some(1));
        assert_eq!(storage.read_bookings().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn read_failure_rejects_fail_closed() {
        let (service, storage, user_id) = setup(3).await;
        storage.fail_reads(true);

        let result = service.book(user_id, slot(2, 10, 2)).await;

        assert_eq!(result.unwrap_err(), BookingError::StorageUnavailable);

        storage.fail_reads(false);
        assert_eq!(storage.read_bookings().await.unwrap().len(), 0);
        assert_eq!(storage.visits_left(user_id).await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn credit_floor_over_many_days() {
        let (service, storage, user_id) = setup(2).await;

        assert!(service.book(user_id, slot(2, 10, 1)).await.is_ok());
        assert!(service.book(user_id, slot(3, 10, 1)).await.is_ok());
        let third_day = service.book(user_id, slot(4, 10, 1)).await;

        assert_eq!(third_day.unwrap_err(), BookingError::NoCreditsLeft);
        assert_eq!(storage.visits_left(user_id).await.unwrap(), Some(0));
        assert_eq!(storage.read_bookings().await.unwrap().len(), 2);
    }
}
