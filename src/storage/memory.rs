use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::models::{Booking, TimeSlot, User};

use super::{Storage, StorageError};

/// Хранилище в памяти для тестов движка бронирования. Умеет имитировать
/// отказ чтения и отказ записи бронирования (учёт посещений при этом
/// продолжает работать, что нужно тестам компенсации).
#[derive(Default)]
pub struct MemoryStorage {
    inner: Mutex<Inner>,
    fail_reads: AtomicBool,
    fail_booking_writes: AtomicBool,
}

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    bookings: Vec<Booking>,
    credits: HashMap<i64, i32>,
    next_user_id: i64,
    next_booking_id: i64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_booking_writes(&self, fail: bool) {
        self.fail_booking_writes.store(fail, Ordering::SeqCst);
    }

    fn check_read(&self) -> Result<(), StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            Err(StorageError::Database("simulated read failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_or_create_user(
        &self,
        telegram_id: i64,
        username: Option<&str>,
        first_name: Option<&str>,
    ) -> Result<User, StorageError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(user) = inner.users.iter().find(|u| u.telegram_id == telegram_id) {
            return Ok(user.clone());
        }
        inner.next_user_id += 1;
        let user = User {
            id: inner.next_user_id,
            telegram_id,
            username: username.map(str::to_owned),
            first_name: first_name.map(str::to_owned),
        };
        inner.users.push(user.clone());
        inner.credits.insert(user.id, 0);
        Ok(user)
    }

    async fn read_bookings(&self) -> Result<Vec<Booking>, StorageError> {
        self.check_read()?;
        Ok(self.inner.lock().unwrap().bookings.clone())
    }

    async fn user_bookings(&self, user_id: i64) -> Result<Vec<Booking>, StorageError> {
        self.check_read()?;
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .bookings
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn count_user_bookings_on(
        &self,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<i64, StorageError> {
        self.check_read()?;
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .bookings
            .iter()
            .filter(|b| b.user_id == user_id && b.start_time.date() == date)
            .count() as i64)
    }

    async fn write_booking(&self, user_id: i64, slot: &TimeSlot) -> Result<Booking, StorageError> {
        if self.fail_booking_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Database(
                "simulated write failure".to_string(),
            ));
        }
        let mut inner = self.inner.lock().unwrap();
        inner.next_booking_id += 1;
        let booking = Booking {
            id: inner.next_booking_id,
            user_id,
            start_time: slot.start,
            end_time: slot.end,
        };
        inner.bookings.push(booking.clone());
        Ok(booking)
    }

    async fn upcoming_bookings(
        &self,
        after: NaiveDateTime,
    ) -> Result<Vec<(Booking, i64)>, StorageError> {
        self.check_read()?;
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .bookings
            .iter()
            .filter(|b| b.start_time > after)
            .filter_map(|b| {
                inner
                    .users
                    .iter()
                    .find(|u| u.id == b.user_id)
                    .map(|u| (b.clone(), u.telegram_id))
            })
            .collect())
    }

    async fn visits_left(&self, user_id: i64) -> Result<Option<i32>, StorageError> {
        self.check_read()?;
        Ok(self.inner.lock().unwrap().credits.get(&user_id).copied())
    }

    async fn spend_visit(&self, user_id: i64) -> Result<Option<i32>, StorageError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.credits.get_mut(&user_id) {
            Some(left) if *left > 0 => {
                *left -= 1;
                Ok(Some(*left))
            }
            _ => Ok(None),
        }
    }

    async fn add_visits(&self, user_id: i64, count: i32) -> Result<i32, StorageError> {
        let mut inner = self.inner.lock().unwrap();
        let left = inner.credits.entry(user_id).or_insert(0);
        *left += count;
        Ok(*left)
    }
}
