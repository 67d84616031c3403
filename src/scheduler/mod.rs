pub mod telegram;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Local, NaiveDateTime};

use crate::storage::{Storage, StorageError};

/// Напоминаем за сутки и за час до начала; ближе часа уже не напоминаем.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderKind {
    DayBefore,
    HourBefore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reminder {
    pub trigger_at: NaiveDateTime,
    pub booking_start: NaiveDateTime,
    pub kind: ReminderKind,
}

impl Reminder {
    pub fn text(&self) -> String {
        let time = self.booking_start.format("%H:%M");
        match self.kind {
            ReminderKind::DayBefore => {
                format!("🔔 Напоминание: у вас запись в ArtChaos завтра в {}!", time)
            }
            ReminderKind::HourBefore => {
                format!("🔔 Напоминание: у вас запись в ArtChaos сегодня в {}!", time)
            }
        }
    }
}

/// Чистая функция планирования: по текущему моменту и началу бронирования
/// возвращает ноль, одно или два времени срабатывания.
pub fn plan_reminders(now: NaiveDateTime, booking_start: NaiveDateTime) -> Vec<Reminder> {
    let until = booking_start - now;
    let mut planned = Vec::new();

    if until > Duration::hours(24) {
        planned.push(Reminder {
            trigger_at: booking_start - Duration::hours(24),
            booking_start,
            kind: ReminderKind::DayBefore,
        });
    }
    if until > Duration::hours(1) {
        planned.push(Reminder {
            trigger_at: booking_start - Duration::hours(1),
            booking_start,
            kind: ReminderKind::HourBefore,
        });
    }

    planned
}

/// Канал доставки напоминаний.
#[async_trait]
pub trait Notify: Send + Sync {
    async fn notify(
        &self,
        chat_id: i64,
        text: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Отложенная отправка напоминаний через таймеры tokio.
pub struct Reminders<N> {
    notifier: Arc<N>,
}

impl<N> Clone for Reminders<N> {
    fn clone(&self) -> Self {
        Reminders {
            notifier: Arc::clone(&self.notifier),
        }
    }
}

impl<N: Notify + 'static> Reminders<N> {
    pub fn new(notifier: N) -> Self {
        Reminders {
            notifier: Arc::new(notifier),
        }
    }

    /// Ставит таймеры для подтверждённого бронирования. Возвращает,
    /// сколько напоминаний запланировано.
    pub fn schedule(&self, chat_id: i64, booking_start: NaiveDateTime) -> usize {
        let now = Local::now().naive_local();
        let planned = plan_reminders(now, booking_start);
        for reminder in &planned {
            self.spawn_timer(chat_id, *reminder, now);
        }
        planned.len()
    }

    /// Восстанавливает таймеры по будущим бронированиям. Таймеры живут
    /// только в памяти процесса, поэтому после перезапуска пересчитываем
    /// их заново из базы.
    pub async fn restore<S: Storage>(&self, storage: &S) -> Result<usize, StorageError> {
        let now = Local::now().naive_local();
        let upcoming = storage.upcoming_bookings(now).await?;

        let mut restored = 0;
        for (booking, telegram_id) in upcoming {
            for reminder in plan_reminders(now, booking.start_time) {
                self.spawn_timer(telegram_id, reminder, now);
                restored += 1;
            }
        }

        Ok(restored)
    }

    fn spawn_timer(&self, chat_id: i64, reminder: Reminder, now: NaiveDateTime) {
        let notifier = Arc::clone(&self.notifier);
        let wait = (reminder.trigger_at - now).to_std().unwrap_or_default();

        tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            if let Err(e) = notifier.notify(chat_id, &reminder.text()).await {
                // Доставка не повторяется: получатель мог заблокировать бота
                log::warn!("Reminder delivery failed for chat {}: {}", chat_id, e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, min, 0)
            .unwrap()
    }

    #[test]
    fn two_days_ahead_plans_both_reminders() {
        let planned = plan_reminders(at(1, 0, 0), at(3, 0, 0));

        assert_eq!(planned.len(), 2);
        assert_eq!(planned[0].trigger_at, at(2, 0, 0));
        assert_eq!(planned[0].kind, ReminderKind::DayBefore);
        assert_eq!(planned[1].trigger_at, at(2, 23, 0));
        assert_eq!(planned[1].kind, ReminderKind::HourBefore);
    }

    #[test]
    fn ten_hours_ahead_plans_single_reminder() {
        let planned = plan_reminders(at(1, 0, 0), at(1, 10, 0));

        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].trigger_at, at(1, 9, 0));
        assert_eq!(planned[0].kind, ReminderKind::HourBefore);
    }

    #[test]
    fn half_hour_ahead_plans_nothing() {
        let planned = plan_reminders(at(1, 0, 0), at(1, 0, 30));
        assert!(planned.is_empty());
    }

    #[test]
    fn exactly_24_hours_ahead_plans_single_reminder() {
        let planned = plan_reminders(at(1, 0, 0), at(2, 0, 0));

        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].kind, ReminderKind::HourBefore);
        assert_eq!(planned[0].trigger_at, at(1, 23, 0));
    }

    #[test]
    fn exactly_one_hour_ahead_plans_nothing() {
        let planned = plan_reminders(at(1, 0, 0), at(1, 1, 0));
        assert!(planned.is_empty());
    }

    #[test]
    fn booking_in_the_past_plans_nothing() {
        let planned = plan_reminders(at(2, 0, 0), at(1, 10, 0));
        assert!(planned.is_empty());
    }

    #[test]
    fn reminder_text_mentions_start_time() {
        let planned = plan_reminders(at(1, 0, 0), at(1, 10, 30));
        assert_eq!(planned.len(), 1);
        assert!(planned[0].text().contains("10:30"));
        assert!(planned[0].text().contains("сегодня"));
    }
}
