use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Serialize, Deserialize};

/// Интервал бронирования `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeSlot {
    /// Пустые и перевёрнутые интервалы не существуют как значения.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Option<Self> {
        if end > start {
            Some(TimeSlot { start, end })
        } else {
            None
        }
    }

    pub fn with_duration(start: NaiveDateTime, minutes: i64) -> Option<Self> {
        Self::new(start, start + Duration::minutes(minutes))
    }

    /// Полуоткрытые интервалы пересекаются, когда каждый начинается раньше,
    /// чем заканчивается другой. Касание границами не считается пересечением:
    /// слот 10:00-11:00 не мешает слоту 11:00-12:00.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Календарный день начала слота.
    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}
