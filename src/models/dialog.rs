use chrono::{NaiveDate, NaiveTime};
use serde::{Serialize, Deserialize};

/// Шаг диалога бронирования. Состояние переносится между нажатиями кнопок
/// явным значением, а не россыпью полей в контексте чата.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingDialog {
    CollectingDate,
    CollectingTime { date: NaiveDate },
    CollectingDuration { date: NaiveDate, time: NaiveTime },
}
