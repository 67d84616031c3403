use chrono::{Datelike, Duration, Local, Weekday};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::booking::{BookingError, Confirmation};
use crate::models::Booking;

/// Часы начала, доступные для записи.
pub const TIME_SLOTS: [&str; 12] = [
    "10:00", "11:00", "12:00", "13:00", "14:00", "15:00",
    "16:00", "17:00", "18:00", "19:00", "20:00", "21:00",
];

/// Варианты длительности в минутах: от получаса до восьми часов.
pub const DURATIONS: [(i64, &str); 8] = [
    (30, "30 минут"),
    (60, "1 час"),
    (90, "1,5 часа"),
    (120, "2 часа"),
    (180, "3 часа"),
    (240, "4 часа"),
    (360, "6 часов"),
    (480, "8 часов"),
];

fn weekday_short(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "пн",
        Weekday::Tue => "вт",
        Weekday::Wed => "ср",
        Weekday::Thu => "чт",
        Weekday::Fri => "пт",
        Weekday::Sat => "сб",
        Weekday::Sun => "вс",
    }
}

/// Клавиатура с датами на ближайшие 7 дней.
pub fn make_date_keyboard() -> InlineKeyboardMarkup {
    let today = Local::now().date_naive();
    let mut keyboard = Vec::new();

    for i in 0..7 {
        let date = today + Duration::days(i);
        let label = format!("{} ({})", date.format("%d.%m"), weekday_short(date.weekday()));
        keyboard.push(vec![InlineKeyboardButton::callback(
            label,
            format!("date_{}", date.format("%Y-%m-%d")),
        )]);
    }

    keyboard.push(vec![InlineKeyboardButton::callback("❌ Отмена", "book_cancel")]);
    InlineKeyboardMarkup::new(keyboard)
}

/// Клавиатура времени начала, по две кнопки в ряд.
pub fn make_time_keyboard() -> InlineKeyboardMarkup {
    let mut keyboard: Vec<Vec<InlineKeyboardButton>> = Vec::new();

    for pair in TIME_SLOTS.chunks(2) {
        keyboard.push(
            pair.iter()
                .map(|slot| {
                    InlineKeyboardButton::callback(slot.to_string(), format!("time_{}", slot))
                })
                .collect(),
        );
    }

    keyboard.push(vec![InlineKeyboardButton::callback("❌ Отмена", "book_cancel")]);
    InlineKeyboardMarkup::new(keyboard)
}

/// Клавиатура длительности. Именно здесь живёт ограничение 0,5-8 часов:
/// других вариантов пользователю не предлагается.
pub fn make_duration_keyboard() -> InlineKeyboardMarkup {
    let mut keyboard: Vec<Vec<InlineKeyboardButton>> = Vec::new();

    for pair in DURATIONS.chunks(2) {
        keyboard.push(
            pair.iter()
                .map(|(minutes, label)| {
                    InlineKeyboardButton::callback(label.to_string(), format!("dur_{}", minutes))
                })
                .collect(),
        );
    }

    keyboard.push(vec![InlineKeyboardButton::callback("❌ Отмена", "book_cancel")]);
    InlineKeyboardMarkup::new(keyboard)
}

pub fn duration_label(minutes: i64) -> String {
    DURATIONS
        .iter()
        .find(|(m, _)| *m == minutes)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| format!("{} мин", minutes))
}

pub fn format_booking(booking: &Booking) -> String {
    format!(
        "📅 {}  🕐 {} – {}",
        booking.start_time.format("%d.%m.%Y"),
        booking.start_time.format("%H:%M"),
        booking.end_time.format("%H:%M")
    )
}

pub fn confirmation_text(confirmation: &Confirmation) -> String {
    let booking = &confirmation.booking;
    let minutes = booking.slot().duration().num_minutes();

    let mut text = format!(
        "🎉 Поздравляем! Вы успешно записаны!\n\n\
        📅 Дата: {}\n\
        🕐 Время: {} – {}\n\
        ⏱️ Длительность: {}\n\n",
        booking.start_time.format("%d.%m.%Y"),
        booking.start_time.format("%H:%M"),
        booking.end_time.format("%H:%M"),
        duration_label(minutes)
    );

    if confirmation.credit_spent {
        if let Some(left) = confirmation.visits_left {
            text.push_str(&format!(
                "🎟️ Списано одно посещение. Осталось на абонементе: {}\n\n",
                left
            ));
        }
    } else {
        text.push_str("🎟️ Повторная запись в этот день — посещение не списывается.\n\n");
    }

    text.push_str("До встречи в мастерской! 🎨");
    text
}

pub fn rejection_text(error: &BookingError) -> String {
    match error {
        BookingError::SlotTaken => "❌ К сожалению, это время уже занято.\n\n\
            Пожалуйста, выберите другое время: /book"
            .to_string(),
        BookingError::NoCreditsLeft => "❌ На вашем абонементе не осталось посещений.\n\n\
            Обратитесь к администратору мастерской, чтобы пополнить абонемент."
            .to_string(),
        BookingError::PersistFailed => "❌ Произошла ошибка при сохранении бронирования.\n\n\
            Пожалуйста, попробуйте ещё раз: /book"
            .to_string(),
        BookingError::StorageUnavailable => "❌ Не получилось проверить расписание.\n\n\
            Пожалуйста, попробуйте ещё раз чуть позже: /book"
            .to_string(),
    }
}
