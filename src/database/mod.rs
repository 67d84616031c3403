use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;

use crate::models::{Booking, TimeSlot, User};
use crate::storage::{Storage, StorageError};

#[derive(Clone, Debug)]
pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(1800))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        Ok(Database { pool })
    }

    pub async fn init(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        // Таблица users
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id BIGSERIAL PRIMARY KEY,
                telegram_id BIGINT NOT NULL UNIQUE,
                username TEXT,
                first_name TEXT,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Таблица abonements: остаток посещений, строго неотрицательный
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS abonements (
                user_id BIGINT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
                visits_left INTEGER NOT NULL DEFAULT 0 CHECK (visits_left >= 0),
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Таблица bookings: времена наивные, одна общая локальная шкала
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS bookings (
                id BIGSERIAL PRIMARY KEY,
                user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                start_time TIMESTAMP NOT NULL,
                end_time TIMESTAMP NOT NULL,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                CHECK (end_time > start_time)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Индексы
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_bookings_user_id ON bookings (user_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_bookings_start_time ON bookings (start_time)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl Storage for Database {
    async fn get_or_create_user(
        &self,
        telegram_id: i64,
        username: Option<&str>,
        first_name: Option<&str>,
    ) -> Result<User, StorageError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (telegram_id, username, first_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (telegram_id) DO UPDATE SET
                username = EXCLUDED.username,
                first_name = EXCLUDED.first_name,
                updated_at = NOW()
            RETURNING id, telegram_id, username, first_name
            "#,
        )
        .bind(telegram_id)
        .bind(username)
        .bind(first_name)
        .fetch_one(&self.pool)
        .await?;

        // Пустой абонемент заводится вместе с пользователем
        sqlx::query(
            "INSERT INTO abonements (user_id, visits_left) VALUES ($1, 0)
             ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(user.id)
        .execute(&self.pool)
        .await?;

        Ok(user)
    }

    async fn read_bookings(&self) -> Result<Vec<Booking>, StorageError> {
        let bookings = sqlx::query_as::<_, Booking>(
            "SELECT id, user_id, start_time, end_time FROM bookings ORDER BY start_time",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    async fn user_bookings(&self, user_id: i64) -> Result<Vec<Booking>, StorageError> {
        let bookings = sqlx::query_as::<_, Booking>(
            "SELECT id, user_id, start_time, end_time FROM bookings
             WHERE user_id = $1 ORDER BY start_time",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    async fn count_user_bookings_on(
        &self,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<i64, StorageError> {
        let day_start = date.and_time(NaiveTime::MIN);
        let day_end = (date + chrono::Duration::days(1)).and_time(NaiveTime::MIN);

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings
             WHERE user_id = $1 AND start_time >= $2 AND start_time < $3",
        )
        .bind(user_id)
        .bind(day_start)
        .bind(day_end)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn write_booking(&self, user_id: i64, slot: &TimeSlot) -> Result<Booking, StorageError> {
        let booking = sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (user_id, start_time, end_time)
             VALUES ($1, $2, $3)
             RETURNING id, user_id, start_time, end_time",
        )
        .bind(user_id)
        .bind(slot.start)
        .bind(slot.end)
        .fetch_one(&self.pool)
        .await?;

        Ok(booking)
    }

    async fn upcoming_bookings(
        &self,
        after: NaiveDateTime,
    ) -> Result<Vec<(Booking, i64)>, StorageError> {
        let rows = sqlx::query(
            "SELECT b.id, b.user_id, b.start_time, b.end_time, u.telegram_id
             FROM bookings b
             JOIN users u ON u.id = b.user_id
             WHERE b.start_time > $1
             ORDER BY b.start_time",
        )
        .bind(after)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let booking = Booking {
                    id: row.get("id"),
                    user_id: row.get("user_id"),
                    start_time: row.get("start_time"),
                    end_time: row.get("end_time"),
                };
                (booking, row.get("telegram_id"))
            })
            .collect())
    }

    async fn visits_left(&self, user_id: i64) -> Result<Option<i32>, StorageError> {
        let left: Option<i32> =
            sqlx::query_scalar("SELECT visits_left FROM abonements WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(left)
    }

    async fn spend_visit(&self, user_id: i64) -> Result<Option<i32>, StorageError> {
        // Проверка и декремент одним UPDATE: два конкурентных списания
        // последнего посещения не пройдут оба
        let left: Option<i32> = sqlx::query_scalar(
            "UPDATE abonements
             SET visits_left = visits_left - 1, updated_at = NOW()
             WHERE user_id = $1 AND visits_left > 0
             RETURNING visits_left",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(left)
    }

    async fn add_visits(&self, user_id: i64, count: i32) -> Result<i32, StorageError> {
        let left: i32 = sqlx::query_scalar(
            "INSERT INTO abonements (user_id, visits_left) VALUES ($1, $2)
             ON CONFLICT (user_id) DO UPDATE SET
                visits_left = abonements.visits_left + EXCLUDED.visits_left,
                updated_at = NOW()
             RETURNING visits_left",
        )
        .bind(user_id)
        .bind(count)
        .fetch_one(&self.pool)
        .await?;

        Ok(left)
    }
}
