use serde::{Serialize, Deserialize};
use sqlx::FromRow;

/// Посетитель мастерской. Заводится лениво при первом обращении к боту.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
}
