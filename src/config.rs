use std::env;

/// Настройки процесса. Токен бота teloxide читает сам из TELOXIDE_TOKEN,
/// остальное собирается здесь.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Чат администратора, которому разрешено пополнять абонементы.
    pub admin_chat_id: Option<i64>,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        let database_url = env::var("DATABASE_URL")?;
        let admin_chat_id = env::var("ADMIN_CHAT_ID")
            .ok()
            .and_then(|v| v.parse::<i64>().ok());

        Ok(Config {
            database_url,
            admin_chat_id,
        })
    }
}
