use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    /// Ответ хоста с ошибкой, без изменений
    #[error("Хост вернул ошибку: {0}")]
    Host(serde_json::Value),

    #[error("Ошибка транспорта: {0}")]
    Transport(String),

    #[error("Не удалось разобрать ответ хоста: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Команда не поддерживается хостом: {0}")]
    Unsupported(String),
}

impl WatcherError {
    pub fn host<T>(payload: impl Into<serde_json::Value>) -> Result<T> {
        Err(WatcherError::Host(payload.into()))
    }
}

pub type Result<T> = std::result::Result<T, WatcherError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! watcher_error {
    (host, $($arg:tt)*) => {
        $crate::error::WatcherError::Host(serde_json::Value::String(format!($($arg)*)))
    };
    (transport, $($arg:tt)*) => {
        $crate::error::WatcherError::Transport(format!($($arg)*))
    };
    (unsupported, $($arg:tt)*) => {
        $crate::error::WatcherError::Unsupported(format!($($arg)*))
    };
}
