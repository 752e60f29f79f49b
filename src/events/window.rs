use serde::{Deserialize, Serialize};
use std::fmt;

/// Наблюдение за окном программы, которое хост рассылает через событие
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowStatus {
    pub path: String,
    pub active: bool,
    /// Unix-время в миллисекундах
    pub time: i64,
}

impl WindowStatus {
    pub fn new(path: impl Into<String>, active: bool) -> Self {
        Self {
            path: path.into(),
            active,
            time: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn activated(path: impl Into<String>) -> Self {
        Self::new(path, true)
    }

    pub fn deactivated(path: impl Into<String>) -> Self {
        Self::new(path, false)
    }

    pub fn with_time(mut self, time: i64) -> Self {
        self.time = time;
        self
    }
}

impl fmt::Display for WindowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.active { "active" } else { "inactive" };
        write!(f, "\"{}\" {} @{}", self.path, state, self.time)
    }
}

/// Именованные каналы событий, которые публикует хост
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HostEvent {
    StatusChanged,
    WindowActivate,
}

impl HostEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            HostEvent::StatusChanged => "plugin:shion-watcher://status-changed",
            HostEvent::WindowActivate => "plugin:shion-watcher://window-activate",
        }
    }
}

impl fmt::Display for HostEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
