use serde::{Deserialize, Serialize};
use std::fmt;

/// Снимок метаданных программы, как его отдаёт хост
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Program {
    pub name: String,
    /// Уникальный идентификатор программы
    pub path: String,
    /// Сырые байты иконки (на проводе - массив чисел)
    #[serde(default)]
    pub icon: Vec<u8>,
}

impl Program {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            icon: Vec::new(),
        }
    }

    pub fn with_icon(mut self, icon: Vec<u8>) -> Self {
        self.icon = icon;
        self
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" ({})", self.name, self.path)
    }
}
