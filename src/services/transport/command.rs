use crate::error::{Result, WatcherError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

pub const PLUGIN_NAME: &str = "shion-watcher";

/// Команды хоста, доступные по RPC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    GetProgramList,
    GetProgramByPath,
    Suspend,
    Resume,
    IsActive,
    CheckWatched,
}

impl Command {
    pub const ALL: [Command; 6] = [
        Command::GetProgramList,
        Command::GetProgramByPath,
        Command::Suspend,
        Command::Resume,
        Command::IsActive,
        Command::CheckWatched,
    ];

    /// Короткое имя команды внутри плагина
    pub fn name(&self) -> &'static str {
        match self {
            Command::GetProgramList => "get_program_list",
            Command::GetProgramByPath => "get_program_by_path",
            Command::Suspend => "suspend",
            Command::Resume => "resume",
            Command::IsActive => "is_active",
            Command::CheckWatched => "check_watched",
        }
    }

    /// Полное имя вызова, как его ждёт хост
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::GetProgramList => "plugin:shion-watcher|get_program_list",
            Command::GetProgramByPath => "plugin:shion-watcher|get_program_by_path",
            Command::Suspend => "plugin:shion-watcher|suspend",
            Command::Resume => "plugin:shion-watcher|resume",
            Command::IsActive => "plugin:shion-watcher|is_active",
            Command::CheckWatched => "plugin:shion-watcher|check_watched",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.name() == name)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = WatcherError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s
            .strip_prefix("plugin:")
            .and_then(|rest| rest.strip_prefix(PLUGIN_NAME))
            .and_then(|rest| rest.strip_prefix('|'))
            .ok_or_else(|| crate::watcher_error!(host, "command {} not found", s))?;

        Self::from_name(name).ok_or_else(|| crate::watcher_error!(host, "command {} not found", s))
    }
}

/// Один RPC-вызов: имя команды и аргументы
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvokeRequest {
    pub cmd: String,
    pub args: Value,
}

impl InvokeRequest {
    /// Вызов без аргументов отправляет пустой объект
    pub fn new(command: Command) -> Self {
        Self {
            cmd: command.as_str().to_string(),
            args: json!({}),
        }
    }

    pub fn with_path(command: Command, path: &str) -> Self {
        Self {
            cmd: command.as_str().to_string(),
            args: json!({ "path": path }),
        }
    }

    pub fn command(&self) -> Result<Command> {
        self.cmd.parse()
    }
}

impl fmt::Display for InvokeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.cmd, self.args)
    }
}

/// Набор команд, которые поддерживает подключённый хост
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    commands: HashSet<Command>,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::all()
    }
}

impl Capabilities {
    pub fn all() -> Self {
        Self {
            commands: Command::ALL.into_iter().collect(),
        }
    }

    pub fn from_names(names: &[String]) -> Result<Self> {
        let commands = names
            .iter()
            .map(|name| {
                Command::from_name(name)
                    .ok_or_else(|| crate::watcher_error!(unsupported, "{}", name))
            })
            .collect::<Result<HashSet<_>>>()?;

        Ok(Self { commands })
    }

    pub fn supports(&self, command: Command) -> bool {
        self.commands.contains(&command)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
