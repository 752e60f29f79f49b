use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use crate::events::Program;
use crate::services::transport::{Capabilities, Command};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub host: HostConfig,
    pub dry_run: DryRunConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostConfig {
    /// Короткие имена команд, которые поддерживает хост
    pub commands: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DryRunConfig {
    pub activation_interval_ms: u64,
    #[serde(default)]
    pub programs: Vec<Program>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "compact".to_string(),
            },
            host: HostConfig {
                commands: Command::ALL.iter().map(|c| c.name().to_string()).collect(),
            },
            dry_run: DryRunConfig {
                activation_interval_ms: 2000,
                programs: vec![
                    Program::new("Terminal", "/usr/bin/alacritty"),
                    Program::new("Browser", "/usr/bin/firefox"),
                    Program::new("Editor", "/usr/bin/nvim"),
                ],
            },
        }
    }
}

impl Config {
    /// Слои: встроенные значения, затем TOML-файл (может отсутствовать), затем SHION_*
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("SHION_").split("__"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "pretty" | "compact" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        for name in &self.host.commands {
            if Command::from_name(name).is_none() {
                anyhow::bail!("Неизвестная команда хоста: {}", name);
            }
        }

        if self.dry_run.activation_interval_ms < 100 {
            anyhow::bail!("activation_interval_ms должно быть минимум 100");
        }

        if self.dry_run.programs.is_empty() {
            anyhow::bail!("Список программ для эмуляции пуст");
        }

        let mut paths = HashSet::new();
        for (i, program) in self.dry_run.programs.iter().enumerate() {
            if program.path.is_empty() {
                anyhow::bail!("Пустой путь у программы #{}", i + 1);
            }
            if !paths.insert(program.path.as_str()) {
                anyhow::bail!("Повторяющийся путь программы: {}", program.path);
            }
        }

        Ok(())
    }

    /// Подставляет уровень логирования из командной строки и проверяет его
    pub fn with_log_level(mut self, level: Option<String>) -> Result<Self> {
        if let Some(level) = level {
            self.logging.level = level;
            self.validate()?;
        }
        Ok(self)
    }

    pub fn capabilities(&self) -> crate::error::Result<Capabilities> {
        Capabilities::from_names(&self.host.commands)
    }

    pub fn activation_interval(&self) -> Duration {
        Duration::from_millis(self.dry_run.activation_interval_ms)
    }
}
