use crate::config::Config;
use crate::error::{Result, WatcherError};
use crate::events::{HostEvent, Program, WindowStatus};
use crate::watcher_error;
use parking_lot::{ReentrantMutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};

use super::command::{Command, InvokeRequest};
use super::listener::{EventBus, EventHandler, ListenerId};
use super::r#trait::Transport;

#[derive(Deserialize)]
struct PathArgs {
    path: String,
}

struct HostState {
    running: bool,
    active: Option<String>,
}

/// Эмулятор хоста плагина, работающий в том же процессе
pub struct DryRunHost {
    programs: Vec<Program>,
    bus: EventBus,
    state: RwLock<HostState>,
    // Serializes activate/suspend/resume together with their emissions.
    // Reentrant so an event handler can call back into the host.
    transition: ReentrantMutex<()>,
}

impl DryRunHost {
    pub fn new(programs: Vec<Program>) -> Self {
        info!("Инициализация DryRunHost ({} программ)", programs.len());
        Self {
            programs,
            bus: EventBus::new(),
            state: RwLock::new(HostState {
                running: true,
                active: None,
            }),
            transition: ReentrantMutex::new(()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.dry_run.programs.clone())
    }

    pub fn programs(&self) -> &[Program] {
        &self.programs
    }

    pub fn is_watching(&self) -> bool {
        self.state.read().running
    }

    pub fn active_path(&self) -> Option<String> {
        self.state.read().active.clone()
    }

    pub fn is_active(&self, path: &str) -> bool {
        self.state.read().active.as_deref() == Some(path)
    }

    /// Останавливает наблюдение и молча забывает активную программу
    pub fn suspend(&self) {
        let _transition = self.transition.lock();
        let mut state = self.state.write();
        state.running = false;
        state.active = None;
        info!("Наблюдение приостановлено");
    }

    pub fn resume(&self) {
        let _transition = self.transition.lock();
        self.state.write().running = true;
        info!("Наблюдение возобновлено");
    }

    /// Делает программу активной и рассылает события; false, если ничего не изменилось
    pub fn activate(&self, path: &str) -> bool {
        let _transition = self.transition.lock();

        let previous = {
            let mut state = self.state.write();
            if !state.running {
                debug!("Наблюдение приостановлено, пропускаем активацию {}", path);
                return false;
            }
            if state.active.as_deref() == Some(path) {
                return false;
            }
            state.active.replace(path.to_string())
        };

        if let Some(previous) = previous {
            self.emit(HostEvent::StatusChanged, &WindowStatus::deactivated(previous));
        }
        // Обработчик мог приостановить хост прямо во время рассылки
        if !self.is_active(path) {
            return false;
        }
        self.emit(HostEvent::StatusChanged, &WindowStatus::activated(path));
        if !self.is_active(path) {
            return false;
        }
        self.emit(HostEvent::WindowActivate, &path);

        debug!("Активное окно: {}", path);
        true
    }

    pub fn emit<T: Serialize>(&self, event: HostEvent, payload: &T) -> usize {
        match serde_json::to_value(payload) {
            Ok(value) => self.bus.emit(event.as_str(), value),
            Err(e) => {
                warn!("Не удалось сериализовать событие {}: {}", event, e);
                0
            }
        }
    }

    pub fn listener_count(&self, event: HostEvent) -> usize {
        self.bus.listener_count(event.as_str())
    }

    /// Циклически активирует программы из списка, пока не исчерпан `limit`
    pub async fn run_emulation(self: Arc<Self>, period: Duration, limit: Option<usize>) -> Result<()> {
        if self.programs.is_empty() {
            return Err(watcher_error!(transport, "Нет программ для эмуляции"));
        }

        info!("Dry-run режим - хост работает в режиме эмуляции");

        let mut index = 0;
        let mut ticks = 0;
        let mut interval = interval(period);

        loop {
            interval.tick().await;
            if limit.is_some_and(|limit| ticks >= limit) {
                break;
            }

            let program = &self.programs[index];
            info!("Dry-run: эмулируем смену окна на: {}", program);
            self.activate(&program.path);

            index = (index + 1) % self.programs.len();
            ticks += 1;
        }

        Ok(())
    }

    fn path_args(request: &InvokeRequest) -> Result<String> {
        serde_json::from_value::<PathArgs>(request.args.clone())
            .map(|args| args.path)
            .map_err(|e| watcher_error!(host, "invalid args for command {}: {}", request.cmd, e))
    }

    fn handle(&self, request: &InvokeRequest) -> Result<Value> {
        let value = match request.command()? {
            Command::GetProgramList => serde_json::to_value(&self.programs)?,
            Command::GetProgramByPath => {
                let path = Self::path_args(request)?;
                match self.programs.iter().find(|program| program.path == path) {
                    Some(program) => serde_json::to_value(program)?,
                    None => return WatcherError::host(format!("program not found: {}", path)),
                }
            }
            Command::Suspend => {
                self.suspend();
                Value::Null
            }
            Command::Resume => {
                self.resume();
                Value::Null
            }
            Command::IsActive => {
                let path = Self::path_args(request)?;
                Value::Bool(self.is_active(&path))
            }
            Command::CheckWatched => Value::Bool(self.is_watching()),
        };

        Ok(value)
    }
}

#[async_trait::async_trait]
impl Transport for DryRunHost {
    async fn invoke(&self, request: InvokeRequest) -> Result<Value> {
        debug!("Dry-run: вызов {}", request);
        self.handle(&request)
    }

    async fn listen(&self, event: &str, handler: EventHandler) -> Result<ListenerId> {
        Ok(self.bus.listen(event, handler))
    }

    fn unlisten(&self, event: &str, id: ListenerId) {
        self.bus.unlisten(event, id);
    }
}
