use crate::error::Result;
use crate::events::{HostEvent, Program, WindowStatus};
use crate::services::transport::{Capabilities, Command, EventHandler, InvokeRequest, ListenerId, Transport};
use crate::watcher_error;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Типизированный фасад над вызовами и событиями плагина shion-watcher.
///
/// Каждый метод делает ровно один вызов транспорта и возвращает ошибку хоста без изменений.
/// Состояния нет: параллельные вызовы друг о друге не знают.
#[derive(Clone)]
pub struct WatcherClient {
    transport: Arc<dyn Transport>,
    capabilities: Capabilities,
}

impl WatcherClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            capabilities: Capabilities::all(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Все программы, которые сейчас известны хосту
    pub async fn get_program_list(&self) -> Result<Vec<Program>> {
        self.call(InvokeRequest::new(Command::GetProgramList)).await
    }

    pub async fn get_program_by_path(&self, path: &str) -> Result<Program> {
        self.call(InvokeRequest::with_path(Command::GetProgramByPath, path))
            .await
    }

    /// Приостановить наблюдение за окнами
    pub async fn suspend(&self) -> Result<()> {
        self.call::<Value>(InvokeRequest::new(Command::Suspend))
            .await
            .map(drop)
    }

    pub async fn resume(&self) -> Result<()> {
        self.call::<Value>(InvokeRequest::new(Command::Resume))
            .await
            .map(drop)
    }

    /// Является ли программа по `path` активным окном
    pub async fn is_active(&self, path: &str) -> Result<bool> {
        self.call(InvokeRequest::with_path(Command::IsActive, path))
            .await
    }

    /// Включено ли наблюдение
    pub async fn check_watched(&self) -> Result<bool> {
        self.call(InvokeRequest::new(Command::CheckWatched)).await
    }

    /// Вызывает `callback` на каждое событие status-changed, пока подписка не снята
    pub async fn on_status_changed<F>(&self, callback: F) -> Result<Unlisten>
    where
        F: Fn(WindowStatus) + Send + Sync + 'static,
    {
        self.subscribe(HostEvent::StatusChanged, callback).await
    }

    /// Вызывает `callback` с путём нового активного окна
    pub async fn on_window_activate<F>(&self, callback: F) -> Result<Unlisten>
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        self.subscribe(HostEvent::WindowActivate, callback).await
    }

    async fn call<T: DeserializeOwned>(&self, request: InvokeRequest) -> Result<T> {
        let command = request.command()?;
        if !self.capabilities.supports(command) {
            return Err(watcher_error!(unsupported, "{}", command.name()));
        }

        debug!("Вызов хоста: {}", request);
        let value = self.transport.invoke(request).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn subscribe<T, F>(&self, event: HostEvent, callback: F) -> Result<Unlisten>
    where
        T: DeserializeOwned + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        let handler: EventHandler = Arc::new(move |payload: Value| {
            match serde_json::from_value::<T>(payload) {
                Ok(payload) => callback(payload),
                Err(e) => warn!("Пропущено событие {} с неверной нагрузкой: {}", event, e),
            }
        });

        let id = self.transport.listen(event.as_str(), handler).await?;
        debug!("Подписка {} на {}", id, event);

        Ok(Unlisten {
            transport: Arc::clone(&self.transport),
            event,
            id,
        })
    }
}

/// Handle for a registered event callback.
///
/// Dropping it keeps the subscription alive; only `unlisten` detaches the callback.
pub struct Unlisten {
    transport: Arc<dyn Transport>,
    event: HostEvent,
    id: ListenerId,
}

impl Unlisten {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn event(&self) -> HostEvent {
        self.event
    }

    /// After this returns the callback receives nothing more
    pub fn unlisten(self) {
        debug!("Отписка {} от {}", self.id, self.event);
        self.transport.unlisten(self.event.as_str(), self.id);
    }
}

impl fmt::Debug for Unlisten {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unlisten")
            .field("event", &self.event)
            .field("id", &self.id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WatcherError;
    use crate::services::transport::mock::MockTransport;
    use parking_lot::Mutex;
    use serde_json::json;

    fn client() -> (Arc<MockTransport>, WatcherClient) {
        let transport = Arc::new(MockTransport::new());
        let client = WatcherClient::new(transport.clone());
        (transport, client)
    }

    #[tokio::test]
    async fn is_active_sends_path_and_returns_host_answer() {
        let (transport, client) = client();
        transport.reply(Command::IsActive, json!(true));

        assert!(client.is_active("/usr/bin/app").await.unwrap());

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].cmd, "plugin:shion-watcher|is_active");
        assert_eq!(calls[0].args, json!({ "path": "/usr/bin/app" }));
    }

    #[tokio::test]
    async fn each_operation_issues_exactly_one_documented_call() {
        let (transport, client) = client();
        let program = json!({ "name": "App", "path": "/usr/bin/app", "icon": [1, 2] });
        transport.reply(Command::GetProgramList, json!([program.clone()]));
        transport.reply(Command::GetProgramByPath, program);
        transport.reply(Command::Suspend, Value::Null);
        transport.reply(Command::Resume, Value::Null);
        transport.reply(Command::CheckWatched, json!(false));

        let list = client.get_program_list().await.unwrap();
        let one = client.get_program_by_path("/usr/bin/app").await.unwrap();
        client.suspend().await.unwrap();
        client.resume().await.unwrap();
        let watched = client.check_watched().await.unwrap();

        let expected = Program::new("App", "/usr/bin/app").with_icon(vec![1, 2]);
        assert_eq!(list, vec![expected.clone()]);
        assert_eq!(one, expected);
        assert!(!watched);

        let calls: Vec<(String, Value)> = transport
            .calls()
            .into_iter()
            .map(|call| (call.cmd, call.args))
            .collect();
        assert_eq!(
            calls,
            vec![
                ("plugin:shion-watcher|get_program_list".to_string(), json!({})),
                (
                    "plugin:shion-watcher|get_program_by_path".to_string(),
                    json!({ "path": "/usr/bin/app" })
                ),
                ("plugin:shion-watcher|suspend".to_string(), json!({})),
                ("plugin:shion-watcher|resume".to_string(), json!({})),
                ("plugin:shion-watcher|check_watched".to_string(), json!({})),
            ]
        );
    }

    #[tokio::test]
    async fn rejection_reaches_caller_unchanged() {
        let (transport, client) = client();
        let reason = json!({ "code": 5, "message": "host is gone" });
        transport.reject(Command::GetProgramList, reason.clone());

        let err = client.get_program_list().await.unwrap_err();
        assert!(matches!(err, WatcherError::Host(payload) if payload == reason));
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn transport_failure_is_observable() {
        let (_transport, client) = client();
        let err = client.resume().await.unwrap_err();
        assert!(matches!(err, WatcherError::Transport(_)));
    }

    #[tokio::test]
    async fn unexpected_result_shape_is_decode_error() {
        let (transport, client) = client();
        transport.reply(Command::IsActive, json!("yes"));

        let err = client.is_active("/usr/bin/app").await.unwrap_err();
        assert!(matches!(err, WatcherError::Decode(_)));
    }

    #[tokio::test]
    async fn unsupported_command_never_reaches_transport() {
        let (transport, client) = client();
        let client = client.with_capabilities(
            Capabilities::from_names(&["get_program_list".to_string()]).unwrap(),
        );

        let err = client.check_watched().await.unwrap_err();
        assert!(
            matches!(err, WatcherError::Unsupported(name) if name == "check_watched")
        );
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn status_events_arrive_in_order_with_exact_payloads() {
        let (transport, client) = client();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let _handle = client
            .on_status_changed({
                let seen = seen.clone();
                move |status| seen.lock().push(status)
            })
            .await
            .unwrap();

        let first = WindowStatus::activated("/usr/bin/a").with_time(10);
        let second = WindowStatus::deactivated("/usr/bin/a").with_time(20);
        transport.bus.emit(
            HostEvent::StatusChanged.as_str(),
            serde_json::to_value(&first).unwrap(),
        );
        transport.bus.emit(
            HostEvent::StatusChanged.as_str(),
            serde_json::to_value(&second).unwrap(),
        );

        assert_eq!(*seen.lock(), vec![first, second]);
    }

    #[tokio::test]
    async fn two_subscribers_each_get_every_event() {
        let (transport, client) = client();
        let first = Arc::new(Mutex::new(Vec::new()));
        let second = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for seen in [first.clone(), second.clone()] {
            let handle = client
                .on_window_activate(move |path| seen.lock().push(path))
                .await
                .unwrap();
            handles.push(handle);
        }
        assert_ne!(handles[0].id(), handles[1].id());

        let event = HostEvent::WindowActivate.as_str();
        transport.bus.emit(event, json!("/usr/bin/a"));
        transport.bus.emit(event, json!("/usr/bin/b"));

        let expected = vec!["/usr/bin/a".to_string(), "/usr/bin/b".to_string()];
        assert_eq!(*first.lock(), expected);
        assert_eq!(*second.lock(), expected);
    }

    #[tokio::test]
    async fn unlisten_stops_further_delivery() {
        let (transport, client) = client();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let handle = client
            .on_window_activate({
                let seen = seen.clone();
                move |path| seen.lock().push(path)
            })
            .await
            .unwrap();
        assert_eq!(handle.event(), HostEvent::WindowActivate);

        let event = HostEvent::WindowActivate.as_str();
        transport.bus.emit(event, json!("/usr/bin/a"));
        handle.unlisten();
        transport.bus.emit(event, json!("/usr/bin/b"));

        assert_eq!(*seen.lock(), vec!["/usr/bin/a".to_string()]);
        assert_eq!(transport.bus.listener_count(event), 0);
    }

    #[tokio::test]
    async fn malformed_event_is_skipped() {
        let (transport, client) = client();
        let seen = Arc::new(Mutex::new(Vec::new()));
        client
            .on_status_changed({
                let seen = seen.clone();
                move |status| seen.lock().push(status)
            })
            .await
            .unwrap();

        let event = HostEvent::StatusChanged.as_str();
        transport.bus.emit(event, json!({ "path": 1 }));
        transport
            .bus
            .emit(event, json!({ "path": "/usr/bin/a", "active": true, "time": 5 }));

        assert_eq!(
            *seen.lock(),
            vec![WindowStatus::activated("/usr/bin/a").with_time(5)]
        );
    }

    #[tokio::test]
    async fn works_against_dry_run_host() {
        use crate::services::transport::DryRunHost;

        let host = Arc::new(DryRunHost::new(vec![Program::new("Editor", "/usr/bin/nvim")]));
        let client = WatcherClient::new(host.clone());
        let activated = Arc::new(Mutex::new(Vec::new()));
        let handle = client
            .on_window_activate({
                let activated = activated.clone();
                move |path| activated.lock().push(path)
            })
            .await
            .unwrap();

        host.activate("/usr/bin/nvim");
        assert!(client.is_active("/usr/bin/nvim").await.unwrap());
        assert!(client.check_watched().await.unwrap());

        client.suspend().await.unwrap();
        assert!(!client.check_watched().await.unwrap());
        assert!(!client.is_active("/usr/bin/nvim").await.unwrap());

        handle.unlisten();
        client.resume().await.unwrap();
        host.activate("/usr/bin/nvim");

        assert_eq!(*activated.lock(), vec!["/usr/bin/nvim".to_string()]);
        assert!(matches!(
            client.get_program_by_path("/nope").await,
            Err(WatcherError::Host(_))
        ));
    }
}
