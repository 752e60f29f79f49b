use crate::error::{Result, WatcherError};
use crate::watcher_error;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;

use super::command::{Command, InvokeRequest};
use super::listener::{EventBus, EventHandler, ListenerId};
use super::r#trait::Transport;

/// Test transport: records every request and answers from a script
#[derive(Default)]
pub struct MockTransport {
    calls: Mutex<Vec<InvokeRequest>>,
    replies: DashMap<String, std::result::Result<Value, Value>>,
    pub bus: EventBus,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, command: Command, value: Value) {
        self.replies.insert(command.as_str().to_string(), Ok(value));
    }

    pub fn reject(&self, command: Command, payload: Value) {
        self.replies.insert(command.as_str().to_string(), Err(payload));
    }

    pub fn calls(&self) -> Vec<InvokeRequest> {
        self.calls.lock().clone()
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn invoke(&self, request: InvokeRequest) -> Result<Value> {
        let reply = self.replies.get(&request.cmd).map(|r| r.value().clone());
        let cmd = request.cmd.clone();
        self.calls.lock().push(request);

        match reply {
            Some(Ok(value)) => Ok(value),
            Some(Err(payload)) => Err(WatcherError::Host(payload)),
            None => Err(watcher_error!(transport, "no reply scripted for {}", cmd)),
        }
    }

    async fn listen(&self, event: &str, handler: EventHandler) -> Result<ListenerId> {
        Ok(self.bus.listen(event, handler))
    }

    fn unlisten(&self, event: &str, id: ListenerId) {
        self.bus.unlisten(event, id);
    }
}
