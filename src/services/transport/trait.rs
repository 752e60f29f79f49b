use crate::error::Result;
use serde_json::Value;

use super::command::InvokeRequest;
use super::listener::{EventHandler, ListenerId};

/// Trait for the channel between the client and a plugin host
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Send a single request and wait for the host's reply.
    /// A host rejection comes back as `WatcherError::Host` with the payload untouched.
    async fn invoke(&self, request: InvokeRequest) -> Result<Value>;

    /// Register a handler on a named event channel
    async fn listen(&self, event: &str, handler: EventHandler) -> Result<ListenerId>;

    /// Detach a handler; no-op if it is already gone
    fn unlisten(&self, event: &str, id: ListenerId);
}
