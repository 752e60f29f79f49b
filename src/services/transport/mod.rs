//! Transport layer: the only way the client talks to a plugin host.
//!
//! A transport carries named request/response calls and named host-to-client
//! event channels. It does not interpret payloads; typing happens in the client.

mod command;
mod dry_run;
mod listener;
#[cfg(test)]
pub(crate) mod mock;
mod r#trait;

pub use self::command::{Capabilities, Command, InvokeRequest, PLUGIN_NAME};
pub use self::dry_run::DryRunHost;
pub use self::listener::{EventBus, EventHandler, ListenerId};
pub use self::r#trait::Transport;
