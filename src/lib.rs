//! Typed client for the `shion-watcher` desktop plugin.
//!
//! The host does the actual window watching; this crate only forwards typed calls
//! to it and subscribes to the events it publishes.

pub mod config;
pub mod error;
pub mod events;
pub mod services;

pub use error::{Result, WatcherError};
pub use events::{HostEvent, Program, WindowStatus};
pub use services::transport::{Capabilities, Command, DryRunHost, InvokeRequest, Transport};
pub use services::{Unlisten, WatcherClient};
