pub mod client;
pub mod transport;

pub use client::{Unlisten, WatcherClient};
pub use transport::{DryRunHost, Transport};
