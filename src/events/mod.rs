pub mod program;
pub mod window;

pub use program::Program;
pub use window::{HostEvent, WindowStatus};
