//! Watch runtime: filesystem events, batching and dispatch.

mod events;
mod handler;
mod runtime;

pub use events::{is_ignored, ChangeEvent, WatchConfig};
pub use handler::JournalWatchHandler;
pub use runtime::{convert_event, ChangeHandler, WatchDaemon};
