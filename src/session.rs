//! Journal session
//!
//! Composition root for the response loop: edits are debounced, the delta is
//! extracted and gated, agents are orchestrated and the merged reply is
//! inserted after the writer's last line in scope. At most one cycle per
//! session is in flight.

pub mod controller;
pub mod debounce;
pub mod editor;

pub use controller::{CycleOutcome, SessionController, SessionStatus};
pub use debounce::Debouncer;
pub use editor::{FileEditor, HostEditor};
