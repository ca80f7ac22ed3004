//! Agent identities
//!
//! Agents are remote conversational participants. Locally each one is an
//! opaque service-side identifier plus a role from a closed vocabulary, a
//! display name used for attribution, and an explicit invocation order.

pub mod identity;
pub mod persona;
pub mod registry;
pub mod storage;

pub use identity::{AgentIdentity, AgentRole};
pub use persona::persona_for;
pub use registry::{attribution_set, AgentRegistry};
pub use storage::{AgentStorage, StoredAgentConfig, XdgAgentStorage};
