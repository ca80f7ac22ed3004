//! Marginalia: a journal companion
//!
//! Watches a journal document, finds the text written since the last agent
//! reply, routes it to one or more conversational agents on a remote agent
//! service, and weaves their replies back into the document as attributed
//! quotations. Optionally indexes the surrounding notes corpus into a
//! retrieval archive on the same service.

pub mod agent;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod index;
pub mod journal;
pub mod logging;
pub mod orchestrator;
pub mod service;
pub mod session;
pub mod tooling;
pub mod watch;

pub use agent::{AgentIdentity, AgentRegistry, AgentRole};
pub use config::{ConfigLoader, MarginaliaConfig};
pub use error::ApiError;
pub use journal::{extract_delta, format_response, has_engagement_cue, DeltaExtractor};
pub use orchestrator::{CompositionMode, Orchestrator};
pub use service::{AgentService, HttpAgentService};
pub use session::SessionController;
