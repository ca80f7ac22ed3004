//! Agent service port
//!
//! The remote conversational-agent service is a black-box RPC peer: it holds
//! the agents, their memory blocks and the archives used for retrieval. The
//! rest of the crate talks to it only through [`AgentService`].

pub mod http;
pub mod reply;
pub mod scripted;

use crate::error::ApiError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use http::HttpAgentService;
pub use reply::parse_reply;
pub use scripted::ScriptedAgentService;

/// A model the service can run agents on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub handle: String,
    #[serde(default, alias = "provider_name", alias = "model_endpoint_type")]
    pub provider: String,
}

/// A named block of an agent's core memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub label: String,
    #[serde(default)]
    pub value: String,
}

/// A passage stored in an archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Passage {
    /// The `source` metadata entry, used to group passages by file.
    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").and_then(Value::as_str)
    }
}

/// Parameters for creating an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateAgentRequest {
    pub name: String,
    pub persona: String,
    pub model: String,
}

#[async_trait]
pub trait AgentService: Send + Sync {
    /// Send user text to an agent and return its reply text. The reply may
    /// be the listening sentinel or empty.
    async fn send_message(&self, agent_id: &str, text: &str) -> Result<String, ApiError>;

    /// Create an agent and return its service-side ID.
    async fn create_agent(&self, request: &CreateAgentRequest) -> Result<String, ApiError>;

    async fn delete_agent(&self, agent_id: &str) -> Result<(), ApiError>;

    async fn list_models(&self) -> Result<Vec<ModelInfo>, ApiError>;

    async fn list_blocks(&self, agent_id: &str) -> Result<Vec<MemoryBlock>, ApiError>;

    async fn update_block(
        &self,
        agent_id: &str,
        label: &str,
        value: &str,
    ) -> Result<MemoryBlock, ApiError>;

    async fn insert_passage(
        &self,
        archive_id: &str,
        text: &str,
        metadata: &Map<String, Value>,
    ) -> Result<Passage, ApiError>;

    async fn list_passages(&self, archive_id: &str) -> Result<Vec<Passage>, ApiError>;

    async fn delete_passage(&self, archive_id: &str, passage_id: &str) -> Result<(), ApiError>;
}
