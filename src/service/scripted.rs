//! In-memory agent service with scripted replies.
//!
//! Used by tests and offline runs. Replies are queued per agent; every call
//! is recorded so callers can assert on what was sent and in which order.

use super::{AgentService, CreateAgentRequest, MemoryBlock, ModelInfo, Passage};
use crate::error::ApiError;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Scripted {
    Reply(String),
    Fail(String),
}

#[derive(Default)]
struct State {
    replies: HashMap<String, VecDeque<Scripted>>,
    delays: HashMap<String, Duration>,
    sent: Vec<(String, String)>,
    blocks: HashMap<String, Vec<MemoryBlock>>,
    passages: HashMap<String, Vec<Passage>>,
    fail_passages_containing: Vec<String>,
    created: Vec<CreateAgentRequest>,
    deleted: Vec<String>,
    models: Vec<ModelInfo>,
    next_id: u64,
}

#[derive(Default)]
pub struct ScriptedAgentService {
    state: Mutex<State>,
    default_reply: Option<String>,
}

impl ScriptedAgentService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply used when an agent has no queued reply. Without one, unscripted
    /// calls fail.
    pub fn with_default_reply(mut self, reply: impl Into<String>) -> Self {
        self.default_reply = Some(reply.into());
        self
    }

    pub fn reply(self, agent_id: &str, reply: impl Into<String>) -> Self {
        self.push(agent_id, Scripted::Reply(reply.into()));
        self
    }

    pub fn fail(self, agent_id: &str, message: impl Into<String>) -> Self {
        self.push(agent_id, Scripted::Fail(message.into()));
        self
    }

    /// Delay every reply from `agent_id`.
    pub fn delay(self, agent_id: &str, delay: Duration) -> Self {
        self.state.lock().delays.insert(agent_id.to_string(), delay);
        self
    }

    pub fn model(self, handle: &str, provider: &str) -> Self {
        self.state.lock().models.push(ModelInfo {
            handle: handle.to_string(),
            provider: provider.to_string(),
        });
        self
    }

    /// Fail passage inserts whose text contains `needle`.
    pub fn fail_passages_containing(self, needle: impl Into<String>) -> Self {
        self.state
            .lock()
            .fail_passages_containing
            .push(needle.into());
        self
    }

    fn push(&self, agent_id: &str, scripted: Scripted) {
        self.state
            .lock()
            .replies
            .entry(agent_id.to_string())
            .or_default()
            .push_back(scripted);
    }

    /// Every `(agent_id, text)` sent, in call order.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.state.lock().sent.clone()
    }

    pub fn sent_to(&self, agent_id: &str) -> Vec<String> {
        self.state
            .lock()
            .sent
            .iter()
            .filter(|(id, _)| id == agent_id)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn created(&self) -> Vec<CreateAgentRequest> {
        self.state.lock().created.clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.state.lock().deleted.clone()
    }

    pub fn passages(&self, archive_id: &str) -> Vec<Passage> {
        self.state
            .lock()
            .passages
            .get(archive_id)
            .cloned()
            .unwrap_or_default()
    }

    fn next_id(&self, prefix: &str) -> String {
        let mut state = self.state.lock();
        state.next_id += 1;
        format!("{}-{}", prefix, state.next_id)
    }
}

#[async_trait]
impl AgentService for ScriptedAgentService {
    async fn send_message(&self, agent_id: &str, text: &str) -> Result<String, ApiError> {
        let (scripted, delay) = {
            let mut state = self.state.lock();
            state.sent.push((agent_id.to_string(), text.to_string()));
            let scripted = state
                .replies
                .get_mut(agent_id)
                .and_then(VecDeque::pop_front);
            (scripted, state.delays.get(agent_id).copied())
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match scripted {
            Some(Scripted::Reply(reply)) => Ok(reply),
            Some(Scripted::Fail(message)) => Err(ApiError::ProviderRequestFailed(message)),
            None => self.default_reply.clone().ok_or_else(|| {
                ApiError::ProviderError(format!("no scripted reply for {}", agent_id))
            }),
        }
    }

    async fn create_agent(&self, request: &CreateAgentRequest) -> Result<String, ApiError> {
        let id = self.next_id("agent");
        let mut state = self.state.lock();
        state.created.push(request.clone());
        state.blocks.insert(
            id.clone(),
            vec![
                MemoryBlock {
                    id: None,
                    label: "persona".to_string(),
                    value: request.persona.clone(),
                },
                MemoryBlock {
                    id: None,
                    label: "human".to_string(),
                    value: String::new(),
                },
            ],
        );
        Ok(id)
    }

    async fn delete_agent(&self, agent_id: &str) -> Result<(), ApiError> {
        let mut state = self.state.lock();
        state.blocks.remove(agent_id);
        state.deleted.push(agent_id.to_string());
        Ok(())
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, ApiError> {
        Ok(self.state.lock().models.clone())
    }

    async fn list_blocks(&self, agent_id: &str) -> Result<Vec<MemoryBlock>, ApiError> {
        self.state
            .lock()
            .blocks
            .get(agent_id)
            .cloned()
            .ok_or_else(|| ApiError::AgentNotFound(agent_id.to_string()))
    }

    async fn update_block(
        &self,
        agent_id: &str,
        label: &str,
        value: &str,
    ) -> Result<MemoryBlock, ApiError> {
        let mut state = self.state.lock();
        let blocks = state
            .blocks
            .get_mut(agent_id)
            .ok_or_else(|| ApiError::AgentNotFound(agent_id.to_string()))?;
        let block = blocks
            .iter_mut()
            .find(|b| b.label == label)
            .ok_or_else(|| ApiError::ProviderError(format!("no memory block '{}'", label)))?;
        block.value = value.to_string();
        Ok(block.clone())
    }

    async fn insert_passage(
        &self,
        archive_id: &str,
        text: &str,
        metadata: &Map<String, Value>,
    ) -> Result<Passage, ApiError> {
        let failing = self
            .state
            .lock()
            .fail_passages_containing
            .iter()
            .any(|needle| text.contains(needle.as_str()));
        if failing {
            return Err(ApiError::ProviderRequestFailed(
                "passage insert rejected".to_string(),
            ));
        }

        let passage = Passage {
            id: self.next_id("passage"),
            text: text.to_string(),
            metadata: metadata.clone(),
        };
        self.state
            .lock()
            .passages
            .entry(archive_id.to_string())
            .or_default()
            .push(passage.clone());
        Ok(passage)
    }

    async fn list_passages(&self, archive_id: &str) -> Result<Vec<Passage>, ApiError> {
        Ok(self.passages(archive_id))
    }

    async fn delete_passage(&self, archive_id: &str, passage_id: &str) -> Result<(), ApiError> {
        if let Some(passages) = self.state.lock().passages.get_mut(archive_id) {
            passages.retain(|p| p.id != passage_id);
        }
        Ok(())
    }
}
