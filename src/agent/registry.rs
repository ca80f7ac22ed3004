//! Agent registry.
//!
//! Holds the configured agents in configuration order and delegates
//! persistence to the storage port.

use crate::agent::identity::AgentIdentity;
use crate::agent::storage::{AgentStorage, XdgAgentStorage};
use crate::config::MarginaliaConfig;
use crate::error::ApiError;
use crate::journal::AttributionSet;
use std::path::PathBuf;
use std::sync::Arc;

pub struct AgentRegistry {
    agents: Vec<AgentIdentity>,
    storage: Arc<dyn AgentStorage>,
}

impl AgentRegistry {
    /// Create an empty registry backed by XDG storage
    pub fn new() -> Self {
        Self::with_storage(Arc::new(XdgAgentStorage::new()))
    }

    pub fn with_storage(storage: Arc<dyn AgentStorage>) -> Self {
        Self {
            agents: Vec::new(),
            storage,
        }
    }

    /// Register an agent, replacing any agent with the same ID in place.
    pub fn register(&mut self, identity: AgentIdentity) {
        match self
            .agents
            .iter_mut()
            .find(|a| a.agent_id == identity.agent_id)
        {
            Some(existing) => *existing = identity,
            None => self.agents.push(identity),
        }
    }

    pub fn get(&self, agent_id: &str) -> Option<&AgentIdentity> {
        self.agents.iter().find(|a| a.agent_id == agent_id)
    }

    pub fn get_or_error(&self, agent_id: &str) -> Result<&AgentIdentity, ApiError> {
        self.get(agent_id)
            .ok_or_else(|| ApiError::AgentNotFound(agent_id.to_string()))
    }

    /// Look up by agent ID, then by display name (case-insensitive).
    pub fn resolve(&self, key: &str) -> Result<&AgentIdentity, ApiError> {
        self.get(key)
            .or_else(|| {
                self.agents
                    .iter()
                    .find(|a| a.display_name.eq_ignore_ascii_case(key))
            })
            .ok_or_else(|| ApiError::AgentNotFound(key.to_string()))
    }

    pub fn list_all(&self) -> &[AgentIdentity] {
        &self.agents
    }

    pub fn remove(&mut self, agent_id: &str) -> Option<AgentIdentity> {
        let index = self.agents.iter().position(|a| a.agent_id == agent_id)?;
        Some(self.agents.remove(index))
    }

    /// Enabled agents sorted by `order`. Ties keep registration order.
    pub fn active(&self) -> Vec<AgentIdentity> {
        let mut active: Vec<AgentIdentity> =
            self.agents.iter().filter(|a| a.enabled).cloned().collect();
        active.sort_by_key(|a| a.order);
        active
    }

    /// Markers that count as a reply in this workspace.
    pub fn attributions(&self, label: &str) -> AttributionSet {
        attribution_set(label, &self.agents)
    }

    /// Load agents declared in the `[[agents]]` configuration tables.
    pub fn load_from_config(&mut self, config: &MarginaliaConfig) -> Result<(), ApiError> {
        for identity in &config.agents {
            identity.validate().map_err(ApiError::ConfigError)?;
            self.register(identity.clone());
        }
        Ok(())
    }

    /// Load agents saved under the agents directory. Config-declared agents
    /// with the same ID win.
    pub fn load_from_storage(&mut self) -> Result<(), ApiError> {
        for stored in self.storage.list()? {
            if self.get(&stored.agent_id).is_none() {
                self.agents.push(stored.identity);
            }
        }
        Ok(())
    }

    pub fn save_agent(&self, identity: &AgentIdentity) -> Result<(), ApiError> {
        self.storage.save(identity)
    }

    pub fn delete_agent_config(&self, agent_id: &str) -> Result<(), ApiError> {
        self.storage.delete(agent_id)
    }

    pub fn agent_config_path(&self, agent_id: &str) -> Result<PathBuf, ApiError> {
        self.storage.path_for(agent_id)
    }

    pub fn agents_dir(&self) -> Result<PathBuf, ApiError> {
        self.storage.agents_dir()
    }
}

/// The user-facing label plus every agent's display name. Disabled agents
/// stay in the set so their earlier replies still end the writer's text.
pub fn attribution_set(label: &str, agents: &[AgentIdentity]) -> AttributionSet {
    AttributionSet::new(
        std::iter::once(label).chain(agents.iter().map(|a| a.display_name.as_str())),
    )
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
