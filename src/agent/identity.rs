//! Agent identity and role types.

use crate::agent::persona::persona_for;
use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed role vocabulary. Each role maps to a fixed persona used when the
/// agent is created on the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentRole {
    PrimaryResponder,
    PatternObserver,
    MemoryKeeper,
    SafetyMonitor,
    Custom,
}

impl AgentRole {
    pub const ALL: [AgentRole; 5] = [
        AgentRole::PrimaryResponder,
        AgentRole::PatternObserver,
        AgentRole::MemoryKeeper,
        AgentRole::SafetyMonitor,
        AgentRole::Custom,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            AgentRole::PrimaryResponder => "primary-responder",
            AgentRole::PatternObserver => "pattern-observer",
            AgentRole::MemoryKeeper => "memory-keeper",
            AgentRole::SafetyMonitor => "safety-monitor",
            AgentRole::Custom => "custom",
        }
    }

    pub fn default_display_name(&self) -> &'static str {
        match self {
            AgentRole::PrimaryResponder => "Companion",
            AgentRole::PatternObserver => "Pattern Observer",
            AgentRole::MemoryKeeper => "Memory Keeper",
            AgentRole::SafetyMonitor => "Safety Monitor",
            AgentRole::Custom => "Agent",
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for AgentRole {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgentRole::ALL
            .iter()
            .copied()
            .find(|role| role.slug() == s)
            .ok_or_else(|| {
                ApiError::ConfigError(format!(
                    "Invalid role: {}. Must be one of primary-responder, pattern-observer, memory-keeper, safety-monitor, custom",
                    s
                ))
            })
    }
}

fn default_true() -> bool {
    true
}

/// A configured agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentIdentity {
    /// Identifier on the agent service
    pub agent_id: String,
    /// Name used in attributions and transcripts
    pub display_name: String,
    pub role: AgentRole,
    /// Invocation order; ties keep configuration order
    #[serde(default)]
    pub order: u32,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Persona override, only meaningful for custom agents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,
}

impl AgentIdentity {
    pub fn new(agent_id: impl Into<String>, display_name: impl Into<String>, role: AgentRole) -> Self {
        Self {
            agent_id: agent_id.into(),
            display_name: display_name.into(),
            role,
            order: 0,
            enabled: true,
            persona: None,
        }
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    /// Persona text sent at creation time.
    pub fn persona_text(&self) -> &str {
        match (&self.role, &self.persona) {
            (_, Some(persona)) if !persona.trim().is_empty() => persona,
            (role, _) => persona_for(*role),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.agent_id.trim().is_empty() {
            return Err("Agent ID cannot be empty".to_string());
        }
        crate::journal::validate_label(&self.display_name)
            .map_err(|e| format!("Agent '{}': {}", self.agent_id, e))?;
        if let Some(persona) = &self.persona {
            if persona.trim().is_empty() {
                return Err(format!(
                    "Agent '{}': persona cannot be empty if provided",
                    self.agent_id
                ));
            }
        }
        Ok(())
    }
}
