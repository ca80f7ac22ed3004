//! Configuration
//!
//! Layered with the `config` crate. Precedence, lowest first: built-in
//! defaults, the global file `$XDG_CONFIG_HOME/marginalia/config.toml`, the
//! workspace file `marginalia.toml`, then `MARGINALIA__SECTION__KEY`
//! environment variables.

pub mod loader;
pub mod xdg;

use crate::agent::AgentIdentity;
use crate::error::ApiError;
use crate::journal::validate_label;
use crate::logging::LoggingConfig;
use crate::orchestrator::CompositionMode;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub use loader::ConfigLoader;

/// Environment variable holding the service API key when the config does not.
pub const API_KEY_ENV: &str = "MARGINALIA_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarginaliaConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub journal: JournalConfig,
    #[serde(default)]
    pub composition: CompositionMode,
    #[serde(default)]
    pub agents: Vec<AgentIdentity>,
    #[serde(default)]
    pub indexing: IndexingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Per-call network timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Model handle for newly created agents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:8283".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            default_model: None,
        }
    }
}

impl ServiceConfig {
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalConfig {
    /// Attribution label for merged replies
    #[serde(default = "default_label")]
    pub label: String,
    /// Only read the writer's text under a Journal heading
    #[serde(default = "default_true")]
    pub scope_to_section: bool,
    /// Quiet period before a passive cycle starts
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Passive deltas shorter than this are not sent
    #[serde(default = "default_min_delta_chars")]
    pub min_delta_chars: usize,
    /// Send uncued deltas with passive framing; when off only cued or forced
    /// deltas are sent
    #[serde(default = "default_true")]
    pub passive_observation: bool,
}

fn default_label() -> String {
    "Companion".to_string()
}

fn default_debounce_ms() -> u64 {
    3000
}

fn default_min_delta_chars() -> usize {
    10
}

fn default_true() -> bool {
    true
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            label: default_label(),
            scope_to_section: true,
            debounce_ms: default_debounce_ms(),
            min_delta_chars: default_min_delta_chars(),
            passive_observation: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Archive that receives the passages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_id: Option<String>,
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,
    #[serde(default = "default_overlap_chars")]
    pub overlap_chars: usize,
    #[serde(default = "default_min_content_chars")]
    pub min_content_chars: usize,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
}

fn default_max_chunk_chars() -> usize {
    1000
}

fn default_overlap_chars() -> usize {
    100
}

fn default_min_content_chars() -> usize {
    50
}

fn default_extensions() -> Vec<String> {
    vec!["md".to_string()]
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            archive_id: None,
            max_chunk_chars: default_max_chunk_chars(),
            overlap_chars: default_overlap_chars(),
            min_content_chars: default_min_content_chars(),
            extensions: default_extensions(),
            ignore_patterns: Vec::new(),
        }
    }
}

impl MarginaliaConfig {
    /// Check cross-field constraints the types cannot express.
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();

        if let Err(e) = validate_label(&self.journal.label) {
            errors.push(format!("journal.label: {}", e));
        }
        if self.journal.debounce_ms == 0 {
            errors.push("journal.debounce_ms must be greater than 0".to_string());
        }
        if self.service.timeout_secs == 0 {
            errors.push("service.timeout_secs must be greater than 0".to_string());
        }
        if self.indexing.max_chunk_chars == 0 {
            errors.push("indexing.max_chunk_chars must be greater than 0".to_string());
        }
        if self.indexing.overlap_chars >= self.indexing.max_chunk_chars {
            errors.push(format!(
                "indexing.overlap_chars ({}) must be less than indexing.max_chunk_chars ({})",
                self.indexing.overlap_chars, self.indexing.max_chunk_chars
            ));
        }
        if self.indexing.enabled && self.indexing.archive_id.is_none() {
            errors.push("indexing.archive_id is required when indexing is enabled".to_string());
        }

        let mut seen = HashSet::new();
        for agent in &self.agents {
            if let Err(e) = agent.validate() {
                errors.push(e);
            }
            if !seen.insert(agent.agent_id.as_str()) {
                errors.push(format!("Duplicate agent ID: {}", agent.agent_id));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::ConfigError(errors.join("; ")))
        }
    }
}
