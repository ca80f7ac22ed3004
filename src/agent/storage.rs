//! Agent storage: one TOML file per agent under the agents directory.

use crate::agent::identity::AgentIdentity;
use crate::error::ApiError;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct StoredAgentConfig {
    pub agent_id: String,
    pub identity: AgentIdentity,
    pub path: PathBuf,
}

pub trait AgentStorage: Send + Sync {
    fn list(&self) -> Result<Vec<StoredAgentConfig>, ApiError>;
    fn path_for(&self, agent_id: &str) -> Result<PathBuf, ApiError>;
    fn save(&self, identity: &AgentIdentity) -> Result<(), ApiError>;
    fn delete(&self, agent_id: &str) -> Result<(), ApiError>;
    fn agents_dir(&self) -> Result<PathBuf, ApiError>;
}

/// Stores agents in `$XDG_CONFIG_HOME/marginalia/agents/`, or in an explicit
/// directory.
#[derive(Debug, Clone, Default)]
pub struct XdgAgentStorage {
    dir: Option<PathBuf>,
}

impl XdgAgentStorage {
    pub fn new() -> Self {
        Self { dir: None }
    }

    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    fn ensure_dir(&self) -> Result<PathBuf, ApiError> {
        let dir = self.agents_dir()?;
        std::fs::create_dir_all(&dir).map_err(|e| {
            ApiError::ConfigError(format!(
                "Failed to create agents directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        Ok(dir)
    }
}

fn check_agent_id(agent_id: &str) -> Result<(), ApiError> {
    let valid = !agent_id.is_empty()
        && agent_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        && agent_id != "."
        && agent_id != "..";
    if valid {
        Ok(())
    } else {
        Err(ApiError::ConfigError(format!(
            "Agent ID '{}' cannot be used as a file name",
            agent_id
        )))
    }
}

fn load_file(path: &Path) -> Option<StoredAgentConfig> {
    let file_id = match path.file_stem().and_then(|s| s.to_str()) {
        Some(id) => id.to_string(),
        None => {
            tracing::warn!("Invalid agent filename non UTF8: {:?}", path);
            return None;
        }
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to read agent config {}: {}", path.display(), e);
            return None;
        }
    };

    let identity: AgentIdentity = match toml::from_str(&content) {
        Ok(identity) => identity,
        Err(e) => {
            tracing::error!("Failed to parse agent config {}: {}", path.display(), e);
            return None;
        }
    };

    if identity.agent_id != file_id {
        tracing::warn!(
            "Agent ID mismatch in {}: filename={}, config={}",
            path.display(),
            file_id,
            identity.agent_id
        );
    }

    if let Err(e) = identity.validate() {
        tracing::error!("Invalid agent config {}: {}", path.display(), e);
        return None;
    }

    Some(StoredAgentConfig {
        agent_id: identity.agent_id.clone(),
        identity,
        path: path.to_path_buf(),
    })
}

impl AgentStorage for XdgAgentStorage {
    fn list(&self) -> Result<Vec<StoredAgentConfig>, ApiError> {
        let dir = self.agents_dir()?;
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&dir).map_err(|e| {
            ApiError::ConfigError(format!(
                "Failed to read agents directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if path.extension() == Some(std::ffi::OsStr::new("toml")) {
                        paths.push(path);
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to read directory entry in {}: {}", dir.display(), e);
                }
            }
        }
        paths.sort();

        Ok(paths.iter().filter_map(|p| load_file(p)).collect())
    }

    fn path_for(&self, agent_id: &str) -> Result<PathBuf, ApiError> {
        check_agent_id(agent_id)?;
        Ok(self.agents_dir()?.join(format!("{}.toml", agent_id)))
    }

    fn save(&self, identity: &AgentIdentity) -> Result<(), ApiError> {
        identity.validate().map_err(ApiError::ConfigError)?;
        let path = self.path_for(&identity.agent_id)?;
        self.ensure_dir()?;

        let content = toml::to_string_pretty(identity).map_err(|e| {
            ApiError::ConfigError(format!("Failed to serialize agent config: {}", e))
        })?;

        std::fs::write(&path, content).map_err(|e| {
            ApiError::ConfigError(format!(
                "Failed to write agent config to {}: {}",
                path.display(),
                e
            ))
        })
    }

    fn delete(&self, agent_id: &str) -> Result<(), ApiError> {
        let path = self.path_for(agent_id)?;
        if !path.exists() {
            return Err(ApiError::AgentNotFound(agent_id.to_string()));
        }
        std::fs::remove_file(&path).map_err(|e| {
            ApiError::ConfigError(format!(
                "Failed to delete agent config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    fn agents_dir(&self) -> Result<PathBuf, ApiError> {
        match &self.dir {
            Some(dir) => Ok(dir.clone()),
            None => crate::config::xdg::agents_dir(),
        }
    }
}
