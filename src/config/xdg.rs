//! XDG base directories.

use crate::error::ApiError;
use std::path::PathBuf;

const APP_DIR: &str = "marginalia";

/// `$XDG_CONFIG_HOME`, else the platform config dir.
pub fn config_home() -> Result<PathBuf, ApiError> {
    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg_config_home.is_empty() {
            return Ok(PathBuf::from(xdg_config_home));
        }
    }

    directories::BaseDirs::new()
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| {
            ApiError::ConfigError(
                "Could not determine XDG config home directory (HOME not set)".to_string(),
            )
        })
}

/// `$XDG_CONFIG_HOME/marginalia/`
pub fn app_config_dir() -> Result<PathBuf, ApiError> {
    Ok(config_home()?.join(APP_DIR))
}

/// `$XDG_CONFIG_HOME/marginalia/config.toml`
pub fn global_config_path() -> Result<PathBuf, ApiError> {
    Ok(app_config_dir()?.join("config.toml"))
}

/// `$XDG_CONFIG_HOME/marginalia/agents/`. Not created here; storage creates
/// it on first save.
pub fn agents_dir() -> Result<PathBuf, ApiError> {
    Ok(app_config_dir()?.join("agents"))
}
