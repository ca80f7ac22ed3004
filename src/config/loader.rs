//! Config source layering.

use super::{xdg, MarginaliaConfig};
use crate::error::ApiError;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the per-workspace config file.
pub const WORKSPACE_CONFIG_FILE: &str = "marginalia.toml";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load global file, workspace file and environment, then validate.
    pub fn load(workspace_root: &Path) -> Result<MarginaliaConfig, ApiError> {
        let global = xdg::global_config_path().ok();
        Self::load_layers(global.as_deref(), workspace_root)
    }

    /// Load one explicit file with the environment overlay.
    pub fn load_from_file(path: &Path) -> Result<MarginaliaConfig, ApiError> {
        let builder = Config::builder().add_source(
            File::from(path.to_path_buf())
                .format(FileFormat::Toml)
                .required(true),
        );
        finish(with_environment(builder))
    }

    pub fn workspace_config_path(workspace_root: &Path) -> PathBuf {
        workspace_root.join(WORKSPACE_CONFIG_FILE)
    }

    pub(crate) fn load_layers(
        global: Option<&Path>,
        workspace_root: &Path,
    ) -> Result<MarginaliaConfig, ApiError> {
        let mut builder = Config::builder();
        if let Some(global) = global {
            debug!(path = %global.display(), "Global config layer");
            builder = builder.add_source(optional_toml(global));
        }
        let workspace_file = Self::workspace_config_path(workspace_root);
        debug!(path = %workspace_file.display(), "Workspace config layer");
        builder = builder.add_source(optional_toml(&workspace_file));
        finish(with_environment(builder))
    }
}

fn optional_toml(path: &Path) -> File<config::FileSourceFile, FileFormat> {
    File::from(path.to_path_buf())
        .format(FileFormat::Toml)
        .required(false)
}

/// `MARGINALIA__JOURNAL__LABEL=...` style overrides.
fn with_environment(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("MARGINALIA")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    )
}

fn finish(builder: ConfigBuilder<DefaultState>) -> Result<MarginaliaConfig, ApiError> {
    // Missing keys fall back to the serde defaults on each section.
    let config: MarginaliaConfig = builder.build()?.try_deserialize()?;
    config.validate()?;
    Ok(config)
}
