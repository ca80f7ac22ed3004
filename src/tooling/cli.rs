//! CLI Tooling
//!
//! Command-line interface for journal sessions, agent management and corpus
//! indexing. Every command runs against one workspace and its resolved
//! configuration.

use crate::agent::{persona_for, AgentIdentity, AgentRegistry, AgentRole};
use crate::config::{ConfigLoader, MarginaliaConfig};
use crate::error::ApiError;
use crate::index::{chunk, CorpusIndexer};
use crate::journal::DeltaExtractor;
use crate::logging::LoggingConfig;
use crate::orchestrator::CompositionMode;
use crate::service::{AgentService, CreateAgentRequest, HttpAgentService};
use crate::session::{FileEditor, SessionController};
use crate::tooling::format::{
    format_agents_text, format_blocks_text, format_chunks_text, format_cycle_text,
    format_delta_text, format_index_report_text, format_models_text, format_status_text,
    StatusReport,
};
use crate::watch::{JournalWatchHandler, WatchConfig, WatchDaemon};
use clap::{Parser, Subcommand};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Marginalia - a journal companion that answers in the margins
#[derive(Parser)]
#[command(name = "marginalia")]
#[command(about = "Routes new journal writing to conversational agents and quotes their replies back")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (same as --log-level debug)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Apply logging flags over the configured logging section.
    pub fn logging_config(&self, base: &LoggingConfig) -> LoggingConfig {
        let mut config = base.clone();
        if self.verbose {
            config.level = "debug".to_string();
        }
        if let Some(level) = &self.log_level {
            config.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            config.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            config.file = Some(file.clone());
        }
        config
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the text written since the last agent reply
    Delta {
        /// Journal document
        file: PathBuf,
    },
    /// Run one response cycle on a document
    Respond {
        /// Journal document
        file: PathBuf,
        /// Respond even without an engagement cue or below the minimum length
        #[arg(long)]
        force: bool,
        /// Override the configured composition mode (single, sequential, parallel)
        #[arg(long)]
        mode: Option<CompositionMode>,
    },
    /// Watch a document and respond as writing settles
    Watch {
        /// Journal document
        file: PathBuf,
        /// Do not re-index corpus files as they change
        #[arg(long)]
        no_index: bool,
        /// Batch window in milliseconds
        #[arg(long, default_value = "250")]
        batch_window_ms: u64,
    },
    /// Index the workspace corpus into the configured archive
    Index,
    /// Show how a file would be split into passages
    Chunk {
        file: PathBuf,
        /// Maximum chunk size in characters
        #[arg(long)]
        max: Option<usize>,
        /// Overlap between consecutive chunks in characters
        #[arg(long)]
        overlap: Option<usize>,
    },
    /// Agent management commands
    Agent {
        #[command(subcommand)]
        command: AgentCommands,
    },
    /// List models available on the agent service
    Models,
    /// Show resolved configuration and agents
    Status {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

#[derive(Subcommand)]
pub enum AgentCommands {
    /// List configured agents in invocation order
    List,
    /// Create an agent on the service and add it to the roster
    Create {
        /// primary-responder, pattern-observer, memory-keeper, safety-monitor, custom
        #[arg(long)]
        role: AgentRole,
        /// Display name (defaults to the role's name)
        #[arg(long)]
        name: Option<String>,
        /// Model handle (defaults to service.default_model)
        #[arg(long)]
        model: Option<String>,
        /// Invocation order
        #[arg(long, default_value = "0")]
        order: u32,
    },
    /// Delete an agent from the service and the roster
    Remove {
        /// Agent ID or display name
        agent: String,
        /// Only remove the roster entry
        #[arg(long)]
        keep_remote: bool,
    },
    /// Show an agent's memory blocks
    Memory {
        /// Agent ID or display name
        agent: String,
    },
    /// Replace the value of one memory block
    SetMemory {
        /// Agent ID or display name
        agent: String,
        label: String,
        value: String,
    },
}

/// CLI context for executing commands
pub struct CliContext {
    workspace_root: PathBuf,
    config_path: Option<PathBuf>,
    config: MarginaliaConfig,
    registry: RwLock<AgentRegistry>,
    service: Arc<dyn AgentService>,
}

impl CliContext {
    /// Create a new CLI context
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = match &config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };

        // Config-declared agents first; saved agents fill in the rest.
        let mut registry = AgentRegistry::new();
        registry.load_from_config(&config)?;
        registry.load_from_storage()?;

        let service: Arc<dyn AgentService> = Arc::new(HttpAgentService::from_config(&config.service)?);
        let mut context = Self::with_parts(workspace_root, config, registry, service);
        context.config_path = config_path;
        Ok(context)
    }

    /// Assemble a context from already-resolved parts.
    pub fn with_parts(
        workspace_root: PathBuf,
        config: MarginaliaConfig,
        registry: AgentRegistry,
        service: Arc<dyn AgentService>,
    ) -> Self {
        Self {
            workspace_root,
            config_path: None,
            config,
            registry: RwLock::new(registry),
            service,
        }
    }

    pub fn config(&self) -> &MarginaliaConfig {
        &self.config
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Execute a CLI command
    pub async fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let started = Instant::now();
        let result = match command {
            Commands::Delta { file } => self.handle_delta(file),
            Commands::Respond { file, force, mode } => self.handle_respond(file, *force, *mode).await,
            Commands::Watch {
                file,
                no_index,
                batch_window_ms,
            } => self.handle_watch(file, *no_index, *batch_window_ms).await,
            Commands::Index => self.handle_index().await,
            Commands::Chunk { file, max, overlap } => self.handle_chunk(file, *max, *overlap),
            Commands::Agent { command } => self.handle_agent(command).await,
            Commands::Models => self
                .service
                .list_models()
                .await
                .map(|models| format_models_text(&models)),
            Commands::Status { format } => self.handle_status(format),
        };
        info!(
            command = command_name(command),
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn resolve_document(&self, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.workspace_root.join(file)
        }
    }

    fn session_for(&self, file: &Path, mode: Option<CompositionMode>) -> SessionController {
        SessionController::new(
            Arc::new(FileEditor::new(self.resolve_document(file))),
            Arc::clone(&self.service),
            self.registry.read().list_all().to_vec(),
            mode.unwrap_or(self.config.composition),
            self.config.journal.clone(),
        )
    }

    fn handle_delta(&self, file: &Path) -> Result<String, ApiError> {
        let path = self.resolve_document(file);
        let text = std::fs::read_to_string(&path).map_err(|source| ApiError::Read {
            path: path.clone(),
            source,
        })?;
        let extractor = DeltaExtractor::new(
            self.registry.read().attributions(&self.config.journal.label),
            self.config.journal.scope_to_section,
        );
        Ok(format_delta_text(&extractor.extract(&text)))
    }

    async fn handle_respond(
        &self,
        file: &Path,
        force: bool,
        mode: Option<CompositionMode>,
    ) -> Result<String, ApiError> {
        let session = self.session_for(file, mode);
        let outcome = session.run_cycle(force).await?;
        Ok(format_cycle_text(&outcome, &session.status()))
    }

    async fn handle_watch(
        &self,
        file: &Path,
        no_index: bool,
        batch_window_ms: u64,
    ) -> Result<String, ApiError> {
        let document = self.resolve_document(file);
        if !document.is_file() {
            return Err(ApiError::Read {
                path: document,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            });
        }
        let session = Arc::new(self.session_for(file, None));
        let indexer = if self.config.indexing.enabled && !no_index {
            Some(Arc::new(self.indexer()))
        } else {
            None
        };
        let handler = JournalWatchHandler::new(&document, Arc::clone(&session), indexer);

        let mut watch_config = WatchConfig::new(self.workspace_root.clone());
        watch_config.batch_window_ms = batch_window_ms;
        let daemon = WatchDaemon::new(watch_config);
        let result = daemon
            .run(&handler, async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!(error = %e, "Failed to listen for ctrl-c");
                }
            })
            .await;
        session.cancel_pending();
        result?;
        Ok(format!("Stopped watching {}", document.display()))
    }

    fn indexer(&self) -> CorpusIndexer {
        CorpusIndexer::new(
            Arc::clone(&self.service),
            self.config.indexing.clone(),
            self.workspace_root.clone(),
        )
    }

    async fn handle_index(&self) -> Result<String, ApiError> {
        let report = self.indexer().index_all().await?;
        Ok(format_index_report_text(&report))
    }

    fn handle_chunk(
        &self,
        file: &Path,
        max: Option<usize>,
        overlap: Option<usize>,
    ) -> Result<String, ApiError> {
        let path = self.resolve_document(file);
        let text = std::fs::read_to_string(&path).map_err(|source| ApiError::Read {
            path: path.clone(),
            source,
        })?;
        let source_id = self.indexer().source_id(&path);
        let chunks = chunk(
            &text,
            &source_id,
            max.unwrap_or(self.config.indexing.max_chunk_chars),
            overlap.unwrap_or(self.config.indexing.overlap_chars),
        )?;
        Ok(format_chunks_text(&chunks))
    }

    async fn handle_agent(&self, command: &AgentCommands) -> Result<String, ApiError> {
        match command {
            AgentCommands::List => Ok(format_agents_text(&self.roster())),
            AgentCommands::Create {
                role,
                name,
                model,
                order,
            } => self.handle_agent_create(*role, name.as_deref(), model.as_deref(), *order).await,
            AgentCommands::Remove { agent, keep_remote } => {
                self.handle_agent_remove(agent, *keep_remote).await
            }
            AgentCommands::Memory { agent } => {
                let identity = self.resolve_agent(agent)?;
                let blocks = self.service.list_blocks(&identity.agent_id).await?;
                Ok(format_blocks_text(&identity, &blocks))
            }
            AgentCommands::SetMemory { agent, label, value } => {
                let identity = self.resolve_agent(agent)?;
                let block = self
                    .service
                    .update_block(&identity.agent_id, label, value)
                    .await?;
                Ok(format!(
                    "Updated block '{}' for {} ({} chars)",
                    block.label,
                    identity.display_name,
                    block.value.chars().count()
                ))
            }
        }
    }

    /// Every configured agent, disabled ones included, in invocation order.
    fn roster(&self) -> Vec<AgentIdentity> {
        let mut agents = self.registry.read().list_all().to_vec();
        agents.sort_by_key(|a| a.order);
        agents
    }

    fn resolve_agent(&self, key: &str) -> Result<AgentIdentity, ApiError> {
        self.registry.read().resolve(key).cloned()
    }

    async fn handle_agent_create(
        &self,
        role: AgentRole,
        name: Option<&str>,
        model: Option<&str>,
        order: u32,
    ) -> Result<String, ApiError> {
        let name = name.unwrap_or_else(|| role.default_display_name()).to_string();
        crate::journal::validate_label(&name).map_err(ApiError::ConfigError)?;
        let model = model
            .map(str::to_string)
            .or_else(|| self.config.service.default_model.clone())
            .ok_or_else(|| {
                ApiError::ConfigError(
                    "No model given: pass --model or set service.default_model".to_string(),
                )
            })?;

        let request = CreateAgentRequest {
            name: name.clone(),
            persona: persona_for(role).to_string(),
            model,
        };
        let agent_id = self.service.create_agent(&request).await?;
        let identity = AgentIdentity::new(agent_id.clone(), name.clone(), role).with_order(order);

        let mut registry = self.registry.write();
        registry.save_agent(&identity)?;
        let path = registry.agent_config_path(&agent_id)?;
        registry.register(identity);
        info!(agent_id = %agent_id, role = %role, "Agent created");
        Ok(format!(
            "Created agent {} ({})\nSaved to {}",
            name,
            agent_id,
            path.display()
        ))
    }

    async fn handle_agent_remove(&self, key: &str, keep_remote: bool) -> Result<String, ApiError> {
        let identity = self.resolve_agent(key)?;
        if !keep_remote {
            self.service.delete_agent(&identity.agent_id).await?;
        }

        let mut registry = self.registry.write();
        let note = match registry.delete_agent_config(&identity.agent_id) {
            Ok(()) => String::new(),
            Err(ApiError::AgentNotFound(_)) => {
                "\nThis agent is declared in a config file; remove it there as well.".to_string()
            }
            Err(e) => return Err(e),
        };
        registry.remove(&identity.agent_id);
        info!(agent_id = %identity.agent_id, keep_remote, "Agent removed");
        Ok(format!(
            "Removed agent {} ({}){}",
            identity.display_name, identity.agent_id, note
        ))
    }

    fn status_report(&self) -> StatusReport {
        let config_file = self
            .config_path
            .clone()
            .or_else(|| {
                let path = ConfigLoader::workspace_config_path(&self.workspace_root);
                path.is_file().then_some(path)
            })
            .map(|p| p.display().to_string());
        StatusReport {
            workspace: self.workspace_root.display().to_string(),
            config_file,
            service_url: self.config.service.base_url.clone(),
            api_key_set: self.config.service.resolved_api_key().is_some(),
            label: self.config.journal.label.clone(),
            composition: self.config.composition.to_string(),
            scope_to_section: self.config.journal.scope_to_section,
            passive_observation: self.config.journal.passive_observation,
            debounce_ms: self.config.journal.debounce_ms,
            agents: self.roster(),
            indexing_enabled: self.config.indexing.enabled,
            archive_id: self.config.indexing.archive_id.clone(),
        }
    }

    fn handle_status(&self, format: &str) -> Result<String, ApiError> {
        let report = self.status_report();
        match format {
            "json" => Ok(serde_json::to_string_pretty(&report)?),
            "text" => Ok(format_status_text(&report)),
            other => Err(ApiError::ConfigError(format!(
                "Invalid format: {} (must be 'text' or 'json')",
                other
            ))),
        }
    }
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Delta { .. } => "delta",
        Commands::Respond { .. } => "respond",
        Commands::Watch { .. } => "watch",
        Commands::Index => "index",
        Commands::Chunk { .. } => "chunk",
        Commands::Agent { .. } => "agent",
        Commands::Models => "models",
        Commands::Status { .. } => "status",
    }
}
