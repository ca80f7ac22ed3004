//! Agent orchestration
//!
//! One routine drives every composition mode. The mode picks how agents are
//! invoked (one, in turn, or concurrently) and how their replies merge.
//! Remote failures never escape: each becomes an empty slot in the result.

pub mod merge;
pub mod prompt;

use crate::agent::AgentIdentity;
use crate::error::ApiError;
use crate::journal::is_listening_sentinel;
use crate::service::AgentService;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub use merge::{merge_outputs, MergeStrategy};
pub use prompt::{frame_delta, with_transcript, Framing};

/// How the enabled agents respond to one delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositionMode {
    #[default]
    Single,
    Sequential,
    Parallel,
}

impl CompositionMode {
    pub fn merge_strategy(&self) -> MergeStrategy {
        match self {
            CompositionMode::Single | CompositionMode::Parallel => MergeStrategy::Independent,
            CompositionMode::Sequential => MergeStrategy::Transcript,
        }
    }
}

impl fmt::Display for CompositionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompositionMode::Single => "single",
            CompositionMode::Sequential => "sequential",
            CompositionMode::Parallel => "parallel",
        };
        f.write_str(s)
    }
}

impl FromStr for CompositionMode {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "single" => Ok(CompositionMode::Single),
            "sequential" => Ok(CompositionMode::Sequential),
            "parallel" => Ok(CompositionMode::Parallel),
            other => Err(ApiError::ConfigError(format!(
                "Invalid composition mode: {}. Must be single, sequential or parallel",
                other
            ))),
        }
    }
}

/// What one agent produced in a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentOutput {
    pub agent_id: String,
    pub display_name: String,
    /// Trimmed reply; `None` when empty, suppressed or failed
    pub reply: Option<String>,
    /// The agent answered with the listening sentinel
    pub suppressed: bool,
    pub error: Option<String>,
}

impl AgentOutput {
    fn from_result(agent: &AgentIdentity, result: Result<String, ApiError>) -> Self {
        let mut output = AgentOutput {
            agent_id: agent.agent_id.clone(),
            display_name: agent.display_name.clone(),
            reply: None,
            suppressed: false,
            error: None,
        };
        match result {
            Ok(raw) if is_listening_sentinel(&raw) => {
                debug!(agent_id = %agent.agent_id, "Agent is listening");
                output.suppressed = true;
            }
            Ok(raw) => {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    output.reply = Some(trimmed.to_string());
                }
            }
            Err(e) => {
                warn!(agent_id = %agent.agent_id, error = %e, "Agent call failed");
                output.error = Some(e.to_string());
            }
        }
        output
    }

    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestrationResult {
    pub mode: CompositionMode,
    /// One entry per invoked agent, in invocation order
    pub outputs: Vec<AgentOutput>,
    /// Formatted text ready for insertion, if any agent contributed
    pub merged_text: Option<String>,
}

impl OrchestrationResult {
    fn empty(mode: CompositionMode) -> Self {
        Self {
            mode,
            outputs: Vec::new(),
            merged_text: None,
        }
    }

    /// Every invoked agent failed (false when nothing was invoked).
    pub fn all_failed(&self) -> bool {
        !self.outputs.is_empty() && self.outputs.iter().all(AgentOutput::failed)
    }

    /// At least one agent signalled silence and nobody contributed.
    pub fn suppressed(&self) -> bool {
        self.merged_text.is_none() && self.outputs.iter().any(|o| o.suppressed)
    }
}

/// Enabled agents in invocation order: sorted by `order`, ties keep the
/// order they were given in.
pub fn invocation_order(agents: &[AgentIdentity]) -> Vec<AgentIdentity> {
    let mut ordered: Vec<AgentIdentity> = agents.iter().filter(|a| a.enabled).cloned().collect();
    ordered.sort_by_key(|a| a.order);
    ordered
}

pub struct Orchestrator {
    service: Arc<dyn AgentService>,
    label: String,
}

impl Orchestrator {
    pub fn new(service: Arc<dyn AgentService>, label: impl Into<String>) -> Self {
        Self {
            service,
            label: label.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Run one round for `delta` and merge the replies.
    pub async fn respond(
        &self,
        delta: &str,
        framing: Framing,
        agents: &[AgentIdentity],
        mode: CompositionMode,
    ) -> OrchestrationResult {
        let ordered = invocation_order(agents);
        if ordered.is_empty() {
            debug!("No enabled agents");
            return OrchestrationResult::empty(mode);
        }

        let message = frame_delta(delta, framing);
        let outputs = match mode {
            CompositionMode::Single => vec![self.invoke(&ordered[0], &message).await],
            CompositionMode::Parallel => {
                let calls = ordered.iter().map(|agent| self.invoke(agent, &message));
                // join_all yields results in input order, not completion order
                join_all(calls).await
            }
            CompositionMode::Sequential => self.run_sequential(&ordered, &message).await,
        };

        let merged_text = merge_outputs(&outputs, mode.merge_strategy(), &self.label);
        info!(
            mode = %mode,
            invoked = outputs.len(),
            contributed = outputs.iter().filter(|o| o.reply.is_some()).count(),
            failed = outputs.iter().filter(|o| o.failed()).count(),
            "Orchestration round complete"
        );

        OrchestrationResult {
            mode,
            outputs,
            merged_text,
        }
    }

    async fn run_sequential(&self, ordered: &[AgentIdentity], message: &str) -> Vec<AgentOutput> {
        let mut transcript: Vec<(String, String)> = Vec::new();
        let mut outputs = Vec::with_capacity(ordered.len());
        for agent in ordered {
            let turn = with_transcript(message, &transcript);
            let output = self.invoke(agent, &turn).await;
            if let Some(reply) = &output.reply {
                transcript.push((agent.display_name.clone(), reply.clone()));
            }
            outputs.push(output);
        }
        outputs
    }

    async fn invoke(&self, agent: &AgentIdentity, message: &str) -> AgentOutput {
        debug!(agent_id = %agent.agent_id, "Sending delta to agent");
        let result = self.service.send_message(&agent.agent_id, message).await;
        AgentOutput::from_result(agent, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentRole;
    use crate::service::ScriptedAgentService;

    fn agent(id: &str, name: &str, order: u32) -> AgentIdentity {
        AgentIdentity::new(id, name, AgentRole::Custom).with_order(order)
    }

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("Parallel".parse::<CompositionMode>().unwrap(), CompositionMode::Parallel);
        assert!("round-robin".parse::<CompositionMode>().is_err());
    }

    #[tokio::test]
    async fn single_uses_first_agent_by_order() {
        let service = Arc::new(ScriptedAgentService::new().reply("b", "hello"));
        let orchestrator = Orchestrator::new(service.clone(), "Companion");
        let agents = vec![agent("a", "A", 2), agent("b", "B", 1)];

        let result = orchestrator
            .respond("Bad day.", Framing::Engaged, &agents, CompositionMode::Single)
            .await;

        assert_eq!(result.outputs.len(), 1);
        assert_eq!(result.outputs[0].agent_id, "b");
        assert_eq!(
            result.merged_text.as_deref(),
            Some("\n\n> **Companion:** hello\n\n")
        );
        assert!(service.sent_to("a").is_empty());
    }

    #[tokio::test]
    async fn sentinel_suppresses_insertion() {
        let service = Arc::new(ScriptedAgentService::new().reply("a", "  [listening]\n"));
        let orchestrator = Orchestrator::new(service, "Companion");

        let result = orchestrator
            .respond("Walked.", Framing::Passive, &[agent("a", "A", 0)], CompositionMode::Single)
            .await;

        assert!(result.merged_text.is_none());
        assert!(result.suppressed());
        assert!(!result.all_failed());
    }

    #[tokio::test]
    async fn single_failure_inserts_nothing() {
        let service = Arc::new(ScriptedAgentService::new().fail("a", "timeout"));
        let orchestrator = Orchestrator::new(service, "Companion");

        let result = orchestrator
            .respond("x", Framing::Engaged, &[agent("a", "A", 0)], CompositionMode::Single)
            .await;

        assert!(result.merged_text.is_none());
        assert!(result.all_failed());
    }

    #[tokio::test]
    async fn disabled_agents_are_skipped() {
        let service = Arc::new(ScriptedAgentService::new().with_default_reply("ok"));
        let orchestrator = Orchestrator::new(service.clone(), "C");
        let mut off = agent("a", "A", 0);
        off.enabled = false;

        let result = orchestrator
            .respond("x", Framing::Engaged, &[off, agent("b", "B", 1)], CompositionMode::Parallel)
            .await;

        assert_eq!(result.outputs.len(), 1);
        assert!(service.sent_to("a").is_empty());
    }

    #[tokio::test]
    async fn no_agents_is_an_empty_round() {
        let service = Arc::new(ScriptedAgentService::new());
        let orchestrator = Orchestrator::new(service, "C");
        let result = orchestrator
            .respond("x", Framing::Engaged, &[], CompositionMode::Sequential)
            .await;
        assert!(result.outputs.is_empty());
        assert!(!result.all_failed());
        assert!(result.merged_text.is_none());
    }
}
