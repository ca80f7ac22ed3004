//! Session controller: one response cycle per settled edit.

use super::debounce::Debouncer;
use super::editor::HostEditor;
use crate::agent::{attribution_set, AgentIdentity};
use crate::concurrency::InFlightFlag;
use crate::config::JournalConfig;
use crate::error::ApiError;
use crate::journal::{has_engagement_cue, reply_insertion_offset, DeltaExtractor, DeltaOutcome};
use crate::orchestrator::{invocation_order, CompositionMode, Framing, Orchestrator};
use crate::service::AgentService;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Listening,
    Thinking,
    Error(String),
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Listening => f.write_str("listening"),
            SessionStatus::Thinking => f.write_str("thinking"),
            SessionStatus::Error(message) => write!(f, "error: {}", message),
        }
    }
}

/// How a cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No Journal section, or no agents configured
    NotEligible,
    /// Another cycle was in flight; this trigger was dropped
    Busy,
    EmptyDelta,
    /// Passive delta shorter than the minimum
    TooShort,
    /// Passive observation is off and the delta has no cue
    NoCue,
    /// Agents answered with the listening sentinel or nothing
    Suppressed,
    Inserted { chars: usize },
    /// Every invoked agent failed
    Failed,
}

pub struct SessionController {
    editor: Arc<dyn HostEditor>,
    orchestrator: Orchestrator,
    agents: Vec<AgentIdentity>,
    mode: CompositionMode,
    settings: JournalConfig,
    extractor: DeltaExtractor,
    in_flight: InFlightFlag,
    status: RwLock<SessionStatus>,
    debouncer: Debouncer,
}

impl SessionController {
    /// `agents` is the full roster. Only enabled agents are invoked, but
    /// every display name counts as an attribution.
    pub fn new(
        editor: Arc<dyn HostEditor>,
        service: Arc<dyn AgentService>,
        agents: Vec<AgentIdentity>,
        mode: CompositionMode,
        settings: JournalConfig,
    ) -> Self {
        let extractor = DeltaExtractor::new(
            attribution_set(&settings.label, &agents),
            settings.scope_to_section,
        );
        let agents = invocation_order(&agents);
        Self {
            editor,
            orchestrator: Orchestrator::new(service, settings.label.clone()),
            agents,
            mode,
            extractor,
            in_flight: InFlightFlag::new(),
            status: RwLock::new(SessionStatus::Listening),
            debouncer: Debouncer::new(Duration::from_millis(settings.debounce_ms)),
            settings,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status.read().clone()
    }

    pub fn extractor(&self) -> &DeltaExtractor {
        &self.extractor
    }

    pub fn agents(&self) -> &[AgentIdentity] {
        &self.agents
    }

    pub fn mode(&self) -> CompositionMode {
        self.mode
    }

    /// Current delta of the active document.
    pub fn current_delta(&self) -> Result<DeltaOutcome, ApiError> {
        Ok(self.extractor.extract(&self.editor.read_text()?))
    }

    fn set_status(&self, next: SessionStatus) {
        let mut status = self.status.write();
        if *status != next {
            info!(from = %status.to_string(), to = %next, "Session status changed");
            *status = next;
        }
    }

    /// Record an edit. A cycle runs once edits have settled for the debounce
    /// period.
    pub fn notify_change(self: &Arc<Self>) -> JoinHandle<()> {
        let session = Arc::clone(self);
        self.debouncer.schedule(move || async move {
            match session.run_cycle(false).await {
                Ok(outcome) => debug!(?outcome, "Passive cycle finished"),
                Err(e) => warn!(error = %e, "Passive cycle failed"),
            }
        })
    }

    /// Drop any edit still waiting out the debounce period.
    pub fn cancel_pending(&self) {
        self.debouncer.cancel();
    }

    /// Run one cycle now. `force` is the manual trigger: it skips the cue and
    /// length gates but still honours eligibility, emptiness and the
    /// in-flight guard.
    pub async fn run_cycle(&self, force: bool) -> Result<CycleOutcome, ApiError> {
        let _guard = match self.in_flight.try_acquire() {
            Some(guard) => guard,
            None => {
                debug!("Cycle already in flight, dropping trigger");
                return Ok(CycleOutcome::Busy);
            }
        };

        if self.agents.is_empty() {
            debug!("No enabled agents");
            return Ok(CycleOutcome::NotEligible);
        }

        let text = self.editor.read_text()?;
        let delta = match self.extractor.extract(&text) {
            DeltaOutcome::NotEligible => {
                debug!("Document has no Journal section");
                return Ok(CycleOutcome::NotEligible);
            }
            DeltaOutcome::Empty => return Ok(CycleOutcome::EmptyDelta),
            DeltaOutcome::New(delta) => delta,
        };

        let cued = has_engagement_cue(&delta);
        if !force {
            if delta.chars().count() < self.settings.min_delta_chars {
                return Ok(CycleOutcome::TooShort);
            }
            if !cued && !self.settings.passive_observation {
                return Ok(CycleOutcome::NoCue);
            }
        }
        let framing = if force || cued {
            Framing::Engaged
        } else {
            Framing::Passive
        };

        info!(
            chars = delta.chars().count(),
            ?framing,
            mode = %self.mode,
            force,
            "Responding to delta"
        );
        self.set_status(SessionStatus::Thinking);
        let result = self
            .orchestrator
            .respond(&delta, framing, &self.agents, self.mode)
            .await;

        if let Some(merged) = result.merged_text {
            let inserted = self.editor.read_text().and_then(|current| {
                let at = reply_insertion_offset(&current, self.settings.scope_to_section);
                self.editor.insert(at, &merged)
            });
            if let Err(e) = inserted {
                self.set_status(SessionStatus::Error(e.to_string()));
                return Err(e);
            }
            self.set_status(SessionStatus::Listening);
            return Ok(CycleOutcome::Inserted {
                chars: merged.chars().count(),
            });
        }

        if result.all_failed() {
            if force {
                let message = result
                    .outputs
                    .iter()
                    .filter_map(|o| o.error.clone())
                    .next()
                    .unwrap_or_else(|| "agent call failed".to_string());
                self.set_status(SessionStatus::Error(message));
            } else {
                self.set_status(SessionStatus::Listening);
            }
            return Ok(CycleOutcome::Failed);
        }

        self.set_status(SessionStatus::Listening);
        Ok(CycleOutcome::Suppressed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentRole;
    use crate::service::ScriptedAgentService;
    use parking_lot::Mutex;

    struct MemoryEditor {
        text: Mutex<String>,
    }

    impl MemoryEditor {
        fn new(text: &str) -> Arc<Self> {
            Arc::new(Self {
                text: Mutex::new(text.to_string()),
            })
        }
    }

    impl HostEditor for MemoryEditor {
        fn read_text(&self) -> Result<String, ApiError> {
            Ok(self.text.lock().clone())
        }
        fn insert(&self, offset: usize, text: &str) -> Result<(), ApiError> {
            let mut doc = self.text.lock();
            let at = doc.char_indices().nth(offset).map(|(i, _)| i).unwrap_or(doc.len());
            doc.insert_str(at, text);
            Ok(())
        }
    }

    fn settings() -> JournalConfig {
        JournalConfig {
            label: "Companion".to_string(),
            scope_to_section: true,
            debounce_ms: 10,
            min_delta_chars: 10,
            passive_observation: true,
        }
    }

    fn session(
        editor: Arc<MemoryEditor>,
        service: ScriptedAgentService,
        settings: JournalConfig,
    ) -> SessionController {
        SessionController::new(
            editor,
            Arc::new(service),
            vec![AgentIdentity::new("a", "Companion", AgentRole::PrimaryResponder)],
            CompositionMode::Single,
            settings,
        )
    }

    #[tokio::test]
    async fn cycle_inserts_and_next_delta_is_empty() {
        let editor = MemoryEditor::new("# Journal\nBad day. What should I do?");
        let controller = session(
            editor.clone(),
            ScriptedAgentService::new().reply("a", "What happened?"),
            settings(),
        );

        let outcome = controller.run_cycle(false).await.unwrap();
        assert!(matches!(outcome, CycleOutcome::Inserted { .. }));
        assert_eq!(
            editor.read_text().unwrap(),
            "# Journal\nBad day. What should I do?\n\n> **Companion:** What happened?\n\n"
        );
        assert_eq!(controller.status(), SessionStatus::Listening);
        assert_eq!(controller.run_cycle(false).await.unwrap(), CycleOutcome::EmptyDelta);
    }

    #[tokio::test]
    async fn no_journal_section_is_not_eligible() {
        let editor = MemoryEditor::new("Just some notes that are long enough.");
        let controller = session(editor, ScriptedAgentService::new(), settings());
        assert_eq!(controller.run_cycle(true).await.unwrap(), CycleOutcome::NotEligible);
    }

    #[tokio::test]
    async fn short_passive_delta_is_skipped_but_forced_is_sent() {
        let editor = MemoryEditor::new("# Journal\nTired.");
        let controller = session(
            editor.clone(),
            ScriptedAgentService::new().reply("a", "Rest well."),
            settings(),
        );
        assert_eq!(controller.run_cycle(false).await.unwrap(), CycleOutcome::TooShort);
        assert!(matches!(
            controller.run_cycle(true).await.unwrap(),
            CycleOutcome::Inserted { .. }
        ));
    }

    #[tokio::test]
    async fn uncued_delta_without_passive_observation() {
        let editor = MemoryEditor::new("# Journal\nWent for a long run this morning.");
        let mut cfg = settings();
        cfg.passive_observation = false;
        let controller = session(editor, ScriptedAgentService::new(), cfg);
        assert_eq!(controller.run_cycle(false).await.unwrap(), CycleOutcome::NoCue);
    }

    #[tokio::test]
    async fn sentinel_leaves_document_untouched() {
        let original = "# Journal\nWent for a long run this morning.";
        let editor = MemoryEditor::new(original);
        let controller = session(
            editor.clone(),
            ScriptedAgentService::new().reply("a", "[listening]"),
            settings(),
        );
        assert_eq!(controller.run_cycle(false).await.unwrap(), CycleOutcome::Suppressed);
        assert_eq!(editor.read_text().unwrap(), original);
        assert_eq!(controller.status(), SessionStatus::Listening);
    }

    #[tokio::test]
    async fn forced_failure_sets_error_status() {
        let editor = MemoryEditor::new("# Journal\nHelp me think this through?");
        let controller = session(
            editor,
            ScriptedAgentService::new().fail("a", "connection refused"),
            settings(),
        );
        assert_eq!(controller.run_cycle(true).await.unwrap(), CycleOutcome::Failed);
        assert!(matches!(controller.status(), SessionStatus::Error(_)));
    }

    #[tokio::test]
    async fn passive_failure_stays_listening() {
        let editor = MemoryEditor::new("# Journal\nHelp me think this through?");
        let controller = session(
            editor,
            ScriptedAgentService::new().fail("a", "connection refused"),
            settings(),
        );
        assert_eq!(controller.run_cycle(false).await.unwrap(), CycleOutcome::Failed);
        assert_eq!(controller.status(), SessionStatus::Listening);
    }

    #[tokio::test]
    async fn trigger_while_busy_is_dropped() {
        let editor = MemoryEditor::new("# Journal\nWhat do you think about this plan?");
        let controller = Arc::new(session(
            editor,
            ScriptedAgentService::new()
                .reply("a", "Sounds good.")
                .delay("a", Duration::from_millis(200)),
            settings(),
        ));

        let first = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.run_cycle(true).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(controller.run_cycle(true).await.unwrap(), CycleOutcome::Busy);
        assert!(matches!(
            first.await.unwrap().unwrap(),
            CycleOutcome::Inserted { .. }
        ));
    }

    #[tokio::test]
    async fn notify_change_runs_after_quiet_period() {
        let editor = MemoryEditor::new("# Journal\nShould I take the new job?");
        let controller = Arc::new(session(
            editor.clone(),
            ScriptedAgentService::new().reply("a", "What draws you to it?"),
            settings(),
        ));

        let first = controller.notify_change();
        let second = controller.notify_change();
        first.await.unwrap();
        second.await.unwrap();

        assert!(editor.read_text().unwrap().contains("> **Companion:** What draws you to it?"));
    }
    #[tokio::test]
    async fn reply_lands_inside_section_before_next_heading() {
        let editor = MemoryEditor::new("## Journal\nShould I quit my job?\n## Tasks\n- dishes\n");
        let controller = session(
            editor.clone(),
            ScriptedAgentService::new().reply("a", "What is pulling you away?"),
            settings(),
        );

        assert!(matches!(
            controller.run_cycle(false).await.unwrap(),
            CycleOutcome::Inserted { .. }
        ));
        assert_eq!(
            editor.read_text().unwrap(),
            "## Journal\nShould I quit my job?\n\n> **Companion:** What is pulling you away?\n\n\n## Tasks\n- dishes\n"
        );
        assert_eq!(controller.run_cycle(false).await.unwrap(), CycleOutcome::EmptyDelta);
    }

    #[tokio::test]
    async fn disabled_agent_reply_still_ends_the_delta() {
        let editor = MemoryEditor::new(
            "# Journal\nLong week at work again.\n\n> **Observer:** Work keeps coming up.\n",
        );
        let mut observer = AgentIdentity::new("b", "Observer", AgentRole::PatternObserver);
        observer.enabled = false;
        let controller = SessionController::new(
            editor,
            Arc::new(ScriptedAgentService::new()),
            vec![
                AgentIdentity::new("a", "Companion", AgentRole::PrimaryResponder),
                observer,
            ],
            CompositionMode::Single,
            settings(),
        );

        assert_eq!(controller.agents().len(), 1);
        assert_eq!(controller.current_delta().unwrap(), DeltaOutcome::Empty);
        assert_eq!(controller.run_cycle(true).await.unwrap(), CycleOutcome::EmptyDelta);
    }

    #[tokio::test]
    async fn cancel_pending_drops_a_scheduled_cycle() {
        let original = "# Journal\nShould I take the new job?";
        let editor = MemoryEditor::new(original);
        let controller = Arc::new(session(
            editor.clone(),
            ScriptedAgentService::new().reply("a", "What draws you to it?"),
            settings(),
        ));

        let pending = controller.notify_change();
        controller.cancel_pending();
        pending.await.unwrap();

        assert_eq!(editor.read_text().unwrap(), original);
    }
}
