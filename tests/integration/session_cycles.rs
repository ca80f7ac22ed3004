//! Session cycles over a file-backed document.

use marginalia::agent::{AgentIdentity, AgentRole};
use marginalia::config::JournalConfig;
use marginalia::journal::DeltaOutcome;
use marginalia::orchestrator::{CompositionMode, Framing};
use marginalia::service::{AgentService, ScriptedAgentService};
use marginalia::session::{CycleOutcome, FileEditor, SessionController, SessionStatus};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

struct Journal {
    _tmp: TempDir,
    path: PathBuf,
}

impl Journal {
    fn new(text: &str) -> Self {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("2024-03-01.md");
        std::fs::write(&path, text).unwrap();
        Self { _tmp: tmp, path }
    }

    fn text(&self) -> String {
        std::fs::read_to_string(&self.path).unwrap()
    }

    fn append(&self, more: &str) {
        let mut text = self.text();
        text.push_str(more);
        std::fs::write(&self.path, text).unwrap();
    }
}

fn session(
    journal: &Journal,
    service: &Arc<ScriptedAgentService>,
    settings: JournalConfig,
) -> Arc<SessionController> {
    Arc::new(SessionController::new(
        Arc::new(FileEditor::new(journal.path.clone())),
        Arc::clone(service) as Arc<dyn AgentService>,
        vec![AgentIdentity::new("a1", "Companion", AgentRole::PrimaryResponder)],
        CompositionMode::Single,
        settings,
    ))
}

fn fast() -> JournalConfig {
    JournalConfig {
        debounce_ms: 20,
        ..JournalConfig::default()
    }
}

#[tokio::test]
async fn cued_delta_gets_an_engaged_reply_and_is_then_consumed() {
    let journal = Journal::new("# Journal\n\nMy sister called again. Should I call her back?\n");
    let service = Arc::new(ScriptedAgentService::new().reply("a1", "What would you want to say?"));
    let session = session(&journal, &service, fast());

    let outcome = session.run_cycle(false).await.unwrap();
    assert_eq!(
        outcome,
        CycleOutcome::Inserted {
            chars: "\n\n> **Companion:** What would you want to say?\n\n".chars().count()
        }
    );
    let sent = service.sent_to("a1");
    assert!(sent[0].starts_with(Framing::Engaged.prefix()));
    assert!(journal
        .text()
        .ends_with("> **Companion:** What would you want to say?\n\n"));
    assert_eq!(session.status(), SessionStatus::Listening);

    assert_eq!(session.run_cycle(false).await.unwrap(), CycleOutcome::EmptyDelta);

    journal.append("Probably that I miss her.");
    let delta = session.current_delta().unwrap();
    assert_eq!(delta.text(), "Probably that I miss her.");
}

#[tokio::test]
async fn uncued_delta_is_sent_passively() {
    let journal = Journal::new("# Journal\n\nWent for a long walk by the river today.\n");
    let service = Arc::new(ScriptedAgentService::new().reply("a1", "[listening]"));
    let session = session(&journal, &service, fast());
    let before = journal.text();

    assert_eq!(session.run_cycle(false).await.unwrap(), CycleOutcome::Suppressed);
    assert!(service.sent_to("a1")[0].starts_with(Framing::Passive.prefix()));
    assert_eq!(journal.text(), before);
}

#[tokio::test]
async fn passive_gates_are_skipped_when_forced() {
    let journal = Journal::new("# Journal\n\nTired.\n");
    let service = Arc::new(ScriptedAgentService::new().with_default_reply("Rest, then."));
    let settings = JournalConfig {
        passive_observation: false,
        ..fast()
    };
    let session = session(&journal, &service, settings);

    assert_eq!(session.run_cycle(false).await.unwrap(), CycleOutcome::TooShort);
    assert!(service.sent().is_empty());

    let outcome = session.run_cycle(true).await.unwrap();
    assert!(matches!(outcome, CycleOutcome::Inserted { .. }));
    assert!(service.sent_to("a1")[0].starts_with(Framing::Engaged.prefix()));
}

#[tokio::test]
async fn uncued_delta_without_passive_observation_is_held() {
    let journal = Journal::new("# Journal\n\nCleaned the whole flat this afternoon.\n");
    let service = Arc::new(ScriptedAgentService::new().with_default_reply("Nice."));
    let settings = JournalConfig {
        passive_observation: false,
        ..fast()
    };
    let session = session(&journal, &service, settings);

    assert_eq!(session.run_cycle(false).await.unwrap(), CycleOutcome::NoCue);
    assert!(service.sent().is_empty());
}

#[tokio::test]
async fn failed_forced_cycle_reports_an_error_status() {
    let journal = Journal::new("# Journal\n\nWhat now?\n");
    let service = Arc::new(ScriptedAgentService::new().fail("a1", "HTTP 503"));
    let session = session(&journal, &service, fast());
    let before = journal.text();

    assert_eq!(session.run_cycle(true).await.unwrap(), CycleOutcome::Failed);
    assert!(matches!(session.status(), SessionStatus::Error(ref m) if m.contains("HTTP 503")));
    assert_eq!(journal.text(), before);
}

#[tokio::test]
async fn document_without_journal_section_is_ignored() {
    let journal = Journal::new("# Groceries\n\nEggs? Milk?\n");
    let service = Arc::new(ScriptedAgentService::new().with_default_reply("hi"));
    let session = session(&journal, &service, fast());

    assert_eq!(session.run_cycle(true).await.unwrap(), CycleOutcome::NotEligible);
    assert!(service.sent().is_empty());
}

#[tokio::test]
async fn rapid_edits_settle_into_one_cycle() {
    let journal = Journal::new("# Journal\n\nI keep thinking about the move. Is it too soon?\n");
    let service = Arc::new(ScriptedAgentService::new().with_default_reply("What feels soon about it?"));
    let session = session(&journal, &service, fast());

    let first = session.notify_change();
    let second = session.notify_change();
    let last = session.notify_change();
    for handle in [first, second, last] {
        handle.await.unwrap();
    }

    assert_eq!(service.sent().len(), 1);
    assert!(journal.text().contains("> **Companion:** What feels soon about it?"));
}

#[tokio::test]
async fn missing_document_is_an_error() {
    let journal = Journal::new("");
    std::fs::remove_file(&journal.path).unwrap();
    let service = Arc::new(ScriptedAgentService::new());
    let session = session(&journal, &service, fast());

    assert!(session.run_cycle(true).await.is_err());
}

#[tokio::test]
async fn reply_stays_inside_section_across_cycles() {
    let journal = Journal::new("## Journal\nShould I quit?\n## Tasks\n- dishes\n");
    let service = Arc::new(ScriptedAgentService::new().reply("a1", "What is pulling you away?"));
    let session = session(&journal, &service, fast());

    assert!(matches!(
        session.run_cycle(false).await.unwrap(),
        CycleOutcome::Inserted { .. }
    ));
    assert_eq!(
        journal.text(),
        "## Journal\nShould I quit?\n\n> **Companion:** What is pulling you away?\n\n\n## Tasks\n- dishes\n"
    );

    assert_eq!(session.run_cycle(false).await.unwrap(), CycleOutcome::EmptyDelta);
    assert_eq!(service.sent().len(), 1);
    assert!(journal.text().ends_with("- dishes\n"));
}

#[tokio::test]
async fn second_reply_follows_text_written_after_the_first() {
    let journal = Journal::new("# Journal\n\nRough morning.\n");
    let service = Arc::new(
        ScriptedAgentService::new()
            .reply("a1", "Tell me more.")
            .reply("a1", "What happened after?"),
    );
    let session = session(&journal, &service, fast());

    assert!(matches!(
        session.run_cycle(true).await.unwrap(),
        CycleOutcome::Inserted { .. }
    ));
    journal.append("Boss yelled.\nThen I left early?");
    assert_eq!(
        session.current_delta().unwrap().text(),
        "Boss yelled.\nThen I left early?"
    );

    assert!(matches!(
        session.run_cycle(true).await.unwrap(),
        CycleOutcome::Inserted { .. }
    ));
    let text = journal.text();
    assert!(text.ends_with(
        "Boss yelled.\nThen I left early?\n\n> **Companion:** What happened after?\n\n"
    ));
    assert!(service.sent_to("a1")[1].contains("Boss yelled.\nThen I left early?"));
    assert_eq!(session.current_delta().unwrap(), DeltaOutcome::Empty);
}
