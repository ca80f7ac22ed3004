//! Composition modes against a scripted agent service.

use marginalia::agent::{AgentIdentity, AgentRole};
use marginalia::journal::format_response;
use marginalia::orchestrator::{CompositionMode, Framing, Orchestrator};
use marginalia::service::{AgentService, ScriptedAgentService};
use std::sync::Arc;
use std::time::Duration;

fn agents() -> Vec<AgentIdentity> {
    vec![
        AgentIdentity::new("a", "A", AgentRole::PrimaryResponder).with_order(0),
        AgentIdentity::new("b", "B", AgentRole::PatternObserver).with_order(1),
    ]
}

fn orchestrator(service: &Arc<ScriptedAgentService>) -> Orchestrator {
    Orchestrator::new(Arc::clone(service) as Arc<dyn AgentService>, "Companion")
}

#[tokio::test]
async fn sequential_agents_see_earlier_replies() {
    let service = Arc::new(ScriptedAgentService::new().reply("a", "noted").reply("b", "agreed"));
    let result = orchestrator(&service)
        .respond("I quit my job.", Framing::Engaged, &agents(), CompositionMode::Sequential)
        .await;

    let to_a = service.sent_to("a");
    let to_b = service.sent_to("b");
    assert_eq!(to_a.len(), 1);
    assert!(!to_a[0].contains("[A]: noted"));
    assert!(to_b[0].contains("I quit my job."));
    assert!(to_b[0].contains("[A]: noted"));

    assert_eq!(
        result.merged_text.as_deref(),
        Some("\n\n> **A:** noted\n\n> **B:** agreed\n\n")
    );
}

#[tokio::test]
async fn sequential_failure_is_left_out_of_the_transcript() {
    let service = Arc::new(ScriptedAgentService::new().fail("a", "HTTP 502").reply("b", "still here"));
    let result = orchestrator(&service)
        .respond("Long day.", Framing::Engaged, &agents(), CompositionMode::Sequential)
        .await;

    assert!(!service.sent_to("b")[0].contains("[A]"));
    assert_eq!(result.merged_text.as_deref(), Some("\n\n> **B:** still here\n\n"));
}

#[tokio::test]
async fn parallel_failure_keeps_the_other_reply() {
    let service = Arc::new(ScriptedAgentService::new().reply("a", "hello").fail("b", "boom"));
    let result = orchestrator(&service)
        .respond("Bad day.", Framing::Engaged, &agents(), CompositionMode::Parallel)
        .await;

    assert!(!result.all_failed());
    assert!(result.outputs[1].failed());
    assert_eq!(result.merged_text, Some(format_response("hello", "Companion")));
}

#[tokio::test]
async fn parallel_merge_follows_configured_order() {
    let service = Arc::new(
        ScriptedAgentService::new()
            .reply("a", "slow first")
            .reply("b", "fast second")
            .delay("a", Duration::from_millis(50)),
    );
    let result = orchestrator(&service)
        .respond("Hm.", Framing::Passive, &agents(), CompositionMode::Parallel)
        .await;

    let merged = result.merged_text.unwrap();
    let first = merged.find("slow first").unwrap();
    let second = merged.find("fast second").unwrap();
    assert!(first < second);
    assert!(merged.starts_with("\n\n> **Companion:** slow first"));
}

#[tokio::test]
async fn parallel_sentinels_are_dropped_from_the_merge() {
    let service = Arc::new(ScriptedAgentService::new().reply("a", "[listening]").reply("b", "One thought."));
    let result = orchestrator(&service)
        .respond("Walked the dog.", Framing::Passive, &agents(), CompositionMode::Parallel)
        .await;

    assert_eq!(result.merged_text, Some(format_response("One thought.", "Companion")));
}

#[tokio::test]
async fn every_agent_failing_yields_nothing() {
    let service = Arc::new(ScriptedAgentService::new().fail("a", "x").fail("b", "y"));
    let result = orchestrator(&service)
        .respond("?", Framing::Engaged, &agents(), CompositionMode::Parallel)
        .await;

    assert!(result.all_failed());
    assert!(result.merged_text.is_none());
}
