//! Human-readable output for CLI commands.

use crate::agent::AgentIdentity;
use crate::index::{Chunk, IndexReport};
use crate::journal::DeltaOutcome;
use crate::service::{MemoryBlock, ModelInfo};
use crate::session::{CycleOutcome, SessionStatus};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::Serialize;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// Snapshot of the resolved configuration for `marginalia status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub workspace: String,
    pub config_file: Option<String>,
    pub service_url: String,
    pub api_key_set: bool,
    pub label: String,
    pub composition: String,
    pub scope_to_section: bool,
    pub passive_observation: bool,
    pub debounce_ms: u64,
    pub agents: Vec<AgentIdentity>,
    pub indexing_enabled: bool,
    pub archive_id: Option<String>,
}

pub fn format_status_text(report: &StatusReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Workspace")));
    out.push_str(&format!("  Root: {}\n", report.workspace));
    out.push_str(&format!(
        "  Config: {}\n\n",
        report.config_file.as_deref().unwrap_or("(defaults)")
    ));

    out.push_str(&format!("{}\n\n", format_section_heading("Service")));
    out.push_str(&format!("  URL: {}\n", report.service_url));
    out.push_str(&format!(
        "  API key: {}\n\n",
        if report.api_key_set { "set" } else { "not set" }
    ));

    out.push_str(&format!("{}\n\n", format_section_heading("Journal")));
    out.push_str(&format!("  Label: {}\n", report.label));
    out.push_str(&format!("  Composition: {}\n", report.composition));
    out.push_str(&format!(
        "  Scope: {}\n",
        if report.scope_to_section {
            "Journal section"
        } else {
            "whole document"
        }
    ));
    out.push_str(&format!(
        "  Passive observation: {}\n",
        if report.passive_observation { "on" } else { "off" }
    ));
    out.push_str(&format!("  Debounce: {} ms\n\n", report.debounce_ms));

    out.push_str(&format_agents_text(&report.agents));
    out.push('\n');

    out.push_str(&format!("{}\n\n", format_section_heading("Indexing")));
    if report.indexing_enabled {
        out.push_str(&format!(
            "  Enabled, archive {}\n",
            report.archive_id.as_deref().unwrap_or("-")
        ));
    } else {
        out.push_str("  Disabled\n");
    }
    out
}

pub fn format_agents_text(agents: &[AgentIdentity]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Agents")));
    if agents.is_empty() {
        out.push_str("No agents configured.\n");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Order", "Name", "Role", "Agent ID", "Enabled"]);
    for agent in agents {
        table.add_row(vec![
            agent.order.to_string(),
            agent.display_name.clone(),
            agent.role.to_string(),
            agent.agent_id.clone(),
            if agent.enabled { "yes" } else { "no" }.to_string(),
        ]);
    }
    out.push_str(&format!("{}\n\n", table));
    let enabled = agents.iter().filter(|a| a.enabled).count();
    out.push_str(&format!(
        "Total: {} agents, {} enabled.\n",
        agents.len(),
        enabled
    ));
    out
}

pub fn format_models_text(models: &[ModelInfo]) -> String {
    if models.is_empty() {
        return "No models available.\n".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Model", "Provider"]);
    for model in models {
        let provider = if model.provider.is_empty() {
            "-".to_string()
        } else {
            model.provider.clone()
        };
        table.add_row(vec![model.handle.clone(), provider]);
    }
    format!("{}\n", table)
}

pub fn format_blocks_text(agent: &AgentIdentity, blocks: &[MemoryBlock]) -> String {
    let mut out = format!(
        "{}\n\n",
        format_section_heading(&format!("Memory: {}", agent.display_name))
    );
    if blocks.is_empty() {
        out.push_str("No memory blocks.\n");
        return out;
    }
    for block in blocks {
        out.push_str(&format!("[{}]\n", block.label.bold()));
        out.push_str(block.value.trim_end());
        out.push_str("\n\n");
    }
    out
}

pub fn format_index_report_text(report: &IndexReport) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Indexed", "Unchanged", "Too short", "Chunks", "Removed", "Failed"]);
    table.add_row(vec![
        report.files_indexed.to_string(),
        report.files_unchanged.to_string(),
        report.files_too_short.to_string(),
        report.chunks_uploaded.to_string(),
        report.passages_removed.to_string(),
        report.failures.len().to_string(),
    ]);
    let mut out = format!("{}\n", table);
    for (source, error) in &report.failures {
        out.push_str(&format!("  {} {}: {}\n", "failed".red(), source, error));
    }
    out
}

pub fn format_chunks_text(chunks: &[Chunk]) -> String {
    if chunks.is_empty() {
        return "No chunks.\n".to_string();
    }
    let mut out = String::new();
    for chunk in chunks {
        out.push_str(&format!(
            "{} ({} chars)\n",
            chunk.header.bold(),
            chunk.text.chars().count()
        ));
    }
    out.push_str(&format!("\nTotal: {} chunks.\n", chunks.len()));
    out
}

pub fn format_delta_text(outcome: &DeltaOutcome) -> String {
    match outcome {
        DeltaOutcome::NotEligible => "No Journal section in this document.".to_string(),
        DeltaOutcome::Empty => "Nothing new since the last reply.".to_string(),
        DeltaOutcome::New(delta) => delta.clone(),
    }
}

pub fn format_cycle_text(outcome: &CycleOutcome, status: &SessionStatus) -> String {
    let summary = match outcome {
        CycleOutcome::NotEligible => "Not eligible: no Journal section or no enabled agents".to_string(),
        CycleOutcome::Busy => "Skipped: a response is already in progress".to_string(),
        CycleOutcome::EmptyDelta => "Nothing new to respond to".to_string(),
        CycleOutcome::TooShort => "Skipped: new text is below the minimum length".to_string(),
        CycleOutcome::NoCue => "Skipped: no engagement cue".to_string(),
        CycleOutcome::Suppressed => "Agents are listening; nothing inserted".to_string(),
        CycleOutcome::Inserted { chars } => format!("{} ({} chars)", "Inserted reply".green(), chars),
        CycleOutcome::Failed => format!("{}", "All agents failed".red()),
    };
    match status {
        SessionStatus::Error(message) => format!("{}\nStatus: error: {}", summary, message),
        _ => summary,
    }
}
