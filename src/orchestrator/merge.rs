//! Merging per-agent outputs into one insertable block.

use super::AgentOutput;
use crate::journal::format_response;

/// How per-agent replies become one insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Replies were produced independently: join the raw replies with a
    /// blank line and attribute the whole block to the configured label.
    Independent,
    /// Replies form a transcript: attribute each reply to its agent.
    Transcript,
}

/// Merge outputs in the order given. `None` when no agent contributed.
pub fn merge_outputs(outputs: &[AgentOutput], strategy: MergeStrategy, label: &str) -> Option<String> {
    let contributions: Vec<&AgentOutput> = outputs.iter().filter(|o| o.reply.is_some()).collect();
    if contributions.is_empty() {
        return None;
    }

    match strategy {
        MergeStrategy::Independent => {
            let joined = contributions
                .iter()
                .filter_map(|o| o.reply.as_deref())
                .collect::<Vec<_>>()
                .join("\n\n");
            Some(format_response(&joined, label))
        }
        MergeStrategy::Transcript => {
            let blocks: Vec<String> = contributions
                .iter()
                .filter_map(|o| {
                    o.reply
                        .as_deref()
                        .map(|reply| format_response(reply, &o.display_name))
                })
                .collect();
            let inner = blocks
                .iter()
                .map(|b| b.trim_matches('\n'))
                .collect::<Vec<_>>()
                .join("\n\n");
            Some(format!("\n\n{}\n\n", inner))
        }
    }
}
