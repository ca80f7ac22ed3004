//! Delta extraction: the writer's text since the last agent reply.
//!
//! The document is its own log. The last attributed quotation marks how far
//! the agents have read; whatever follows the end of its blockquote run is new.

use super::attribution::AttributionSet;
use super::section::find_journal_section;

/// Result of looking for new writing in a document snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeltaOutcome {
    /// Section scoping is on and the document has no Journal section.
    NotEligible,
    /// Nothing new since the last reply.
    Empty,
    /// Unconsumed writer text, trimmed.
    New(String),
}

impl DeltaOutcome {
    pub fn text(&self) -> &str {
        match self {
            DeltaOutcome::New(text) => text,
            DeltaOutcome::NotEligible | DeltaOutcome::Empty => "",
        }
    }
}

/// Extracts deltas using a fixed attribution set and scoping policy.
#[derive(Debug, Clone)]
pub struct DeltaExtractor {
    attributions: AttributionSet,
    scope_to_section: bool,
}

impl DeltaExtractor {
    pub fn new(attributions: AttributionSet, scope_to_section: bool) -> Self {
        Self {
            attributions,
            scope_to_section,
        }
    }

    pub fn attributions(&self) -> &AttributionSet {
        &self.attributions
    }

    pub fn scope_to_section(&self) -> bool {
        self.scope_to_section
    }

    /// Whether the document can be processed at all under this policy.
    pub fn is_eligible(&self, text: &str) -> bool {
        !self.scope_to_section || find_journal_section(text).is_some()
    }

    pub fn extract(&self, text: &str) -> DeltaOutcome {
        let scoped = if self.scope_to_section {
            match find_journal_section(text) {
                Some(section) => section.body(text),
                None => return DeltaOutcome::NotEligible,
            }
        } else {
            text
        };

        let delta = unconsumed_span(scoped, &self.attributions);
        if delta.is_empty() {
            DeltaOutcome::Empty
        } else {
            DeltaOutcome::New(delta.to_string())
        }
    }
}

/// Extract the delta for a single attribution label.
///
/// Returns an empty string both when nothing is new and when scoping is on
/// but the document has no Journal section; use [`DeltaExtractor::extract`]
/// to tell those apart.
pub fn extract_delta(full_text: &str, label: &str, scope_to_section: bool) -> String {
    DeltaExtractor::new(AttributionSet::single(label), scope_to_section)
        .extract(full_text)
        .text()
        .to_string()
}

fn unconsumed_span<'a>(scoped: &'a str, attributions: &AttributionSet) -> &'a str {
    let Some(marker_pos) = attributions.find_last(scoped) else {
        return scoped.trim();
    };

    let line_start = scoped[..marker_pos].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let mut offset = line_start;
    for line in scoped[line_start..].split_inclusive('\n') {
        let content = line.trim();
        if content.is_empty() || content.starts_with('>') {
            offset += line.len();
            continue;
        }
        return scoped[offset..].trim();
    }
    ""
}
