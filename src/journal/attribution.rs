//! Attribution marker construction and lookup.
//!
//! The marker `> **<Label>:**` is the only synchronization point between the
//! formatter and the delta extractor. Both sides build it through
//! [`attribution_marker`]; nothing else in the crate spells the pattern out.

/// Reply an agent sends when it chooses not to respond.
pub const LISTENING_SENTINEL: &str = "[listening]";

/// Build the attribution marker for a label.
pub fn attribution_marker(label: &str) -> String {
    format!("> **{}:**", label)
}

/// True when a raw agent reply is the no-reply sentinel.
pub fn is_listening_sentinel(reply: &str) -> bool {
    reply.trim() == LISTENING_SENTINEL
}

/// Check that a label can be embedded in a marker without ambiguity.
///
/// Labels must be non-empty, single-line, and free of `*` and `:` so that no
/// label's marker can be a prefix of another label's marker.
pub fn validate_label(label: &str) -> Result<(), String> {
    if label.trim().is_empty() {
        return Err("Attribution label cannot be empty".to_string());
    }
    if label.contains('\n') || label.contains('\r') {
        return Err(format!("Attribution label must be a single line: {:?}", label));
    }
    if label.contains('*') || label.contains(':') {
        return Err(format!(
            "Attribution label cannot contain '*' or ':': {:?}",
            label
        ));
    }
    Ok(())
}

/// The set of attribution markers recognized in a document.
///
/// A single-agent setup has one label. Sequential composition attributes each
/// reply to the agent that wrote it, so the set then carries every active
/// agent's display name as well.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributionSet {
    markers: Vec<String>,
}

impl AttributionSet {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut markers: Vec<String> = Vec::new();
        for label in labels {
            let marker = attribution_marker(label.as_ref());
            if !markers.contains(&marker) {
                markers.push(marker);
            }
        }
        Self { markers }
    }

    pub fn single(label: &str) -> Self {
        Self::new([label])
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    /// Byte offset of the last marker that starts a line (after optional
    /// indentation), across all labels in the set.
    pub fn find_last(&self, text: &str) -> Option<usize> {
        self.markers
            .iter()
            .filter_map(|marker| {
                text.rmatch_indices(marker.as_str())
                    .map(|(pos, _)| pos)
                    .find(|&pos| starts_line(text, pos))
            })
            .max()
    }

    /// True when `text`, trimmed, begins with any marker in the set.
    pub fn is_response(&self, text: &str) -> bool {
        let trimmed = text.trim();
        self.markers.iter().any(|m| trimmed.starts_with(m.as_str()))
    }
}

fn starts_line(text: &str, pos: usize) -> bool {
    let line_start = text[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0);
    text[line_start..pos].chars().all(|c| c == ' ' || c == '\t')
}
