//! Journal section lookup.
//!
//! A Journal section starts at a `# Journal`, `## Journal` or `### Journal`
//! heading and runs until the next heading of equal or higher level.

use std::ops::Range;

/// Byte span of a Journal section body within a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalSection {
    /// Heading level (1-3).
    pub level: usize,
    /// Body range, excluding the heading line itself.
    pub body: Range<usize>,
}

impl JournalSection {
    pub fn body<'a>(&self, text: &'a str) -> &'a str {
        &text[self.body.clone()]
    }
}

/// Locate the first Journal section in `text`.
pub fn find_journal_section(text: &str) -> Option<JournalSection> {
    let mut offset = 0;
    let mut open: Option<(usize, usize)> = None;

    for line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();
        let content = line.trim_end_matches(['\n', '\r']);

        match open {
            None => {
                if let Some(level) = journal_heading_level(content) {
                    open = Some((level, offset));
                }
            }
            Some((level, body_start)) => {
                if let Some(next) = heading_level(content) {
                    if next <= level {
                        return Some(JournalSection {
                            level,
                            body: body_start..line_start,
                        });
                    }
                }
            }
        }
    }

    open.map(|(level, body_start)| JournalSection {
        level,
        body: body_start..text.len(),
    })
}

/// Char offset where a reply belongs: right after the last non-blank text of
/// the Journal section, or of the whole document when unscoped. A reply put
/// here is the first thing the next delta scan sees.
pub fn reply_insertion_offset(text: &str, scope_to_section: bool) -> usize {
    let scope = if scope_to_section {
        find_journal_section(text).map_or(0..text.len(), |section| section.body)
    } else {
        0..text.len()
    };
    let end = scope.start + text[scope.clone()].trim_end().len();
    text[..end].chars().count()
}

fn journal_heading_level(line: &str) -> Option<usize> {
    let level = heading_level(line)?;
    if level > 3 {
        return None;
    }
    let rest = &line[level + 1..];
    let after = rest.strip_prefix("Journal")?;
    if after.is_empty() || after.starts_with(char::is_whitespace) {
        Some(level)
    } else {
        None
    }
}

/// ATX heading level of a line, if it is a heading.
fn heading_level(line: &str) -> Option<usize> {
    let hashes = line.chars().take_while(|&c| c == '#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    match line[hashes..].chars().next() {
        Some(' ') | Some('\t') => Some(hashes),
        _ => None,
    }
}
