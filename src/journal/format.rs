//! Rendering agent replies as attributed quotations.

use super::attribution::attribution_marker;

/// Render a raw agent reply as an attributed blockquote.
///
/// The first line carries the marker, later lines are `> `-prefixed and blank
/// lines become a bare `>` so the quotation stays one contiguous blockquote.
/// The block is wrapped in blank lines so it sits as its own paragraph when
/// inserted at the end of a line.
pub fn format_response(raw: &str, label: &str) -> String {
    let mut lines = raw.trim().lines();
    let mut out = String::from("\n\n");
    out.push_str(&attribution_marker(label));

    let first = lines.next().unwrap_or("").trim_end();
    if !first.is_empty() {
        out.push(' ');
        out.push_str(first);
    }

    for line in lines {
        out.push('\n');
        let line = line.trim_end();
        if line.trim().is_empty() {
            out.push('>');
        } else {
            out.push_str("> ");
            out.push_str(line);
        }
    }

    out.push_str("\n\n");
    out
}

/// True when `text` is an attributed quotation for `label`.
pub fn is_response(text: &str, label: &str) -> bool {
    text.trim().starts_with(&attribution_marker(label))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_reply() {
        assert_eq!(
            format_response("What happened?", "Therapist"),
            "\n\n> **Therapist:** What happened?\n\n"
        );
    }

    #[test]
    fn paragraphs_are_preserved_inside_the_quote() {
        let out = format_response("First.\nStill first.\n\nSecond.", "C");
        assert_eq!(out, "\n\n> **C:** First.\n> Still first.\n>\n> Second.\n\n");
    }

    #[test]
    fn surrounding_whitespace_is_dropped() {
        let out = format_response("\n\n  hi  \n\n", "C");
        assert_eq!(out, "\n\n> **C:** hi\n\n");
    }

    #[test]
    fn crlf_reply() {
        let out = format_response("a\r\n\r\nb", "C");
        assert_eq!(out, "\n\n> **C:** a\n>\n> b\n\n");
    }

    #[test]
    fn is_response_matches_only_same_label() {
        let out = format_response("hello", "Companion");
        assert!(is_response(&out, "Companion"));
        assert!(!is_response(&out, "Therapist"));
        assert!(!is_response("> plain quote", "Companion"));
        assert!(!is_response("Companion: hi", "Companion"));
    }
}
