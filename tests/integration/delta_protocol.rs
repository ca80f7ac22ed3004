//! Delta extraction and response formatting working together.

use marginalia::journal::{
    extract_delta, format_response, is_response, AttributionSet, DeltaExtractor, DeltaOutcome,
};
use proptest::prelude::*;

fn plain_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,?!\n]{0,200}"
}

fn user_text() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9 .,?!\n]{0,80}"
}

fn label() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{0,10}( [A-Z][a-z]{0,8})?"
}

fn reply() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9 .,?!\n]{0,120}"
}

proptest! {
    #[test]
    fn text_without_markers_is_returned_trimmed(text in plain_text()) {
        prop_assert_eq!(extract_delta(&text, "Companion", false), text.trim());
    }

    #[test]
    fn formatted_reply_is_recognized_by_its_label(raw in reply(), label in label()) {
        prop_assert!(is_response(&format_response(&raw, &label), &label));
    }

    #[test]
    fn formatted_reply_is_not_recognized_by_another_label(
        raw in reply(),
        first in label(),
        second in label(),
    ) {
        prop_assume!(first != second);
        prop_assert!(!is_response(&format_response(&raw, &first), &second));
    }

    #[test]
    fn inserting_a_reply_consumes_the_delta(doc in plain_text(), raw in reply(), label in label()) {
        let text = format!("{}{}", doc, format_response(&raw, &label));
        prop_assert_eq!(extract_delta(&text, &label, false), "");
    }

    #[test]
    fn text_after_the_latest_reply_is_the_delta(
        rounds in prop::collection::vec((user_text(), reply()), 1..4),
        tail in user_text(),
        label in label(),
    ) {
        let mut text = String::new();
        for (written, answer) in &rounds {
            text.push_str(written);
            text.push_str(&format_response(answer, &label));
        }
        text.push_str(&tail);
        prop_assert_eq!(extract_delta(&text, &label, false), tail.trim());
    }
}

#[test]
fn reply_followed_by_new_writing() {
    let text = "Bad day.\n\n> **Therapist:** What happened?\n\nBoss yelled at me.";
    assert_eq!(extract_delta(text, "Therapist", false), "Boss yelled at me.");
}

#[test]
fn reply_as_last_thing_in_document() {
    let text = "Bad day.\n\n> **Therapist:** What happened?";
    assert_eq!(extract_delta(text, "Therapist", false), "");
}

#[test]
fn scoped_extraction_ignores_text_outside_the_journal_section() {
    let text = "# 2024-03-01\n\nTodo: groceries?\n\n## Journal\n\nSlept badly.\n\n## Tasks\n\n- call mum\n";
    let extractor = DeltaExtractor::new(AttributionSet::single("Companion"), true);
    assert_eq!(extractor.extract(text), DeltaOutcome::New("Slept badly.".to_string()));
    // Unchanged document, unchanged delta.
    assert_eq!(extractor.extract(text), extractor.extract(text));
}

#[test]
fn document_without_journal_section_is_not_eligible() {
    let extractor = DeltaExtractor::new(AttributionSet::single("Companion"), true);
    assert_eq!(extractor.extract("# Notes\n\nJust notes."), DeltaOutcome::NotEligible);
    assert_eq!(extract_delta("# Notes\n\nJust notes.", "Companion", true), "");
}

#[test]
fn any_active_label_consumes_the_delta() {
    let extractor = DeltaExtractor::new(AttributionSet::new(["Companion", "Observer"]), false);
    let text = format!(
        "Morning pages.{}{}",
        format_response("Sounds restful.", "Companion"),
        format_response("Third calm morning this week.", "Observer"),
    );
    assert_eq!(extractor.extract(&text), DeltaOutcome::Empty);

    let text = format!("{}Back to work now.", text);
    assert_eq!(
        extractor.extract(&text),
        DeltaOutcome::New("Back to work now.".to_string())
    );
}
