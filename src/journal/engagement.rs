//! Lexical engagement cues.
//!
//! A coarse gate: does the new text look like the writer is asking for input?
//! The remote agent makes the real call; this only picks the prompt framing.

const ENGAGEMENT_PHRASES: &[&str] = &[
    "what do you think",
    "do you think",
    "should i",
    "help me",
    "advice",
    "any thoughts",
    "your thoughts",
    "what would you",
    "can you",
    "could you",
    "tell me",
];

/// True if the delta contains a `?` or a request phrase (case-insensitive).
pub fn has_engagement_cue(delta: &str) -> bool {
    if delta.contains('?') {
        return true;
    }
    let lowered = delta.to_lowercase();
    ENGAGEMENT_PHRASES
        .iter()
        .any(|phrase| lowered.contains(phrase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_mark_is_a_cue() {
        assert!(has_engagement_cue("Is this normal?"));
    }

    #[test]
    fn phrases_match_case_insensitively() {
        assert!(has_engagement_cue("What Do You Think about that."));
        assert!(has_engagement_cue("I could use some ADVICE here"));
        assert!(has_engagement_cue("help me sort this out"));
        assert!(has_engagement_cue("Should I call her back."));
    }

    #[test]
    fn plain_narration_is_not_a_cue() {
        assert!(!has_engagement_cue("Went for a run. Felt good."));
        assert!(!has_engagement_cue(""));
    }
}
