//! Journal text protocol
//!
//! Everything that reads or writes the journal document itself: locating the
//! Journal section, finding the writer's unconsumed text since the last agent
//! reply, deciding whether that text asks for input, and rendering replies as
//! attributed quotations. All functions here are pure over a text snapshot.

pub mod attribution;
pub mod delta;
pub mod engagement;
pub mod format;
pub mod section;

pub use attribution::{
    attribution_marker, is_listening_sentinel, validate_label, AttributionSet,
    LISTENING_SENTINEL,
};
pub use delta::{extract_delta, DeltaExtractor, DeltaOutcome};
pub use engagement::has_engagement_cue;
pub use format::{format_response, is_response};
pub use section::{find_journal_section, reply_insertion_offset, JournalSection};
