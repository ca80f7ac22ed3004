//! Retrieval indexing
//!
//! Documents are cut into bounded, overlapping chunks and stored as passages
//! in an archive on the agent service, so agents can ground replies in
//! earlier writing.

pub mod chunker;
pub mod pipeline;

pub use chunker::{chunk, should_index, Chunk};
pub use pipeline::{CorpusIndexer, IndexReport};
