//! Content chunker.
//!
//! Windows are measured in chars. A window of `max_size` slides forward by
//! `max_size - overlap`, so consecutive chunks share exactly `overlap` chars.

use crate::error::ApiError;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub source_id: String,
    /// Zero-based position within the source
    pub index: usize,
    pub header: String,
    pub text: String,
}

impl Chunk {
    /// Header and body as stored in the archive.
    pub fn passage_text(&self) -> String {
        format!("{}\n\n{}", self.header, self.text)
    }
}

fn header(source_id: &str, part: Option<usize>) -> String {
    match part {
        Some(n) => format!("File: {} (Part {})", source_id, n),
        None => format!("File: {}", source_id),
    }
}

/// Split `text` into chunks of at most `max_size` chars.
///
/// Text that fits in one window yields a single chunk without a part number.
/// `max_size == 0` or `overlap >= max_size` would never advance and is
/// rejected.
pub fn chunk(
    text: &str,
    source_id: &str,
    max_size: usize,
    overlap: usize,
) -> Result<Vec<Chunk>, ApiError> {
    if max_size == 0 || overlap >= max_size {
        return Err(ApiError::InvalidChunkConfig { max_size, overlap });
    }

    // Byte offset of every char boundary, plus the end.
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let len = bounds.len() - 1;

    if len <= max_size {
        return Ok(vec![Chunk {
            source_id: source_id.to_string(),
            index: 0,
            header: header(source_id, None),
            text: text.to_string(),
        }]);
    }

    let step = max_size - overlap;
    let mut chunks = Vec::with_capacity(len / step + 1);
    let mut start = 0;
    while start < len {
        let end = (start + max_size).min(len);
        let index = chunks.len();
        chunks.push(Chunk {
            source_id: source_id.to_string(),
            index,
            header: header(source_id, Some(index + 1)),
            text: text[bounds[start]..bounds[end]].to_string(),
        });
        if end == len {
            break;
        }
        start += step;
    }
    Ok(chunks)
}

/// Very short documents are not indexed.
pub fn should_index(text: &str, min_chars: usize) -> bool {
    text.trim().chars().count() >= min_chars
}
