//! Host editor capability.

use crate::error::ApiError;
use std::path::PathBuf;

/// What the session needs from the host editor. The session decides where a
/// reply goes from the text itself, so hosts only read and insert.
pub trait HostEditor: Send + Sync {
    /// Full text of the active document.
    fn read_text(&self) -> Result<String, ApiError>;

    /// Insert at a char offset.
    fn insert(&self, offset: usize, text: &str) -> Result<(), ApiError>;
}

fn byte_offset(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// A document on disk, re-read on every call.
pub struct FileEditor {
    path: PathBuf,
}

impl FileEditor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl HostEditor for FileEditor {
    fn read_text(&self) -> Result<String, ApiError> {
        std::fs::read_to_string(&self.path).map_err(|source| ApiError::Read {
            path: self.path.clone(),
            source,
        })
    }

    fn insert(&self, offset: usize, text: &str) -> Result<(), ApiError> {
        let mut content = self.read_text()?;
        let at = byte_offset(&content, offset);
        content.insert_str(at, text);
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}
