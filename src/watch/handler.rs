//! Routes workspace changes to the session and the indexer.

use super::events::ChangeEvent;
use super::runtime::ChangeHandler;
use crate::error::ApiError;
use crate::index::CorpusIndexer;
use crate::session::SessionController;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Edits to the journal document feed the session debouncer; other corpus
/// files are re-indexed when an indexer is attached.
pub struct JournalWatchHandler {
    document: PathBuf,
    session: Arc<SessionController>,
    indexer: Option<Arc<CorpusIndexer>>,
}

impl JournalWatchHandler {
    pub fn new(
        document: &Path,
        session: Arc<SessionController>,
        indexer: Option<Arc<CorpusIndexer>>,
    ) -> Self {
        Self {
            document: normalize(document),
            session,
            indexer,
        }
    }

    fn is_document(&self, path: &Path) -> bool {
        normalize(path) == self.document
    }
}

fn normalize(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[async_trait]
impl ChangeHandler for JournalWatchHandler {
    async fn handle_batch(&self, events: Vec<ChangeEvent>) {
        let mut to_index = Vec::new();
        for event in events.iter().filter(|e| e.has_content()) {
            if self.is_document(event.path()) {
                debug!("Journal document changed");
                // The debouncer owns the task; dropping the handle detaches it.
                drop(self.session.notify_change());
            } else {
                to_index.push(event.path().to_path_buf());
            }
        }

        let indexer = match &self.indexer {
            Some(indexer) if !to_index.is_empty() => indexer,
            _ => return,
        };
        match indexer.index_paths(&to_index).await {
            Ok(report) if report.files_indexed > 0 || !report.failures.is_empty() => info!(
                indexed = report.files_indexed,
                failed = report.failures.len(),
                "Incremental indexing"
            ),
            Ok(_) => {}
            Err(ApiError::IndexingInProgress) => {
                debug!("Indexing already running, skipping incremental update")
            }
            Err(e) => warn!(error = %e, "Incremental indexing failed"),
        }
    }
}
