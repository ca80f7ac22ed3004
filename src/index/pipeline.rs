//! Corpus indexing pipeline.
//!
//! Walks the corpus, chunks each document and replaces its passages in the
//! archive. Runs are single-flight. A failure on one file is logged and the
//! run moves on to the next.

use super::chunker::{chunk, should_index, Chunk};
use crate::concurrency::InFlightFlag;
use crate::config::IndexingConfig;
use crate::error::ApiError;
use crate::service::{AgentService, Passage};
use crate::watch::is_ignored;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    pub files_indexed: usize,
    pub files_unchanged: usize,
    pub files_too_short: usize,
    pub chunks_uploaded: usize,
    pub passages_removed: usize,
    /// `(source_id, error)` for each file that failed
    pub failures: Vec<(String, String)>,
}

enum FileOutcome {
    Indexed { chunks: usize, removed: usize },
    Unchanged,
    TooShort { removed: usize },
}

pub struct CorpusIndexer {
    service: Arc<dyn AgentService>,
    config: IndexingConfig,
    root: PathBuf,
    in_flight: InFlightFlag,
    fingerprints: Mutex<HashMap<String, blake3::Hash>>,
}

impl CorpusIndexer {
    pub fn new(service: Arc<dyn AgentService>, config: IndexingConfig, root: PathBuf) -> Self {
        Self {
            service,
            config,
            root,
            in_flight: InFlightFlag::new(),
            fingerprints: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.is_busy()
    }

    fn archive_id(&self) -> Result<&str, ApiError> {
        self.config
            .archive_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ApiError::ProviderNotConfigured("indexing.archive_id is not set".to_string()))
    }

    /// Source identifier: path relative to the corpus root, `/`-separated.
    pub fn source_id(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Whether a path belongs to the indexed corpus.
    pub fn is_corpus_file(&self, path: &Path) -> bool {
        let has_extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.config.extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
            .unwrap_or(false);
        has_extension && !is_ignored(&self.source_id(path), &self.config.ignore_patterns)
    }

    /// Corpus files under the root, sorted.
    pub fn corpus_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0 || !entry.file_name().to_string_lossy().starts_with('.')
            })
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable corpus entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| self.is_corpus_file(path))
            .collect();
        files.sort();
        files
    }

    /// Index every corpus file, replacing all of its passages.
    pub async fn index_all(&self) -> Result<IndexReport, ApiError> {
        let files = self.corpus_files();
        self.run(&files, true).await
    }

    /// Re-index the given files, skipping ones whose content is unchanged
    /// since this indexer last stored them.
    pub async fn index_paths(&self, paths: &[PathBuf]) -> Result<IndexReport, ApiError> {
        let files: Vec<PathBuf> = paths
            .iter()
            .filter(|p| p.is_file() && self.is_corpus_file(p))
            .cloned()
            .collect();
        if files.is_empty() {
            return Ok(IndexReport::default());
        }
        self.run(&files, false).await
    }

    async fn run(&self, files: &[PathBuf], force: bool) -> Result<IndexReport, ApiError> {
        let _guard = self
            .in_flight
            .try_acquire()
            .ok_or(ApiError::IndexingInProgress)?;
        let archive_id = self.archive_id()?;

        info!(files = files.len(), archive_id, force, "Indexing corpus");
        let mut existing = group_by_source(self.service.list_passages(archive_id).await?);

        let mut report = IndexReport::default();
        for path in files {
            let source_id = self.source_id(path);
            let stale = existing.remove(&source_id).unwrap_or_default();
            match self
                .index_file(archive_id, path, &source_id, stale, force)
                .await
            {
                Ok(FileOutcome::Indexed { chunks, removed }) => {
                    report.files_indexed += 1;
                    report.chunks_uploaded += chunks;
                    report.passages_removed += removed;
                }
                Ok(FileOutcome::Unchanged) => report.files_unchanged += 1,
                Ok(FileOutcome::TooShort { removed }) => {
                    report.files_too_short += 1;
                    report.passages_removed += removed;
                }
                Err(e) => {
                    warn!(source = %source_id, error = %e, "Failed to index file");
                    self.fingerprints.lock().remove(&source_id);
                    report.failures.push((source_id, e.to_string()));
                }
            }
        }

        info!(
            indexed = report.files_indexed,
            unchanged = report.files_unchanged,
            too_short = report.files_too_short,
            chunks = report.chunks_uploaded,
            failed = report.failures.len(),
            "Indexing complete"
        );
        Ok(report)
    }

    async fn index_file(
        &self,
        archive_id: &str,
        path: &Path,
        source_id: &str,
        stale: Vec<Passage>,
        force: bool,
    ) -> Result<FileOutcome, ApiError> {
        let content = std::fs::read_to_string(path).map_err(|source| ApiError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let fingerprint = blake3::hash(content.as_bytes());

        if !force && self.fingerprints.lock().get(source_id) == Some(&fingerprint) {
            debug!(source = %source_id, "Unchanged, skipping");
            return Ok(FileOutcome::Unchanged);
        }

        let removed = self.remove_passages(archive_id, &stale).await?;

        if !should_index(&content, self.config.min_content_chars) {
            debug!(source = %source_id, "Below minimum length, not indexed");
            self.fingerprints.lock().insert(source_id.to_string(), fingerprint);
            return Ok(FileOutcome::TooShort { removed });
        }

        let chunks = chunk(
            &content,
            source_id,
            self.config.max_chunk_chars,
            self.config.overlap_chars,
        )?;
        let total = chunks.len();
        for c in &chunks {
            self.service
                .insert_passage(archive_id, &c.passage_text(), &chunk_metadata(c, total))
                .await?;
        }

        self.fingerprints.lock().insert(source_id.to_string(), fingerprint);
        debug!(source = %source_id, chunks = total, removed, "Indexed file");
        Ok(FileOutcome::Indexed {
            chunks: total,
            removed,
        })
    }

    async fn remove_passages(&self, archive_id: &str, stale: &[Passage]) -> Result<usize, ApiError> {
        for passage in stale {
            self.service.delete_passage(archive_id, &passage.id).await?;
        }
        Ok(stale.len())
    }
}

fn group_by_source(passages: Vec<Passage>) -> HashMap<String, Vec<Passage>> {
    let mut grouped: HashMap<String, Vec<Passage>> = HashMap::new();
    for passage in passages {
        if let Some(source) = passage.source().map(str::to_string) {
            grouped.entry(source).or_default().push(passage);
        }
    }
    grouped
}

fn chunk_metadata(c: &Chunk, total: usize) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("source".to_string(), json!(c.source_id));
    metadata.insert("chunk_index".to_string(), json!(c.index));
    metadata.insert("total_chunks".to_string(), json!(total));
    metadata
}
