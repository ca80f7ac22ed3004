//! Watch events, batching and ignore matching.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub workspace_root: PathBuf,
    /// How long events accumulate before a batch is dispatched
    pub batch_window_ms: u64,
    pub max_batch_size: usize,
    pub ignore_patterns: Vec<String>,
}

impl WatchConfig {
    pub fn new(workspace_root: PathBuf) -> Self {
        Self {
            workspace_root,
            ..Self::default()
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            workspace_root: PathBuf::from("."),
            batch_window_ms: 250,
            max_batch_size: 100,
            ignore_patterns: vec![
                "**/.git/**".to_string(),
                "**/.obsidian/**".to_string(),
                "**/.trash/**".to_string(),
                "**/.DS_Store".to_string(),
                "**/*.swp".to_string(),
                "**/*.tmp".to_string(),
                "**/*~".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChangeEvent {
    Created(PathBuf),
    Modified(PathBuf),
    Removed(PathBuf),
    Renamed { from: PathBuf, to: PathBuf },
}

impl ChangeEvent {
    /// The path the event leaves behind.
    pub fn path(&self) -> &Path {
        match self {
            ChangeEvent::Created(p) | ChangeEvent::Modified(p) | ChangeEvent::Removed(p) => p,
            ChangeEvent::Renamed { to, .. } => to,
        }
    }

    /// Whether the path still holds content after the event.
    pub fn has_content(&self) -> bool {
        !matches!(self, ChangeEvent::Removed(_))
    }
}

/// Collapses repeated events per path; the latest event for a path wins.
pub(crate) struct EventBatcher {
    config: WatchConfig,
    pending: HashMap<PathBuf, ChangeEvent>,
    order: Vec<PathBuf>,
}

impl EventBatcher {
    pub(crate) fn new(config: WatchConfig) -> Self {
        Self {
            config,
            pending: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Queue an event. Returns true when the batch is full.
    pub(crate) fn add_event(&mut self, event: ChangeEvent) -> bool {
        let path = event.path().to_path_buf();
        let relative = path
            .strip_prefix(&self.config.workspace_root)
            .unwrap_or(&path)
            .to_string_lossy()
            .replace('\\', "/");
        if is_ignored(&relative, &self.config.ignore_patterns) {
            return false;
        }

        if self.pending.insert(path.clone(), event).is_none() {
            self.order.push(path);
        }
        self.pending.len() >= self.config.max_batch_size
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drain pending events in first-seen order.
    pub(crate) fn take_batch(&mut self) -> Vec<ChangeEvent> {
        let batch = self
            .order
            .drain(..)
            .filter_map(|path| self.pending.remove(&path))
            .collect();
        self.pending.clear();
        batch
    }
}

/// Match a `/`-separated relative path against simple glob patterns.
///
/// Supported forms: `**/name/**` and `prefix/**` (directory anywhere or at a
/// prefix), `**/*.ext` and `*.ext` (suffix), `**/name` (file name anywhere),
/// and plain paths (exact or leading directory).
pub fn is_ignored(path: &str, patterns: &[String]) -> bool {
    let path = path.replace('\\', "/");
    patterns.iter().any(|pattern| matches_pattern(&path, pattern))
}

fn matches_pattern(path: &str, pattern: &str) -> bool {
    let pattern = pattern.replace('\\', "/");
    let file_name = path.rsplit('/').next().unwrap_or(path);

    if let Some(rest) = pattern.strip_prefix("**/") {
        if let Some(dir) = rest.strip_suffix("/**") {
            return path.split('/').any(|segment| segment == dir);
        }
        return matches_name(file_name, rest);
    }
    if let Some(prefix) = pattern.strip_suffix("/**") {
        return path == prefix || path.starts_with(&format!("{}/", prefix));
    }
    if pattern.contains('*') {
        return matches_name(file_name, &pattern);
    }
    path == pattern || path.starts_with(&format!("{}/", pattern))
}

/// Single-`*` wildcard match on a file name.
fn matches_name(name: &str, pattern: &str) -> bool {
    match pattern.split_once('*') {
        Some((prefix, suffix)) => {
            name.len() >= prefix.len() + suffix.len()
                && name.starts_with(prefix)
                && name.ends_with(suffix)
        }
        None => name == pattern,
    }
}
