//! Corpus indexing against a scripted archive.

use marginalia::config::IndexingConfig;
use marginalia::index::CorpusIndexer;
use marginalia::service::{AgentService, ScriptedAgentService};
use std::sync::Arc;
use tempfile::TempDir;

fn config() -> IndexingConfig {
    IndexingConfig {
        enabled: true,
        archive_id: Some("archive-1".to_string()),
        max_chunk_chars: 100,
        overlap_chars: 10,
        min_content_chars: 20,
        ..IndexingConfig::default()
    }
}

#[tokio::test]
async fn reindexing_a_changed_file_replaces_its_passages() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();
    std::fs::create_dir_all(root.join("2024")).unwrap();
    std::fs::write(root.join("2024/march.md"), "a".repeat(250)).unwrap();
    std::fs::write(root.join("notes.md"), "A short but indexable note.").unwrap();
    std::fs::write(root.join("tiny.md"), "hi").unwrap();
    std::fs::write(root.join("image.png"), "not text at all, not indexed").unwrap();

    let service = Arc::new(ScriptedAgentService::new());
    let indexer = CorpusIndexer::new(
        Arc::clone(&service) as Arc<dyn AgentService>,
        config(),
        root.clone(),
    );

    let report = indexer.index_all().await.unwrap();
    assert_eq!(report.files_indexed, 2);
    assert_eq!(report.files_too_short, 1);
    assert_eq!(report.chunks_uploaded, 4);
    assert_eq!(service.passages("archive-1").len(), 4);

    let unchanged = indexer
        .index_paths(&[root.join("2024/march.md"), root.join("notes.md")])
        .await
        .unwrap();
    assert_eq!(unchanged.files_unchanged, 2);
    assert_eq!(unchanged.files_indexed, 0);

    std::fs::write(root.join("2024/march.md"), "b".repeat(80)).unwrap();
    let report = indexer.index_paths(&[root.join("2024/march.md")]).await.unwrap();
    assert_eq!(report.files_indexed, 1);
    assert_eq!(report.passages_removed, 3);

    let passages = service.passages("archive-1");
    let march: Vec<_> = passages
        .iter()
        .filter(|p| p.source() == Some("2024/march.md"))
        .collect();
    assert_eq!(march.len(), 1);
    assert!(march[0].text.starts_with("File: 2024/march.md\n\n"));
    assert_eq!(passages.len(), 2);
}

#[tokio::test]
async fn one_failing_file_does_not_stop_the_run() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();
    std::fs::write(root.join("good.md"), "Perfectly ordinary entry text.").unwrap();
    std::fs::write(root.join("poison.md"), "This entry contains POISON somewhere.").unwrap();

    let service = Arc::new(ScriptedAgentService::new().fail_passages_containing("POISON"));
    let indexer = CorpusIndexer::new(
        Arc::clone(&service) as Arc<dyn AgentService>,
        config(),
        root,
    );

    let report = indexer.index_all().await.unwrap();
    assert_eq!(report.files_indexed, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, "poison.md");
}
