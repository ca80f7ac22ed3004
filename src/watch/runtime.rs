//! Watch daemon.

use super::events::{ChangeEvent, EventBatcher, WatchConfig};
use crate::error::ApiError;
use async_trait::async_trait;
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Receives batches of filesystem changes.
#[async_trait]
pub trait ChangeHandler: Send + Sync {
    async fn handle_batch(&self, events: Vec<ChangeEvent>);
}

pub struct WatchDaemon {
    config: WatchConfig,
}

impl WatchDaemon {
    pub fn new(config: WatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Watch the workspace until `shutdown` resolves, dispatching batched
    /// events to `handler`.
    pub async fn run<H, S>(&self, handler: &H, shutdown: S) -> Result<(), ApiError>
    where
        H: ChangeHandler + ?Sized,
        S: Future<Output = ()>,
    {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            // The receiver only goes away on shutdown.
            let _ = tx.send(res);
        })?;
        watcher.watch(&self.config.workspace_root, RecursiveMode::Recursive)?;
        info!(workspace = %self.config.workspace_root.display(), "Watching workspace");

        let mut batcher = EventBatcher::new(self.config.clone());
        let mut ticker = tokio::time::interval(Duration::from_millis(self.config.batch_window_ms));
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Stopping watch");
                    break;
                }
                received = rx.recv() => match received {
                    Some(Ok(event)) => {
                        if let Some(change) = convert_event(event) {
                            debug!(?change, "Change event");
                            if batcher.add_event(change) {
                                handler.handle_batch(batcher.take_batch()).await;
                            }
                        }
                    }
                    Some(Err(e)) => warn!(error = %e, "Watch error"),
                    None => {
                        error!("Watcher channel disconnected");
                        break;
                    }
                },
                _ = ticker.tick() => {
                    if !batcher.is_empty() {
                        handler.handle_batch(batcher.take_batch()).await;
                    }
                }
            }
        }

        if !batcher.is_empty() {
            handler.handle_batch(batcher.take_batch()).await;
        }
        drop(watcher);
        Ok(())
    }
}

/// Map a notify event onto a change event. Access and metadata-only events
/// are dropped.
pub fn convert_event(event: Event) -> Option<ChangeEvent> {
    let first = event.paths.first().cloned();
    match event.kind {
        EventKind::Create(_) => first.map(ChangeEvent::Created),
        EventKind::Modify(ModifyKind::Name(_)) => match event.paths.as_slice() {
            [from, to, ..] => Some(ChangeEvent::Renamed {
                from: from.clone(),
                to: to.clone(),
            }),
            _ => first.map(ChangeEvent::Modified),
        },
        EventKind::Modify(ModifyKind::Metadata(_)) => None,
        EventKind::Modify(_) => first.map(ChangeEvent::Modified),
        EventKind::Remove(_) => first.map(ChangeEvent::Removed),
        _ => None,
    }
}
