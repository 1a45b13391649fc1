//! Background enrichment worker.
//!
//! Bookmark IDs are queued on an mpsc channel; the worker enriches up to
//! `max_concurrent_jobs` of them at a time and reports progress on a broadcast
//! channel.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

use paperloft_core::{Error, LinkLookupStatus, Result};

use crate::enrich::Enricher;

/// Default number of bookmarks enriched concurrently.
pub const DEFAULT_MAX_CONCURRENT: usize = 2;
/// Pending enrichment requests before `enqueue` waits.
pub const QUEUE_CAPACITY: usize = 256;
const EVENT_CAPACITY: usize = 256;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum number of bookmarks enriched at once.
    pub max_concurrent_jobs: usize,
    /// Whether to process the queue at all.
    pub enabled: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: DEFAULT_MAX_CONCURRENT,
            enabled: true,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `ENRICH_WORKER_ENABLED` | `true` | Enable/disable enrichment |
    /// | `ENRICH_MAX_CONCURRENT` | `2` | Max bookmarks enriched at once |
    pub fn from_env() -> Self {
        let enabled = std::env::var("ENRICH_WORKER_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let max_concurrent_jobs = std::env::var("ENRICH_MAX_CONCURRENT")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_CONCURRENT)
            .max(1);

        Self {
            max_concurrent_jobs,
            enabled,
        }
    }

    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent_jobs = max.max(1);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Event emitted by the enrichment worker.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    WorkerStarted,
    WorkerStopped,
    JobStarted {
        bookmark_id: String,
    },
    JobCompleted {
        bookmark_id: String,
        links_status: LinkLookupStatus,
        link_count: usize,
    },
    /// The bookmark was removed before it could be enriched.
    JobSkipped {
        bookmark_id: String,
    },
    JobFailed {
        bookmark_id: String,
        error: String,
    },
}

/// Sender side of the enrichment queue.
#[derive(Debug, Clone)]
pub struct EnrichmentQueue {
    tx: mpsc::Sender<String>,
}

impl EnrichmentQueue {
    /// Queue a bookmark for enrichment.
    pub async fn enqueue(&self, bookmark_id: impl Into<String>) -> Result<()> {
        let bookmark_id = bookmark_id.into();
        debug!(subsystem = "jobs", component = "worker", bookmark_id = %bookmark_id, "Enrichment queued");
        self.tx
            .send(bookmark_id)
            .await
            .map_err(|_| Error::Internal("Enrichment worker is not running".into()))
    }
}

/// Handle for controlling a running worker.
pub struct WorkerHandle {
    shutdown_tx: mpsc::Sender<()>,
    event_rx: broadcast::Receiver<WorkerEvent>,
    queue: EnrichmentQueue,
}

impl WorkerHandle {
    /// Signal the worker to shut down gracefully. In-flight jobs finish first.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| Error::Internal("Failed to send shutdown signal".into()))?;
        Ok(())
    }

    /// Get a receiver for worker events.
    pub fn events(&self) -> broadcast::Receiver<WorkerEvent> {
        self.event_rx.resubscribe()
    }

    pub fn queue(&self) -> EnrichmentQueue {
        self.queue.clone()
    }
}

/// Enrichment worker.
pub struct EnrichmentWorker {
    enricher: Enricher,
    config: WorkerConfig,
    event_tx: broadcast::Sender<WorkerEvent>,
}

impl EnrichmentWorker {
    pub fn new(enricher: Enricher, config: WorkerConfig) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            enricher,
            config,
            event_tx,
        }
    }

    /// Start the worker and return a handle for control.
    pub fn start(self) -> WorkerHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let (job_tx, mut job_rx) = mpsc::channel(QUEUE_CAPACITY);
        let event_rx = self.event_tx.subscribe();

        tokio::spawn(async move {
            self.run(&mut job_rx, &mut shutdown_rx).await;
        });

        WorkerHandle {
            shutdown_tx,
            event_rx,
            queue: EnrichmentQueue { tx: job_tx },
        }
    }

    #[instrument(skip(self, job_rx, shutdown_rx), fields(subsystem = "jobs", component = "worker"))]
    async fn run(&self, job_rx: &mut mpsc::Receiver<String>, shutdown_rx: &mut mpsc::Receiver<()>) {
        if !self.config.enabled {
            info!("Enrichment worker is disabled, not starting");
            return;
        }

        info!(
            max_concurrent = self.config.max_concurrent_jobs,
            "Enrichment worker started"
        );
        let _ = self.event_tx.send(WorkerEvent::WorkerStarted);

        let permits = Arc::new(Semaphore::new(self.config.max_concurrent_jobs));
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Enrichment worker received shutdown signal");
                    break;
                }
                next = job_rx.recv() => {
                    let Some(bookmark_id) = next else {
                        info!("Enrichment queue closed");
                        break;
                    };
                    let permit = match permits.clone().acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => break,
                    };
                    let enricher = self.enricher.clone();
                    let event_tx = self.event_tx.clone();
                    tasks.spawn(async move {
                        execute_job(enricher, event_tx, bookmark_id).await;
                        drop(permit);
                    });
                }
                Some(result) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = result {
                        error!(error = ?e, "Enrichment task panicked");
                    }
                }
            }
        }

        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                error!(error = ?e, "Enrichment task panicked");
            }
        }

        let _ = self.event_tx.send(WorkerEvent::WorkerStopped);
        info!("Enrichment worker stopped");
    }
}

async fn execute_job(
    enricher: Enricher,
    event_tx: broadcast::Sender<WorkerEvent>,
    bookmark_id: String,
) {
    let start = std::time::Instant::now();
    let _ = event_tx.send(WorkerEvent::JobStarted {
        bookmark_id: bookmark_id.clone(),
    });

    match enricher.enrich(&bookmark_id).await {
        Ok(Some(outcome)) => {
            info!(
                subsystem = "jobs",
                component = "worker",
                bookmark_id = %bookmark_id,
                duration_ms = start.elapsed().as_millis() as u64,
                "Enrichment completed"
            );
            let _ = event_tx.send(WorkerEvent::JobCompleted {
                bookmark_id,
                links_status: outcome.links_status,
                link_count: outcome.link_count,
            });
        }
        Ok(None) => {
            let _ = event_tx.send(WorkerEvent::JobSkipped { bookmark_id });
        }
        Err(e) => {
            warn!(
                subsystem = "jobs",
                component = "worker",
                bookmark_id = %bookmark_id,
                error = %e,
                "Enrichment failed"
            );
            let _ = event_tx.send(WorkerEvent::JobFailed {
                bookmark_id,
                error: e.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WorkerConfig::default();
        assert!(config.enabled);
        assert_eq!(config.max_concurrent_jobs, DEFAULT_MAX_CONCURRENT);
    }

    #[test]
    fn test_with_max_concurrent_floor() {
        let config = WorkerConfig::default().with_max_concurrent(0);
        assert_eq!(config.max_concurrent_jobs, 1);
        assert!(!WorkerConfig::default().with_enabled(false).enabled);
    }
}
