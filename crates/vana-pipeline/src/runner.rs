//! Supervised spawning of pipeline tasks.
//!
//! Submission never blocks: every accepted job gets a task immediately, and
//! the concurrency bound is enforced inside the task by a semaphore permit.
//! A queued job therefore sits in `Pending` until a permit frees up.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinHandle;
use tracing::debug;

use vana_models::JobId;

/// Tracks in-flight pipeline tasks and bounds how many run at once.
pub struct PipelineRunner {
    semaphore: Arc<Semaphore>,
    in_flight: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl PipelineRunner {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Spawn a pipeline task for `job_id`. Returns immediately; the task
    /// waits for a concurrency permit before doing any work.
    pub async fn spawn<F>(&self, job_id: &JobId, pipeline: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let semaphore = Arc::clone(&self.semaphore);
        let id = job_id.as_str().to_string();

        let handle = tokio::spawn(async move {
            // Held for the duration of the pipeline run. The semaphore is
            // never closed, so acquire can only fail at shutdown.
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return;
            };
            pipeline.await;
        });

        let mut in_flight = self.in_flight.lock().await;
        in_flight.retain(|_, h| !h.is_finished());
        in_flight.insert(id, handle);
        debug!(tracked = in_flight.len(), "pipeline task spawned");
    }

    /// Number of tracked tasks that have not yet finished.
    pub async fn in_flight_count(&self) -> usize {
        let mut in_flight = self.in_flight.lock().await;
        in_flight.retain(|_, h| !h.is_finished());
        in_flight.len()
    }

    /// Abort all tracked tasks. Used on shutdown.
    pub async fn abort_all(&self) {
        let mut in_flight = self.in_flight.lock().await;
        for (_, handle) in in_flight.drain() {
            handle.abort();
        }
    }
}
