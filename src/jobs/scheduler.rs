use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, warn};
use once_cell::sync::OnceCell;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use super::{JobKind, JobRunner};
use crate::config::SyncConfig;

/// Shared connectivity flag. The embedding application flips it as the device
/// goes on/offline; queued jobs wait on it before touching the network.
#[derive(Clone)]
pub struct ConnectivityMonitor {
    tx: Arc<watch::Sender<bool>>,
}

impl ConnectivityMonitor {
    pub fn new(online: bool) -> Self {
        let (tx, _) = watch::channel(online);
        Self { tx: Arc::new(tx) }
    }

    pub fn set_online(&self, online: bool) {
        self.tx.send_replace(online);
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// Exponential backoff parameters for job retries.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Give up after this many failed attempts. 0 means retry forever.
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            base_delay: Duration::from_secs(config.retry_base_secs),
            max_delay: Duration::from_secs(config.retry_max_secs),
            max_attempts: config.retry_max_attempts,
        }
    }

    /// Delay before retry number `attempt` (1-based), doubled per attempt and
    /// capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(30),
            max_delay: Duration::from_secs(3600),
            max_attempts: 8,
        }
    }
}

/// Deduplicated background job queue.
///
/// One task per [`JobKind`] at most: enqueueing a kind that is already queued
/// or running is a no-op. Jobs wait for connectivity, invoke the runner once,
/// and on failure are retried by the scheduler with exponential backoff.
pub struct JobScheduler {
    connectivity: ConnectivityMonitor,
    retry: RetryPolicy,
    runner: OnceCell<Arc<dyn JobRunner>>,
    running: Mutex<HashMap<JobKind, JoinHandle<()>>>,
}

impl JobScheduler {
    pub fn new(connectivity: ConnectivityMonitor, retry: RetryPolicy) -> Self {
        Self {
            connectivity,
            retry,
            runner: OnceCell::new(),
            running: Mutex::new(HashMap::new()),
        }
    }

    /// Attach the job runner. Must be called once before any job executes;
    /// enqueues made earlier are rejected with a log line.
    pub fn start(&self, runner: Arc<dyn JobRunner>) {
        if self.runner.set(runner).is_err() {
            warn!("job runner already attached, ignoring");
        }
    }

    /// Enqueue a job with keep-existing-on-conflict semantics: if a job of
    /// this kind is already queued or running, this call does nothing.
    pub async fn enqueue_unique(&self, kind: JobKind) {
        let Some(runner) = self.runner.get().cloned() else {
            error!("cannot enqueue job '{kind}': no runner attached");
            return;
        };

        let mut running = self.running.lock().await;
        running.retain(|_, handle| !handle.is_finished());
        if running.contains_key(&kind) {
            debug!("job '{kind}' already pending, keeping existing");
            return;
        }

        let mut connectivity = self.connectivity.subscribe();
        let retry = self.retry;
        let handle = tokio::spawn(async move {
            let mut attempt = 0u32;
            loop {
                if kind.requires_network() {
                    // Held until online; Err means the monitor is gone, in
                    // which case the attempt proceeds and fails on its own.
                    let _ = connectivity.wait_for(|online| *online).await;
                }

                match runner.run_job(kind).await {
                    Ok(()) => {
                        debug!("job '{kind}' completed");
                        return;
                    }
                    Err(e) => {
                        attempt += 1;
                        if retry.max_attempts > 0 && attempt >= retry.max_attempts {
                            error!("job '{kind}' giving up after {attempt} attempts: {e}");
                            return;
                        }
                        let delay = retry.delay_for(attempt);
                        warn!("job '{kind}' failed (attempt {attempt}): {e}; retrying in {delay:?}");
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        });
        running.insert(kind, handle);
    }

    /// Whether a job of this kind is currently queued or running.
    pub async fn is_pending(&self, kind: JobKind) -> bool {
        let mut running = self.running.lock().await;
        running.retain(|_, handle| !handle.is_finished());
        running.contains_key(&kind)
    }

    /// Number of jobs currently queued or running.
    pub async fn pending_count(&self) -> usize {
        let mut running = self.running.lock().await;
        running.retain(|_, handle| !handle.is_finished());
        running.len()
    }

    /// Cancel all queued and running jobs. In-flight sweeps stop at their next
    /// await point; rows not yet processed stay untouched and retryable.
    pub async fn shutdown(&self) {
        let mut running = self.running.lock().await;
        for (kind, handle) in running.drain() {
            handle.abort();
            debug!("job '{kind}' cancelled");
        }
    }
}
