//! Background job scheduling for deferred sync work.
//!
//! Jobs are a closed set of kinds, one per entity-type × operation pair, with
//! stable keys. The scheduler deduplicates by kind (keep-existing-on-conflict),
//! holds jobs until connectivity is available, and owns retry/backoff; the job
//! body itself only runs the matching engine sweep once and reports the outcome.

use std::fmt;

use anyhow::Result;
use async_trait::async_trait;

pub mod scheduler;

pub use scheduler::{ConnectivityMonitor, JobScheduler, RetryPolicy};

/// The closed set of background job kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    SyncModes,
    DeleteModes,
    SyncTasks,
    DeleteTasks,
}

impl JobKind {
    /// Stable unique key identifying this job in the queue.
    pub fn key(self) -> &'static str {
        match self {
            JobKind::SyncModes => "sync modes",
            JobKind::DeleteModes => "delete modes",
            JobKind::SyncTasks => "sync tasks",
            JobKind::DeleteTasks => "delete tasks",
        }
    }

    /// Whether this job must wait for network connectivity before running.
    pub fn requires_network(self) -> bool {
        match self {
            JobKind::SyncModes | JobKind::DeleteModes | JobKind::SyncTasks | JobKind::DeleteTasks => true,
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Executes one job kind to completion. Implemented by the sync engine with an
/// exhaustive match; an `Err` asks the scheduler for a retry.
#[async_trait]
pub trait JobRunner: Send + Sync + 'static {
    async fn run_job(&self, kind: JobKind) -> Result<()>;
}
