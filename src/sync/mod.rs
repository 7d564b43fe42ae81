//! Synchronization engine for the modalist data layer.
//!
//! This module provides the [`SyncService`] struct which reconciles the local
//! store with the remote backend under unreliable connectivity. All mutations
//! are written locally first (optimistic writes), mirrored to the backend on a
//! best-effort basis, and swept by deduplicated background jobs until the two
//! sides converge.
//!
//! The sync service acts as the main data layer for the application, offering:
//! - Fast local reads and live snapshot observation for UI consumers
//! - Optimistic local writes with immediate best-effort remote mirroring
//! - Soft deletion with deferred remote delete and local purge
//! - One-time bootstrap pull per entity type, then incremental cache fills

pub mod modes;
pub mod observer;
pub mod tasks;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::backend::Backend;
use crate::entities::{mode, task};
use crate::jobs::{JobKind, JobRunner, JobScheduler};
use crate::repositories::{ModeRepository, TaskRepository};
use crate::storage::LocalStorage;

pub use observer::{Subject, Subscription};

/// Engine mediating between the local store and the remote backend.
///
/// Owns all reconciliation policy for both entity types. Every operation is
/// local-first: a remote failure never propagates past this boundary, it only
/// leaves rows unsynced for a later background sweep.
pub struct SyncService {
    storage: Arc<LocalStorage>,
    backend: Arc<dyn Backend>,
    scheduler: Arc<JobScheduler>,
    mode_subject: Subject<mode::Model>,
    task_subject: Subject<task::Model>,
}

impl SyncService {
    /// Build the engine on an explicitly constructed storage handle, backend
    /// client, and scheduler. Primes the observation subjects with the current
    /// store contents.
    pub async fn new(
        storage: Arc<LocalStorage>,
        backend: Arc<dyn Backend>,
        scheduler: Arc<JobScheduler>,
    ) -> Result<Self> {
        let service = Self {
            storage,
            backend,
            scheduler,
            mode_subject: Subject::new(),
            task_subject: Subject::new(),
        };
        service.publish_modes().await?;
        service.publish_tasks().await?;
        Ok(service)
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    pub fn scheduler(&self) -> &JobScheduler {
        &self.scheduler
    }

    /// Re-read the active mode snapshot and fan it out to subscribers.
    pub(crate) async fn publish_modes(&self) -> Result<()> {
        let snapshot = ModeRepository::get_all_active(&self.storage.conn).await?;
        self.mode_subject.publish(snapshot);
        Ok(())
    }

    /// Re-read the active task snapshot and fan it out to subscribers.
    pub(crate) async fn publish_tasks(&self) -> Result<()> {
        let snapshot = TaskRepository::get_all_active(&self.storage.conn).await?;
        self.task_subject.publish(snapshot);
        Ok(())
    }
}

#[async_trait]
impl JobRunner for SyncService {
    async fn run_job(&self, kind: JobKind) -> Result<()> {
        match kind {
            JobKind::SyncModes => self.push_unsynced_modes().await,
            JobKind::DeleteModes => self.sync_deleted_modes().await,
            JobKind::SyncTasks => self.push_unsynced_tasks().await,
            JobKind::DeleteTasks => self.sync_deleted_tasks().await,
        }
    }
}
