//! Task operations of the sync engine.
//!
//! Tasks reference modes through a local-only foreign key; every network
//! round-trip translates it to the mode's backend identity and back. Remote
//! tasks whose mode cannot be resolved locally are dropped rather than
//! inserted with a dangling reference.

use anyhow::{Context, Result};
use log::{debug, error, warn};
use sea_orm::ActiveValue::{NotSet, Set};

use crate::backend::TaskDto;
use crate::entities::{mode, task, EntityKind};
use crate::jobs::JobKind;
use crate::repositories::{ModeRepository, SyncStatusRepository, TaskRepository};
use crate::sync::{Subscription, SyncService};

pub(crate) fn task_active_model(t: task::Model) -> task::ActiveModel {
    task::ActiveModel {
        local_id: Set(t.local_id),
        backend_id: Set(t.backend_id),
        title: Set(t.title),
        mode_id: Set(t.mode_id),
        is_completed: Set(t.is_completed),
        time_logged: Set(t.time_logged),
        is_synced: Set(t.is_synced),
        is_deleted: Set(t.is_deleted),
    }
}

/// Active model for a brand-new row; the store assigns the local id.
pub(crate) fn new_task_row(t: task::Model) -> task::ActiveModel {
    let mut row = task_active_model(t);
    row.local_id = NotSet;
    row
}

/// Translate the local mode reference to the mode's backend identity. A mode
/// that was never synced yields 0, which the backend rejects; the row then
/// simply stays unsynced until the mode has its identity.
pub(crate) fn task_to_dto(t: &task::Model, modes: &[mode::Model]) -> TaskDto {
    let remote_mode_id = modes
        .iter()
        .find(|m| m.local_id == t.mode_id)
        .and_then(|m| m.backend_id)
        .unwrap_or(0);

    TaskDto {
        id: t.backend_id.unwrap_or(0),
        title: t.title.clone(),
        mode_id: remote_mode_id,
        is_completed: t.is_completed,
        time_logged: t.time_logged,
        is_deleted: t.is_deleted,
    }
}

/// Local row for a server-side task, resolving the remote mode id against the
/// locally known modes. `None` when the referenced mode is unknown locally.
pub(crate) fn task_from_dto(dto: &TaskDto, modes: &[mode::Model]) -> Option<task::Model> {
    let mode = modes.iter().find(|m| m.backend_id == Some(dto.mode_id))?;
    Some(task::Model {
        local_id: 0,
        backend_id: Some(dto.id),
        title: dto.title.clone(),
        mode_id: mode.local_id,
        is_completed: dto.is_completed,
        time_logged: dto.time_logged,
        is_synced: true,
        is_deleted: dto.is_deleted,
    })
}

impl SyncService {
    /// One-shot list of all active tasks from the local store.
    pub async fn get_tasks_once(&self) -> Result<Vec<task::Model>> {
        TaskRepository::get_all_active(&self.storage.conn).await
    }

    /// One-shot list of the active tasks belonging to a mode.
    pub async fn get_tasks_for_mode(&self, mode_local_id: i64) -> Result<Vec<task::Model>> {
        TaskRepository::get_for_mode(&self.storage.conn, mode_local_id).await
    }

    /// Live snapshots of the active tasks. Each mutation re-emits the full
    /// current snapshot; drop the subscription to stop receiving.
    pub fn observe_tasks(&self) -> Subscription<task::Model> {
        self.task_subject.subscribe()
    }

    /// Adds a task locally, then attempts the remote create.
    ///
    /// Mirrors [`SyncService::add_mode`]: optimistic unsynced insert first,
    /// merge of the backend identity and server field values on success, and
    /// the plain unsynced local row on any remote failure.
    pub async fn add_task(&self, t: task::Model) -> Result<task::Model> {
        let unsynced = task::Model {
            is_synced: false,
            backend_id: None,
            is_deleted: false,
            ..t.clone()
        };
        let local_id = TaskRepository::insert(&self.storage.conn, new_task_row(unsynced)).await?;
        self.publish_tasks().await?;

        let modes = ModeRepository::get_all_active(&self.storage.conn).await?;
        let created = match self.backend.create_task(task_to_dto(&t, &modes)).await {
            Ok(dto) => {
                let resolved = task_from_dto(&dto, &modes);
                if resolved.is_none() {
                    warn!("create response for task {local_id} references unknown mode {}", dto.mode_id);
                }
                resolved
            }
            Err(e) => {
                error!("remote create for task failed, keeping local copy: {e}");
                None
            }
        };

        match created {
            Some(created) => {
                let merged = task::Model { local_id, ..created };
                TaskRepository::update(&self.storage.conn, task_active_model(merged.clone())).await?;
                self.publish_tasks().await?;
                Ok(merged)
            }
            None => TaskRepository::get_by_local_id(&self.storage.conn, local_id)
                .await?
                .context("task row missing right after insert"),
        }
    }

    /// Updates a task locally, then mirrors the update to the backend.
    ///
    /// A task that never got a backend identity cannot be updated remotely;
    /// the call logs and returns without touching the store. Otherwise the
    /// local row is written unsynced first, and on backend success the
    /// server's returned representation is written back as authoritative. On
    /// failure the row stays unsynced and a sync job is scheduled.
    pub async fn update_task(&self, t: task::Model) -> Result<()> {
        let Some(backend_id) = t.backend_id else {
            error!("cannot update task {}: no backend id assigned yet", t.local_id);
            return Ok(());
        };

        let unsynced = task::Model {
            is_synced: false,
            ..t.clone()
        };
        TaskRepository::update(&self.storage.conn, task_active_model(unsynced)).await?;
        self.publish_tasks().await?;

        let modes = ModeRepository::get_all_active(&self.storage.conn).await?;
        match self.backend.update_task(backend_id, task_to_dto(&t, &modes)).await {
            Ok(dto) => match task_from_dto(&dto, &modes) {
                Some(updated) => {
                    let synced = task::Model {
                        local_id: t.local_id,
                        ..updated
                    };
                    TaskRepository::update(&self.storage.conn, task_active_model(synced)).await?;
                    self.publish_tasks().await?;
                }
                None => {
                    warn!("update response for task {backend_id} references unknown mode {}", dto.mode_id);
                }
            },
            Err(e) => {
                error!("error updating task {backend_id}: {e}");
                self.scheduler.enqueue_unique(JobKind::SyncTasks).await;
            }
        }
        Ok(())
    }

    /// Marks a task as deleted locally and schedules the remote deletion.
    pub async fn delete_task(&self, t: task::Model) -> Result<()> {
        let deleted = task::Model {
            is_deleted: true,
            is_synced: false,
            ..t
        };
        TaskRepository::update(&self.storage.conn, task_active_model(deleted)).await?;
        self.publish_tasks().await?;
        self.scheduler.enqueue_unique(JobKind::DeleteTasks).await;
        Ok(())
    }

    /// Syncs tasks with the backend.
    ///
    /// The first call ever performs the bootstrap pull and records it in the
    /// status tracker; every later call defers to the background sync job.
    pub async fn sync_tasks(&self) -> Result<()> {
        if !SyncStatusRepository::has_completed_initial_sync(&self.storage.conn, EntityKind::Tasks).await? {
            self.fetch_tasks_from_backend_and_cache().await?;
            SyncStatusRepository::set_completed_initial_sync(&self.storage.conn, EntityKind::Tasks, true).await?;
        } else {
            self.scheduler.enqueue_unique(JobKind::SyncTasks).await;
        }
        Ok(())
    }

    /// Pulls the full remote task collection and inserts only rows whose
    /// backend identity is not yet known locally. Modes are bootstrapped
    /// first when none are cached yet, since every task must resolve its
    /// mode reference; tasks that cannot are silently dropped.
    pub async fn fetch_tasks_from_backend_and_cache(&self) -> Result<()> {
        let remote = match self.backend.list_tasks().await {
            Ok(remote) => remote,
            Err(e) => {
                error!("error fetching tasks: {e}");
                return Ok(());
            }
        };

        let mut modes = ModeRepository::get_all_active(&self.storage.conn).await?;
        if modes.is_empty()
            && !SyncStatusRepository::has_completed_initial_sync(&self.storage.conn, EntityKind::Modes).await?
        {
            self.fetch_modes_from_backend_and_cache().await?;
            SyncStatusRepository::set_completed_initial_sync(&self.storage.conn, EntityKind::Modes, true).await?;
            modes = ModeRepository::get_all_active(&self.storage.conn).await?;
        }

        let known: Vec<i32> = TaskRepository::get_all_active(&self.storage.conn)
            .await?
            .into_iter()
            .filter_map(|t| t.backend_id)
            .collect();

        let new_rows: Vec<task::ActiveModel> = remote
            .iter()
            .filter(|dto| !known.contains(&dto.id))
            .filter_map(|dto| match task_from_dto(dto, &modes) {
                Some(t) => Some(new_task_row(t)),
                None => {
                    warn!("dropping remote task {} referencing unknown mode {}", dto.id, dto.mode_id);
                    None
                }
            })
            .collect();

        if new_rows.is_empty() {
            debug!("no new tasks to insert");
            return Ok(());
        }

        TaskRepository::insert_many(&self.storage.conn, new_rows).await?;
        self.publish_tasks().await?;
        Ok(())
    }

    /// Sweeps locally soft-deleted tasks: deletes each on the backend (skipped
    /// when the row never got a backend identity) and purges the local row on
    /// success. Per-row failures are logged and left for the next sweep; if
    /// any row failed, an error is returned so the scheduler retries.
    pub async fn sync_deleted_tasks(&self) -> Result<()> {
        let deleted = TaskRepository::get_soft_deleted_unsynced(&self.storage.conn).await?;
        let total = deleted.len();
        let mut failed = 0usize;
        let mut purged = false;

        for t in deleted {
            match t.backend_id {
                Some(backend_id) => match self.backend.delete_task(backend_id).await {
                    Ok(()) => {
                        TaskRepository::delete_by_local_id(&self.storage.conn, t.local_id).await?;
                        purged = true;
                    }
                    Err(e) => {
                        failed += 1;
                        error!("failed to delete task {backend_id} from backend: {e}");
                    }
                },
                // Never synced: nothing to delete remotely, just drop the row.
                None => {
                    TaskRepository::delete_by_local_id(&self.storage.conn, t.local_id).await?;
                    purged = true;
                }
            }
        }

        if purged {
            self.publish_tasks().await?;
        }
        if failed > 0 {
            anyhow::bail!("{failed} of {total} deleted tasks still pending remote delete");
        }
        Ok(())
    }

    /// Pushes every unsynced active task to the backend: creates rows that
    /// never got a backend identity, updates the rest. Run by the background
    /// sync job; per-row failures are logged, counted, and reported back so
    /// the scheduler retries.
    pub async fn push_unsynced_tasks(&self) -> Result<()> {
        let pending = TaskRepository::get_unsynced_active(&self.storage.conn).await?;
        let total = pending.len();
        let mut failed = 0usize;

        let modes = ModeRepository::get_all_active(&self.storage.conn).await?;
        for t in pending {
            let outcome = match t.backend_id {
                None => self.backend.create_task(task_to_dto(&t, &modes)).await,
                Some(backend_id) => self.backend.update_task(backend_id, task_to_dto(&t, &modes)).await,
            };
            match outcome {
                Ok(dto) => match task_from_dto(&dto, &modes) {
                    Some(synced) => {
                        let merged = task::Model {
                            local_id: t.local_id,
                            ..synced
                        };
                        TaskRepository::update(&self.storage.conn, task_active_model(merged)).await?;
                    }
                    None => {
                        failed += 1;
                        warn!("push response for task {} references unknown mode {}", t.local_id, dto.mode_id);
                    }
                },
                Err(e) => {
                    failed += 1;
                    warn!("failed to push task {}: {e}", t.local_id);
                }
            }
        }

        if total > 0 {
            self.publish_tasks().await?;
        }
        if failed > 0 {
            anyhow::bail!("{failed} of {total} tasks still unsynced");
        }
        Ok(())
    }
}
