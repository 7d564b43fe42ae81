//! Mode operations of the sync engine.

use anyhow::{Context, Result};
use log::{debug, error, warn};
use sea_orm::ActiveValue::{NotSet, Set};

use crate::backend::ModeDto;
use crate::entities::{mode, EntityKind};
use crate::jobs::JobKind;
use crate::repositories::{ModeRepository, SyncStatusRepository};
use crate::sync::{Subscription, SyncService};

pub(crate) fn mode_active_model(m: mode::Model) -> mode::ActiveModel {
    mode::ActiveModel {
        local_id: Set(m.local_id),
        backend_id: Set(m.backend_id),
        title: Set(m.title),
        color: Set(m.color),
        is_synced: Set(m.is_synced),
        is_deleted: Set(m.is_deleted),
    }
}

/// Active model for a brand-new row; the store assigns the local id.
pub(crate) fn new_mode_row(m: mode::Model) -> mode::ActiveModel {
    let mut row = mode_active_model(m);
    row.local_id = NotSet;
    row
}

pub(crate) fn mode_to_dto(m: &mode::Model) -> ModeDto {
    ModeDto {
        id: m.backend_id.unwrap_or(0),
        title: m.title.clone(),
        color: m.color.clone(),
        is_deleted: m.is_deleted,
    }
}

/// Local row for a server-side mode. The local id is unknown here; callers
/// fill it in (or leave it unset for inserts).
pub(crate) fn mode_from_dto(dto: &ModeDto) -> mode::Model {
    mode::Model {
        local_id: 0,
        backend_id: Some(dto.id),
        title: dto.title.clone(),
        color: dto.color.clone(),
        is_synced: true,
        is_deleted: dto.is_deleted,
    }
}

impl SyncService {
    /// One-shot list of all active modes from the local store.
    pub async fn get_modes_once(&self) -> Result<Vec<mode::Model>> {
        ModeRepository::get_all_active(&self.storage.conn).await
    }

    /// Live snapshots of the active modes. Each mutation re-emits the full
    /// current snapshot; drop the subscription to stop receiving.
    pub fn observe_modes(&self) -> Subscription<mode::Model> {
        self.mode_subject.subscribe()
    }

    /// Adds a mode locally, then attempts the remote create.
    ///
    /// The optimistic local row is inserted first with `is_synced = false`.
    /// On backend success the backend-assigned identity and the server's
    /// field values are merged in and the row is marked synced. On any remote
    /// failure the unsynced local row is returned as-is; no error escapes.
    pub async fn add_mode(&self, m: mode::Model) -> Result<mode::Model> {
        let unsynced = mode::Model {
            is_synced: false,
            backend_id: None,
            is_deleted: false,
            ..m.clone()
        };
        let local_id = ModeRepository::insert(&self.storage.conn, new_mode_row(unsynced)).await?;
        self.publish_modes().await?;

        match self.backend.create_mode(mode_to_dto(&m)).await {
            Ok(dto) => {
                let merged = mode::Model {
                    local_id,
                    ..mode_from_dto(&dto)
                };
                ModeRepository::update(&self.storage.conn, mode_active_model(merged.clone())).await?;
                self.publish_modes().await?;
                Ok(merged)
            }
            Err(e) => {
                error!("remote create for mode failed, keeping local copy: {e}");
                ModeRepository::get_by_local_id(&self.storage.conn, local_id)
                    .await?
                    .context("mode row missing right after insert")
            }
        }
    }

    /// Updates a mode locally, then mirrors the update to the backend.
    ///
    /// The local row is written first with `is_synced = false`. On backend
    /// success the server's returned representation is written back as the
    /// authoritative value. On failure the row stays unsynced and a sync job
    /// is scheduled to push it later.
    pub async fn update_mode(&self, m: mode::Model) -> Result<()> {
        let unsynced = mode::Model {
            is_synced: false,
            ..m.clone()
        };
        ModeRepository::update(&self.storage.conn, mode_active_model(unsynced)).await?;
        self.publish_modes().await?;

        let Some(backend_id) = m.backend_id else {
            error!("cannot update mode {}: no backend id assigned yet", m.local_id);
            return Ok(());
        };

        match self.backend.update_mode(backend_id, mode_to_dto(&m)).await {
            Ok(dto) => {
                let synced = mode::Model {
                    local_id: m.local_id,
                    ..mode_from_dto(&dto)
                };
                ModeRepository::update(&self.storage.conn, mode_active_model(synced)).await?;
                self.publish_modes().await?;
            }
            Err(e) => {
                error!("error updating mode {backend_id}: {e}");
                self.scheduler.enqueue_unique(JobKind::SyncModes).await;
            }
        }
        Ok(())
    }

    /// Marks a mode as deleted locally and schedules the remote deletion.
    pub async fn delete_mode(&self, m: mode::Model) -> Result<()> {
        let deleted = mode::Model {
            is_deleted: true,
            is_synced: false,
            ..m
        };
        ModeRepository::update(&self.storage.conn, mode_active_model(deleted)).await?;
        self.publish_modes().await?;
        self.scheduler.enqueue_unique(JobKind::DeleteModes).await;
        Ok(())
    }

    /// Syncs modes with the backend.
    ///
    /// The first call ever performs the bootstrap pull and records it in the
    /// status tracker; every later call defers to the background sync job.
    pub async fn sync_modes(&self) -> Result<()> {
        if !SyncStatusRepository::has_completed_initial_sync(&self.storage.conn, EntityKind::Modes).await? {
            self.fetch_modes_from_backend_and_cache().await?;
            SyncStatusRepository::set_completed_initial_sync(&self.storage.conn, EntityKind::Modes, true).await?;
        } else {
            self.scheduler.enqueue_unique(JobKind::SyncModes).await;
        }
        Ok(())
    }

    /// Pulls the full remote mode collection and inserts only rows whose
    /// backend identity is not yet known locally. Never overwrites existing
    /// rows, so repeated calls are idempotent.
    pub async fn fetch_modes_from_backend_and_cache(&self) -> Result<()> {
        let remote = match self.backend.list_modes().await {
            Ok(remote) => remote,
            Err(e) => {
                error!("error fetching modes: {e}");
                return Ok(());
            }
        };

        let known: Vec<i32> = ModeRepository::get_all_active(&self.storage.conn)
            .await?
            .into_iter()
            .filter_map(|m| m.backend_id)
            .collect();

        let new_rows: Vec<mode::ActiveModel> = remote
            .iter()
            .filter(|dto| !known.contains(&dto.id))
            .map(|dto| new_mode_row(mode_from_dto(dto)))
            .collect();

        if new_rows.is_empty() {
            debug!("no new modes to insert");
            return Ok(());
        }

        ModeRepository::insert_many(&self.storage.conn, new_rows).await?;
        self.publish_modes().await?;
        Ok(())
    }

    /// Sweeps locally soft-deleted modes: deletes each on the backend (skipped
    /// when the row never got a backend identity) and purges the local row on
    /// success. Per-row failures are logged and left for the next sweep; if
    /// any row failed, an error is returned so the scheduler retries.
    pub async fn sync_deleted_modes(&self) -> Result<()> {
        let deleted = ModeRepository::get_soft_deleted_unsynced(&self.storage.conn).await?;
        let total = deleted.len();
        let mut failed = 0usize;
        let mut purged = false;

        for m in deleted {
            match m.backend_id {
                Some(backend_id) => match self.backend.delete_mode(backend_id).await {
                    Ok(()) => {
                        ModeRepository::delete_by_local_id(&self.storage.conn, m.local_id).await?;
                        purged = true;
                    }
                    Err(e) => {
                        failed += 1;
                        error!("failed to delete mode {backend_id} from backend: {e}");
                    }
                },
                // Never synced: nothing to delete remotely, just drop the row.
                None => {
                    ModeRepository::delete_by_local_id(&self.storage.conn, m.local_id).await?;
                    purged = true;
                }
            }
        }

        if purged {
            self.publish_modes().await?;
        }
        if failed > 0 {
            anyhow::bail!("{failed} of {total} deleted modes still pending remote delete");
        }
        Ok(())
    }

    /// Pushes every unsynced active mode to the backend: creates rows that
    /// never got a backend identity, updates the rest. Run by the background
    /// sync job; per-row failures are logged, counted, and reported back so
    /// the scheduler retries.
    pub async fn push_unsynced_modes(&self) -> Result<()> {
        let pending = ModeRepository::get_unsynced_active(&self.storage.conn).await?;
        let total = pending.len();
        let mut failed = 0usize;

        for m in pending {
            let outcome = match m.backend_id {
                None => self.backend.create_mode(mode_to_dto(&m)).await,
                Some(backend_id) => self.backend.update_mode(backend_id, mode_to_dto(&m)).await,
            };
            match outcome {
                Ok(dto) => {
                    let synced = mode::Model {
                        local_id: m.local_id,
                        ..mode_from_dto(&dto)
                    };
                    ModeRepository::update(&self.storage.conn, mode_active_model(synced)).await?;
                }
                Err(e) => {
                    failed += 1;
                    warn!("failed to push mode {}: {e}", m.local_id);
                }
            }
        }

        if total > 0 {
            self.publish_modes().await?;
        }
        if failed > 0 {
            anyhow::bail!("{failed} of {total} modes still unsynced");
        }
        Ok(())
    }
}
