//! Sync status tracker: persisted bootstrap-pull flags, one row per entity kind.

use anyhow::Result;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue, ConnectionTrait, EntityTrait};

use crate::entities::sync_status;
use crate::entities::EntityKind;

/// Repository for the per-entity-type initial sync flags.
pub struct SyncStatusRepository;

impl SyncStatusRepository {
    /// Whether the one-time bootstrap pull has completed for this entity kind.
    /// Missing rows read as `false`.
    pub async fn has_completed_initial_sync<C>(conn: &C, kind: EntityKind) -> Result<bool>
    where
        C: ConnectionTrait,
    {
        Ok(sync_status::Entity::find_by_id(kind.as_str())
            .one(conn)
            .await?
            .is_some_and(|row| row.initial_synced))
    }

    /// Record whether the bootstrap pull has completed for this entity kind.
    pub async fn set_completed_initial_sync<C>(conn: &C, kind: EntityKind, synced: bool) -> Result<()>
    where
        C: ConnectionTrait,
    {
        let row = sync_status::ActiveModel {
            entity_kind: ActiveValue::Set(kind.as_str().to_string()),
            initial_synced: ActiveValue::Set(synced),
        };
        sync_status::Entity::insert(row)
            .on_conflict(
                OnConflict::column(sync_status::Column::EntityKind)
                    .update_column(sync_status::Column::InitialSynced)
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;
        Ok(())
    }
}
