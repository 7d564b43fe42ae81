//! Mode repository for database operations.

use anyhow::Result;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::entities::mode;

/// Repository for mode-related database operations.
pub struct ModeRepository;

impl ModeRepository {
    /// Get all active modes (soft-deleted rows excluded).
    pub async fn get_all_active<C>(conn: &C) -> Result<Vec<mode::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(mode::Entity::find()
            .filter(mode::Column::IsDeleted.eq(false))
            .order_by_asc(mode::Column::LocalId)
            .all(conn)
            .await?)
    }

    /// Get a single mode by its local id.
    pub async fn get_by_local_id<C>(conn: &C, local_id: i64) -> Result<Option<mode::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(mode::Entity::find_by_id(local_id).one(conn).await?)
    }

    /// Get all active modes that still await a push to the backend.
    pub async fn get_unsynced_active<C>(conn: &C) -> Result<Vec<mode::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(mode::Entity::find()
            .filter(mode::Column::IsSynced.eq(false).and(mode::Column::IsDeleted.eq(false)))
            .order_by_asc(mode::Column::LocalId)
            .all(conn)
            .await?)
    }

    /// Get modes marked deleted locally but not yet deleted on the backend.
    pub async fn get_soft_deleted_unsynced<C>(conn: &C) -> Result<Vec<mode::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(mode::Entity::find()
            .filter(mode::Column::IsDeleted.eq(true).and(mode::Column::IsSynced.eq(false)))
            .all(conn)
            .await?)
    }

    /// Insert a single mode, returning the assigned local id.
    pub async fn insert<C>(conn: &C, mode: mode::ActiveModel) -> Result<i64>
    where
        C: ConnectionTrait,
    {
        Ok(mode::Entity::insert(mode).exec(conn).await?.last_insert_id)
    }

    /// Bulk-insert modes. Rows colliding on an already-known backend id are
    /// left untouched, which keeps cache fills idempotent.
    pub async fn insert_many<C>(conn: &C, modes: Vec<mode::ActiveModel>) -> Result<()>
    where
        C: ConnectionTrait,
    {
        if modes.is_empty() {
            return Ok(());
        }
        mode::Entity::insert_many(modes)
            .on_conflict(OnConflict::column(mode::Column::BackendId).do_nothing().to_owned())
            .exec_without_returning(conn)
            .await?;
        Ok(())
    }

    /// Update a mode in the database.
    pub async fn update<C>(conn: &C, mode: mode::ActiveModel) -> Result<mode::Model>
    where
        C: ConnectionTrait,
    {
        Ok(mode.update(conn).await?)
    }

    /// Physically remove a mode by its local id.
    pub async fn delete_by_local_id<C>(conn: &C, local_id: i64) -> Result<()>
    where
        C: ConnectionTrait,
    {
        mode::Entity::delete_by_id(local_id).exec(conn).await?;
        Ok(())
    }

    /// Physically remove every soft-deleted mode, returning how many rows went away.
    pub async fn purge_soft_deleted<C>(conn: &C) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        let res = mode::Entity::delete_many()
            .filter(mode::Column::IsDeleted.eq(true))
            .exec(conn)
            .await?;
        Ok(res.rows_affected)
    }
}
