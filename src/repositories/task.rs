//! Task repository for database operations.

use anyhow::Result;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::entities::task;

/// Repository for task-related database operations.
pub struct TaskRepository;

impl TaskRepository {
    /// Get all active tasks (soft-deleted rows excluded).
    pub async fn get_all_active<C>(conn: &C) -> Result<Vec<task::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(task::Entity::find()
            .filter(task::Column::IsDeleted.eq(false))
            .order_by_asc(task::Column::IsCompleted)
            .order_by_asc(task::Column::LocalId)
            .all(conn)
            .await?)
    }

    /// Get a single task by its local id.
    pub async fn get_by_local_id<C>(conn: &C, local_id: i64) -> Result<Option<task::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(task::Entity::find_by_id(local_id).one(conn).await?)
    }

    /// Get all active tasks for a specific mode.
    pub async fn get_for_mode<C>(conn: &C, mode_local_id: i64) -> Result<Vec<task::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(task::Entity::find()
            .filter(task::Column::ModeId.eq(mode_local_id).and(task::Column::IsDeleted.eq(false)))
            .order_by_asc(task::Column::IsCompleted)
            .order_by_asc(task::Column::LocalId)
            .all(conn)
            .await?)
    }

    /// Get all active tasks that still await a push to the backend.
    pub async fn get_unsynced_active<C>(conn: &C) -> Result<Vec<task::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(task::Entity::find()
            .filter(task::Column::IsSynced.eq(false).and(task::Column::IsDeleted.eq(false)))
            .order_by_asc(task::Column::LocalId)
            .all(conn)
            .await?)
    }

    /// Get tasks marked deleted locally but not yet deleted on the backend.
    pub async fn get_soft_deleted_unsynced<C>(conn: &C) -> Result<Vec<task::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(task::Entity::find()
            .filter(task::Column::IsDeleted.eq(true).and(task::Column::IsSynced.eq(false)))
            .all(conn)
            .await?)
    }

    /// Insert a single task, returning the assigned local id.
    pub async fn insert<C>(conn: &C, task: task::ActiveModel) -> Result<i64>
    where
        C: ConnectionTrait,
    {
        Ok(task::Entity::insert(task).exec(conn).await?.last_insert_id)
    }

    /// Bulk-insert tasks. Rows colliding on an already-known backend id are
    /// left untouched, which keeps cache fills idempotent.
    pub async fn insert_many<C>(conn: &C, tasks: Vec<task::ActiveModel>) -> Result<()>
    where
        C: ConnectionTrait,
    {
        if tasks.is_empty() {
            return Ok(());
        }
        task::Entity::insert_many(tasks)
            .on_conflict(OnConflict::column(task::Column::BackendId).do_nothing().to_owned())
            .exec_without_returning(conn)
            .await?;
        Ok(())
    }

    /// Update a task in the database.
    pub async fn update<C>(conn: &C, task: task::ActiveModel) -> Result<task::Model>
    where
        C: ConnectionTrait,
    {
        Ok(task.update(conn).await?)
    }

    /// Physically remove a task by its local id.
    pub async fn delete_by_local_id<C>(conn: &C, local_id: i64) -> Result<()>
    where
        C: ConnectionTrait,
    {
        task::Entity::delete_by_id(local_id).exec(conn).await?;
        Ok(())
    }

    /// Physically remove every soft-deleted task, returning how many rows went away.
    pub async fn purge_soft_deleted<C>(conn: &C) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        let res = task::Entity::delete_many()
            .filter(task::Column::IsDeleted.eq(true))
            .exec(conn)
            .await?;
        Ok(res.rows_affected)
    }
}
