//! Repository layer: all direct database access for the local store.
//!
//! Repositories are stateless; every method takes a [`sea_orm::ConnectionTrait`]
//! so they work against the shared connection or a transaction alike.

pub mod mode;
pub mod sync_status;
pub mod task;

pub use mode::ModeRepository;
pub use sync_status::SyncStatusRepository;
pub use task::TaskRepository;
