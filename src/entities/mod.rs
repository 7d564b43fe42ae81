pub mod mode;
pub mod sync_status;
pub mod task;

pub use mode::Entity as Mode;
pub use sync_status::Entity as SyncStatus;
pub use sync_status::EntityKind;
pub use task::Entity as Task;
