use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub local_id: i64,
    /// Backend-assigned identity, null until the first successful remote create.
    #[sea_orm(unique, nullable)]
    pub backend_id: Option<i32>,
    pub title: String,
    /// Local-only foreign key to `modes.local_id`. Never transmitted as-is;
    /// translated to the mode's backend id at the network boundary.
    pub mode_id: i64,
    pub is_completed: bool,
    /// Time logged on the task, in seconds.
    pub time_logged: i64,
    pub is_synced: bool,
    pub is_deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::mode::Entity",
        from = "Column::ModeId",
        to = "super::mode::Column::LocalId",
        on_delete = "Cascade"
    )]
    Mode,
}

impl Related<super::mode::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Mode.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
