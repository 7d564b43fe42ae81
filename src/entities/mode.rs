use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "modes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub local_id: i64,
    /// Backend-assigned identity, null until the first successful remote create.
    #[sea_orm(unique, nullable)]
    pub backend_id: Option<i32>,
    pub title: String,
    /// Hex color string, e.g. "#FF5733".
    pub color: String,
    pub is_synced: bool,
    pub is_deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::task::Entity")]
    Task,
}

impl Related<super::task::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Task.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
