//! Event entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    pub starts_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub ends_at: Option<DateTimeWithTimeZone>,

    #[sea_orm(nullable)]
    pub location: Option<String>,

    /// Open string set; defaults to "other".
    pub category: String,

    #[sea_orm(nullable)]
    pub max_participants: Option<i32>,

    /// User who created the event (admins only).
    #[sea_orm(nullable)]
    pub created_by: Option<i32>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    Creator,

    #[sea_orm(has_many = "super::saved_event::Entity")]
    SavedBy,

    #[sea_orm(has_many = "super::reminder::Entity")]
    Reminders,
}

impl Related<super::saved_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SavedBy.def()
    }
}

impl Related<super::reminder::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reminders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
