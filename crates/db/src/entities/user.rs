//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Telegram user ID. One row per Telegram account.
    #[sea_orm(unique)]
    pub telegram_id: i64,

    /// Telegram username, if set.
    #[sea_orm(nullable)]
    pub username: Option<String>,

    /// Derived from the config allowlist on every contact.
    #[sea_orm(default_value = false)]
    pub is_admin: bool,

    pub created_at: DateTimeWithTimeZone,

    /// Updated (best-effort) on every authenticated request.
    pub last_active_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::saved_event::Entity")]
    SavedEvents,

    #[sea_orm(has_many = "super::vote::Entity")]
    Votes,
}

impl Related<super::saved_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SavedEvents.def()
    }
}

impl Related<super::vote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Votes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
