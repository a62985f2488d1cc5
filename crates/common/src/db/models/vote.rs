//! Vote entity
//!
//! At most one row per (user_id, votable_type, votable_id); the unique
//! index lives in the migration.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "votes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(indexed)]
    pub user_id: Uuid,

    /// review | thread | post
    #[sea_orm(column_type = "Text")]
    pub votable_type: String,

    pub votable_id: Uuid,

    /// upvote | downvote
    #[sea_orm(column_type = "Text")]
    pub vote_type: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
