//! Review entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reviews")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(indexed)]
    pub user_id: Uuid,

    /// professor | course | building | cafe
    #[sea_orm(column_type = "Text")]
    pub reviewable_type: String,

    pub reviewable_id: Uuid,

    pub overall_rating: i32,

    /// Named sub-ratings, keys depend on the reviewed kind
    #[sea_orm(column_type = "JsonBinary")]
    pub specific_ratings: Json,

    #[sea_orm(column_type = "Text", nullable)]
    pub title: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    pub tags: Vec<String>,

    pub is_anonymous: bool,

    #[sea_orm(column_type = "Text", nullable)]
    pub semester: Option<String>,

    pub year: Option<i32>,

    pub upvotes: i32,

    pub downvotes: i32,

    pub is_flagged: bool,

    pub is_moderated: bool,

    pub is_verified: bool,

    #[sea_orm(column_type = "Text", nullable)]
    pub flag_reason: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::UserId",
        to = "super::profile::Column::UserId"
    )]
    Profile,
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
