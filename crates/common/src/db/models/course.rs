//! Course entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub code: String,

    #[sea_orm(column_type = "Text")]
    pub name: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub department: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub level: Option<String>,

    pub credits: Option<i32>,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    pub prerequisites: Vec<String>,

    pub overall_rating: f64,

    pub total_reviews: i32,

    pub difficulty_rating: f64,

    pub usefulness_rating: f64,

    pub workload_rating: f64,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// A course with no reviews yet
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        let now = chrono::Utc::now().into();
        Self {
            id: Uuid::new_v4(),
            code: code.into(),
            name: name.into(),
            department: None,
            level: None,
            credits: None,
            description: None,
            prerequisites: Vec::new(),
            overall_rating: 0.0,
            total_reviews: 0,
            difficulty_rating: 0.0,
            usefulness_rating: 0.0,
            workload_rating: 0.0,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
