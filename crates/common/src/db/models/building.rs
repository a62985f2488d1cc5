//! Building entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "buildings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub name: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub code: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub building_type: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub location: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    pub latitude: Option<f64>,

    pub longitude: Option<f64>,

    pub facilities: Vec<String>,

    pub overall_rating: f64,

    pub total_reviews: i32,

    pub wifi_rating: f64,

    pub study_spaces_rating: f64,

    pub accessibility_rating: f64,

    pub cleanliness_rating: f64,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// A building with no reviews yet
    pub fn new(name: impl Into<String>, code: Option<&str>) -> Self {
        let now = chrono::Utc::now().into();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            code: code.map(String::from),
            building_type: None,
            location: None,
            description: None,
            latitude: None,
            longitude: None,
            facilities: Vec::new(),
            overall_rating: 0.0,
            total_reviews: 0,
            wifi_rating: 0.0,
            study_spaces_rating: 0.0,
            accessibility_rating: 0.0,
            cleanliness_rating: 0.0,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::cafe::Entity")]
    Cafes,
}

impl Related<super::cafe::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cafes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
