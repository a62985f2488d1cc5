//! Cafe entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cafes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub name: String,

    pub building_id: Option<Uuid>,

    #[sea_orm(column_type = "Text", nullable)]
    pub location: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    pub cuisine_type: Vec<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub price_range: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub menu_url: Option<String>,

    pub overall_rating: f64,

    pub total_reviews: i32,

    pub food_quality_rating: f64,

    pub service_rating: f64,

    pub value_rating: f64,

    pub atmosphere_rating: f64,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// A cafe with no reviews yet
    pub fn new(name: impl Into<String>) -> Self {
        let now = chrono::Utc::now().into();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            building_id: None,
            location: None,
            description: None,
            cuisine_type: Vec::new(),
            price_range: None,
            menu_url: None,
            overall_rating: 0.0,
            total_reviews: 0,
            food_quality_rating: 0.0,
            service_rating: 0.0,
            value_rating: 0.0,
            atmosphere_rating: 0.0,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::building::Entity",
        from = "Column::BuildingId",
        to = "super::building::Column::Id"
    )]
    Building,
}

impl Related<super::building::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Building.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
