//! Rating aggregation
//!
//! Reviewable kinds, their named sub-ratings, and the mean/round reduction
//! that keeps an entity's denormalized rating columns in sync with its reviews.

use crate::db::models::Review;
use crate::errors::AppError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Kinds of entity that accumulate reviews
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewableType {
    Professor,
    Course,
    Building,
    Cafe,
}

/// A named sub-rating: the key reviewers fill in `specific_ratings` and the
/// entity column holding its average.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubRating {
    pub key: &'static str,
    pub column: &'static str,
}

const COURSE_SUB_RATINGS: &[SubRating] = &[
    SubRating { key: "difficulty", column: "difficulty_rating" },
    SubRating { key: "usefulness", column: "usefulness_rating" },
    SubRating { key: "workload", column: "workload_rating" },
];

const BUILDING_SUB_RATINGS: &[SubRating] = &[
    SubRating { key: "wifi", column: "wifi_rating" },
    SubRating { key: "study_spaces", column: "study_spaces_rating" },
    SubRating { key: "accessibility", column: "accessibility_rating" },
    SubRating { key: "cleanliness", column: "cleanliness_rating" },
];

const CAFE_SUB_RATINGS: &[SubRating] = &[
    SubRating { key: "food_quality", column: "food_quality_rating" },
    SubRating { key: "service", column: "service_rating" },
    SubRating { key: "value", column: "value_rating" },
    SubRating { key: "atmosphere", column: "atmosphere_rating" },
];

impl ReviewableType {
    pub const ALL: [ReviewableType; 4] = [
        ReviewableType::Professor,
        ReviewableType::Course,
        ReviewableType::Building,
        ReviewableType::Cafe,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewableType::Professor => "professor",
            ReviewableType::Course => "course",
            ReviewableType::Building => "building",
            ReviewableType::Cafe => "cafe",
        }
    }

    /// Table holding the aggregate columns for this kind
    pub fn table_name(&self) -> &'static str {
        match self {
            ReviewableType::Professor => "professors",
            ReviewableType::Course => "courses",
            ReviewableType::Building => "buildings",
            ReviewableType::Cafe => "cafes",
        }
    }

    /// Sub-ratings averaged for this kind (professors have none)
    pub fn sub_ratings(&self) -> &'static [SubRating] {
        match self {
            ReviewableType::Professor => &[],
            ReviewableType::Course => COURSE_SUB_RATINGS,
            ReviewableType::Building => BUILDING_SUB_RATINGS,
            ReviewableType::Cafe => CAFE_SUB_RATINGS,
        }
    }
}

impl fmt::Display for ReviewableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewableType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "professor" => Ok(ReviewableType::Professor),
            "course" => Ok(ReviewableType::Course),
            "building" => Ok(ReviewableType::Building),
            "cafe" => Ok(ReviewableType::Cafe),
            other => Err(AppError::Validation {
                message: format!("unknown reviewable type '{}'", other),
                field: Some("reviewable_type".to_string()),
            }),
        }
    }
}

/// (type, id) pair identifying a reviewed entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReviewableRef {
    pub kind: ReviewableType,
    pub id: Uuid,
}

impl ReviewableRef {
    pub fn new(kind: ReviewableType, id: Uuid) -> Self {
        Self { kind, id }
    }
}

/// How a review that omits a sub-rating contributes to its average
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingSubRating {
    /// Count the missing value as 0, so non-response lowers the average
    #[default]
    Zero,
    /// Average only over the reviews that supplied the value
    Exclude,
}

/// Recomputed aggregate columns for one reviewable entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingAggregate {
    pub overall_rating: f64,
    pub total_reviews: i32,
    /// Column name -> rounded average
    pub sub_ratings: BTreeMap<&'static str, f64>,
}

impl RatingAggregate {
    pub fn sub_rating(&self, column: &str) -> Option<f64> {
        self.sub_ratings.get(column).copied()
    }
}

/// Round half away from zero to two decimals
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Numeric value of a named sub-rating on one review, if present
pub fn sub_rating_value(review: &Review, key: &str) -> Option<f64> {
    review.specific_ratings.get(key).and_then(|v| v.as_f64())
}

/// Reduce every review of one entity to its aggregate columns.
///
/// Returns `None` for an empty review set; callers leave the entity untouched.
pub fn compute_aggregate(
    kind: ReviewableType,
    reviews: &[Review],
    policy: MissingSubRating,
) -> Option<RatingAggregate> {
    if reviews.is_empty() {
        return None;
    }

    let total = reviews.len();
    let overall_sum: f64 = reviews.iter().map(|r| f64::from(r.overall_rating)).sum();

    let sub_ratings = kind
        .sub_ratings()
        .iter()
        .map(|sub| {
            let supplied: Vec<f64> = reviews
                .iter()
                .filter_map(|r| sub_rating_value(r, sub.key))
                .collect();
            let sum: f64 = supplied.iter().sum();

            let mean = match policy {
                MissingSubRating::Zero => sum / total as f64,
                MissingSubRating::Exclude if supplied.is_empty() => 0.0,
                MissingSubRating::Exclude => sum / supplied.len() as f64,
            };

            (sub.column, round2(mean))
        })
        .collect();

    Some(RatingAggregate {
        overall_rating: round2(overall_sum / total as f64),
        total_reviews: total as i32,
        sub_ratings,
    })
}
