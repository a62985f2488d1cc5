//! Review handlers

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::collections::BTreeMap;

use super::{json_body, parse_uuid, query_params, required};
use crate::AppState;
use campusrate_common::{
    auth::AuthContext,
    db::models::Review,
    errors::{AppError, Result},
    rating::{ReviewableRef, ReviewableType},
    services::ReviewInput,
    store::ReviewWithAuthor,
};

#[derive(Debug, Deserialize)]
pub struct ListReviewsParams {
    #[serde(rename = "itemId")]
    pub item_id: Option<String>,

    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Body of `POST /reviews`
#[derive(Debug, Deserialize)]
pub struct SubmitReviewRequest {
    pub reviewable_type: Option<String>,
    pub reviewable_id: Option<String>,
    pub overall_rating: Option<i32>,
    /// `null` values are treated as absent
    #[serde(default)]
    pub specific_ratings: Option<BTreeMap<String, Option<f64>>>,
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub is_anonymous: Option<bool>,
    pub semester: Option<String>,
    pub year: Option<i32>,
}

impl SubmitReviewRequest {
    fn into_parts(self) -> Result<(ReviewableRef, ReviewInput)> {
        let kind: ReviewableType = required(self.reviewable_type, "reviewable_type")?.parse()?;
        let id = parse_uuid(&required(self.reviewable_id, "reviewable_id")?, "reviewable_id")?;
        let overall_rating = self.overall_rating.ok_or_else(|| AppError::MissingField {
            field: "overall_rating".to_string(),
        })?;

        let input = ReviewInput {
            overall_rating,
            specific_ratings: self
                .specific_ratings
                .unwrap_or_default()
                .into_iter()
                .filter_map(|(key, value)| value.map(|v| (key, v)))
                .collect(),
            title: self.title,
            content: required(self.content, "content")?,
            tags: self.tags.unwrap_or_default(),
            is_anonymous: self.is_anonymous.unwrap_or(false),
            semester: self.semester,
            year: self.year,
        };

        Ok((ReviewableRef::new(kind, id), input))
    }
}

/// List reviews of one entity with author display info, newest first
pub async fn list_reviews(
    State(state): State<AppState>,
    params: std::result::Result<Query<ListReviewsParams>, QueryRejection>,
) -> Result<Json<Vec<ReviewWithAuthor>>> {
    let params = query_params(params)?;

    let (Some(item_id), Some(kind)) = (
        params.item_id.filter(|v| !v.is_empty()),
        params.kind.filter(|v| !v.is_empty()),
    ) else {
        return Err(AppError::BadRequest {
            message: "Missing itemId or type parameter".to_string(),
        });
    };

    let target = ReviewableRef::new(kind.parse()?, parse_uuid(&item_id, "itemId")?);
    let reviews = state.reviews().list(target).await?;

    tracing::debug!(
        reviewable_type = %target.kind,
        reviewable_id = %target.id,
        count = reviews.len(),
        "Reviews listed"
    );

    Ok(Json(reviews))
}

/// Submit a review as the authenticated caller
pub async fn submit_review(
    State(state): State<AppState>,
    auth: AuthContext,
    payload: std::result::Result<Json<SubmitReviewRequest>, JsonRejection>,
) -> Result<Json<Review>> {
    let (target, input) = json_body(payload)?.into_parts()?;

    let review = state.reviews().submit(&auth, target, input).await?;

    Ok(Json(review))
}
