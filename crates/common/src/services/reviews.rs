//! Review submission and listing
//!
//! Submitting a review persists it and then synchronously recomputes the
//! reviewed entity's aggregate columns from every one of its reviews.
//! The insert and the recompute are separate statements: if the recompute
//! fails the review stays stored and the aggregates stay stale until the
//! next write to the same entity.

use crate::auth::AuthContext;
use crate::db::models::Review;
use crate::errors::Result;
use crate::metrics;
use crate::rating::{compute_aggregate, MissingSubRating, RatingAggregate, ReviewableRef};
use crate::store::{NewReview, ReviewWithAuthor, Store};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use validator::{Validate, ValidationError};

/// Review fields supplied by the caller
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ReviewInput {
    #[validate(range(min = 1, max = 5))]
    pub overall_rating: i32,

    #[serde(default)]
    #[validate(custom(function = "validate_sub_ratings"))]
    pub specific_ratings: BTreeMap<String, f64>,

    #[serde(default)]
    #[validate(length(max = 200))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 5000))]
    pub content: String,

    #[serde(default)]
    #[validate(length(max = 10))]
    pub tags: Vec<String>,

    #[serde(default)]
    pub is_anonymous: bool,

    #[serde(default)]
    pub semester: Option<String>,

    #[serde(default)]
    #[validate(range(min = 1900, max = 2100))]
    pub year: Option<i32>,
}

fn validate_sub_ratings(ratings: &BTreeMap<String, f64>) -> std::result::Result<(), ValidationError> {
    if ratings.values().all(|v| (0.0..=5.0).contains(v)) {
        Ok(())
    } else {
        Err(ValidationError::new("sub_rating_range"))
    }
}

/// Review operations over a [`Store`]
#[derive(Clone)]
pub struct ReviewService {
    store: Arc<dyn Store>,
    missing_sub_rating: MissingSubRating,
}

impl ReviewService {
    pub fn new(store: Arc<dyn Store>, missing_sub_rating: MissingSubRating) -> Self {
        Self {
            store,
            missing_sub_rating,
        }
    }

    /// Persist a review by the caller, then recompute the target's aggregates
    pub async fn submit(
        &self,
        auth: &AuthContext,
        target: ReviewableRef,
        input: ReviewInput,
    ) -> Result<Review> {
        input.validate()?;

        let review = self
            .store
            .insert_review(NewReview {
                user_id: auth.user_id,
                target,
                overall_rating: input.overall_rating,
                specific_ratings: input.specific_ratings,
                title: input.title,
                content: input.content,
                tags: input.tags,
                is_anonymous: input.is_anonymous,
                semester: input.semester,
                year: input.year,
            })
            .await?;

        metrics::record_review_submitted(target.kind.as_str());

        tracing::info!(
            review_id = %review.id,
            user_id = %auth.user_id,
            request_id = %auth.request_id,
            reviewable_type = %target.kind,
            reviewable_id = %target.id,
            overall_rating = review.overall_rating,
            "Review created"
        );

        self.recompute(target).await.map_err(|e| {
            tracing::error!(
                review_id = %review.id,
                request_id = %auth.request_id,
                reviewable_type = %target.kind,
                reviewable_id = %target.id,
                error = %e,
                "Aggregate recompute failed after review insert"
            );
            e
        })?;

        Ok(review)
    }

    /// Re-read every review of `target` and overwrite its aggregate columns.
    ///
    /// Returns `None` (and writes nothing) when the entity has no reviews.
    pub async fn recompute(&self, target: ReviewableRef) -> Result<Option<RatingAggregate>> {
        let start = Instant::now();

        let reviews = self.store.reviews_for(target).await?;
        let Some(aggregate) = compute_aggregate(target.kind, &reviews, self.missing_sub_rating)
        else {
            return Ok(None);
        };

        self.store.write_rating_aggregate(target, &aggregate).await?;

        metrics::record_aggregate_recompute(
            target.kind.as_str(),
            start.elapsed().as_secs_f64(),
        );

        tracing::debug!(
            reviewable_type = %target.kind,
            reviewable_id = %target.id,
            overall_rating = aggregate.overall_rating,
            total_reviews = aggregate.total_reviews,
            "Aggregates recomputed"
        );

        Ok(Some(aggregate))
    }

    /// Reviews of `target` with author display info, newest first
    pub async fn list(&self, target: ReviewableRef) -> Result<Vec<ReviewWithAuthor>> {
        self.store.reviews_with_authors(target).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{Course, Profile, Professor};
    use crate::errors::AppError;
    use crate::rating::ReviewableType;
    use crate::store::MemoryStore;
    use tokio_test::assert_ok;
    use uuid::Uuid;

    fn input(overall: i32, specific: &[(&str, f64)]) -> ReviewInput {
        ReviewInput {
            overall_rating: overall,
            specific_ratings: specific.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            content: "Solid lectures".to_string(),
            ..Default::default()
        }
    }

    fn service(store: &Arc<MemoryStore>, policy: MissingSubRating) -> ReviewService {
        ReviewService::new(store.clone(), policy)
    }

    #[tokio::test]
    async fn test_overall_mean_after_each_submission() {
        let store = Arc::new(MemoryStore::new());
        let professor = Professor::new("Ada Lovelace");
        let target = ReviewableRef::new(ReviewableType::Professor, professor.id);
        store.insert_professor(professor).await;
        let reviews = service(&store, MissingSubRating::Zero);

        for rating in [5, 4, 4] {
            let user = AuthContext::for_user(Uuid::new_v4());
            assert_ok!(reviews.submit(&user, target, input(rating, &[])).await);
        }

        let stored = store.professor(target.id).await.unwrap();
        assert_eq!(stored.overall_rating, 4.33);
        assert_eq!(stored.total_reviews, 3);
    }

    #[tokio::test]
    async fn test_course_sub_ratings() {
        let store = Arc::new(MemoryStore::new());
        let course = Course::new("COMP101", "Intro to Computing");
        let target = ReviewableRef::new(ReviewableType::Course, course.id);
        store.insert_course(course).await;
        let reviews = service(&store, MissingSubRating::Zero);
        let user = AuthContext::for_user(Uuid::new_v4());

        reviews
            .submit(&user, target, input(4, &[("difficulty", 2.0), ("workload", 3.0)]))
            .await
            .unwrap();
        reviews
            .submit(&user, target, input(5, &[("difficulty", 4.0), ("usefulness", 5.0)]))
            .await
            .unwrap();

        let stored = store.course(target.id).await.unwrap();
        assert_eq!(stored.difficulty_rating, 3.0);
        assert_eq!(stored.usefulness_rating, 2.5);
        assert_eq!(stored.workload_rating, 1.5);
        assert_eq!(stored.overall_rating, 4.5);
        assert_eq!(stored.total_reviews, 2);
    }

    #[tokio::test]
    async fn test_exclude_policy_ignores_missing_values() {
        let store = Arc::new(MemoryStore::new());
        let course = Course::new("MATH200", "Linear Algebra");
        let target = ReviewableRef::new(ReviewableType::Course, course.id);
        store.insert_course(course).await;
        let reviews = service(&store, MissingSubRating::Exclude);
        let user = AuthContext::for_user(Uuid::new_v4());

        reviews.submit(&user, target, input(4, &[("difficulty", 4.0)])).await.unwrap();
        reviews.submit(&user, target, input(2, &[])).await.unwrap();

        let stored = store.course(target.id).await.unwrap();
        assert_eq!(stored.difficulty_rating, 4.0);
        assert_eq!(stored.overall_rating, 3.0);
    }

    #[tokio::test]
    async fn test_invalid_input_persists_nothing() {
        let store = Arc::new(MemoryStore::new());
        let target = ReviewableRef::new(ReviewableType::Cafe, Uuid::new_v4());
        let reviews = service(&store, MissingSubRating::Zero);
        let user = AuthContext::for_user(Uuid::new_v4());

        let out_of_range = reviews.submit(&user, target, input(6, &[])).await;
        assert!(matches!(out_of_range, Err(AppError::Validation { .. })));

        let bad_sub = reviews.submit(&user, target, input(3, &[("service", 9.0)])).await;
        assert!(matches!(bad_sub, Err(AppError::Validation { .. })));

        assert!(store.reviews_for(target).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_newest_first_with_authors() {
        let store = Arc::new(MemoryStore::new());
        let target = ReviewableRef::new(ReviewableType::Professor, Uuid::new_v4());
        let reviews = service(&store, MissingSubRating::Zero);

        let author = Uuid::new_v4();
        store.insert_profile(Profile::new(author, "grace")).await;
        let anonymous_no_profile = AuthContext::for_user(Uuid::new_v4());

        let first = reviews
            .submit(&AuthContext::for_user(author), target, input(3, &[]))
            .await
            .unwrap();
        reviews.submit(&anonymous_no_profile, target, input(1, &[])).await.unwrap();
        let second = reviews
            .submit(&AuthContext::for_user(author), target, input(5, &[]))
            .await
            .unwrap();

        let listed = reviews.list(target).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|r| r.review.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert_eq!(listed[0].profiles.username.as_deref(), Some("grace"));
    }
}
