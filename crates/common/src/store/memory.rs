//! In-process store backed by vectors behind a lock

use super::{AuthorProfile, NewReview, ReviewWithAuthor, Store};
use crate::db::models::{
    Building, Cafe, Course, ForumPost, ForumThread, Professor, Profile, Review, Vote,
};
use crate::errors::{AppError, Result};
use crate::rating::{RatingAggregate, ReviewableRef, ReviewableType};
use crate::services::votes::{VotableRef, VotableType, VoteCounts, VoteType};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    professors: Vec<Professor>,
    courses: Vec<Course>,
    buildings: Vec<Building>,
    cafes: Vec<Cafe>,
    profiles: Vec<Profile>,
    threads: Vec<ForumThread>,
    posts: Vec<ForumPost>,
    reviews: Vec<Review>,
    votes: Vec<Vote>,
}

/// Store that keeps every table in memory.
///
/// Row order is insertion order, which is also the order search returns.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

fn now() -> DateTimeWithTimeZone {
    Utc::now().into()
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn take<T: Clone>(rows: impl Iterator<Item = T>, limit: u64) -> Vec<T> {
    rows.take(usize::try_from(limit).unwrap_or(usize::MAX)).collect()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_professor(&self, professor: Professor) {
        self.tables.write().await.professors.push(professor);
    }

    pub async fn insert_course(&self, course: Course) {
        self.tables.write().await.courses.push(course);
    }

    pub async fn insert_building(&self, building: Building) {
        self.tables.write().await.buildings.push(building);
    }

    pub async fn insert_cafe(&self, cafe: Cafe) {
        self.tables.write().await.cafes.push(cafe);
    }

    pub async fn insert_profile(&self, profile: Profile) {
        self.tables.write().await.profiles.push(profile);
    }

    pub async fn insert_thread(&self, thread: ForumThread) {
        self.tables.write().await.threads.push(thread);
    }

    pub async fn insert_post(&self, post: ForumPost) {
        self.tables.write().await.posts.push(post);
    }

    pub async fn professor(&self, id: Uuid) -> Option<Professor> {
        self.tables.read().await.professors.iter().find(|p| p.id == id).cloned()
    }

    pub async fn course(&self, id: Uuid) -> Option<Course> {
        self.tables.read().await.courses.iter().find(|c| c.id == id).cloned()
    }

    pub async fn building(&self, id: Uuid) -> Option<Building> {
        self.tables.read().await.buildings.iter().find(|b| b.id == id).cloned()
    }

    pub async fn cafe(&self, id: Uuid) -> Option<Cafe> {
        self.tables.read().await.cafes.iter().find(|c| c.id == id).cloned()
    }

    pub async fn review(&self, id: Uuid) -> Option<Review> {
        self.tables.read().await.reviews.iter().find(|r| r.id == id).cloned()
    }

    pub async fn thread(&self, id: Uuid) -> Option<ForumThread> {
        self.tables.read().await.threads.iter().find(|t| t.id == id).cloned()
    }

    pub async fn post(&self, id: Uuid) -> Option<ForumPost> {
        self.tables.read().await.posts.iter().find(|p| p.id == id).cloned()
    }
}

fn is_target(review: &Review, target: ReviewableRef) -> bool {
    review.reviewable_type == target.kind.as_str() && review.reviewable_id == target.id
}

fn is_votable(vote: &Vote, target: VotableRef) -> bool {
    vote.votable_type == target.kind.as_str() && vote.votable_id == target.id
}

#[async_trait]
impl Store for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn insert_review(&self, review: NewReview) -> Result<Review> {
        let created_at = now();
        let row = Review {
            id: Uuid::new_v4(),
            user_id: review.user_id,
            reviewable_type: review.target.kind.as_str().to_string(),
            reviewable_id: review.target.id,
            overall_rating: review.overall_rating,
            specific_ratings: serde_json::to_value(&review.specific_ratings)?,
            title: review.title,
            content: review.content,
            tags: review.tags,
            is_anonymous: review.is_anonymous,
            semester: review.semester,
            year: review.year,
            upvotes: 0,
            downvotes: 0,
            is_flagged: false,
            is_moderated: false,
            is_verified: false,
            flag_reason: None,
            created_at,
            updated_at: created_at,
        };
        self.tables.write().await.reviews.push(row.clone());
        Ok(row)
    }

    async fn reviews_for(&self, target: ReviewableRef) -> Result<Vec<Review>> {
        let tables = self.tables.read().await;
        Ok(tables.reviews.iter().filter(|r| is_target(r, target)).cloned().collect())
    }

    async fn reviews_with_authors(&self, target: ReviewableRef) -> Result<Vec<ReviewWithAuthor>> {
        let tables = self.tables.read().await;

        // Reverse insertion order first so equal timestamps still list newest first
        let mut rows: Vec<ReviewWithAuthor> = tables
            .reviews
            .iter()
            .rev()
            .filter(|r| is_target(r, target))
            .filter_map(|review| {
                let profile = tables.profiles.iter().find(|p| p.user_id == review.user_id)?;
                Some(ReviewWithAuthor {
                    review: review.clone(),
                    profiles: AuthorProfile::from(profile.clone()),
                })
            })
            .collect();
        rows.sort_by(|a, b| b.review.created_at.cmp(&a.review.created_at));
        Ok(rows)
    }

    async fn write_rating_aggregate(
        &self,
        target: ReviewableRef,
        aggregate: &RatingAggregate,
    ) -> Result<()> {
        let mut tables = self.tables.write().await;
        let sub = |column: &str| aggregate.sub_rating(column).unwrap_or_default();
        let updated_at = now();

        match target.kind {
            ReviewableType::Professor => {
                if let Some(row) = tables.professors.iter_mut().find(|p| p.id == target.id) {
                    row.overall_rating = aggregate.overall_rating;
                    row.total_reviews = aggregate.total_reviews;
                    row.updated_at = updated_at;
                }
            }
            ReviewableType::Course => {
                if let Some(row) = tables.courses.iter_mut().find(|c| c.id == target.id) {
                    row.overall_rating = aggregate.overall_rating;
                    row.total_reviews = aggregate.total_reviews;
                    row.difficulty_rating = sub("difficulty_rating");
                    row.usefulness_rating = sub("usefulness_rating");
                    row.workload_rating = sub("workload_rating");
                    row.updated_at = updated_at;
                }
            }
            ReviewableType::Building => {
                if let Some(row) = tables.buildings.iter_mut().find(|b| b.id == target.id) {
                    row.overall_rating = aggregate.overall_rating;
                    row.total_reviews = aggregate.total_reviews;
                    row.wifi_rating = sub("wifi_rating");
                    row.study_spaces_rating = sub("study_spaces_rating");
                    row.accessibility_rating = sub("accessibility_rating");
                    row.cleanliness_rating = sub("cleanliness_rating");
                    row.updated_at = updated_at;
                }
            }
            ReviewableType::Cafe => {
                if let Some(row) = tables.cafes.iter_mut().find(|c| c.id == target.id) {
                    row.overall_rating = aggregate.overall_rating;
                    row.total_reviews = aggregate.total_reviews;
                    row.food_quality_rating = sub("food_quality_rating");
                    row.service_rating = sub("service_rating");
                    row.value_rating = sub("value_rating");
                    row.atmosphere_rating = sub("atmosphere_rating");
                    row.updated_at = updated_at;
                }
            }
        }
        Ok(())
    }

    async fn find_vote(&self, user_id: Uuid, target: VotableRef) -> Result<Option<Vote>> {
        let tables = self.tables.read().await;
        Ok(tables
            .votes
            .iter()
            .find(|v| v.user_id == user_id && is_votable(v, target))
            .cloned())
    }

    async fn insert_vote(
        &self,
        user_id: Uuid,
        target: VotableRef,
        vote_type: VoteType,
    ) -> Result<Vote> {
        let mut tables = self.tables.write().await;
        if tables.votes.iter().any(|v| v.user_id == user_id && is_votable(v, target)) {
            return Err(AppError::Duplicate {
                message: format!("vote already exists for {} {}", target.kind, target.id),
            });
        }

        let row = Vote {
            id: Uuid::new_v4(),
            user_id,
            votable_type: target.kind.as_str().to_string(),
            votable_id: target.id,
            vote_type: vote_type.as_str().to_string(),
            created_at: now(),
        };
        tables.votes.push(row.clone());
        Ok(row)
    }

    async fn update_vote_type(&self, vote_id: Uuid, vote_type: VoteType) -> Result<()> {
        let mut tables = self.tables.write().await;
        if let Some(vote) = tables.votes.iter_mut().find(|v| v.id == vote_id) {
            vote.vote_type = vote_type.as_str().to_string();
        }
        Ok(())
    }

    async fn delete_vote(&self, vote_id: Uuid) -> Result<()> {
        self.tables.write().await.votes.retain(|v| v.id != vote_id);
        Ok(())
    }

    async fn votes_for(&self, target: VotableRef) -> Result<Vec<Vote>> {
        let tables = self.tables.read().await;
        Ok(tables.votes.iter().filter(|v| is_votable(v, target)).cloned().collect())
    }

    async fn write_vote_counts(&self, target: VotableRef, counts: VoteCounts) -> Result<()> {
        let mut tables = self.tables.write().await;
        let updated_at = now();

        match target.kind {
            VotableType::Review => {
                if let Some(row) = tables.reviews.iter_mut().find(|r| r.id == target.id) {
                    row.upvotes = counts.upvotes;
                    row.downvotes = counts.downvotes;
                    row.updated_at = updated_at;
                }
            }
            VotableType::Thread => {
                if let Some(row) = tables.threads.iter_mut().find(|t| t.id == target.id) {
                    row.upvotes = counts.upvotes;
                    row.downvotes = counts.downvotes;
                    row.updated_at = updated_at;
                }
            }
            VotableType::Post => {
                if let Some(row) = tables.posts.iter_mut().find(|p| p.id == target.id) {
                    row.upvotes = counts.upvotes;
                    row.downvotes = counts.downvotes;
                    row.updated_at = updated_at;
                }
            }
        }
        Ok(())
    }

    async fn search_professors(&self, needle: &str, limit: u64) -> Result<Vec<Professor>> {
        let tables = self.tables.read().await;
        let rows = tables.professors.iter().filter(|p| contains_ci(&p.name, needle)).cloned();
        Ok(take(rows, limit))
    }

    async fn search_courses(&self, needle: &str, limit: u64) -> Result<Vec<Course>> {
        let tables = self.tables.read().await;
        let rows = tables
            .courses
            .iter()
            .filter(|c| contains_ci(&c.name, needle) || contains_ci(&c.code, needle))
            .cloned();
        Ok(take(rows, limit))
    }

    async fn search_buildings(&self, needle: &str, limit: u64) -> Result<Vec<Building>> {
        let tables = self.tables.read().await;
        let rows = tables
            .buildings
            .iter()
            .filter(|b| {
                contains_ci(&b.name, needle)
                    || b.code.as_deref().is_some_and(|code| contains_ci(code, needle))
            })
            .cloned();
        Ok(take(rows, limit))
    }

    async fn search_cafes(&self, needle: &str, limit: u64) -> Result<Vec<Cafe>> {
        let tables = self.tables.read().await;
        let rows = tables.cafes.iter().filter(|c| contains_ci(&c.name, needle)).cloned();
        Ok(take(rows, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_second_vote_row_is_duplicate() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let target = VotableRef::new(VotableType::Thread, Uuid::new_v4());

        store.insert_vote(user, target, VoteType::Upvote).await.unwrap();
        let again = store.insert_vote(user, target, VoteType::Downvote).await;

        assert!(matches!(again, Err(AppError::Duplicate { .. })));
        assert_eq!(store.votes_for(target).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_vote_counts_land_on_post() {
        let store = MemoryStore::new();
        let thread = ForumThread::new(Uuid::new_v4(), "Best study spot?", "Asking for finals");
        let post = ForumPost::new(thread.id, Uuid::new_v4(), "Library third floor");
        let post_id = post.id;
        store.insert_thread(thread).await;
        store.insert_post(post).await;

        let target = VotableRef::new(VotableType::Post, post_id);
        store
            .write_vote_counts(target, VoteCounts { upvotes: 3, downvotes: 1 })
            .await
            .unwrap();

        let post = store.post(post_id).await.unwrap();
        assert_eq!((post.upvotes, post.downvotes), (3, 1));
    }

    #[tokio::test]
    async fn test_aggregate_for_missing_entity_is_noop() {
        let store = MemoryStore::new();
        let target = ReviewableRef::new(ReviewableType::Building, Uuid::new_v4());
        let aggregate = RatingAggregate {
            overall_rating: 4.0,
            total_reviews: 1,
            sub_ratings: Default::default(),
        };
        assert!(store.write_rating_aggregate(target, &aggregate).await.is_ok());
        assert!(store.building(target.id).await.is_none());
    }

    #[tokio::test]
    async fn test_building_search_matches_code() {
        let store = MemoryStore::new();
        store.insert_building(Building::new("Main Library", Some("LIB"))).await;
        store.insert_building(Building::new("Gymnasium", None)).await;

        let hits = store.search_buildings("lib", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].code.as_deref(), Some("LIB"));
        assert!(store.search_buildings("xyz", 10).await.unwrap().is_empty());
    }
}
