//! Data platform abstraction
//!
//! Every read and write the handlers perform goes through [`Store`]:
//! - [`crate::db::Repository`] talks to Postgres through SeaORM
//! - [`MemoryStore`] keeps rows in process (tests, local runs)
//!
//! Implementations give per-statement atomicity only; callers compose
//! read-recompute-write sequences without a surrounding transaction.

mod memory;

pub use memory::MemoryStore;

use crate::config::{AppConfig, StoreBackend};
use crate::db::models::{Building, Cafe, Course, Professor, Profile, Review, Vote};
use crate::db::{DbPool, Repository};
use crate::errors::Result;
use crate::rating::{RatingAggregate, ReviewableRef};
use crate::services::votes::{VotableRef, VoteCounts, VoteType};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// Fields of a review about to be inserted
#[derive(Debug, Clone)]
pub struct NewReview {
    pub user_id: Uuid,
    pub target: ReviewableRef,
    pub overall_rating: i32,
    pub specific_ratings: BTreeMap<String, f64>,
    pub title: Option<String>,
    pub content: String,
    pub tags: Vec<String>,
    pub is_anonymous: bool,
    pub semester: Option<String>,
    pub year: Option<i32>,
}

/// Author display info attached to listed reviews
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorProfile {
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<Profile> for AuthorProfile {
    fn from(profile: Profile) -> Self {
        Self {
            username: profile.username,
            display_name: profile.display_name,
            avatar_url: profile.avatar_url,
        }
    }
}

/// Review row joined with its author's profile
#[derive(Debug, Clone, Serialize)]
pub struct ReviewWithAuthor {
    #[serde(flatten)]
    pub review: Review,
    pub profiles: AuthorProfile,
}

/// Trait for the external data platform
#[async_trait]
pub trait Store: Send + Sync {
    /// Short name for logs and readiness output
    fn backend_name(&self) -> &'static str;

    /// Check connectivity
    async fn ping(&self) -> Result<()>;

    // Reviews

    /// Persist a review and return the stored row
    async fn insert_review(&self, review: NewReview) -> Result<Review>;

    /// All reviews referencing an entity, in no particular order
    async fn reviews_for(&self, target: ReviewableRef) -> Result<Vec<Review>>;

    /// Reviews whose author has a profile, newest first
    async fn reviews_with_authors(&self, target: ReviewableRef) -> Result<Vec<ReviewWithAuthor>>;

    /// Overwrite an entity's derived rating columns
    async fn write_rating_aggregate(
        &self,
        target: ReviewableRef,
        aggregate: &RatingAggregate,
    ) -> Result<()>;

    // Votes

    async fn find_vote(&self, user_id: Uuid, target: VotableRef) -> Result<Option<Vote>>;

    /// Insert a vote; a second row for the same (user, target) is a `Duplicate`
    async fn insert_vote(&self, user_id: Uuid, target: VotableRef, vote_type: VoteType)
        -> Result<Vote>;

    async fn update_vote_type(&self, vote_id: Uuid, vote_type: VoteType) -> Result<()>;

    async fn delete_vote(&self, vote_id: Uuid) -> Result<()>;

    async fn votes_for(&self, target: VotableRef) -> Result<Vec<Vote>>;

    /// Overwrite a votable row's upvote/downvote counters
    async fn write_vote_counts(&self, target: VotableRef, counts: VoteCounts) -> Result<()>;

    // Search: case-insensitive substring match on the raw `needle`

    /// Name match
    async fn search_professors(&self, needle: &str, limit: u64) -> Result<Vec<Professor>>;

    /// Name or code match
    async fn search_courses(&self, needle: &str, limit: u64) -> Result<Vec<Course>>;

    /// Name or code match
    async fn search_buildings(&self, needle: &str, limit: u64) -> Result<Vec<Building>>;

    /// Name match
    async fn search_cafes(&self, needle: &str, limit: u64) -> Result<Vec<Cafe>>;
}

/// Create a store based on configuration
pub async fn create_store(config: &AppConfig) -> Result<Arc<dyn Store>> {
    match config.store.backend {
        StoreBackend::Postgres => {
            let pool = DbPool::new(config).await?;
            if config.database.run_migrations {
                pool.run_migrations().await?;
            }
            Ok(Arc::new(Repository::new(pool)))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store, data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
