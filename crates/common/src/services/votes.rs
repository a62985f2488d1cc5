//! Vote toggling
//!
//! A user holds at most one vote per target. Resubmitting the same type
//! removes it, a different type flips it in place. Afterwards the target's
//! counters are recounted from the vote rows and overwritten.

use crate::auth::AuthContext;
use crate::db::models::Vote;
use crate::errors::{AppError, Result};
use crate::metrics;
use crate::store::Store;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

/// Kinds of entity that accumulate votes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VotableType {
    Review,
    Thread,
    Post,
}

impl VotableType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VotableType::Review => "review",
            VotableType::Thread => "thread",
            VotableType::Post => "post",
        }
    }

    /// Table holding the counters for this kind
    pub fn table_name(&self) -> &'static str {
        match self {
            VotableType::Review => "reviews",
            VotableType::Thread => "forum_threads",
            VotableType::Post => "forum_posts",
        }
    }
}

impl fmt::Display for VotableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VotableType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "review" => Ok(VotableType::Review),
            "thread" => Ok(VotableType::Thread),
            "post" => Ok(VotableType::Post),
            other => Err(AppError::Validation {
                message: format!("unknown votable type '{}'", other),
                field: Some("votable_type".to_string()),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    #[serde(alias = "up")]
    Upvote,
    #[serde(alias = "down")]
    Downvote,
}

impl VoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteType::Upvote => "upvote",
            VoteType::Downvote => "downvote",
        }
    }
}

impl fmt::Display for VoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "upvote" | "up" => Ok(VoteType::Upvote),
            "downvote" | "down" => Ok(VoteType::Downvote),
            other => Err(AppError::Validation {
                message: format!("unknown vote type '{}'", other),
                field: Some("vote_type".to_string()),
            }),
        }
    }
}

/// (type, id) pair identifying a voted-on entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VotableRef {
    pub kind: VotableType,
    pub id: Uuid,
}

impl VotableRef {
    pub fn new(kind: VotableType, id: Uuid) -> Self {
        Self { kind, id }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCounts {
    pub upvotes: i32,
    pub downvotes: i32,
}

impl VoteCounts {
    /// Count vote rows by type; rows with an unrecognised type are ignored
    pub fn tally(votes: &[Vote]) -> Self {
        votes.iter().fold(Self::default(), |mut counts, vote| {
            match vote.vote_type.parse::<VoteType>() {
                Ok(VoteType::Upvote) => counts.upvotes += 1,
                Ok(VoteType::Downvote) => counts.downvotes += 1,
                Err(_) => {}
            }
            counts
        })
    }
}

/// What a vote submission did to the caller's vote row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteAction {
    Created,
    Removed,
    Changed,
}

impl VoteAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteAction::Created => "created",
            VoteAction::Removed => "removed",
            VoteAction::Changed => "changed",
        }
    }
}

/// Vote operations over a [`Store`]
#[derive(Clone)]
pub struct VoteService {
    store: Arc<dyn Store>,
}

impl VoteService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Toggle the caller's vote on `target` and return the recounted totals
    pub async fn cast_vote(
        &self,
        auth: &AuthContext,
        target: VotableRef,
        vote_type: VoteType,
    ) -> Result<VoteCounts> {
        let action = match self.store.find_vote(auth.user_id, target).await? {
            None => {
                self.store.insert_vote(auth.user_id, target, vote_type).await?;
                VoteAction::Created
            }
            Some(existing) if existing.vote_type == vote_type.as_str() => {
                self.store.delete_vote(existing.id).await?;
                VoteAction::Removed
            }
            Some(existing) => {
                self.store.update_vote_type(existing.id, vote_type).await?;
                VoteAction::Changed
            }
        };

        let votes = self.store.votes_for(target).await?;
        let counts = VoteCounts::tally(&votes);
        self.store.write_vote_counts(target, counts).await?;

        metrics::record_vote(target.kind.as_str(), action.as_str());

        tracing::info!(
            user_id = %auth.user_id,
            request_id = %auth.request_id,
            votable_type = %target.kind,
            votable_id = %target.id,
            vote_type = %vote_type,
            action = action.as_str(),
            upvotes = counts.upvotes,
            downvotes = counts.downvotes,
            "Vote recorded"
        );

        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::{ReviewableRef, ReviewableType};
    use crate::store::{MemoryStore, NewReview};

    async fn seed_review(store: &MemoryStore) -> Uuid {
        let review = store
            .insert_review(NewReview {
                user_id: Uuid::new_v4(),
                target: ReviewableRef::new(ReviewableType::Professor, Uuid::new_v4()),
                overall_rating: 4,
                specific_ratings: Default::default(),
                title: None,
                content: "Clear lectures".to_string(),
                tags: Vec::new(),
                is_anonymous: false,
                semester: None,
                year: None,
            })
            .await
            .unwrap();
        review.id
    }

    fn caller() -> AuthContext {
        AuthContext::for_user(Uuid::new_v4())
    }

    async fn counters(store: &MemoryStore, review_id: Uuid) -> VoteCounts {
        let review = store.review(review_id).await.unwrap();
        VoteCounts {
            upvotes: review.upvotes,
            downvotes: review.downvotes,
        }
    }

    #[test]
    fn test_parse_vote_types() {
        assert_eq!("upvote".parse::<VoteType>().unwrap(), VoteType::Upvote);
        assert_eq!("down".parse::<VoteType>().unwrap(), VoteType::Downvote);
        assert!("sideways".parse::<VoteType>().is_err());
        assert_eq!("thread".parse::<VotableType>().unwrap(), VotableType::Thread);
        assert_eq!(VotableType::Post.table_name(), "forum_posts");
    }

    #[tokio::test]
    async fn test_first_vote_creates_row() {
        let store = Arc::new(MemoryStore::new());
        let review_id = seed_review(&store).await;
        let service = VoteService::new(store.clone());
        let target = VotableRef::new(VotableType::Review, review_id);

        let counts = service.cast_vote(&caller(), target, VoteType::Upvote).await.unwrap();

        assert_eq!(counts, VoteCounts { upvotes: 1, downvotes: 0 });
        assert_eq!(counters(&store, review_id).await, counts);
        assert_eq!(store.votes_for(target).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_same_vote_twice_toggles_off() {
        let store = Arc::new(MemoryStore::new());
        let review_id = seed_review(&store).await;
        let service = VoteService::new(store.clone());
        let target = VotableRef::new(VotableType::Review, review_id);
        let user = caller();

        service.cast_vote(&user, target, VoteType::Upvote).await.unwrap();
        let counts = service.cast_vote(&user, target, VoteType::Upvote).await.unwrap();

        assert_eq!(counts, VoteCounts::default());
        assert_eq!(counters(&store, review_id).await, VoteCounts::default());
        assert!(store.votes_for(target).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_switching_type_updates_in_place() {
        let store = Arc::new(MemoryStore::new());
        let review_id = seed_review(&store).await;
        let service = VoteService::new(store.clone());
        let target = VotableRef::new(VotableType::Review, review_id);
        let user = caller();

        // Another user's upvote stays untouched throughout
        service.cast_vote(&caller(), target, VoteType::Upvote).await.unwrap();

        let before = service.cast_vote(&user, target, VoteType::Upvote).await.unwrap();
        let first_id = store.find_vote(user.user_id, target).await.unwrap().unwrap().id;

        let after = service.cast_vote(&user, target, VoteType::Downvote).await.unwrap();
        let votes = store.votes_for(target).await.unwrap();
        let mine: Vec<_> = votes.iter().filter(|v| v.user_id == user.user_id).collect();

        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, first_id);
        assert_eq!(mine[0].vote_type, "downvote");
        assert_eq!(after.upvotes, before.upvotes - 1);
        assert_eq!(after.downvotes, before.downvotes + 1);
        assert_eq!(after, VoteCounts { upvotes: 1, downvotes: 1 });
    }

    #[test]
    fn test_tally_ignores_unknown_types() {
        let now = chrono::Utc::now().into();
        let vote = |t: &str| Vote {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            votable_type: "post".to_string(),
            votable_id: Uuid::nil(),
            vote_type: t.to_string(),
            created_at: now,
        };
        let votes = vec![vote("upvote"), vote("upvote"), vote("downvote"), vote("meh")];
        assert_eq!(VoteCounts::tally(&votes), VoteCounts { upvotes: 2, downvotes: 1 });
    }
}
