//! Postgres-backed [`Store`]
//!
//! Simple reads and inserts go through SeaORM entities. Updates whose
//! target table is only known at runtime (aggregate columns, vote counters)
//! are built as raw statements from the type-to-table mapping.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use crate::rating::{RatingAggregate, ReviewableRef};
use crate::services::votes::{VotableRef, VoteCounts, VoteType};
use crate::store::{AuthorProfile, NewReview, ReviewWithAuthor, Store};
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr,
    EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set, SqlErr, Statement,
};
use uuid::Uuid;

/// Escape `%`, `_` and `\` so user input matches literally inside a LIKE pattern
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `%needle%` with metacharacters escaped
fn contains_pattern(needle: &str) -> String {
    format!("%{}%", escape_like(needle))
}

/// `UPDATE <table> SET overall_rating = $1, total_reviews = $2, <sub> = $n.. WHERE id = $last`
fn aggregate_update(target: ReviewableRef, aggregate: &RatingAggregate) -> Statement {
    let mut assignments = vec!["overall_rating = $1".to_string(), "total_reviews = $2".to_string()];
    let mut values: Vec<sea_orm::Value> = vec![
        aggregate.overall_rating.into(),
        aggregate.total_reviews.into(),
    ];

    for sub in target.kind.sub_ratings() {
        values.push(aggregate.sub_rating(sub.column).unwrap_or_default().into());
        assignments.push(format!("{} = ${}", sub.column, values.len()));
    }

    values.push(target.id.into());
    let sql = format!(
        "UPDATE {} SET {}, updated_at = NOW() WHERE id = ${}",
        target.kind.table_name(),
        assignments.join(", "),
        values.len()
    );

    Statement::from_sql_and_values(DbBackend::Postgres, &sql, values)
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    /// Run a name (and optionally code) ILIKE query against one table
    fn search_statement(table: &str, with_code: bool, needle: &str, limit: u64) -> Statement {
        let predicate = if with_code {
            "name ILIKE $1 OR code ILIKE $1"
        } else {
            "name ILIKE $1"
        };
        let sql = format!("SELECT * FROM {} WHERE {} LIMIT $2", table, predicate);
        Statement::from_sql_and_values(
            DbBackend::Postgres,
            &sql,
            vec![contains_pattern(needle).into(), (limit as i64).into()],
        )
    }
}

#[async_trait]
impl Store for Repository {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Reviews
    // ========================================================================

    async fn insert_review(&self, review: NewReview) -> Result<Review> {
        let now = chrono::Utc::now();

        let row = ReviewActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(review.user_id),
            reviewable_type: Set(review.target.kind.as_str().to_string()),
            reviewable_id: Set(review.target.id),
            overall_rating: Set(review.overall_rating),
            specific_ratings: Set(serde_json::to_value(&review.specific_ratings)?),
            title: Set(review.title),
            content: Set(review.content),
            tags: Set(review.tags),
            is_anonymous: Set(review.is_anonymous),
            semester: Set(review.semester),
            year: Set(review.year),
            upvotes: Set(0),
            downvotes: Set(0),
            is_flagged: Set(false),
            is_moderated: Set(false),
            is_verified: Set(false),
            flag_reason: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        row.insert(self.write_conn()).await.map_err(Into::into)
    }

    async fn reviews_for(&self, target: ReviewableRef) -> Result<Vec<Review>> {
        // Primary: the recompute must see the review inserted just before it
        ReviewEntity::find()
            .filter(ReviewColumn::ReviewableType.eq(target.kind.as_str()))
            .filter(ReviewColumn::ReviewableId.eq(target.id))
            .all(self.write_conn())
            .await
            .map_err(Into::into)
    }

    async fn reviews_with_authors(&self, target: ReviewableRef) -> Result<Vec<ReviewWithAuthor>> {
        let rows = ReviewEntity::find()
            .filter(ReviewColumn::ReviewableType.eq(target.kind.as_str()))
            .filter(ReviewColumn::ReviewableId.eq(target.id))
            .find_also_related(ProfileEntity)
            .order_by_desc(ReviewColumn::CreatedAt)
            .all(self.read_conn())
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(review, profile)| {
                profile.map(|p| ReviewWithAuthor {
                    review,
                    profiles: AuthorProfile::from(p),
                })
            })
            .collect())
    }

    async fn write_rating_aggregate(
        &self,
        target: ReviewableRef,
        aggregate: &RatingAggregate,
    ) -> Result<()> {
        let result = self
            .write_conn()
            .execute(aggregate_update(target, aggregate))
            .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(
                reviewable_type = %target.kind,
                reviewable_id = %target.id,
                "Aggregate update matched no row"
            );
        }
        Ok(())
    }

    // ========================================================================
    // Votes
    // ========================================================================

    async fn find_vote(&self, user_id: Uuid, target: VotableRef) -> Result<Option<Vote>> {
        VoteEntity::find()
            .filter(VoteColumn::UserId.eq(user_id))
            .filter(VoteColumn::VotableType.eq(target.kind.as_str()))
            .filter(VoteColumn::VotableId.eq(target.id))
            .one(self.write_conn())
            .await
            .map_err(Into::into)
    }

    async fn insert_vote(
        &self,
        user_id: Uuid,
        target: VotableRef,
        vote_type: VoteType,
    ) -> Result<Vote> {
        let vote = VoteActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            votable_type: Set(target.kind.as_str().to_string()),
            votable_id: Set(target.id),
            vote_type: Set(vote_type.as_str().to_string()),
            created_at: Set(chrono::Utc::now().into()),
        };

        vote.insert(self.write_conn()).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Duplicate {
                    message: format!("vote already exists for {} {}", target.kind, target.id),
                }
            } else {
                e.into()
            }
        })
    }

    async fn update_vote_type(&self, vote_id: Uuid, vote_type: VoteType) -> Result<()> {
        let Some(vote) = VoteEntity::find_by_id(vote_id).one(self.write_conn()).await? else {
            return Ok(());
        };

        let mut vote = vote.into_active_model();
        vote.vote_type = Set(vote_type.as_str().to_string());
        vote.update(self.write_conn()).await?;
        Ok(())
    }

    async fn delete_vote(&self, vote_id: Uuid) -> Result<()> {
        VoteEntity::delete_by_id(vote_id).exec(self.write_conn()).await?;
        Ok(())
    }

    async fn votes_for(&self, target: VotableRef) -> Result<Vec<Vote>> {
        VoteEntity::find()
            .filter(VoteColumn::VotableType.eq(target.kind.as_str()))
            .filter(VoteColumn::VotableId.eq(target.id))
            .all(self.write_conn())
            .await
            .map_err(Into::into)
    }

    async fn write_vote_counts(&self, target: VotableRef, counts: VoteCounts) -> Result<()> {
        let sql = format!(
            "UPDATE {} SET upvotes = $1, downvotes = $2, updated_at = NOW() WHERE id = $3",
            target.kind.table_name()
        );
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            &sql,
            vec![counts.upvotes.into(), counts.downvotes.into(), target.id.into()],
        );

        self.write_conn().execute(stmt).await?;
        Ok(())
    }

    // ========================================================================
    // Search
    // ========================================================================

    async fn search_professors(&self, needle: &str, limit: u64) -> Result<Vec<Professor>> {
        ProfessorEntity::find()
            .from_raw_sql(Self::search_statement("professors", false, needle, limit))
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    async fn search_courses(&self, needle: &str, limit: u64) -> Result<Vec<Course>> {
        CourseEntity::find()
            .from_raw_sql(Self::search_statement("courses", true, needle, limit))
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    async fn search_buildings(&self, needle: &str, limit: u64) -> Result<Vec<Building>> {
        BuildingEntity::find()
            .from_raw_sql(Self::search_statement("buildings", true, needle, limit))
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    async fn search_cafes(&self, needle: &str, limit: u64) -> Result<Vec<Cafe>> {
        CafeEntity::find()
            .from_raw_sql(Self::search_statement("cafes", false, needle, limit))
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::ReviewableType;
    use std::collections::BTreeMap;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("cs_101"), "cs\\_101");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
        assert_eq!(contains_pattern("comp"), "%comp%");
    }

    #[test]
    fn test_aggregate_update_for_building() {
        let target = ReviewableRef::new(ReviewableType::Building, Uuid::nil());
        let aggregate = RatingAggregate {
            overall_rating: 3.5,
            total_reviews: 2,
            sub_ratings: BTreeMap::from([("wifi_rating", 4.0)]),
        };

        let stmt = aggregate_update(target, &aggregate);

        assert_eq!(
            stmt.sql,
            "UPDATE buildings SET overall_rating = $1, total_reviews = $2, wifi_rating = $3, \
             study_spaces_rating = $4, accessibility_rating = $5, cleanliness_rating = $6, \
             updated_at = NOW() WHERE id = $7"
        );
        assert_eq!(stmt.values.map(|v| v.0.len()), Some(7));
    }

    #[test]
    fn test_aggregate_update_for_professor_has_no_sub_columns() {
        let target = ReviewableRef::new(ReviewableType::Professor, Uuid::nil());
        let aggregate = RatingAggregate {
            overall_rating: 5.0,
            total_reviews: 1,
            sub_ratings: BTreeMap::new(),
        };

        let stmt = aggregate_update(target, &aggregate);

        assert!(stmt.sql.starts_with("UPDATE professors SET overall_rating = $1, total_reviews = $2, updated_at"));
        assert!(stmt.sql.ends_with("WHERE id = $3"));
    }
}
