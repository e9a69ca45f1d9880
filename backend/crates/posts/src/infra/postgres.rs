//! PostgreSQL Repository Implementation
//!
//! Vote and favourite sets are `UUID[]` columns. A toggle locks the post
//! row, reads the caller's membership and rewrites both the post's sets and
//! the caller's back-reference arrays on `users` in one transaction.

use chrono::{DateTime, Utc};
use kernel::id::{PostId, UserId};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::entity::post::Post;
use crate::domain::repository::{PostFilter, PostRepository, Window};
use crate::domain::value_object::outcome::{
    FavouriteOutcome, OwnedWrite, VoteKind, VoteOutcome, vote_transition,
};
use crate::domain::value_object::post_sort::PostSort;
use crate::domain::value_object::post_status::PostStatus;
use crate::error::{PostError, PostResult};

/// PostgreSQL-backed post store
#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, post_id: &PostId) -> PostResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE post_id = $1)")
                .bind(post_id.as_uuid())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }
}

const POST_COLUMNS: &str = r#"
    post_id,
    title,
    description,
    owner_id,
    city,
    status,
    upvoted_by,
    downvoted_by,
    favourite_by,
    file_urls,
    verified,
    created_at,
    updated_at
"#;

// ============================================================================
// Post Repository Implementation
// ============================================================================

impl PostRepository for PgPostRepository {
    async fn insert(&self, post: &Post) -> PostResult<()> {
        sqlx::query(
            r#"
            INSERT INTO posts (
                post_id,
                title,
                description,
                owner_id,
                city,
                status,
                verified,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(post.post_id.as_uuid())
        .bind(&post.title)
        .bind(&post.description)
        .bind(post.owner_id.as_uuid())
        .bind(&post.city)
        .bind(post.status.id())
        .bind(post.verified)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, post_id: &PostId) -> PostResult<Option<Post>> {
        let sql = format!("SELECT {} FROM posts WHERE post_id = $1", POST_COLUMNS);
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(post_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_post()).transpose()
    }

    async fn update_content(
        &self,
        post_id: &PostId,
        requester: &UserId,
        title: &str,
        description: &str,
    ) -> PostResult<OwnedWrite> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET title = $3,
                description = $4,
                updated_at = $5
            WHERE post_id = $1 AND owner_id = $2
            "#,
        )
        .bind(post_id.as_uuid())
        .bind(requester.as_uuid())
        .bind(title)
        .bind(description)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(OwnedWrite::Applied(()));
        }

        Ok(if self.exists(post_id).await? {
            OwnedWrite::Forbidden
        } else {
            OwnedWrite::NotFound
        })
    }

    async fn set_status(&self, post_id: &PostId, status: PostStatus) -> PostResult<bool> {
        let result =
            sqlx::query("UPDATE posts SET status = $2, updated_at = $3 WHERE post_id = $1")
                .bind(post_id.as_uuid())
                .bind(status.id())
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn set_verified(&self, post_id: &PostId) -> PostResult<bool> {
        let result =
            sqlx::query("UPDATE posts SET verified = TRUE, updated_at = $2 WHERE post_id = $1")
                .bind(post_id.as_uuid())
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete(
        &self,
        post_id: &PostId,
        requester: Option<&UserId>,
    ) -> PostResult<OwnedWrite<Post>> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "DELETE FROM posts WHERE post_id = $1 AND ($2::uuid IS NULL OR owner_id = $2) RETURNING {}",
            POST_COLUMNS
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(post_id.as_uuid())
            .bind(requester.map(|r| *r.as_uuid()))
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(if self.exists(post_id).await? {
                OwnedWrite::Forbidden
            } else {
                OwnedWrite::NotFound
            });
        };

        sqlx::query(
            r#"
            UPDATE users
            SET upvoted_posts = array_remove(upvoted_posts, $1),
                downvoted_posts = array_remove(downvoted_posts, $1),
                favourite_posts = array_remove(favourite_posts, $1)
            WHERE $1 = ANY(upvoted_posts)
               OR $1 = ANY(downvoted_posts)
               OR $1 = ANY(favourite_posts)
            "#,
        )
        .bind(post_id.as_uuid())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(OwnedWrite::Applied(row.into_post()?))
    }

    async fn toggle_vote(
        &self,
        post_id: &PostId,
        user_id: &UserId,
        kind: VoteKind,
    ) -> PostResult<Option<VoteOutcome>> {
        let mut tx = self.pool.begin().await?;

        let membership: Option<(bool, bool)> = sqlx::query_as(
            r#"
            SELECT $2 = ANY(upvoted_by), $2 = ANY(downvoted_by)
            FROM posts
            WHERE post_id = $1
            FOR UPDATE
            "#,
        )
        .bind(post_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;

        let Some((upvoted, downvoted)) = membership else {
            tx.rollback().await?;
            return Ok(None);
        };
        let transition = vote_transition(kind, upvoted, downvoted);

        sqlx::query(
            r#"
            UPDATE posts
            SET upvoted_by = CASE WHEN $3 THEN array_append(array_remove(upvoted_by, $2), $2)
                                  ELSE array_remove(upvoted_by, $2) END,
                downvoted_by = CASE WHEN $4 THEN array_append(array_remove(downvoted_by, $2), $2)
                                    ELSE array_remove(downvoted_by, $2) END,
                updated_at = $5
            WHERE post_id = $1
            "#,
        )
        .bind(post_id.as_uuid())
        .bind(user_id.as_uuid())
        .bind(transition.upvoted)
        .bind(transition.downvoted)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE users
            SET upvoted_posts = CASE WHEN $3 THEN array_append(array_remove(upvoted_posts, $2), $2)
                                     ELSE array_remove(upvoted_posts, $2) END,
                downvoted_posts = CASE WHEN $4 THEN array_append(array_remove(downvoted_posts, $2), $2)
                                       ELSE array_remove(downvoted_posts, $2) END
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(post_id.as_uuid())
        .bind(transition.upvoted)
        .bind(transition.downvoted)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(transition.outcome))
    }

    async fn toggle_favourite(
        &self,
        post_id: &PostId,
        user_id: &UserId,
    ) -> PostResult<Option<FavouriteOutcome>> {
        let mut tx = self.pool.begin().await?;

        let favourited: Option<bool> = sqlx::query_scalar(
            r#"
            SELECT $2 = ANY(favourite_by)
            FROM posts
            WHERE post_id = $1
            FOR UPDATE
            "#,
        )
        .bind(post_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(favourited) = favourited else {
            tx.rollback().await?;
            return Ok(None);
        };
        let add = !favourited;

        sqlx::query(
            r#"
            UPDATE posts
            SET favourite_by = CASE WHEN $3 THEN array_append(favourite_by, $2)
                                    ELSE array_remove(favourite_by, $2) END,
                updated_at = $4
            WHERE post_id = $1
            "#,
        )
        .bind(post_id.as_uuid())
        .bind(user_id.as_uuid())
        .bind(add)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE users
            SET favourite_posts = CASE WHEN $3 THEN array_append(array_remove(favourite_posts, $2), $2)
                                       ELSE array_remove(favourite_posts, $2) END
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(post_id.as_uuid())
        .bind(add)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(if add {
            FavouriteOutcome::Added
        } else {
            FavouriteOutcome::Removed
        }))
    }

    async fn clear_file_urls(&self, post_id: &PostId) -> PostResult<bool> {
        let result = sqlx::query(
            "UPDATE posts SET file_urls = '{}', updated_at = $2 WHERE post_id = $1",
        )
        .bind(post_id.as_uuid())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn append_file_urls(&self, post_id: &PostId, urls: &[String]) -> PostResult<bool> {
        let result = sqlx::query(
            "UPDATE posts SET file_urls = file_urls || $2, updated_at = $3 WHERE post_id = $1",
        )
        .bind(post_id.as_uuid())
        .bind(urls)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list(
        &self,
        filter: &PostFilter,
        sort: PostSort,
        window: Option<Window>,
    ) -> PostResult<Vec<Post>> {
        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM posts", POST_COLUMNS));
        push_filter(&mut query, filter);
        query.push(" ORDER BY ");
        query.push(order_by(sort));
        if let Some(window) = window {
            query.push(" LIMIT ");
            query.push_bind(window.limit);
            query.push(" OFFSET ");
            query.push_bind(window.offset);
        }

        let rows = query
            .build_query_as::<PostRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(PostRow::into_post).collect()
    }

    async fn count(&self, filter: &PostFilter) -> PostResult<i64> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts");
        push_filter(&mut query, filter);

        let count = query
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

fn push_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &PostFilter) {
    match filter {
        PostFilter::Verified => {
            query.push(" WHERE verified");
        }
        PostFilter::VerifiedInCity(city) => {
            query.push(" WHERE verified AND city = ");
            query.push_bind(city.clone());
        }
        PostFilter::UnverifiedInCity(city) => {
            query.push(" WHERE NOT verified AND city = ");
            query.push_bind(city.clone());
        }
        PostFilter::OwnedBy(user_id) => {
            query.push(" WHERE owner_id = ");
            query.push_bind(*user_id.as_uuid());
        }
        PostFilter::FavouriteOf(user_id) => {
            query.push(" WHERE ");
            query.push_bind(*user_id.as_uuid());
            query.push(" = ANY(favourite_by)");
        }
    }
}

/// Every order ends newest first, then by id for a stable page split.
fn order_by(sort: PostSort) -> String {
    let primary = match sort {
        PostSort::Date => String::new(),
        PostSort::Upvotes => "cardinality(upvoted_by) DESC, ".to_string(),
        PostSort::Downvotes => "cardinality(downvoted_by) DESC, ".to_string(),
        // Enum id, never user text
        PostSort::Status(status) => format!("(status = {}) DESC, ", status.id()),
    };
    format!("{}created_at DESC, post_id", primary)
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct PostRow {
    post_id: Uuid,
    title: String,
    description: String,
    owner_id: Uuid,
    city: String,
    status: i16,
    upvoted_by: Vec<Uuid>,
    downvoted_by: Vec<Uuid>,
    favourite_by: Vec<Uuid>,
    file_urls: Vec<String>,
    verified: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PostRow {
    fn into_post(self) -> PostResult<Post> {
        let status = PostStatus::from_id(self.status)
            .ok_or_else(|| PostError::Internal(format!("Invalid post status: {}", self.status)))?;

        Ok(Post {
            post_id: PostId::from_uuid(self.post_id),
            title: self.title,
            description: self.description,
            owner_id: UserId::from_uuid(self.owner_id),
            city: self.city,
            status,
            upvoted_by: user_ids(self.upvoted_by),
            downvoted_by: user_ids(self.downvoted_by),
            favourite_by: user_ids(self.favourite_by),
            file_urls: self.file_urls,
            verified: self.verified,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn user_ids(ids: Vec<Uuid>) -> Vec<UserId> {
    ids.into_iter().map(UserId::from_uuid).collect()
}
