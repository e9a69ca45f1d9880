//! PostgreSQL Repository Implementation

use chrono::{DateTime, Utc};
use kernel::id::{PostId, UserId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{
    address::Address, email::Email, user_password::UserPassword, user_role::UserRole,
};
use crate::error::{AuthError, AuthResult};

/// PostgreSQL-backed identity store
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn find_one(&self, column_filter: &str, bind: FindBy<'_>) -> AuthResult<Option<User>> {
        let sql = format!("{} WHERE {}", SELECT_USER, column_filter);
        let query = sqlx::query_as::<_, UserRow>(&sql);
        let query = match bind {
            FindBy::Id(id) => query.bind(*id.as_uuid()),
            FindBy::Email(email) => query.bind(email.as_str().to_string()),
        };

        let row = query.fetch_optional(&self.pool).await?;
        row.map(|r| r.into_user()).transpose()
    }
}

enum FindBy<'a> {
    Id(&'a UserId),
    Email(&'a Email),
}

const SELECT_USER: &str = r#"
    SELECT
        user_id,
        email,
        password_hash,
        first_name,
        last_name,
        city,
        address_name,
        address_id_url,
        address_verified,
        profile_pic_url,
        upvoted_posts,
        downvoted_posts,
        favourite_posts,
        user_role,
        created_at,
        updated_at
    FROM users
"#;

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgAuthRepository {
    async fn create(&self, user: &User) -> AuthResult<()> {
        let address = user.address.as_ref();

        sqlx::query(
            r#"
            INSERT INTO users (
                user_id,
                email,
                password_hash,
                first_name,
                last_name,
                city,
                address_name,
                address_id_url,
                address_verified,
                profile_pic_url,
                user_role,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.email.as_str())
        .bind(user.password.as_phc_string())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.city)
        .bind(address.map(|a| a.name.as_str()))
        .bind(address.and_then(|a| a.id_url.as_deref()))
        .bind(address.is_some_and(|a| a.verified))
        .bind(user.profile_pic_url.as_deref())
        .bind(user.role.id())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => AuthError::EmailTaken,
            _ => AuthError::Database(e),
        })?;

        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        self.find_one("user_id = $1", FindBy::Id(user_id)).await
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        self.find_one("email = $1", FindBy::Email(email)).await
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn is_verified(&self, user_id: &UserId) -> AuthResult<bool> {
        let verified: Option<bool> = sqlx::query_scalar(
            r#"
            SELECT address_name IS NOT NULL AND address_verified
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(verified.unwrap_or(false))
    }

    async fn find_city(&self, user_id: &UserId) -> AuthResult<Option<String>> {
        let city: Option<String> = sqlx::query_scalar("SELECT city FROM users WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        Ok(city)
    }

    async fn find_email(&self, user_id: &UserId) -> AuthResult<Option<Email>> {
        let email: Option<String> =
            sqlx::query_scalar("SELECT email FROM users WHERE user_id = $1")
                .bind(user_id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        Ok(email.map(Email::from_db))
    }

    async fn set_id_document(&self, user_id: &UserId, id_url: &str) -> AuthResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET address_name = COALESCE(address_name, ''),
                address_id_url = $2,
                updated_at = $3
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(id_url)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn set_address_verified(&self, user_id: &UserId) -> AuthResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET address_verified = TRUE,
                updated_at = $2
            WHERE user_id = $1 AND address_name IS NOT NULL
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    city: String,
    address_name: Option<String>,
    address_id_url: Option<String>,
    address_verified: bool,
    profile_pic_url: Option<String>,
    upvoted_posts: Vec<Uuid>,
    downvoted_posts: Vec<Uuid>,
    favourite_posts: Vec<Uuid>,
    user_role: i16,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        let role = UserRole::from_id(self.user_role)
            .ok_or_else(|| AuthError::Internal(format!("Invalid user_role: {}", self.user_role)))?;

        let address = self.address_name.map(|name| Address {
            name,
            id_url: self.address_id_url,
            verified: self.address_verified,
        });

        Ok(User {
            user_id: UserId::from_uuid(self.user_id),
            email: Email::from_db(self.email),
            password: UserPassword::from_phc_string(self.password_hash)?,
            first_name: self.first_name,
            last_name: self.last_name,
            city: self.city,
            address,
            profile_pic_url: self.profile_pic_url,
            upvoted_posts: post_ids(self.upvoted_posts),
            downvoted_posts: post_ids(self.downvoted_posts),
            favourite_posts: post_ids(self.favourite_posts),
            role,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn post_ids(ids: Vec<Uuid>) -> Vec<PostId> {
    ids.into_iter().map(PostId::from_uuid).collect()
}
