//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::error::conversions::is_unique_violation;
use sqlx::PgPool;

use crate::domain::entity::user::{NewUser, User};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{
    email::Email, user_id::UserId, user_password::UserPassword, user_role::UserRole,
};
use crate::error::{AuthError, AuthResult};

const USER_COLUMNS: &str = r#"
    id,
    email,
    username,
    password_hash,
    google_id,
    role,
    email_verified,
    location,
    phone,
    maps_link,
    profile_image,
    created_at,
    updated_at
"#;

/// PostgreSQL-backed credential store
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, filter: &str, value: &str) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE {filter}"
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }
}

impl UserRepository for PgUserRepository {
    async fn create(&self, user: &NewUser) -> AuthResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (
                email,
                username,
                password_hash,
                google_id,
                role,
                email_verified,
                profile_image
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.email.as_str())
        .bind(&user.username)
        .bind(user.password_hash.as_ref().map(UserPassword::as_phc_string))
        .bind(user.google_id.as_deref())
        .bind(user.role.code())
        .bind(user.email_verified)
        .bind(user.profile_image.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AuthError::Conflict("User with this email already exists".to_string())
            } else {
                AuthError::Database(e)
            }
        })?;

        row.into_user()
    }

    async fn find_by_id(&self, id: UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        self.find_one("lower(email) = $1", email.as_str()).await
    }

    async fn find_by_google_id(&self, google_id: &str) -> AuthResult<Option<User>> {
        self.find_one("google_id = $1", google_id).await
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE lower(email) = $1)",
        )
        .bind(email.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE users SET
                username = $2,
                password_hash = $3,
                google_id = $4,
                role = $5,
                email_verified = $6,
                location = $7,
                phone = $8,
                maps_link = $9,
                profile_image = $10,
                updated_at = $11
            WHERE id = $1
            "#,
        )
        .bind(user.id.get())
        .bind(&user.username)
        .bind(user.password_hash.as_ref().map(UserPassword::as_phc_string))
        .bind(user.google_id.as_deref())
        .bind(user.role.code())
        .bind(user.email_verified)
        .bind(user.location.as_deref())
        .bind(user.phone.as_deref())
        .bind(user.maps_link.as_deref())
        .bind(user.profile_image.as_deref())
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AuthError::AccountConflict(
                    "Provider identity is already linked to another account".to_string(),
                )
            } else {
                AuthError::Database(e)
            }
        })?;

        Ok(())
    }

    async fn delete(&self, id: UserId) -> AuthResult<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    username: String,
    password_hash: Option<String>,
    google_id: Option<String>,
    role: String,
    email_verified: bool,
    location: Option<String>,
    phone: Option<String>,
    maps_link: Option<String>,
    profile_image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        let role = UserRole::from_code(&self.role)
            .ok_or_else(|| AuthError::Internal(format!("Invalid role: {}", self.role)))?;

        let password_hash = self
            .password_hash
            .map(UserPassword::from_phc_string)
            .transpose()?;

        Ok(User {
            id: UserId::new(self.id),
            email: Email::from_db(self.email),
            username: self.username,
            password_hash,
            google_id: self.google_id,
            role,
            email_verified: self.email_verified,
            location: self.location,
            phone: self.phone,
            maps_link: self.maps_link,
            profile_image: self.profile_image,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
