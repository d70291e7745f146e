use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::within;
use super::StoreError;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::Profile;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::Username;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::UserError;

const USER_COLUMNS: &str = "id, username, email, password_hash, role, is_email_verified, \
    first_name, last_name, avatar_url, last_logged_in_at, created_at, updated_at";

pub struct PostgresUserRepository {
    pool: PgPool,
    timeout: Duration,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn fetch_one_where(
        &self,
        predicate: &str,
        value: &str,
    ) -> Result<Option<User>, UserError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE ({predicate}) AND deleted_at IS NULL LIMIT 1"
        );

        within(
            self.timeout,
            sqlx::query_as::<_, UserRow>(&sql)
                .bind(value)
                .fetch_optional(&self.pool),
        )
        .await
        .map_err(store_unavailable)?
        .map(User::try_from)
        .transpose()
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    role: String,
    is_email_verified: bool,
    first_name: Option<String>,
    last_name: Option<String>,
    avatar_url: Option<String>,
    last_logged_in_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = UserError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: UserId(r.id),
            username: Username::new(r.username)?,
            email: EmailAddress::new(r.email)?,
            password_hash: r.password_hash,
            role: r.role.parse()?,
            is_email_verified: r.is_email_verified,
            profile: Profile {
                first_name: r.first_name,
                last_name: r.last_name,
                avatar_url: r.avatar_url,
            },
            last_logged_in_at: r.last_logged_in_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

fn store_unavailable(e: StoreError) -> UserError {
    tracing::error!(error = %e, table = "users", "User store call failed");
    UserError::StoreUnavailable(e.to_string())
}

fn map_write_error(e: StoreError, user: &User) -> UserError {
    match e.violated_unique_constraint() {
        Some("users_username_key") => UserError::UsernameAlreadyExists(user.username.to_string()),
        Some("users_email_key") => UserError::EmailAlreadyExists(user.email.to_string()),
        _ => store_unavailable(e),
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: User) -> Result<User, UserError> {
        within(
            self.timeout,
            sqlx::query(
                r#"
                INSERT INTO users (id, username, email, password_hash, role, is_email_verified,
                                   first_name, last_name, avatar_url, last_logged_in_at,
                                   created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                "#,
            )
            .bind(user.id.0)
            .bind(user.username.as_str())
            .bind(user.email.as_str())
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(user.is_email_verified)
            .bind(&user.profile.first_name)
            .bind(&user.profile.last_name)
            .bind(&user.profile.avatar_url)
            .bind(user.last_logged_in_at)
            .bind(user.created_at)
            .bind(user.updated_at)
            .execute(&self.pool),
        )
        .await
        .map_err(|e| map_write_error(e, &user))?;

        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL");

        within(
            self.timeout,
            sqlx::query_as::<_, UserRow>(&sql)
                .bind(id.0)
                .fetch_optional(&self.pool),
        )
        .await
        .map_err(store_unavailable)?
        .map(User::try_from)
        .transpose()
    }

    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, UserError> {
        self.fetch_one_where("username = $1", username.as_str())
            .await
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError> {
        self.fetch_one_where("email = $1", email.as_str()).await
    }

    async fn find_by_username_or_email(
        &self,
        identifier: &str,
    ) -> Result<Option<User>, UserError> {
        self.fetch_one_where("username = $1 OR email = $1", identifier)
            .await
    }

    async fn list(&self, limit: u32, offset: u32) -> Result<Vec<User>, UserError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE deleted_at IS NULL \
             ORDER BY created_at ASC LIMIT $1 OFFSET $2"
        );

        within(
            self.timeout,
            sqlx::query_as::<_, UserRow>(&sql)
                .bind(i64::from(limit))
                .bind(i64::from(offset))
                .fetch_all(&self.pool),
        )
        .await
        .map_err(store_unavailable)?
        .into_iter()
        .map(User::try_from)
        .collect()
    }

    async fn save(&self, user: User) -> Result<User, UserError> {
        let result = within(
            self.timeout,
            sqlx::query(
                r#"
                UPDATE users
                SET username = $2, email = $3, password_hash = $4, role = $5,
                    is_email_verified = $6, first_name = $7, last_name = $8, avatar_url = $9,
                    last_logged_in_at = $10, updated_at = $11
                WHERE id = $1 AND deleted_at IS NULL
                "#,
            )
            .bind(user.id.0)
            .bind(user.username.as_str())
            .bind(user.email.as_str())
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(user.is_email_verified)
            .bind(&user.profile.first_name)
            .bind(&user.profile.last_name)
            .bind(&user.profile.avatar_url)
            .bind(user.last_logged_in_at)
            .bind(user.updated_at)
            .execute(&self.pool),
        )
        .await
        .map_err(|e| map_write_error(e, &user))?;

        if result.rows_affected() == 0 {
            return Err(UserError::NotFound(user.id.to_string()));
        }

        Ok(user)
    }

    async fn soft_delete(&self, id: &UserId, deleted_at: DateTime<Utc>) -> Result<(), UserError> {
        // Tokens only cascade on hard delete, so a soft delete drops them explicitly.
        let removed = within(self.timeout, async {
            let mut tx = self.pool.begin().await?;

            let result = sqlx::query(
                "UPDATE users SET deleted_at = $2, updated_at = $2 \
                 WHERE id = $1 AND deleted_at IS NULL",
            )
            .bind(id.0)
            .bind(deleted_at)
            .execute(&mut *tx)
            .await?;

            sqlx::query("DELETE FROM tokens WHERE user_id = $1")
                .bind(id.0)
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;
            Ok(result.rows_affected())
        })
        .await
        .map_err(store_unavailable)?;

        if removed == 0 {
            return Err(UserError::NotFound(id.to_string()));
        }

        Ok(())
    }
}
