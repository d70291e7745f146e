use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::within;
use super::StoreError;
use crate::domain::token::errors::TokenError;
use crate::domain::token::models::NewToken;
use crate::domain::token::models::Token;
use crate::domain::token::models::TokenId;
use crate::domain::token::models::TokenKind;
use crate::domain::token::ports::TokenRepository;
use crate::domain::user::models::UserId;

pub struct PostgresTokenRepository {
    pool: PgPool,
    timeout: Duration,
}

impl PostgresTokenRepository {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[derive(sqlx::FromRow)]
struct TokenRow {
    id: i64,
    user_id: Uuid,
    kind: String,
    value: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TokenRow> for Token {
    type Error = TokenError;

    fn try_from(r: TokenRow) -> Result<Self, Self::Error> {
        Ok(Token {
            id: TokenId(r.id),
            user_id: UserId(r.user_id),
            kind: r.kind.parse()?,
            value: r.value,
            expires_at: r.expires_at,
            created_at: r.created_at,
        })
    }
}

fn store_unavailable(e: StoreError) -> TokenError {
    tracing::error!(error = %e, table = "tokens", "Token store call failed");
    TokenError::StoreUnavailable(e.to_string())
}

#[async_trait]
impl TokenRepository for PostgresTokenRepository {
    async fn create(&self, token: NewToken) -> Result<Token, TokenError> {
        let id = within(
            self.timeout,
            sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO tokens (user_id, kind, value, expires_at, created_at)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
                "#,
            )
            .bind(token.user_id.0)
            .bind(token.kind.as_str())
            .bind(&token.value)
            .bind(token.expires_at)
            .bind(token.created_at)
            .fetch_one(&self.pool),
        )
        .await
        .map_err(|e| match e.violated_unique_constraint() {
            Some("tokens_value_key") => TokenError::DuplicateValue,
            _ => store_unavailable(e),
        })?;

        Ok(token.into_token(TokenId(id)))
    }

    async fn find_by_value(&self, value: &str) -> Result<Option<Token>, TokenError> {
        within(
            self.timeout,
            sqlx::query_as::<_, TokenRow>(
                r#"
                SELECT id, user_id, kind, value, expires_at, created_at
                FROM tokens
                WHERE value = $1
                "#,
            )
            .bind(value)
            .fetch_optional(&self.pool),
        )
        .await
        .map_err(store_unavailable)?
        .map(Token::try_from)
        .transpose()
    }

    async fn delete_by_id(&self, id: &TokenId) -> Result<bool, TokenError> {
        let result = within(
            self.timeout,
            sqlx::query("DELETE FROM tokens WHERE id = $1")
                .bind(id.0)
                .execute(&self.pool),
        )
        .await
        .map_err(store_unavailable)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_user_and_kind(
        &self,
        user_id: &UserId,
        kind: TokenKind,
    ) -> Result<u64, TokenError> {
        let result = within(
            self.timeout,
            sqlx::query("DELETE FROM tokens WHERE user_id = $1 AND kind = $2")
                .bind(user_id.0)
                .bind(kind.as_str())
                .execute(&self.pool),
        )
        .await
        .map_err(store_unavailable)?;

        Ok(result.rows_affected())
    }

    async fn delete_expired(&self, before: DateTime<Utc>) -> Result<u64, TokenError> {
        let result = within(
            self.timeout,
            sqlx::query("DELETE FROM tokens WHERE expires_at < $1")
                .bind(before)
                .execute(&self.pool),
        )
        .await
        .map_err(store_unavailable)?;

        Ok(result.rows_affected())
    }
}
