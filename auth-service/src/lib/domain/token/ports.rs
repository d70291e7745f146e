use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::token::errors::TokenError;
use crate::domain::token::models::NewToken;
use crate::domain::token::models::Token;
use crate::domain::token::models::TokenId;
use crate::domain::token::models::TokenKind;
use crate::domain::user::models::UserId;

/// Persistence operations for token records.
#[async_trait]
pub trait TokenRepository: Send + Sync + 'static {
    /// Insert a token, failing if its value is already live.
    ///
    /// # Errors
    /// * `DuplicateValue` - Another stored token has the same value
    /// * `StoreUnavailable` - Store operation failed
    async fn create(&self, token: NewToken) -> Result<Token, TokenError>;

    /// Retrieve the token whose value equals `value`.
    async fn find_by_value(&self, value: &str) -> Result<Option<Token>, TokenError>;

    /// Delete a token by id.
    ///
    /// # Returns
    /// Whether a row was removed by this call
    async fn delete_by_id(&self, id: &TokenId) -> Result<bool, TokenError>;

    /// Delete every token of `kind` owned by `user_id`.
    ///
    /// # Returns
    /// Number of rows removed
    async fn delete_by_user_and_kind(
        &self,
        user_id: &UserId,
        kind: TokenKind,
    ) -> Result<u64, TokenError>;

    /// Delete every token whose expiry lies before `before`.
    ///
    /// # Returns
    /// Number of rows removed
    async fn delete_expired(&self, before: DateTime<Utc>) -> Result<u64, TokenError>;
}
