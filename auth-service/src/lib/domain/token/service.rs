use std::sync::Arc;

use auth::Clock;
use auth::ConfirmationCodeGenerator;
use auth::JwtError;
use auth::RefreshClaims;
use auth::TokenCodec;
use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use crate::domain::token::errors::TokenError;
use crate::domain::token::models::NewToken;
use crate::domain::token::models::Token;
use crate::domain::token::models::TokenId;
use crate::domain::token::models::TokenKind;
use crate::domain::token::models::TokenPair;
use crate::domain::token::ports::TokenRepository;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;

/// Token issuance and verification engine.
///
/// Composes the signed token codec, the confirmation code generator and the
/// token store. The engine attaches no business meaning to a token's kind
/// beyond storing it; flows decide what a kind allows.
pub struct TokenEngine<TR>
where
    TR: TokenRepository,
{
    repository: Arc<TR>,
    codec: Arc<TokenCodec>,
    codes: ConfirmationCodeGenerator,
    clock: Arc<dyn Clock>,
}

impl<TR> TokenEngine<TR>
where
    TR: TokenRepository,
{
    /// Create a new engine.
    ///
    /// # Arguments
    /// * `repository` - Token persistence implementation
    /// * `codec` - Signer/verifier for access and refresh tokens
    /// * `codes` - Random source for confirmation codes
    /// * `clock` - Time source for expiry math
    pub fn new(
        repository: Arc<TR>,
        codec: Arc<TokenCodec>,
        codes: ConfirmationCodeGenerator,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            codec,
            codes,
            clock,
        }
    }

    /// Persist a new token.
    ///
    /// # Errors
    /// * `DuplicateValue` - `value` collides with a live token
    /// * `StoreUnavailable` - Store operation failed
    pub async fn create_token(
        &self,
        kind: TokenKind,
        value: String,
        user_id: &UserId,
        expires_at: DateTime<Utc>,
    ) -> Result<Token, TokenError> {
        let token = self
            .repository
            .create(NewToken {
                user_id: *user_id,
                kind,
                value,
                expires_at,
                created_at: self.clock.now(),
            })
            .await?;

        tracing::debug!(
            token_id = %token.id,
            user_id = %token.user_id,
            kind = %token.kind,
            expires_at = %token.expires_at,
            "Token created"
        );

        Ok(token)
    }

    /// Find the live token holding `value`.
    ///
    /// # Errors
    /// * `NotFound` - No stored token has this value
    /// * `StoreUnavailable` - Store operation failed
    pub async fn lookup_by_value(&self, value: &str) -> Result<Token, TokenError> {
        self.repository
            .find_by_value(value)
            .await?
            .ok_or(TokenError::NotFound)
    }

    /// Delete a token. Deleting an absent token is not an error.
    pub async fn consume(&self, id: &TokenId) -> Result<(), TokenError> {
        let removed = self.repository.delete_by_id(id).await?;
        tracing::debug!(token_id = %id, removed, "Token consumed");

        Ok(())
    }

    /// Delete a token and report whether this call was the one that removed it.
    ///
    /// Two concurrent callers taking the same token see exactly one `true`.
    pub async fn take(&self, id: &TokenId) -> Result<bool, TokenError> {
        self.repository.delete_by_id(id).await
    }

    /// Delete every token of `kind` owned by `user_id`.
    pub async fn revoke(&self, user_id: &UserId, kind: TokenKind) -> Result<u64, TokenError> {
        let removed = self
            .repository
            .delete_by_user_and_kind(user_id, kind)
            .await?;

        if removed > 0 {
            tracing::debug!(user_id = %user_id, kind = %kind, removed, "Previous tokens revoked");
        }

        Ok(removed)
    }

    /// Sign a new access/refresh pair for `user` and store the refresh token.
    ///
    /// # Errors
    /// * `Signing` - Either token could not be signed
    /// * `DuplicateValue` - The refresh value collided with a live token
    /// * `StoreUnavailable` - Store operation failed
    pub async fn issue_session(
        &self,
        user: &User,
        access_expiry_hours: u32,
        refresh_expiry_hours: u32,
    ) -> Result<TokenPair, TokenError> {
        let access = self
            .codec
            .issue_access(
                user.id,
                user.username.as_str(),
                user.role.as_str(),
                access_expiry_hours,
            )
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        let refresh = self
            .codec
            .issue_refresh(user.id, refresh_expiry_hours)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        self.create_token(
            TokenKind::Refresh,
            refresh.value.clone(),
            &user.id,
            refresh.expires_at,
        )
        .await?;

        Ok(TokenPair {
            access_token: access.value,
            refresh_token: refresh.value,
        })
    }

    /// Generate and store a confirmation code of `kind` for `user_id`.
    ///
    /// # Errors
    /// * `DuplicateValue` - The generated code collided with a live token
    /// * `StoreUnavailable` - Store operation failed
    pub async fn issue_code(
        &self,
        kind: TokenKind,
        user_id: &UserId,
        length: usize,
        expiry_hours: u32,
    ) -> Result<Token, TokenError> {
        let code = self.codes.generate(length);
        let expires_at = self.clock.now() + Duration::hours(i64::from(expiry_hours));

        self.create_token(kind, code, user_id, expires_at).await
    }

    /// Check the signature and expiry of a refresh token value.
    pub fn verify_refresh(&self, value: &str) -> Result<RefreshClaims, JwtError> {
        self.codec.verify_refresh(value)
    }
}
