use std::sync::Arc;

use chrono::DateTime;
use chrono::Utc;

use crate::clock::Clock;
use crate::jwt::AccessClaims;
use crate::jwt::JwtError;
use crate::jwt::JwtHandler;
use crate::jwt::RefreshClaims;

/// A freshly signed token together with the instant it stops being valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies access and refresh tokens.
///
/// Access and refresh tokens use separate secrets, so a refresh token can
/// never pass as an access token and the other way round. All expiry math
/// reads the injected [`Clock`].
pub struct TokenCodec {
    access: JwtHandler,
    refresh: JwtHandler,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    /// Create a new codec.
    ///
    /// # Arguments
    /// * `access_secret` - Secret for signing access tokens
    /// * `refresh_secret` - Secret for signing refresh tokens
    /// * `clock` - Time source for issuance and expiry checks
    pub fn new(access_secret: &[u8], refresh_secret: &[u8], clock: Arc<dyn Clock>) -> Self {
        Self {
            access: JwtHandler::new(access_secret),
            refresh: JwtHandler::new(refresh_secret),
            clock,
        }
    }

    /// Sign an access token carrying the user's identity and role.
    ///
    /// # Errors
    /// * `EncodingFailed` - Claims could not be serialized or signed
    pub fn issue_access(
        &self,
        id: impl ToString,
        username: &str,
        role: &str,
        expiry_hours: u32,
    ) -> Result<SignedToken, JwtError> {
        let claims = AccessClaims::for_user(id, username, role, self.clock.now(), expiry_hours);
        self.sign(&self.access, &claims, claims.exp)
    }

    /// Sign a refresh token carrying only the user id.
    ///
    /// # Errors
    /// * `EncodingFailed` - Claims could not be serialized or signed
    pub fn issue_refresh(
        &self,
        id: impl ToString,
        expiry_hours: u32,
    ) -> Result<SignedToken, JwtError> {
        let claims = RefreshClaims::for_user(id, self.clock.now(), expiry_hours);
        self.sign(&self.refresh, &claims, claims.exp)
    }

    /// Verify an access token.
    ///
    /// # Errors
    /// * `TokenExpired` - The token's expiry lies in the past
    /// * `InvalidToken` - Bad signature, wrong algorithm, or malformed token
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, JwtError> {
        self.access.decode(token, self.clock.now().timestamp())
    }

    /// Verify a refresh token.
    ///
    /// # Errors
    /// * `TokenExpired` - The token's expiry lies in the past
    /// * `InvalidToken` - Bad signature, wrong algorithm, or malformed token
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, JwtError> {
        self.refresh.decode(token, self.clock.now().timestamp())
    }

    fn sign<T: serde::Serialize>(
        &self,
        handler: &JwtHandler,
        claims: &T,
        exp: i64,
    ) -> Result<SignedToken, JwtError> {
        let value = handler.encode(claims)?;
        let expires_at = DateTime::<Utc>::from_timestamp(exp, 0)
            .ok_or_else(|| JwtError::EncodingFailed(format!("expiry out of range: {}", exp)))?;

        Ok(SignedToken { value, expires_at })
    }
}
