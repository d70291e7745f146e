use std::sync::Arc;

use auth::JwtError;
use auth::TokenCodec;

use crate::domain::access::errors::AccessError;
use crate::domain::access::models::Identity;
use crate::domain::access::models::Permission;
use crate::domain::user::models::Role;
use crate::domain::user::models::UserId;

/// Authorization gate in front of protected operations.
///
/// Verifies access tokens only; it never consults the token store.
pub struct AccessGate {
    codec: Arc<TokenCodec>,
}

impl AccessGate {
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self { codec }
    }

    /// Verify an access token and extract the identity it carries.
    ///
    /// # Errors
    /// * `ExpiredToken` - Token is past its expiry
    /// * `InvalidToken` - Bad signature, malformed token or unknown claims
    pub fn authenticate(&self, token: &str) -> Result<Identity, AccessError> {
        let claims = self.codec.verify_access(token).map_err(|e| match e {
            JwtError::TokenExpired => AccessError::ExpiredToken,
            other => {
                tracing::debug!(error = %other, "Access token rejected");
                AccessError::InvalidToken
            }
        })?;

        let user_id = UserId::from_string(&claims.id).map_err(|_| AccessError::InvalidToken)?;
        let role = claims
            .role
            .parse::<Role>()
            .map_err(|_| AccessError::InvalidToken)?;

        Ok(Identity {
            user_id,
            username: claims.username,
            role,
        })
    }

    /// Verify a token and check its role against `permission`.
    ///
    /// # Errors
    /// * `ExpiredToken` / `InvalidToken` - See [`AccessGate::authenticate`]
    /// * `Forbidden` - Role is not in the permitted set
    pub fn authorize(&self, token: &str, permission: &Permission) -> Result<Identity, AccessError> {
        let identity = self.authenticate(token)?;

        if !permission.allows_role(identity.role) {
            tracing::info!(
                user_id = %identity.user_id,
                role = %identity.role,
                operation = permission.operation,
                "Operation denied for role"
            );
            return Err(AccessError::Forbidden);
        }

        Ok(identity)
    }

    /// Check that `identity` may act on the resource owned by `owner`.
    pub fn authorize_resource(
        &self,
        identity: &Identity,
        permission: &Permission,
        owner: &UserId,
    ) -> Result<(), AccessError> {
        if permission.allows_resource(identity, owner) {
            Ok(())
        } else {
            tracing::info!(
                user_id = %identity.user_id,
                owner = %owner,
                operation = permission.operation,
                "Operation denied on foreign resource"
            );
            Err(AccessError::Forbidden)
        }
    }
}
