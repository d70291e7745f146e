use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Claims that carry an expiration timestamp.
pub trait ExpiringClaims {
    /// Expiration time (Unix timestamp, seconds).
    fn expires_at(&self) -> i64;

    /// Check if token is expired.
    ///
    /// A token is still valid during the second it expires in.
    fn is_expired(&self, current_timestamp: i64) -> bool {
        self.expires_at() < current_timestamp
    }
}

/// Claims of a short-lived access token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessClaims {
    /// User identifier
    pub id: String,

    pub username: String,

    /// Role name as stored by the issuing service
    pub role: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// JWT ID, unique per issuance
    pub jti: String,
}

impl AccessClaims {
    /// Create access claims expiring `expiration_hours` after `issued_at`.
    pub fn for_user(
        id: impl ToString,
        username: impl ToString,
        role: impl ToString,
        issued_at: DateTime<Utc>,
        expiration_hours: u32,
    ) -> Self {
        let expiration = issued_at + Duration::hours(i64::from(expiration_hours));

        Self {
            id: id.to_string(),
            username: username.to_string(),
            role: role.to_string(),
            exp: expiration.timestamp(),
            iat: issued_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }
}

impl ExpiringClaims for AccessClaims {
    fn expires_at(&self) -> i64 {
        self.exp
    }
}

/// Minimal claims of a refresh token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefreshClaims {
    /// User identifier
    pub id: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// JWT ID, unique per issuance
    pub jti: String,
}

impl RefreshClaims {
    /// Create refresh claims expiring `expiration_hours` after `issued_at`.
    pub fn for_user(id: impl ToString, issued_at: DateTime<Utc>, expiration_hours: u32) -> Self {
        let expiration = issued_at + Duration::hours(i64::from(expiration_hours));

        Self {
            id: id.to_string(),
            exp: expiration.timestamp(),
            iat: issued_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }
}

impl ExpiringClaims for RefreshClaims {
    fn expires_at(&self) -> i64 {
        self.exp
    }
}
