use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;

use crate::domain::token::errors::TokenKindError;
use crate::domain::user::models::UserId;

/// Store-assigned token identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenId(pub i64);

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What a token is for, and therefore how its value is read.
///
/// Access and refresh values are signed structures; the other kinds hold
/// plain confirmation codes that only mean something through a store lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Access,
    Refresh,
    ResetPassword,
    VerifyEmail,
    VerifyPhone,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
            TokenKind::ResetPassword => "reset_password",
            TokenKind::VerifyEmail => "verify_email",
            TokenKind::VerifyPhone => "verify_phone",
        }
    }
}

impl FromStr for TokenKind {
    type Err = TokenKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "access" => Ok(TokenKind::Access),
            "refresh" => Ok(TokenKind::Refresh),
            "reset_password" => Ok(TokenKind::ResetPassword),
            "verify_email" => Ok(TokenKind::VerifyEmail),
            "verify_phone" => Ok(TokenKind::VerifyPhone),
            other => Err(TokenKindError::Unknown(other.to_string())),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted token record.
///
/// Records are never updated: consuming a token deletes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub id: TokenId,
    pub user_id: UserId,
    pub kind: TokenKind,
    pub value: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Token {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// A token record that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewToken {
    pub user_id: UserId,
    pub kind: TokenKind,
    pub value: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl NewToken {
    pub fn into_token(self, id: TokenId) -> Token {
        Token {
            id,
            user_id: self.user_id,
            kind: self.kind,
            value: self.value,
            expires_at: self.expires_at,
            created_at: self.created_at,
        }
    }
}

/// Access and refresh token pair handed out on sign-in and refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            TokenKind::Access,
            TokenKind::Refresh,
            TokenKind::ResetPassword,
            TokenKind::VerifyEmail,
            TokenKind::VerifyPhone,
        ] {
            assert_eq!(kind.as_str().parse::<TokenKind>(), Ok(kind));
        }
        assert!("session".parse::<TokenKind>().is_err());
    }

    #[test]
    fn test_is_expired_is_strict() {
        let now = Utc::now();
        let token = NewToken {
            user_id: UserId::new(),
            kind: TokenKind::ResetPassword,
            value: "ABC123".to_string(),
            expires_at: now,
            created_at: now,
        }
        .into_token(TokenId(1));

        assert!(!token.is_expired(now));
        assert!(token.is_expired(now + Duration::seconds(1)));
    }
}
