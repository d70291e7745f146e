use std::fmt;

use auth::PasswordError;
use thiserror::Error;

use crate::domain::token::errors::TokenError;
use crate::domain::user::errors::UserError;

/// Abstract status class every flow error maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    BadRequest,
    Unauthorized,
    NotFound,
    ServerError,
}

/// Identity field that collided at sign-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityField {
    Username,
    Email,
}

impl fmt::Display for IdentityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityField::Username => f.write_str("username"),
            IdentityField::Email => f.write_str("email"),
        }
    }
}

/// Error for notification delivery
#[derive(Debug, Clone, Error)]
pub enum NotifierError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Failed to build message: {0}")]
    MessageBuild(String),

    #[error("Failed to deliver message: {0}")]
    DeliveryFailed(String),
}

/// Errors of the authentication flows.
///
/// Display strings are the messages shown to callers. Variants that carry
/// internal detail keep it out of the message.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("Existing {0}")]
    DuplicateIdentity(IdentityField),

    #[error("Invalid details")]
    InvalidCredentials,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("No account with this email")]
    NoExistingEmail,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Invalid code")]
    InvalidCode,

    #[error("Expired code")]
    ExpiredCode,

    #[error("Cannot create confirmation code")]
    TokenCreation,

    #[error("Encountered an error")]
    Signing(String),

    #[error("Encountered an error")]
    Hashing(String),

    #[error("Encountered an error")]
    StoreUnavailable(String),

    #[error("cannot send emails at the moment")]
    NotificationFailure(String),
}

impl AuthError {
    pub fn class(&self) -> ErrorClass {
        match self {
            AuthError::Validation(_)
            | AuthError::InvalidRefreshToken
            | AuthError::InvalidCode
            | AuthError::ExpiredCode
            | AuthError::DuplicateIdentity(_) => ErrorClass::BadRequest,
            AuthError::InvalidCredentials => ErrorClass::Unauthorized,
            AuthError::NoExistingEmail | AuthError::NotFound(_) => ErrorClass::NotFound,
            AuthError::TokenCreation
            | AuthError::Signing(_)
            | AuthError::Hashing(_)
            | AuthError::StoreUnavailable(_)
            | AuthError::NotificationFailure(_) => ErrorClass::ServerError,
        }
    }
}

impl From<UserError> for AuthError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::UsernameAlreadyExists(_) => {
                AuthError::DuplicateIdentity(IdentityField::Username)
            }
            UserError::EmailAlreadyExists(_) => AuthError::DuplicateIdentity(IdentityField::Email),
            UserError::NotFound(_) => AuthError::NotFound("user"),
            UserError::InvalidUserId(_)
            | UserError::InvalidUsername(_)
            | UserError::InvalidEmail(_)
            | UserError::InvalidRole(_) => AuthError::StoreUnavailable(err.to_string()),
            UserError::StoreUnavailable(detail) => AuthError::StoreUnavailable(detail),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::DuplicateValue => AuthError::TokenCreation,
            TokenError::NotFound => AuthError::InvalidCode,
            TokenError::Signing(detail) => AuthError::Signing(detail),
            TokenError::InvalidKind(_) => AuthError::StoreUnavailable(err.to_string()),
            TokenError::StoreUnavailable(detail) => AuthError::StoreUnavailable(detail),
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        AuthError::Hashing(err.to_string())
    }
}
