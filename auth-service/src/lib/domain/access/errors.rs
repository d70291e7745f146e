use thiserror::Error;

/// Reasons the authorization gate turns a request away.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum AccessError {
    #[error("Missing Authorization header")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Expired Token")]
    ExpiredToken,

    #[error("Action not allowed")]
    Forbidden,
}
