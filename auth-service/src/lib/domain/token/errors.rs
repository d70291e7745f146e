use thiserror::Error;

/// Error for TokenKind parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenKindError {
    #[error("Unknown token kind: {0}")]
    Unknown(String),
}

/// Errors raised by the token store and issuance engine.
///
/// Token values never appear in messages.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token value already exists")]
    DuplicateValue,

    #[error("Token not found")]
    NotFound,

    #[error("Invalid token kind: {0}")]
    InvalidKind(#[from] TokenKindError),

    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error("Token store unavailable: {0}")]
    StoreUnavailable(String),
}
