use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::claims::ExpiringClaims;
use super::errors::JwtError;

/// JWT token handler for encoding and decoding tokens.
///
/// Generic over the claims type to allow services to define their own token payload.
/// Uses HS256 (HMAC with SHA-256) and refuses tokens whose header names any other algorithm.
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
}

impl JwtHandler {
    /// Create a new JWT handler with a secret key.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens (should be stored securely)
    ///
    /// # Security Notes
    /// - The secret should be at least 256 bits (32 bytes) for HS256
    /// - Store secrets in environment variables or secure vaults, never in code
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
        }
    }

    /// Encode claims into a JWT token.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        let header = Header::new(self.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Decode and validate a JWT token.
    ///
    /// Expiry is judged against `current_timestamp` rather than the system
    /// clock, so callers control time.
    ///
    /// # Arguments
    /// * `token` - JWT token string to decode
    /// * `current_timestamp` - Unix timestamp considered "now"
    ///
    /// # Errors
    /// * `TokenExpired` - `exp` lies before `current_timestamp`
    /// * `InvalidToken` - Signature, algorithm, or structure is invalid
    pub fn decode<T>(&self, token: &str, current_timestamp: i64) -> Result<T, JwtError>
    where
        T: DeserializeOwned + ExpiringClaims,
    {
        let mut validation = Validation::new(self.algorithm);
        // `exp` must be present; its value is checked below.
        validation.validate_exp = false;

        let token_data =
            decode::<T>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                ErrorKind::InvalidAlgorithm => {
                    JwtError::InvalidToken("unexpected signing algorithm".to_string())
                }
                _ => JwtError::InvalidToken(e.to_string()),
            })?;

        if token_data.claims.is_expired(current_timestamp) {
            return Err(JwtError::TokenExpired);
        }

        Ok(token_data.claims)
    }
}
