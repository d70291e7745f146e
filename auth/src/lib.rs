//! Credential primitives library
//!
//! Provides reusable building blocks for issuing and checking credentials:
//! - Password hashing (Argon2id)
//! - Signed access/refresh tokens (HS256 JWT) with clock-driven expiry
//! - Random confirmation codes for out-of-band delivery
//! - An injectable clock
//!
//! Services define their own domain types and adapt these implementations.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::Argon2Hasher;
//!
//! let hasher = Argon2Hasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash).unwrap());
//! ```
//!
//! ## Signed Tokens
//! ```
//! use std::sync::Arc;
//!
//! use auth::SystemClock;
//! use auth::TokenCodec;
//!
//! let codec = TokenCodec::new(
//!     b"access_secret_at_least_32_bytes_long!",
//!     b"refresh_secret_at_least_32_bytes_long",
//!     Arc::new(SystemClock),
//! );
//!
//! let access = codec.issue_access("user123", "alice", "user", 1).unwrap();
//! let claims = codec.verify_access(&access.value).unwrap();
//! assert_eq!(claims.id, "user123");
//! ```
//!
//! ## Confirmation Codes
//! ```
//! use auth::ConfirmationCodeGenerator;
//!
//! let generator = ConfirmationCodeGenerator::seeded(1);
//! let code = generator.generate(6);
//! assert_eq!(code.len(), 6);
//! ```

pub mod clock;
pub mod code;
pub mod codec;
pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use clock::Clock;
pub use clock::ManualClock;
pub use clock::SystemClock;
pub use code::ConfirmationCodeGenerator;
pub use codec::SignedToken;
pub use codec::TokenCodec;
pub use jwt::AccessClaims;
pub use jwt::JwtError;
pub use jwt::RefreshClaims;
pub use password::Argon2Hasher;
pub use password::PasswordError;
