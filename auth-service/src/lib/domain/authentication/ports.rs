use async_trait::async_trait;

use crate::domain::authentication::errors::AuthError;
use crate::domain::authentication::errors::NotifierError;
use crate::domain::authentication::models::ConfirmEmailCommand;
use crate::domain::authentication::models::ResetPasswordCommand;
use crate::domain::authentication::models::SignInCommand;
use crate::domain::authentication::models::SignUpCommand;
use crate::domain::token::models::TokenPair;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::User;

/// Port for the authentication flows.
///
/// Every flow is stateless between calls; progress lives in stored tokens
/// and users only.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register a new account with role `user`.
    ///
    /// # Errors
    /// * `DuplicateIdentity` - Username or email is taken
    /// * `Hashing` - Password could not be hashed
    /// * `StoreUnavailable` - Store operation failed
    async fn sign_up(&self, command: SignUpCommand) -> Result<User, AuthError>;

    /// Exchange credentials for a token pair.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown account or wrong password
    async fn sign_in(&self, command: SignInCommand) -> Result<TokenPair, AuthError>;

    /// Same as [`AuthServicePort::sign_in`], restricted to admins.
    async fn sign_in_admin(&self, command: SignInCommand) -> Result<TokenPair, AuthError>;

    /// Exchange a stored refresh token for a new pair.
    ///
    /// # Errors
    /// * `InvalidRefreshToken` - Token unknown, expired, forged or already rotated
    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;

    /// Send a password reset code.
    ///
    /// # Errors
    /// * `NoExistingEmail` - No account has this email
    /// * `TokenCreation` - Code collided with a live token
    /// * `NotificationFailure` - Code was stored but could not be delivered
    async fn forgot_password(&self, email: &EmailAddress) -> Result<(), AuthError>;

    /// Replace a password using a reset code.
    ///
    /// # Errors
    /// * `InvalidCode` - Unknown code, wrong kind or wrong owner
    /// * `ExpiredCode` - Code is past its expiry
    async fn reset_password(&self, command: ResetPasswordCommand) -> Result<(), AuthError>;

    /// Send an email verification code.
    async fn resend_verify_email(&self, email: &EmailAddress) -> Result<(), AuthError>;

    /// Mark an email as verified using a verification code.
    async fn confirm_email(&self, command: ConfirmEmailCommand) -> Result<User, AuthError>;
}

/// One-way password digests.
pub trait PasswordHasher: Send + Sync + 'static {
    fn hash(&self, password: &str) -> Result<String, auth::PasswordError>;

    fn verify(&self, password: &str, hash: &str) -> Result<bool, auth::PasswordError>;
}

/// Out-of-band message delivery.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn send(&self, from: &str, to: &str, subject: &str, body: &str)
        -> Result<(), NotifierError>;
}
