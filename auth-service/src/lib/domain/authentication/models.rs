use serde::Deserialize;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::Username;

/// Command to register a new account.
#[derive(Debug)]
pub struct SignUpCommand {
    pub username: Username,
    pub email: EmailAddress,
    pub password: String,
}

impl SignUpCommand {
    pub fn new(username: Username, email: EmailAddress, password: String) -> Self {
        Self {
            username,
            email,
            password,
        }
    }
}

/// Command to sign in with a username or an email.
#[derive(Debug)]
pub struct SignInCommand {
    pub login: String,
    pub password: String,
}

/// Command to replace a password with a reset code.
///
/// When `email` is present it must belong to the code's owner.
#[derive(Debug)]
pub struct ResetPasswordCommand {
    pub email: Option<EmailAddress>,
    pub code: String,
    pub new_password: String,
}

/// Command to confirm an email address with a verification code.
#[derive(Debug)]
pub struct ConfirmEmailCommand {
    pub email: Option<EmailAddress>,
    pub code: String,
}

/// What happens to a presented refresh token once it has been exchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshPolicy {
    /// The presented token is deleted; a second exchange fails.
    #[default]
    Rotate,
    /// The presented token stays valid until it expires.
    Reuse,
}

/// Tunables of the authentication flows.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub access_expiry_hours: u32,
    pub refresh_expiry_hours: u32,
    pub code_length: usize,
    pub code_expiry_hours: u32,
    pub mail_from: String,
    pub refresh_policy: RefreshPolicy,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            access_expiry_hours: 1,
            refresh_expiry_hours: 72,
            code_length: 6,
            code_expiry_hours: 1,
            mail_from: "no-reply@localhost".to_string(),
            refresh_policy: RefreshPolicy::Rotate,
        }
    }
}
