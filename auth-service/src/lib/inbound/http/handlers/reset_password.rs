use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::MessageData;
use crate::domain::authentication::models::ResetPasswordCommand;
use crate::domain::user::models::EmailAddress;
use crate::inbound::http::router::AppState;

pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(body): Json<PasswordResetRequest>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    let email =
        EmailAddress::new(body.email).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    state
        .auth_service
        .forgot_password(&email)
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        MessageData::new(format!("Code sent to email {}", email)),
    ))
}

pub async fn confirm_password_reset(
    State(state): State<AppState>,
    Json(body): Json<ConfirmPasswordResetRequest>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    let command = body.try_into_command()?;

    state
        .auth_service
        .reset_password(command)
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::new(StatusCode::OK, MessageData::new("Success")))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PasswordResetRequest {
    email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConfirmPasswordResetRequest {
    #[serde(default)]
    email: Option<String>,
    code: String,
    new_password: String,
}

impl ConfirmPasswordResetRequest {
    fn try_into_command(self) -> Result<ResetPasswordCommand, ApiError> {
        let email = optional_email(self.email)?;

        if self.new_password.is_empty() {
            return Err(ApiError::BadRequest(
                "Password must not be empty".to_string(),
            ));
        }

        Ok(ResetPasswordCommand {
            email,
            code: self.code,
            new_password: self.new_password,
        })
    }
}

/// Parse an optional email, treating an empty string as absent.
pub(super) fn optional_email(email: Option<String>) -> Result<Option<EmailAddress>, ApiError> {
    email
        .filter(|email| !email.is_empty())
        .map(EmailAddress::new)
        .transpose()
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}
