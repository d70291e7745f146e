use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::reset_password::optional_email;
use super::ApiError;
use super::ApiSuccess;
use super::MessageData;
use super::UserData;
use crate::domain::authentication::models::ConfirmEmailCommand;
use crate::domain::user::models::EmailAddress;
use crate::inbound::http::router::AppState;

pub async fn request_email_verification(
    State(state): State<AppState>,
    Query(query): Query<EmailVerificationQuery>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    let email = query
        .email
        .filter(|email| !email.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Email is required".to_string()))?;
    let email = EmailAddress::new(email).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    state
        .auth_service
        .resend_verify_email(&email)
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        MessageData::new(format!("Verification code sent to email {}", email)),
    ))
}

pub async fn confirm_email_verification(
    State(state): State<AppState>,
    Json(body): Json<ConfirmEmailRequest>,
) -> Result<ApiSuccess<UserData>, ApiError> {
    let command = ConfirmEmailCommand {
        email: optional_email(body.email)?,
        code: body.code,
    };

    state
        .auth_service
        .confirm_email(command)
        .await
        .map_err(ApiError::from)
        .map(|ref user| ApiSuccess::new(StatusCode::OK, user.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EmailVerificationQuery {
    email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConfirmEmailRequest {
    #[serde(default)]
    email: Option<String>,
    code: String,
}
