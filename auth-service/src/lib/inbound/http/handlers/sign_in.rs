use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::TokenPairData;
use crate::domain::authentication::models::SignInCommand;
use crate::inbound::http::router::AppState;

pub async fn sign_in(
    State(state): State<AppState>,
    Json(body): Json<SignInRequest>,
) -> Result<ApiSuccess<TokenPairData>, ApiError> {
    let command = body.try_into_command()?;

    state
        .auth_service
        .sign_in(command)
        .await
        .map_err(ApiError::from)
        .map(|pair| ApiSuccess::new(StatusCode::OK, pair.into()))
}

pub async fn sign_in_admin(
    State(state): State<AppState>,
    Json(body): Json<SignInRequest>,
) -> Result<ApiSuccess<TokenPairData>, ApiError> {
    let command = body.try_into_command()?;

    state
        .auth_service
        .sign_in_admin(command)
        .await
        .map_err(ApiError::from)
        .map(|pair| ApiSuccess::new(StatusCode::OK, pair.into()))
}

/// Credentials; `login` may hold a username or an email.
///
/// `username` and `email` are accepted as alternatives to `login`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SignInRequest {
    #[serde(default)]
    login: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    email: Option<String>,
    password: String,
}

impl SignInRequest {
    fn try_into_command(self) -> Result<SignInCommand, ApiError> {
        let login = [self.login, self.username, self.email]
            .into_iter()
            .flatten()
            .find(|value| !value.trim().is_empty())
            .ok_or_else(|| ApiError::BadRequest("login is required".to_string()))?;

        Ok(SignInCommand {
            login,
            password: self.password,
        })
    }
}
