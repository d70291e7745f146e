use axum::extract::Request;
use axum::extract::State;
use axum::http::{self};
use axum::middleware::Next;
use axum::response::Response;

use crate::domain::access::errors::AccessError;
use crate::domain::access::models::Permission;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;

/// Middleware that verifies the bearer token against one operation's
/// permission and stores the caller's `Identity` in request extensions.
pub async fn require_permission(
    State((state, permission)): State<(AppState, &'static Permission)>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = {
        let token = extract_bearer_token(&req)?;
        state.gate.authorize(token, permission).map_err(|e| {
            tracing::warn!(operation = permission.operation, error = %e, "Access denied");
            e
        })?
    };

    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

fn extract_bearer_token(req: &Request) -> Result<&str, AccessError> {
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .ok_or(AccessError::MissingToken)?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AccessError::InvalidToken)?;

    auth_str
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AccessError::InvalidToken)
}
