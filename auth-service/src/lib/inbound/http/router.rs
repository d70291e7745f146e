use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::patch;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::delete_user::delete_user;
use super::handlers::get_user::get_user;
use super::handlers::health::health;
use super::handlers::health::liveness;
use super::handlers::list_users::list_users;
use super::handlers::refresh_token::refresh_token;
use super::handlers::reset_password::confirm_password_reset;
use super::handlers::reset_password::request_password_reset;
use super::handlers::sign_in::sign_in;
use super::handlers::sign_in::sign_in_admin;
use super::handlers::sign_up::sign_up;
use super::handlers::update_user::update_user;
use super::handlers::verify_email::confirm_email_verification;
use super::handlers::verify_email::request_email_verification;
use super::middleware::require_permission;
use crate::domain::access::gate::AccessGate;
use crate::domain::access::models::GET_USER;
use crate::domain::access::models::LIST_USERS;
use crate::domain::access::models::REMOVE_USER;
use crate::domain::access::models::UPDATE_USER;
use crate::domain::authentication::ports::AuthServicePort;
use crate::domain::health::ports::HealthCheck;
use crate::domain::user::ports::UserServicePort;

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthServicePort>,
    pub user_service: Arc<dyn UserServicePort>,
    pub gate: Arc<AccessGate>,
    pub health: Arc<dyn HealthCheck>,
}

pub fn create_router(
    auth_service: Arc<dyn AuthServicePort>,
    user_service: Arc<dyn UserServicePort>,
    gate: Arc<AccessGate>,
    health_check: Arc<dyn HealthCheck>,
) -> Router {
    let state = AppState {
        auth_service,
        user_service,
        gate,
        health: health_check,
    };

    let public_routes = Router::new()
        .route("/", get(liveness))
        .route("/health", get(health))
        .route("/auth/user/signup", post(sign_up))
        .route("/auth/user/signin", post(sign_in))
        .route("/auth/admin/signin", post(sign_in_admin))
        .route("/auth/refresh", post(refresh_token))
        .route(
            "/auth/email-verify/request",
            post(request_email_verification),
        )
        .route(
            "/auth/email-verify/confirm",
            post(confirm_email_verification),
        )
        .route("/auth/reset-password/request", post(request_password_reset))
        .route("/auth/reset-password/confirm", post(confirm_password_reset));

    let protected_routes = Router::new()
        .route(
            "/users",
            get(list_users).route_layer(middleware::from_fn_with_state(
                (state.clone(), &LIST_USERS),
                require_permission,
            )),
        )
        .route(
            "/users/:user_id",
            get(get_user)
                .route_layer(middleware::from_fn_with_state(
                    (state.clone(), &GET_USER),
                    require_permission,
                ))
                .merge(patch(update_user).route_layer(middleware::from_fn_with_state(
                    (state.clone(), &UPDATE_USER),
                    require_permission,
                )))
                .merge(delete(delete_user).route_layer(middleware::from_fn_with_state(
                    (state.clone(), &REMOVE_USER),
                    require_permission,
                ))),
        );

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
