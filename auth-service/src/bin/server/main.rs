use std::sync::Arc;

use auth::Argon2Hasher;
use auth::Clock;
use auth::ConfirmationCodeGenerator;
use auth::SystemClock;
use auth::TokenCodec;
use auth_service::config::Config;
use auth_service::domain::access::gate::AccessGate;
use auth_service::domain::authentication::service::AuthService;
use auth_service::domain::token::reaper::ExpiryReaper;
use auth_service::domain::token::service::TokenEngine;
use auth_service::domain::user::service::UserService;
use auth_service::inbound::http::router::create_router;
use auth_service::outbound::notifier::SmtpNotifier;
use auth_service::outbound::repositories::PostgresHealthCheck;
use auth_service::outbound::repositories::PostgresTokenRepository;
use auth_service::outbound::repositories::PostgresUserRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "auth_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "auth-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        refresh_policy = ?config.jwt.refresh_policy,
        code_length = config.confirmation.code_length,
        reaper_interval_secs = config.reaper.interval_secs,
        smtp_enabled = !config.mail.smtp_host.is_empty(),
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = config.database.max_connections,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let statement_timeout = config.database.statement_timeout();
    let user_repository = Arc::new(PostgresUserRepository::new(
        pg_pool.clone(),
        statement_timeout,
    ));
    let health_check = Arc::new(PostgresHealthCheck::new(
        pg_pool.clone(),
        statement_timeout,
    ));
    let token_repository = Arc::new(PostgresTokenRepository::new(pg_pool, statement_timeout));

    let codec = Arc::new(TokenCodec::new(
        config.jwt.access_secret.as_bytes(),
        config.jwt.refresh_secret.as_bytes(),
        Arc::clone(&clock),
    ));
    let engine = Arc::new(TokenEngine::new(
        Arc::clone(&token_repository),
        Arc::clone(&codec),
        ConfirmationCodeGenerator::from_entropy(),
        Arc::clone(&clock),
    ));
    let notifier = Arc::new(SmtpNotifier::new(&config.mail)?);

    let auth_service = Arc::new(AuthService::new(
        Arc::clone(&user_repository),
        engine,
        notifier,
        Arc::new(Argon2Hasher::new()),
        Arc::clone(&clock),
        config.auth_settings(),
    ));
    let user_service = Arc::new(UserService::new(user_repository, Arc::clone(&clock)));
    let gate = Arc::new(AccessGate::new(codec));

    let reaper =
        Arc::new(ExpiryReaper::new(token_repository, clock)).start(config.reaper.interval());

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(auth_service, user_service, gate, health_check);
    let served = axum::serve(http_listener, http_application)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    reaper.stop().await;

    match served {
        Ok(()) => tracing::info!("Server exited successfully"),
        Err(ref e) => tracing::error!(error = %e, "Server error"),
    };

    served.map_err(anyhow::Error::from)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
