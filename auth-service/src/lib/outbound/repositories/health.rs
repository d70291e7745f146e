use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;

use super::within;
use crate::domain::health::errors::HealthError;
use crate::domain::health::ports::HealthCheck;

pub struct PostgresHealthCheck {
    pool: PgPool,
    timeout: Duration,
}

impl PostgresHealthCheck {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl HealthCheck for PostgresHealthCheck {
    async fn check(&self) -> Result<(), HealthError> {
        within(self.timeout, sqlx::query("SELECT 1").execute(&self.pool))
            .await
            .map(|_| ())
            .map_err(|e| HealthError::StoreUnreachable(e.to_string()))
    }
}
