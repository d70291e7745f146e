use async_trait::async_trait;

use crate::domain::health::errors::HealthError;

/// Readiness probe of the backing store.
#[async_trait]
pub trait HealthCheck: Send + Sync + 'static {
    /// Round-trip to the store once.
    async fn check(&self) -> Result<(), HealthError>;
}
