use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HealthError {
    #[error("Store unreachable: {0}")]
    StoreUnreachable(String),
}
