use thiserror::Error;
use upstream::UpstreamError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("upstream error: {0}")]
    Upstream(String),
    #[error("service unavailable: {0}")]
    Unavailable(String),
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    pub fn invalid(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }
}

impl From<UpstreamError> for ServiceError {
    fn from(e: UpstreamError) -> Self {
        match e {
            UpstreamError::CircuitOpen(_) => ServiceError::Unavailable(e.to_string()),
            other => ServiceError::Upstream(other.to_string()),
        }
    }
}
