//! Outbound HTTP to the OCR and product-lookup services.

pub mod circuit_breaker;
pub mod client;
pub mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use client::{ClientOptions, Upload, UpstreamClient};
pub use retry::{retry_with_policy, RetryPolicy, Retryable};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("{0} circuit breaker is open")]
    CircuitOpen(&'static str),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid upstream response: {0}")]
    Decode(String),
    #[error("client configuration error: {0}")]
    Config(String),
}

impl UpstreamError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, UpstreamError::Status { status: 404, .. })
    }

    fn counts_against_upstream(&self) -> bool {
        match self {
            UpstreamError::Transport(_) | UpstreamError::Decode(_) => true,
            UpstreamError::Status { status, .. } => *status >= 500,
            UpstreamError::CircuitOpen(_) | UpstreamError::Config(_) => false,
        }
    }
}

impl Retryable for UpstreamError {
    fn is_retryable(&self) -> bool {
        match self {
            UpstreamError::Transport(_) => true,
            UpstreamError::Status { status, .. } => matches!(status, 502..=504),
            _ => false,
        }
    }
}
