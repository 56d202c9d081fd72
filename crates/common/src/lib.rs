use thiserror::Error;

pub mod types;
pub mod utils;
pub mod env;
pub mod metrics;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("metrics encode error: {0}")]
    Metrics(String),
    #[error("environment error: {0}")]
    Env(String),
}
