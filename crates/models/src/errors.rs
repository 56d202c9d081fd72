use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("validation error: {0}")]
    Validation(String),
}

impl ModelError {
    pub fn invalid(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }
}
