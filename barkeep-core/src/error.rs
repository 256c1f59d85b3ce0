//! Error types shared across the Barkeep crates

use thiserror::Error;

/// Stack-wide error type
#[derive(Error, Debug)]
pub enum BarkeepError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BarkeepError {
    pub fn api(msg: impl Into<String>) -> Self {
        BarkeepError::Api(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        BarkeepError::Network(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        BarkeepError::Auth(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        BarkeepError::Parse(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        BarkeepError::Protocol(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        BarkeepError::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        BarkeepError::Internal(msg.into())
    }
}

/// Result type alias for Barkeep operations
pub type BarkeepResult<T> = Result<T, BarkeepError>;
