//! Error taxonomy shared by every handler.

use parcel_tracking_core::contract::ValidationError;
use thiserror::Error;

/// A store, queue, or topic call that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{service} {operation} failed: {message}")]
pub struct DependencyError {
    pub service: &'static str,
    pub operation: &'static str,
    pub message: String,
}

impl DependencyError {
    pub fn new(service: &'static str, operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            service,
            operation,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum HandlerError {
    /// Missing or malformed request fields.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    NotFound(String),

    #[error("method {method} is not supported")]
    MethodNotSupported {
        method: String,
        allowed: &'static [&'static str],
    },

    /// Primary store/queue/topic operation failed.
    #[error(transparent)]
    Dependency(#[from] DependencyError),

    #[error("{0}")]
    Internal(String),
}

impl HandlerError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(ValidationError::new(message))
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::MethodNotSupported { .. } => 405,
            Self::Dependency(_) | Self::Internal(_) => 500,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Env(#[from] envy::Error),

    #[error("{0} must be configured")]
    Missing(&'static str),
}
