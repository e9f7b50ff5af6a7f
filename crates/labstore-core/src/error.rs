//! Error types for labstore-core.

use thiserror::Error;

use crate::models::StoreEvent;

/// Boxed error returned by event listeners.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid argument to {operation}: {message}")]
    InvalidArgument {
        operation: &'static str,
        message: String,
    },

    #[error("Unsupported format {0}")]
    UnsupportedFormat(String),

    #[error("listener for '{event}' failed: {source}")]
    Listener {
        event: StoreEvent,
        #[source]
        source: ListenerError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn invalid(operation: &'static str, message: impl Into<String>) -> Self {
        StoreError::InvalidArgument {
            operation,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
