//! Domain Errors
//!
//! Error types for relay operations.

use thiserror::Error;

/// Relay layer errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RelayError {
    #[error("Transient fetch failure: {0}")]
    TransientFetch(String),

    #[error("Malformed interaction id: {0}")]
    MalformedId(String),

    #[error("Capacity rejected: {0}")]
    CapacityRejected(String),

    #[error("Dispatched task failed: {0}")]
    QueueTask(String),

    #[error("Dispatch queue is full ({capacity} pending tasks)")]
    QueueFull { capacity: usize },

    #[error("Dispatch queue is closed")]
    QueueClosed,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Platform unavailable: {0}")]
    Unavailable(String),

    #[error("External service error: {0}")]
    ExternalService(String),
}

impl RelayError {
    pub fn not_found<T: AsRef<str>>(entity_type: T, id: &str) -> Self {
        Self::NotFound {
            entity_type: entity_type.as_ref().to_string(),
            id: id.to_string(),
        }
    }

    /// Whether the caller may retry the same operation later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::TransientFetch(_)
                | Self::QueueFull { .. }
                | Self::ExternalService(_)
                | Self::Unavailable(_)
        )
    }
}
