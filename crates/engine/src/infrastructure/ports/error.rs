//! Error types for port operations.

/// Room/client store errors with context for debugging.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// The call did not finish within the store timeout.
    #[error("Store operation {operation} timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    /// The backing store could not serve the call.
    #[error("Store unavailable in {operation}: {message}")]
    Unavailable {
        operation: &'static str,
        message: String,
    },

    /// A stored record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Entity not found - includes entity type and ID for actionable error messages.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
}

impl StoreError {
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    pub fn unavailable(operation: &'static str, message: impl ToString) -> Self {
        Self::Unavailable {
            operation,
            message: message.to_string(),
        }
    }

    pub fn serialization(message: impl ToString) -> Self {
        Self::Serialization(message.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Fan-out bus errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BusError {
    #[error("Publish to {channel} failed: {message}")]
    Publish { channel: String, message: String },
    #[error("Subscribe to {channel} failed: {message}")]
    Subscribe { channel: String, message: String },
    #[error("Serialization error: {0}")]
    Serialization(String),
}
