//! Error types for port operations.

/// Storage operation errors with context for debugging.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// Backing storage failed - includes operation name for tracing.
    #[error("Storage error in {operation}: {message}")]
    Storage {
        operation: &'static str,
        message: String,
    },

    /// Serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RepoError {
    /// Create a Storage error with operation context.
    pub fn storage(operation: &'static str, message: impl ToString) -> Self {
        Self::Storage {
            operation,
            message: message.to_string(),
        }
    }

    /// Create a Serialization error.
    pub fn serialization(message: impl ToString) -> Self {
        Self::Serialization(message.to_string())
    }

    /// Check if this error means the stored record is unreadable.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::Serialization(_))
    }
}

/// The remote dataset could not be obtained.
///
/// Never masked: a failed fetch is reported to whoever asked for the dataset.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DatasetFetchError {
    #[error("Dataset request failed: {0}")]
    RequestFailed(String),
    #[error("Dataset source returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Malformed dataset response: {0}")]
    Malformed(String),
}

/// An origin image could not be retrieved. Single attempt, no retry.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ImageFetchError {
    #[error("Image request to {url} failed: {message}")]
    RequestFailed { url: String, message: String },
    #[error("Image request to {url} timed out")]
    Timeout { url: String },
    #[error("Image origin {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}
