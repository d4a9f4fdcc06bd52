//! Error types for the sync engine library

use resync_core::EndpointError;

/// Result type alias for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Comprehensive error type for sync operations
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Invalid options or endpoint combinations, detected before any I/O
    #[error("Configuration error: {0}")]
    Config(String),

    /// A document could not be interpreted as a resource
    #[error("Schema error: {message}")]
    Schema { message: String },

    /// Reading from an origin failed after exhausting retries
    #[error("Read failed for '{uri}': {source}")]
    Read {
        uri: String,
        #[source]
        source: EndpointError,
    },

    /// Writing to the destination failed after exhausting retries
    #[error("Write failed for '{uri}': {source}")]
    Write {
        uri: String,
        #[source]
        source: EndpointError,
    },

    /// The parent graph contains a cycle
    #[error("Found cycle at {uri}")]
    Cycle { uri: String },

    /// Endpoint errors outside of a read or write
    #[error("Endpoint error: {0}")]
    Endpoint(#[from] EndpointError),

    /// Progress reporting errors
    #[error("Progress reporting error: {0}")]
    Progress(String),

    /// Cancellation error
    #[error("Operation was cancelled")]
    Cancelled,
}

impl SyncError {
    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a new schema error
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    /// Create a new read error
    pub fn read(uri: impl Into<String>, source: EndpointError) -> Self {
        Self::Read {
            uri: uri.into(),
            source,
        }
    }

    /// Create a new write error
    pub fn write(uri: impl Into<String>, source: EndpointError) -> Self {
        Self::Write {
            uri: uri.into(),
            source,
        }
    }
}
