use thiserror::Error;

#[derive(Error, Debug)]
pub enum EndpointError {
    #[error("Connection failed for {uri}: {message}")]
    Connection { uri: String, message: String },

    #[error("HTTP {status} for {uri}: {message}")]
    Status {
        uri: String,
        status: u16,
        message: String,
    },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unsupported content type: {0:?}")]
    UnsupportedContentType(String),

    #[error("Unsupported endpoint format: {0}")]
    UnsupportedEndpoint(String),

    #[error("Invalid endpoint configuration: {0}")]
    Configuration(String),

    #[error("Endpoint does not support {operation}: {endpoint}")]
    UnsupportedOperation {
        endpoint: String,
        operation: &'static str,
    },

    #[error("Invalid URI: {0}")]
    InvalidUri(#[from] url::ParseError),

    #[error("JSON encoding/decoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML encoding/decoding error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EndpointError {
    /// Connection failures and gateway errors (502, 504) are transient;
    /// everything else is a protocol or configuration failure.
    pub fn is_retryable(&self) -> bool {
        match self {
            EndpointError::Connection { .. } => true,
            EndpointError::Status { status, .. } => matches!(*status, 502 | 504),
            _ => false,
        }
    }

    /// Classify a transport error raised while talking to `uri`.
    ///
    /// Only refused or unreachable connections are retried. A timed out
    /// request may already have been applied by the server.
    pub fn from_transport(uri: &str, error: reqwest::Error) -> Self {
        if error.is_connect() {
            EndpointError::Connection {
                uri: uri.to_string(),
                message: error.to_string(),
            }
        } else {
            EndpointError::Http(error)
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            EndpointError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, EndpointError>;
