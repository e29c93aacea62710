//! Error types for swfs-client

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === Caller Errors ===
    #[error("Invalid file id: {0}")]
    InvalidFileId(String),

    #[error("Upload content already consumed")]
    ContentUnavailable,

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // === Cluster Errors ===
    #[error("File not found: no locations for volume {volume_id}")]
    FileNotFound { volume_id: String },

    #[error("Lookup failed: {0}")]
    LookupFailed(String),

    #[error("Assign failed: {0}")]
    AssignFailed(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("{endpoint} rejected request: {message}")]
    Rejected { endpoint: String, message: String },

    // === Protocol Errors ===
    #[error("{endpoint} result JSON decode error: {source}, body: {body}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
        body: String,
    },

    #[error("Size mismatch: declared {expected} bytes, server stored {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    // === Network Errors ===
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP {status} from {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    // === I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Is this a failure against a resolved server that may come from a stale location?
    ///
    /// Only these trigger the single cache-bypassing retry of a located operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Status { .. })
    }

    /// Build a decode error, keeping the raw body for diagnosis
    pub fn decode(endpoint: impl Into<String>, source: serde_json::Error, body: &[u8]) -> Self {
        Error::Decode {
            endpoint: endpoint.into(),
            source,
            body: String::from_utf8_lossy(body).into_owned(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Transport(e.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::InvalidConfig(e.to_string())
    }
}
