use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::CaptureStage;

/// Failure to turn one intercepted exchange into a search payload.
///
/// Always recoverable at the pipeline level: the exchange is logged and
/// skipped.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unsupported content encoding \"{0}\"")]
    UnsupportedEncoding(String),

    #[error("failed to decompress {encoding} body: {source}")]
    Decompress {
        encoding: String,
        #[source]
        source: std::io::Error,
    },

    #[error("response body is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("JSON deserialization error for search payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected HTTP status {0} on search response")]
    UnexpectedStatus(u16),
}

/// Error reported by a browser automation collaborator.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct AutomationError(pub String);

impl AutomationError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no unique merchant records were captured; refusing to write empty output")]
    EmptyResult,

    #[error("no delivery location configured")]
    MissingLocation,

    #[error("browser automation failed during {stage}: {source}")]
    Automation {
        stage: CaptureStage,
        #[source]
        source: AutomationError,
    },

    #[error("timed out after {timeout_secs}s during {stage} waiting for {condition}")]
    NotReady {
        stage: CaptureStage,
        condition: String,
        timeout_secs: u64,
    },

    #[error("I/O error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid session recording: {reason}")]
    InvalidRecording { reason: String },

    #[error("capture task did not complete: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl CaptureError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
