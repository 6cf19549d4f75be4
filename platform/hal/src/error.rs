use reqwest::StatusCode;
use thiserror::Error;

use crate::client::Response;

/// Shared result type for hypermedia operations.
pub type HalResult<T> = Result<T, HalError>;

#[derive(Debug, Error)]
pub enum HalError {
    /// The server answered with a 4xx/5xx status. The response is kept so
    /// callers can inspect it.
    #[error("{method} {url} failed with status {status}")]
    Status {
        method: reqwest::Method,
        url: String,
        status: StatusCode,
        response: Box<Response>,
    },
    #[error("relation `{rel}` not found in links of {resource}")]
    MissingRelation { rel: String, resource: String },
    #[error("embedded collection `{0}` missing from response")]
    MissingEmbedded(String),
    #[error("invalid uri {uri}: {source}")]
    InvalidUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid header value for {0}")]
    InvalidHeader(&'static str),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid schema: {0}")]
    Schema(String),
}

impl HalError {
    pub fn missing_relation(rel: impl Into<String>, resource: impl Into<String>) -> Self {
        Self::MissingRelation {
            rel: rel.into(),
            resource: resource.into(),
        }
    }

    /// HTTP status carried by the error, if the server produced one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HalError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
