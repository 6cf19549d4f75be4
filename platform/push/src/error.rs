use thiserror::Error;

pub type PushResult<T> = Result<T, PushError>;

#[derive(Debug, Error)]
pub enum PushError {
    #[error("connection failed to {url}: {reason}")]
    Connect { url: String, reason: String },
    /// The broker answered with an ERROR frame.
    #[error("broker error: {0}")]
    Protocol(String),
    #[error("malformed frame: {0}")]
    Frame(String),
    #[error("connection closed before {0}")]
    Closed(&'static str),
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

impl PushError {
    pub fn connect(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Connect {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}
