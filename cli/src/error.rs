#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("invalid tool: {0}")]
    InvalidTool(String),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("websocket error: {0}")]
    Ws(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("websocket closed")]
    WsClosed,
    #[error("frame codec failed: {0}")]
    Codec(#[from] frames::CodecError),
    #[error("timed out waiting for the relay")]
    Timeout,
    #[error("relay rejected {context}: {message}")]
    ServerError { context: String, message: String },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl From<tokio_tungstenite::tungstenite::Error> for CliError {
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Ws(Box::new(error))
    }
}

impl CliError {
    /// Whether the error means the socket is gone and a reconnect may help.
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::Ws(_) | Self::WsClosed | Self::Timeout)
    }
}
