use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("File not found (404): {0}")]
    NotFound(String),
    #[error("Server error (5xx): {0}")]
    ServerError(String),
    #[error("Unexpected HTTP status {status} for {url}")]
    UnexpectedStatus { status: u16, url: String },
    #[error("Failed to store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// True when the server answered but had nothing to give us
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            FetchError::NotFound(_) | FetchError::ServerError(_) | FetchError::UnexpectedStatus { .. }
        )
    }
}
