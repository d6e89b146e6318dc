use thiserror::Error;

/// Why a weather lookup failed.
///
/// Every non-2xx status collapses into `NotFound`, including auth and rate-limit
/// rejections; the real status is only visible in the logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("City not found")]
    NotFound,

    /// Network failure, unreadable body or malformed JSON.
    #[error("{0}")]
    Transport(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Transport(err.to_string())
    }
}
