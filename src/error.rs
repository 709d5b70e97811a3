#[derive(Debug, thiserror::Error)]
pub enum WeekpulseError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server responded with {0}")]
    Status(u16),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("A refresh is already in progress")]
    RefreshInProgress,
}

impl WeekpulseError {
    /// Whether the failure came from the data source and a manual retry may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WeekpulseError::Http(_) | WeekpulseError::Status(_))
    }
}

pub type Result<T> = std::result::Result<T, WeekpulseError>;
