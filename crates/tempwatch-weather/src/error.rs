//! Live lookup error types.

use tempwatch_climate::AnalysisError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("City not found: {0}")]
    CityNotFound(String),

    #[error("Upstream error: {status} - {body}")]
    Upstream { status: u16, body: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(e.without_url())
        }
    }
}

impl FetchError {
    /// User-friendly error message for display.
    pub fn user_message(&self) -> String {
        match self {
            Self::CityNotFound(city) => {
                format!("City '{}' was not found. Check the spelling.", city)
            }
            Self::Upstream { status, body } => format!("Weather service error {}: {}", status, body),
            Self::Timeout => "The weather service did not answer in time.".to_string(),
            Self::Network(_) => "Network error. Check your connection.".to_string(),
            Self::InvalidResponse(_) => "The weather service sent an unexpected response.".to_string(),
        }
    }

    /// Only timeouts are retried; upstream answers are surfaced as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

/// Failure of one city's live comparison.
#[derive(Error, Debug)]
pub enum LiveError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

impl LiveError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Fetch(e) => e.user_message(),
            Self::Analysis(e) => e.user_message(),
        }
    }
}
