//! Dataset and analysis error types.

use thiserror::Error;

use crate::season::Season;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),

    #[error("Invalid row at line {line}: {reason}")]
    InvalidRow { line: u64, reason: String },

    #[error("Dataset contains no observations")]
    Empty,
}

impl DatasetError {
    /// User-friendly error message for terminal display.
    pub fn user_message(&self) -> String {
        match self {
            Self::Io(_) => "Could not open the dataset file. Check the path.".to_string(),
            Self::Csv(_) => "The dataset is not valid CSV.".to_string(),
            Self::MissingColumn(col) => {
                format!("The dataset needs a '{}' column.", col)
            }
            Self::InvalidRow { line, reason } => format!("Line {}: {}", line, reason),
            Self::Empty => "The dataset has no temperature readings.".to_string(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("No historical data for {city} in {season}")]
    NoBaseline { city: String, season: Season },

    #[error("Not enough historical data for {city} in {season} ({count} observation(s), need at least 2)")]
    InsufficientData {
        city: String,
        season: Season,
        count: usize,
    },
}

impl AnalysisError {
    pub fn user_message(&self) -> String {
        match self {
            Self::NoBaseline { city, season } => format!(
                "The dataset has no {} readings for {}, so there is nothing to compare against.",
                season, city
            ),
            Self::InsufficientData { city, season, .. } => format!(
                "Too few {} readings for {} to tell what is normal.",
                season, city
            ),
        }
    }
}
