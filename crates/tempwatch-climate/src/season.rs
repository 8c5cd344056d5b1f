use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Meteorological season.
///
/// Ordering follows the calendar year starting in winter, which is the
/// order seasonal profiles are presented in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Winter, Season::Spring, Season::Summer, Season::Autumn];

    /// Season for a 1-based calendar month, `None` outside 1..=12.
    pub fn from_month(month: u32) -> Option<Self> {
        (1..=12)
            .contains(&month)
            .then(|| Self::from_calendar_month(month))
    }

    // Callers guarantee 1..=12.
    fn from_calendar_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => Self::Winter,
            3..=5 => Self::Spring,
            6..=8 => Self::Summer,
            _ => Self::Autumn,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Winter => "winter",
            Self::Spring => "spring",
            Self::Summer => "summer",
            Self::Autumn => "autumn",
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Season {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "winter" => Ok(Self::Winter),
            "spring" => Ok(Self::Spring),
            "summer" => Ok(Self::Summer),
            "autumn" | "fall" => Ok(Self::Autumn),
            other => Err(format!("unknown season: {}", other)),
        }
    }
}

/// Season a UTC instant falls in.
///
/// Both the dataset loader and the live fetcher label readings through this
/// function so historical and live readings are bucketed identically.
pub fn season_of(timestamp: DateTime<Utc>) -> Season {
    Season::from_calendar_month(timestamp.month())
}
