use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempwatch_climate::{AnomalyVerdict, Season};

/// Resolved position of a city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    /// Name as spelled by the geocoder, when provided
    pub name: Option<String>,
    pub country: Option<String>,
}

/// Current conditions at a position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    /// Degrees Celsius
    pub temperature: f64,
    pub observed_at: DateTime<Utc>,
}

/// A freshly fetched temperature for one city
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveReading {
    pub city: String,
    pub temperature: f64,
    pub season: Season,
    pub fetched_at: DateTime<Utc>,
}

/// A live reading together with its verdict against the historical baseline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveOutcome {
    pub reading: LiveReading,
    pub verdict: AnomalyVerdict,
}

// OpenWeatherMap wire formats

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeCandidate {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl From<GeocodeCandidate> for Coordinates {
    fn from(c: GeocodeCandidate) -> Self {
        Self {
            latitude: c.lat,
            longitude: c.lon,
            name: c.name,
            country: c.country,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WeatherResponse {
    pub main: WeatherMain,
    /// Observation time, Unix seconds UTC
    pub dt: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WeatherMain {
    pub temp: f64,
}
