//! CSV ingestion of historical temperature observations.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DatasetError;
use crate::season::{season_of, Season};

const REQUIRED_COLUMNS: [&str; 3] = ["city", "timestamp", "temperature"];

const NAIVE_DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// One temperature reading for one city, labelled with its season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub city: String,
    pub timestamp: DateTime<Utc>,
    /// Degrees Celsius
    pub temperature: f64,
    pub season: Season,
}

impl Observation {
    pub fn new(city: impl Into<String>, timestamp: DateTime<Utc>, temperature: f64) -> Self {
        Self {
            city: city.into(),
            timestamp,
            temperature,
            season: season_of(timestamp),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRow {
    city: String,
    timestamp: String,
    temperature: String,
}

/// Immutable snapshot of the loaded observations.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    observations: Vec<Observation>,
    skipped_rows: usize,
}

impl Dataset {
    /// Load a CSV file with `city`, `timestamp` and `temperature` columns.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        tracing::debug!("Reading dataset: {}", path.display());
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Parse CSV from any reader. Column order is free and extra columns are
    /// ignored. Rows with an empty temperature cell are skipped.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let headers = reader.headers()?.clone();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(DatasetError::MissingColumn(column));
            }
        }

        let mut observations = Vec::new();
        let mut skipped_rows = 0;

        for record in reader.records() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            let row: RawRow = record.deserialize(Some(&headers))?;

            match parse_row(row) {
                Ok(Some(observation)) => observations.push(observation),
                Ok(None) => {
                    tracing::debug!("Skipping line {}: missing temperature", line);
                    skipped_rows += 1;
                }
                Err(reason) => return Err(DatasetError::InvalidRow { line, reason }),
            }
        }

        if observations.is_empty() {
            return Err(DatasetError::Empty);
        }

        tracing::info!(
            "Loaded {} observations ({} rows skipped)",
            observations.len(),
            skipped_rows
        );

        Ok(Self {
            observations,
            skipped_rows,
        })
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Rows dropped during load because the temperature was missing
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    /// Distinct cities in order of first appearance.
    pub fn cities(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.observations
            .iter()
            .filter(|o| seen.insert(o.city.as_str()))
            .map(|o| o.city.clone())
            .collect()
    }

    pub fn contains_city(&self, city: &str) -> bool {
        self.observations.iter().any(|o| o.city == city)
    }

    /// New snapshot holding only the given cities.
    pub fn select(&self, cities: &[String]) -> Dataset {
        Dataset {
            observations: self
                .observations
                .iter()
                .filter(|o| cities.contains(&o.city))
                .cloned()
                .collect(),
            skipped_rows: 0,
        }
    }

    pub fn city_observations<'a>(&'a self, city: &'a str) -> impl Iterator<Item = &'a Observation> {
        self.observations.iter().filter(move |o| o.city == city)
    }
}

fn parse_row(row: RawRow) -> Result<Option<Observation>, String> {
    if row.city.is_empty() {
        return Err("city is empty".to_string());
    }

    if row.temperature.is_empty() {
        return Ok(None);
    }

    let temperature: f64 = row
        .temperature
        .parse()
        .map_err(|_| format!("temperature '{}' is not a number", row.temperature))?;
    if !temperature.is_finite() {
        return Err(format!("temperature '{}' is not finite", row.temperature));
    }

    let timestamp = parse_timestamp(&row.timestamp)
        .ok_or_else(|| format!("timestamp '{}' is not a recognised date-time", row.timestamp))?;

    Ok(Some(Observation::new(row.city, timestamp, temperature)))
}

/// Parse a timestamp cell. Values without an offset are read as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
