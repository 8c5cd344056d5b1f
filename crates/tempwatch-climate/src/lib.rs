//! Historical temperature analysis for Tempwatch.
//!
//! Loads per-city observations, labels them with meteorological seasons and
//! derives the per-city-per-season baselines used to judge whether a
//! temperature is normal.

pub mod baseline;
pub mod dataset;
pub mod describe;
pub mod error;
pub mod season;

pub use baseline::{
    classify, compute_baselines, flag_anomalies, AnomalyVerdict, Baselines, FlaggedObservation,
    ReadingStatus, SeasonalBaseline, BAND_SIGMAS,
};
pub use dataset::{parse_timestamp, Dataset, Observation};
pub use describe::{describe, CitySummary};
pub use error::{AnalysisError, DatasetError};
pub use season::{season_of, Season};
