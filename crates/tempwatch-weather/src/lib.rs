//! Live temperature lookups for Tempwatch.
//!
//! Resolves city names and current temperatures through OpenWeatherMap and
//! compares each reading against the historical seasonal baseline.

pub mod batch;
pub mod client;
pub mod error;
pub mod fetcher;
pub mod retry;
pub mod types;

pub use batch::{fetch_all, BatchResults};
pub use client::OpenWeatherClient;
pub use error::{FetchError, LiveError};
pub use fetcher::LiveFetcher;
pub use retry::RetryConfig;
pub use types::{Coordinates, CurrentConditions, LiveOutcome, LiveReading};
