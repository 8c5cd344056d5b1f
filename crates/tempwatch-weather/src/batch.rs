//! Concurrent live lookups across many cities.

use std::collections::{BTreeMap, BTreeSet};

use futures::future::join_all;

use crate::error::LiveError;
use crate::fetcher::LiveFetcher;
use crate::types::LiveOutcome;

/// Per-city outcome of a batch, sorted by city name.
pub type BatchResults = BTreeMap<String, Result<LiveOutcome, LiveError>>;

/// Fetch every distinct city concurrently on the current task and collect
/// each result under its city. A failing city only affects its own entry.
pub async fn fetch_all<S: AsRef<str>>(fetcher: &LiveFetcher, cities: &[S]) -> BatchResults {
    let distinct: BTreeSet<&str> = cities.iter().map(|c| c.as_ref()).collect();
    tracing::info!("Fetching live temperatures for {} cities", distinct.len());

    let lookups = distinct.into_iter().map(|city| async move {
        let result = fetcher.fetch_live_reading(city).await;
        if let Err(e) = &result {
            tracing::warn!("Live lookup for {} failed: {}", city, e);
        }
        (city.to_string(), result)
    });

    join_all(lookups).await.into_iter().collect()
}
