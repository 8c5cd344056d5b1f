//! Per-city descriptive statistics.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::dataset::Observation;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CitySummary {
    pub city: String,
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation, same convention as the seasonal baselines
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Summarise all temperatures of each city, ordered by city name.
pub fn describe(observations: &[Observation]) -> Vec<CitySummary> {
    let mut by_city: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for obs in observations {
        by_city.entry(obs.city.as_str()).or_default().push(obs.temperature);
    }

    by_city
        .into_iter()
        .map(|(city, mut temps)| {
            temps.sort_by(f64::total_cmp);
            summarize(city, &temps)
        })
        .collect()
}

// `sorted` is non-empty and ascending.
fn summarize(city: &str, sorted: &[f64]) -> CitySummary {
    let n = sorted.len() as f64;
    let mean = sorted.iter().sum::<f64>() / n;
    let variance = sorted.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / n;

    CitySummary {
        city: city.to_string(),
        count: sorted.len(),
        mean,
        std: variance.sqrt(),
        min: sorted[0],
        q25: percentile(sorted, 0.25),
        median: percentile(sorted, 0.5),
        q75: percentile(sorted, 0.75),
        max: sorted[sorted.len() - 1],
    }
}

/// Linear interpolation between closest ranks.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let rank = q * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
