//! Seasonal baselines and the 2-sigma anomaly band.
//!
//! A baseline summarises every historical reading of one city in one season
//! as a mean and a population standard deviation (denominator `n`). A
//! temperature is normal when it lies inside `[mean - 2σ, mean + 2σ]`,
//! boundaries included. Groups with fewer than two readings have no usable
//! deviation; classifying against them is an error rather than a guess.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::dataset::Observation;
use crate::error::AnalysisError;
use crate::season::Season;

/// Width of the normal band in standard deviations.
pub const BAND_SIGMAS: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalBaseline {
    pub city: String,
    pub season: Season,
    pub mean: f64,
    /// `None` when the group has fewer than two observations
    pub std: Option<f64>,
    pub count: usize,
}

impl SeasonalBaseline {
    /// Build a baseline from the temperatures of one (city, season) group.
    /// Returns `None` for an empty group.
    pub fn from_temperatures(
        city: impl Into<String>,
        season: Season,
        temperatures: &[f64],
    ) -> Option<Self> {
        if temperatures.is_empty() {
            return None;
        }

        let n = temperatures.len() as f64;
        let mean = temperatures.iter().sum::<f64>() / n;
        let std = (temperatures.len() >= 2).then(|| {
            let variance = temperatures.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / n;
            variance.sqrt()
        });

        Some(Self {
            city: city.into(),
            season,
            mean,
            std,
            count: temperatures.len(),
        })
    }

    /// Inclusive `(lower, upper)` bounds of the normal band.
    pub fn band(&self) -> Option<(f64, f64)> {
        self.std.map(|std| {
            (
                self.mean - BAND_SIGMAS * std,
                self.mean + BAND_SIGMAS * std,
            )
        })
    }

    fn insufficient(&self) -> AnalysisError {
        AnalysisError::InsufficientData {
            city: self.city.clone(),
            season: self.season,
            count: self.count,
        }
    }
}

/// Result of judging one temperature against a baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyVerdict {
    pub city: String,
    pub season: Season,
    pub observed_temp: f64,
    pub lower: f64,
    pub upper: f64,
    pub is_anomalous: bool,
    pub message: String,
}

impl std::fmt::Display for AnomalyVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Judge `temperature` against `baseline`.
pub fn classify(
    baseline: &SeasonalBaseline,
    temperature: f64,
) -> Result<AnomalyVerdict, AnalysisError> {
    let (lower, upper) = baseline.band().ok_or_else(|| baseline.insufficient())?;

    let is_anomalous = !(lower..=upper).contains(&temperature);
    let label = if is_anomalous { "anomalous" } else { "normal" };
    let message = format!(
        "Current temperature {}°C in {} is {} for {}.",
        temperature, baseline.city, label, baseline.season
    );

    Ok(AnomalyVerdict {
        city: baseline.city.clone(),
        season: baseline.season,
        observed_temp: temperature,
        lower,
        upper,
        is_anomalous,
        message,
    })
}

/// Baselines keyed by (city, season), iterated in city then season order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Baselines {
    by_key: BTreeMap<(String, Season), SeasonalBaseline>,
}

impl Baselines {
    pub fn get(&self, city: &str, season: Season) -> Option<&SeasonalBaseline> {
        self.by_key.get(&(city.to_string(), season))
    }

    /// Look up the (city, season) baseline and classify against it.
    pub fn classify(
        &self,
        city: &str,
        season: Season,
        temperature: f64,
    ) -> Result<AnomalyVerdict, AnalysisError> {
        let baseline = self.get(city, season).ok_or_else(|| AnalysisError::NoBaseline {
            city: city.to_string(),
            season,
        })?;
        classify(baseline, temperature)
    }

    /// Seasonal profile of one city, winter first.
    pub fn for_city<'a>(&'a self, city: &'a str) -> impl Iterator<Item = &'a SeasonalBaseline> {
        self.by_key.values().filter(move |b| b.city == city)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// Group observations by exact (city, season) and summarise each group.
///
/// Output does not depend on the order of `observations`: groups are keyed in
/// a sorted map and each group's temperatures are summed in sorted order.
pub fn compute_baselines(observations: &[Observation]) -> Baselines {
    let mut groups: BTreeMap<(String, Season), Vec<f64>> = BTreeMap::new();
    for obs in observations {
        groups
            .entry((obs.city.clone(), obs.season))
            .or_default()
            .push(obs.temperature);
    }

    let by_key = groups
        .into_iter()
        .filter_map(|((city, season), mut temps)| {
            temps.sort_by(f64::total_cmp);
            let baseline = SeasonalBaseline::from_temperatures(city.clone(), season, &temps)?;
            Some(((city, season), baseline))
        })
        .collect();

    let baselines = Baselines { by_key };
    tracing::debug!(
        "Computed {} seasonal baselines from {} observations",
        baselines.len(),
        observations.len()
    );
    baselines
}

/// Where a historical reading sits relative to its own seasonal band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingStatus {
    Normal,
    Anomalous,
    /// The group has no usable band (fewer than two readings)
    Undetermined,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlaggedObservation {
    pub observation: Observation,
    pub status: ReadingStatus,
}

/// Label every historical observation against its (city, season) band,
/// keeping input order.
pub fn flag_anomalies(
    observations: &[Observation],
    baselines: &Baselines,
) -> Vec<FlaggedObservation> {
    observations
        .iter()
        .map(|obs| {
            let status = match baselines
                .get(&obs.city, obs.season)
                .map(|b| classify(b, obs.temperature))
            {
                Some(Ok(verdict)) if verdict.is_anomalous => ReadingStatus::Anomalous,
                Some(Ok(_)) => ReadingStatus::Normal,
                Some(Err(_)) | None => ReadingStatus::Undetermined,
            };
            FlaggedObservation {
                observation: obs.clone(),
                status,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn obs(city: &str, month: u32, day: u32, temperature: f64) -> Observation {
        Observation::new(
            city,
            Utc.with_ymd_and_hms(2020, month, day, 0, 0, 0).unwrap(),
            temperature,
        )
    }

    fn moscow_winter() -> Vec<Observation> {
        vec![
            obs("Moscow", 1, 1, -5.0),
            obs("Moscow", 1, 2, -3.0),
            obs("Moscow", 2, 1, -4.0),
            obs("Moscow", 12, 1, -6.0),
        ]
    }

    #[test]
    fn test_moscow_winter_baseline() {
        let baselines = compute_baselines(&moscow_winter());
        let b = baselines.get("Moscow", Season::Winter).unwrap();

        assert_eq!(b.count, 4);
        assert!((b.mean - -4.5).abs() < 1e-12);
        assert!((b.std.unwrap() - 1.118_033_988_75).abs() < 1e-9);
    }

    #[test]
    fn test_moscow_live_readings() {
        let baselines = compute_baselines(&moscow_winter());

        let normal = baselines.classify("Moscow", Season::Winter, -4.5).unwrap();
        assert!(!normal.is_anomalous);
        assert!(normal.message.contains("normal"));

        let hot = baselines.classify("Moscow", Season::Winter, 10.0).unwrap();
        assert!(hot.is_anomalous);
        assert_eq!(
            hot.message,
            "Current temperature 10°C in Moscow is anomalous for winter."
        );
    }

    #[test]
    fn test_band_boundaries_are_inclusive() {
        // mean 10, population std 2 -> band [6, 14]
        let baseline =
            SeasonalBaseline::from_temperatures("Lima", Season::Summer, &[8.0, 12.0]).unwrap();
        assert_eq!(baseline.band(), Some((6.0, 14.0)));

        assert!(!classify(&baseline, 14.0).unwrap().is_anomalous);
        assert!(!classify(&baseline, 6.0).unwrap().is_anomalous);
        assert!(classify(&baseline, 15.0).unwrap().is_anomalous);
        assert!(classify(&baseline, 5.0).unwrap().is_anomalous);
    }

    #[test]
    fn test_single_observation_is_insufficient() {
        let baselines = compute_baselines(&[obs("Quito", 7, 1, 14.0)]);
        let b = baselines.get("Quito", Season::Summer).unwrap();
        assert_eq!(b.std, None);
        assert_eq!(b.band(), None);

        let err = baselines.classify("Quito", Season::Summer, 14.0).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::InsufficientData {
                city: "Quito".into(),
                season: Season::Summer,
                count: 1,
            }
        );
    }

    #[test]
    fn test_missing_season_is_no_baseline() {
        let baselines = compute_baselines(&moscow_winter());
        let err = baselines.classify("Moscow", Season::Summer, 20.0).unwrap_err();
        assert!(matches!(err, AnalysisError::NoBaseline { season: Season::Summer, .. }));

        let err = baselines.classify("Paris", Season::Winter, 5.0).unwrap_err();
        assert!(matches!(err, AnalysisError::NoBaseline { ref city, .. } if city == "Paris"));
    }

    #[test]
    fn test_constant_group_has_zero_width_band() {
        let baselines = compute_baselines(&[obs("Lima", 7, 1, 18.0), obs("Lima", 7, 2, 18.0)]);
        let verdict = baselines.classify("Lima", Season::Summer, 18.0).unwrap();
        assert!(!verdict.is_anomalous);
        let verdict = baselines.classify("Lima", Season::Summer, 18.5).unwrap();
        assert!(verdict.is_anomalous);
    }

    #[test]
    fn test_groups_do_not_mix_cities_or_seasons() {
        let mut data = moscow_winter();
        data.push(obs("Moscow", 7, 1, 20.0));
        data.push(obs("Moscow", 7, 2, 22.0));
        data.push(obs("Berlin", 1, 1, 1.0));
        data.push(obs("Berlin", 1, 2, 3.0));

        let baselines = compute_baselines(&data);
        assert_eq!(baselines.len(), 3);
        assert_eq!(baselines.get("Moscow", Season::Summer).unwrap().mean, 21.0);
        assert_eq!(baselines.get("Berlin", Season::Winter).unwrap().mean, 2.0);
        assert_eq!(baselines.get("Moscow", Season::Winter).unwrap().count, 4);
    }

    #[test]
    fn test_compute_is_deterministic_and_order_independent() {
        let mut data = moscow_winter();
        data.push(obs("Berlin", 4, 1, 10.1));
        data.push(obs("Berlin", 4, 2, 12.7));
        data.push(obs("Berlin", 5, 3, 0.3));

        let first = compute_baselines(&data);
        let second = compute_baselines(&data);
        assert_eq!(first, second);

        let mut reversed = data.clone();
        reversed.reverse();
        assert_eq!(compute_baselines(&reversed), first);
    }

    #[test]
    fn test_for_city_is_ordered_by_season() {
        let data = vec![
            obs("Oslo", 10, 1, 5.0),
            obs("Oslo", 10, 2, 7.0),
            obs("Oslo", 1, 1, -8.0),
            obs("Oslo", 1, 2, -6.0),
            obs("Rome", 1, 1, 8.0),
        ];
        let baselines = compute_baselines(&data);
        let seasons: Vec<Season> = baselines.for_city("Oslo").map(|b| b.season).collect();
        assert_eq!(seasons, vec![Season::Winter, Season::Autumn]);
    }

    #[test]
    fn test_flag_anomalies() {
        let mut data: Vec<Observation> = (1..=10).map(|d| obs("Cairo", 7, d, 30.0)).collect();
        data.push(obs("Cairo", 7, 11, 45.0));
        data.push(obs("Cairo", 1, 1, 15.0));

        let baselines = compute_baselines(&data);
        let flagged = flag_anomalies(&data, &baselines);

        assert_eq!(flagged.len(), data.len());
        assert!(flagged[..10].iter().all(|f| f.status == ReadingStatus::Normal));
        assert_eq!(flagged[10].status, ReadingStatus::Anomalous);
        assert_eq!(flagged[11].status, ReadingStatus::Undetermined);
    }
}
