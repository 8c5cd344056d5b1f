//! Plain-text rendering of the analysis for the terminal.

use std::fmt::Write;

use tempwatch_climate::{Baselines, CitySummary, FlaggedObservation, ReadingStatus};
use tempwatch_weather::BatchResults;

/// Descriptive statistics, one row per city.
pub fn summary_table(summaries: &[CitySummary]) -> String {
    let mut out = String::from("Descriptive statistics (°C)\n");
    let _ = writeln!(
        out,
        "{:<16} {:>6} {:>8} {:>7} {:>7} {:>7} {:>7} {:>7} {:>7}",
        "city", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
    );
    for s in summaries {
        let _ = writeln!(
            out,
            "{:<16} {:>6} {:>8.2} {:>7.2} {:>7.2} {:>7.2} {:>7.2} {:>7.2} {:>7.2}",
            s.city, s.count, s.mean, s.std, s.min, s.q25, s.median, s.q75, s.max
        );
    }
    out.push('\n');
    out
}

/// Verdict line (or failure reason) for each city of a live batch.
pub fn live_results(results: &BatchResults) -> String {
    let mut out = String::from("Current temperatures\n");
    for (city, result) in results {
        let _ = match result {
            Ok(outcome) => writeln!(out, "  {}", outcome.verdict),
            Err(e) => writeln!(out, "  {}: {}", city, e.user_message()),
        };
    }
    out.push('\n');
    out
}

/// Mean ± std per season for one city.
pub fn seasonal_profile(city: &str, baselines: &Baselines) -> String {
    let mut out = format!("Seasonal profile: {}\n", city);
    let mut any = false;
    for b in baselines.for_city(city) {
        any = true;
        let _ = match b.std {
            Some(std) => writeln!(
                out,
                "  {:<7} {:>7.2} ± {:<6.2} (n={})",
                b.season.as_str(),
                b.mean,
                std,
                b.count
            ),
            None => writeln!(
                out,
                "  {:<7} {:>7.2} ± n/a    (n={})",
                b.season.as_str(),
                b.mean,
                b.count
            ),
        };
    }
    if !any {
        out.push_str("  no historical data\n");
    }
    out.push('\n');
    out
}

/// Historical readings of one city that fall outside their seasonal band.
pub fn anomalies(city: &str, flagged: &[FlaggedObservation]) -> String {
    let hits: Vec<&FlaggedObservation> = flagged
        .iter()
        .filter(|f| f.observation.city == city && f.status == ReadingStatus::Anomalous)
        .collect();

    let mut out = format!("Anomalous readings: {} ({})\n", city, hits.len());
    for f in hits {
        let _ = writeln!(
            out,
            "  {}  {:>7.2}°C  {}",
            f.observation.timestamp.format("%Y-%m-%d %H:%M"),
            f.observation.temperature,
            f.observation.season
        );
    }
    out.push('\n');
    out
}
