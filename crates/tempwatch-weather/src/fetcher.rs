//! Single-city live comparison against historical baselines.

use tempwatch_climate::{season_of, Baselines};
use tempwatch_core::LiveConfig;

use crate::client::OpenWeatherClient;
use crate::error::{FetchError, LiveError};
use crate::types::{LiveOutcome, LiveReading};

/// Fetches current temperatures and judges them against a fixed snapshot of
/// historical baselines.
#[derive(Debug, Clone)]
pub struct LiveFetcher {
    client: OpenWeatherClient,
    baselines: Baselines,
}

impl LiveFetcher {
    pub fn new(client: OpenWeatherClient, baselines: Baselines) -> Self {
        Self { client, baselines }
    }

    pub fn from_config(
        api_key: &str,
        config: &LiveConfig,
        baselines: Baselines,
    ) -> Result<Self, FetchError> {
        Ok(Self::new(OpenWeatherClient::new(api_key, config)?, baselines))
    }

    /// Geocode `city`, fetch its current temperature and classify it against
    /// the baseline for the season the reading falls in.
    pub async fn fetch_live_reading(&self, city: &str) -> Result<LiveOutcome, LiveError> {
        let coords = self.client.geocode(city).await?;
        let conditions = self.client.current_conditions(&coords).await?;

        let reading = LiveReading {
            city: city.to_string(),
            temperature: conditions.temperature,
            season: season_of(conditions.observed_at),
            fetched_at: conditions.observed_at,
        };

        let verdict = self
            .baselines
            .classify(city, reading.season, reading.temperature)?;

        tracing::info!("{}", verdict.message);
        Ok(LiveOutcome { reading, verdict })
    }
}
