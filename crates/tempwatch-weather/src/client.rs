//! OpenWeatherMap client: direct geocoding and current weather.

use std::time::Duration;

use chrono::DateTime;
use reqwest::Client;
use tempwatch_core::LiveConfig;
use tracing::instrument;

use crate::error::FetchError;
use crate::retry::{with_retry, RetryConfig};
use crate::types::{Coordinates, CurrentConditions, GeocodeCandidate, WeatherResponse};

const USER_AGENT: &str = concat!("tempwatch/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: Client,
    api_key: String,
    geocoding_url: String,
    weather_url: String,
    retry: RetryConfig,
}

impl OpenWeatherClient {
    /// Build a client with the endpoints, timeout and retry policy from `config`.
    pub fn new(api_key: &str, config: &LiveConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            geocoding_url: config.geocoding_url.clone(),
            weather_url: config.weather_url.clone(),
            retry: RetryConfig::from_live_config(config),
        })
    }

    /// Resolve a city name to coordinates using the first geocoder match.
    #[instrument(skip(self), level = "info")]
    pub async fn geocode(&self, city: &str) -> Result<Coordinates, FetchError> {
        let params = [("q", city), ("limit", "1"), ("appid", self.api_key.as_str())];
        let candidates: Vec<GeocodeCandidate> =
            with_retry(&self.retry, || self.get_json(&self.geocoding_url, &params)).await?;

        let coords: Coordinates = candidates
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::CityNotFound(city.to_string()))?
            .into();

        tracing::debug!(
            "Geocoded {} to ({}, {})",
            city,
            coords.latitude,
            coords.longitude
        );
        Ok(coords)
    }

    /// Current temperature (metric) and observation time at `coords`.
    #[instrument(skip(self), level = "info")]
    pub async fn current_conditions(
        &self,
        coords: &Coordinates,
    ) -> Result<CurrentConditions, FetchError> {
        let lat = coords.latitude.to_string();
        let lon = coords.longitude.to_string();

        let params = [
            ("lat", lat.as_str()),
            ("lon", lon.as_str()),
            ("appid", self.api_key.as_str()),
            ("units", "metric"),
        ];
        let body: WeatherResponse =
            with_retry(&self.retry, || self.get_json(&self.weather_url, &params)).await?;

        let observed_at = DateTime::from_timestamp(body.dt, 0).ok_or_else(|| {
            FetchError::InvalidResponse(format!("observation time {} out of range", body.dt))
        })?;

        Ok(CurrentConditions {
            temperature: body.main.temp,
            observed_at,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        let response = self.client.get(url).query(params).send().await?;
        handle_response(response).await
    }
}

async fn handle_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, FetchError> {
    let status = response.status();

    if status.is_success() {
        response.json().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::InvalidResponse(format!("JSON parse error: {}", e.without_url()))
            }
        })
    } else {
        let body = response.text().await.unwrap_or_default();
        tracing::debug!("Upstream returned status {}", status);
        Err(FetchError::Upstream {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> LiveConfig {
        LiveConfig {
            geocoding_url: format!("{}/geo/1.0/direct", server.uri()),
            weather_url: format!("{}/data/2.5/weather", server.uri()),
            timeout_secs: 1,
            ..LiveConfig::default()
        }
    }

    #[tokio::test]
    async fn test_geocode() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .and(query_param("q", "Moscow"))
            .and(query_param("limit", "1"))
            .and(query_param("appid", "test_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"name": "Moscow", "lat": 55.75, "lon": 37.62, "country": "RU"}
            ])))
            .mount(&mock_server)
            .await;

        let client = OpenWeatherClient::new("test_key", &config_for(&mock_server)).unwrap();
        let coords = client.geocode("Moscow").await.unwrap();

        assert_eq!(coords.latitude, 55.75);
        assert_eq!(coords.longitude, 37.62);
        assert_eq!(coords.name.as_deref(), Some("Moscow"));
    }

    #[tokio::test]
    async fn test_geocode_empty_list_is_city_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&mock_server)
            .await;

        let client = OpenWeatherClient::new("test_key", &config_for(&mock_server)).unwrap();
        let result = client.geocode("Atlantis").await;

        assert!(matches!(result, Err(FetchError::CityNotFound(ref c)) if c == "Atlantis"));
    }

    #[tokio::test]
    async fn test_non_success_is_upstream_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_string(r#"{"cod":401,"message":"Invalid API key"}"#),
            )
            .mount(&mock_server)
            .await;

        let client = OpenWeatherClient::new("bad_key", &config_for(&mock_server)).unwrap();
        let result = client.geocode("Moscow").await;

        match result {
            Err(FetchError::Upstream { status, body }) => {
                assert_eq!(status, 401);
                assert!(body.contains("Invalid API key"));
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_current_conditions() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("lat", "55.75"))
            .and(query_param("lon", "37.62"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "main": {"temp": -7.5, "humidity": 80},
                "dt": 1704067200
            })))
            .mount(&mock_server)
            .await;

        let client = OpenWeatherClient::new("test_key", &config_for(&mock_server)).unwrap();
        let coords = Coordinates {
            latitude: 55.75,
            longitude: 37.62,
            name: None,
            country: None,
        };
        let conditions = client.current_conditions(&coords).await.unwrap();

        assert_eq!(conditions.temperature, -7.5);
        assert_eq!(
            conditions.observed_at,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "weather": []
            })))
            .mount(&mock_server)
            .await;

        let client = OpenWeatherClient::new("test_key", &config_for(&mock_server)).unwrap();
        let coords = Coordinates {
            latitude: 1.0,
            longitude: 2.0,
            name: None,
            country: None,
        };
        let result = client.current_conditions(&coords).await;

        assert!(matches!(result, Err(FetchError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_slow_response_is_timeout() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([{"lat": 1.0, "lon": 2.0}]))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&mock_server)
            .await;

        let client = OpenWeatherClient::new("test_key", &config_for(&mock_server)).unwrap();
        let result = client.geocode("Slowtown").await;

        assert!(matches!(result, Err(FetchError::Timeout)));
    }

    #[tokio::test]
    async fn test_network_error_does_not_expose_api_key() {
        let config = LiveConfig {
            geocoding_url: "http://127.0.0.1:1/geo".to_string(),
            timeout_secs: 1,
            ..LiveConfig::default()
        };
        let client = OpenWeatherClient::new("SECRET123", &config).unwrap();
        let err = client.geocode("Moscow").await.unwrap_err();

        assert!(matches!(err, FetchError::Network(_) | FetchError::Timeout));
        assert!(!err.to_string().contains("SECRET123"));
        assert!(!format!("{err:?}").contains("SECRET123"));
    }

    #[tokio::test]
    async fn test_timeout_is_retried_when_configured() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([{"lat": 1.0, "lon": 2.0}]))
                    .set_delay(Duration::from_secs(3)),
            )
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!([{"lat": 1.0, "lon": 2.0}])),
            )
            .mount(&mock_server)
            .await;

        let config = LiveConfig {
            timeout_retries: 1,
            retry_initial_delay_ms: 10,
            ..config_for(&mock_server)
        };
        let client = OpenWeatherClient::new("test_key", &config).unwrap();
        let coords = client.geocode("Slowtown").await.unwrap();

        assert_eq!(coords.latitude, 1.0);
    }
}
