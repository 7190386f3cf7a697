use async_trait::async_trait;
use kisan_core::config::WeatherConfig;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use crate::data::DataClientError;

#[derive(Clone, Debug, PartialEq)]
pub struct WeatherObservation {
    /// City name as reported by the provider, or the requested one.
    pub city: String,
    pub description: String,
    pub temperature_c: f64,
    pub humidity_pct: Option<f64>,
}

#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current(&self, city: &str) -> Result<WeatherObservation, DataClientError>;
}

/// OpenWeatherMap current-conditions lookup in metric units.
#[derive(Clone, Debug)]
pub struct OpenWeatherClient {
    http: Client,
    api_key: Option<SecretString>,
    base_url: String,
}

impl OpenWeatherClient {
    pub fn new(api_key: Option<SecretString>, base_url: impl Into<String>) -> Self {
        Self { http: Client::new(), api_key, base_url: base_url.into() }
    }

    pub fn from_config(config: &WeatherConfig) -> Self {
        Self::new(config.api_key.clone(), config.base_url.clone())
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    async fn current(&self, city: &str) -> Result<WeatherObservation, DataClientError> {
        let api_key = self
            .api_key
            .as_ref()
            .map(|key| key.expose_secret().trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(DataClientError::MissingApiKey("OPENWEATHER_API_KEY"))?;

        let url = format!("{}/data/2.5/weather", self.base_url.trim_end_matches('/'));
        debug!(event_name = "agent.data.weather_request", city, "fetching current weather");

        let payload: OpenWeatherPayload = self
            .http
            .get(&url)
            .query(&[("q", city), ("appid", api_key.as_str()), ("units", "metric")])
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(DataClientError::request)?
            .json()
            .await
            .map_err(DataClientError::decode)?;

        payload.into_observation(city)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenWeatherPayload {
    name: Option<String>,
    #[serde(default)]
    weather: Vec<Condition>,
    main: MainReadings,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
    humidity: Option<f64>,
}

impl OpenWeatherPayload {
    pub(crate) fn into_observation(
        self,
        requested_city: &str,
    ) -> Result<WeatherObservation, DataClientError> {
        let description = self
            .weather
            .into_iter()
            .next()
            .map(|condition| condition.description)
            .ok_or_else(|| DataClientError::Malformed("no weather conditions reported".into()))?;

        Ok(WeatherObservation {
            city: self
                .name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| requested_city.to_string()),
            description,
            temperature_c: self.main.temp,
            humidity_pct: self.main.humidity,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{OpenWeatherClient, OpenWeatherPayload, WeatherSource};
    use crate::data::DataClientError;

    #[tokio::test]
    async fn fetches_metric_conditions_for_city() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("q", "Hyderabad"))
            .and(query_param("appid", "weather-key"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "Hyderabad",
                "weather": [{"description": "scattered clouds"}],
                "main": {"temp": 31.5, "humidity": 48}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenWeatherClient::new(Some("weather-key".to_string().into()), server.uri());
        let observation = client.current("Hyderabad").await.expect("observation");

        assert_eq!(observation.city, "Hyderabad");
        assert_eq!(observation.description, "scattered clouds");
        assert_eq!(observation.temperature_c, 31.5);
        assert_eq!(observation.humidity_pct, Some(48.0));
    }

    #[tokio::test]
    async fn missing_key_short_circuits() {
        let client = OpenWeatherClient::new(None, "http://127.0.0.1:9");
        let error = client.current("Pune").await.expect_err("missing key");

        assert_eq!(error, DataClientError::MissingApiKey("OPENWEATHER_API_KEY"));
        assert_eq!(error.to_string(), "OPENWEATHER_API_KEY not found.");
    }

    #[tokio::test]
    async fn unknown_city_surfaces_request_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"cod": "404", "message": "city not found"})),
            )
            .mount(&server)
            .await;

        let client = OpenWeatherClient::new(Some("weather-key".to_string().into()), server.uri());
        let error = client.current("Atlantis").await.expect_err("404");

        assert!(matches!(error, DataClientError::Request(ref message) if message.contains("404")));
    }

    #[test]
    fn sparse_payload_falls_back_to_requested_city() {
        let payload: OpenWeatherPayload = serde_json::from_value(json!({
            "weather": [{"description": "light rain"}],
            "main": {"temp": 24}
        }))
        .expect("payload");

        let observation = payload.into_observation("Pune").expect("observation");
        assert_eq!(observation.city, "Pune");
        assert_eq!(observation.temperature_c, 24.0);
        assert_eq!(observation.humidity_pct, None);
    }

    #[test]
    fn payload_without_conditions_is_malformed() {
        let payload: OpenWeatherPayload =
            serde_json::from_value(json!({"weather": [], "main": {"temp": 20}})).expect("payload");

        assert!(matches!(payload.into_observation("Pune"), Err(DataClientError::Malformed(_))));
    }
}
