use async_trait::async_trait;
use kisan_core::config::MarketConfig;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::data::DataClientError;

/// One mandi price row. Every field is optional and carried as text; the
/// agent embeds the rows verbatim in its prompt.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketRecord {
    #[serde(default, deserialize_with = "text_or_number", skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "text_or_number", skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(default, deserialize_with = "text_or_number", skip_serializing_if = "Option::is_none")]
    pub market: Option<String>,
    #[serde(default, deserialize_with = "text_or_number", skip_serializing_if = "Option::is_none")]
    pub commodity: Option<String>,
    #[serde(default, deserialize_with = "text_or_number", skip_serializing_if = "Option::is_none")]
    pub variety: Option<String>,
    #[serde(default, deserialize_with = "text_or_number", skip_serializing_if = "Option::is_none")]
    pub arrival_date: Option<String>,
    #[serde(default, deserialize_with = "text_or_number", skip_serializing_if = "Option::is_none")]
    pub min_price: Option<String>,
    #[serde(default, deserialize_with = "text_or_number", skip_serializing_if = "Option::is_none")]
    pub max_price: Option<String>,
    #[serde(default, deserialize_with = "text_or_number", skip_serializing_if = "Option::is_none")]
    pub modal_price: Option<String>,
}

impl MarketRecord {
    pub fn prices(
        min_price: impl Into<String>,
        max_price: impl Into<String>,
        modal_price: impl Into<String>,
    ) -> Self {
        Self {
            min_price: Some(min_price.into()),
            max_price: Some(max_price.into()),
            modal_price: Some(modal_price.into()),
            ..Self::default()
        }
    }
}

fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

#[async_trait]
pub trait MarketSource: Send + Sync {
    async fn prices(
        &self,
        commodity: &str,
        market: &str,
    ) -> Result<Vec<MarketRecord>, DataClientError>;
}

/// Daily mandi prices from the data.gov.in open data API.
#[derive(Clone, Debug)]
pub struct DataGovMarketClient {
    http: Client,
    api_key: Option<SecretString>,
    base_url: String,
    resource_id: String,
    limit: u32,
}

impl DataGovMarketClient {
    pub fn new(
        api_key: Option<SecretString>,
        base_url: impl Into<String>,
        resource_id: impl Into<String>,
        limit: u32,
    ) -> Self {
        Self {
            http: Client::new(),
            api_key,
            base_url: base_url.into(),
            resource_id: resource_id.into(),
            limit,
        }
    }

    pub fn from_config(config: &MarketConfig) -> Self {
        Self::new(
            config.api_key.clone(),
            config.base_url.clone(),
            config.resource_id.clone(),
            config.limit,
        )
    }
}

#[derive(Debug, Deserialize)]
struct ResourcePayload {
    #[serde(default)]
    records: Vec<MarketRecord>,
}

#[async_trait]
impl MarketSource for DataGovMarketClient {
    async fn prices(
        &self,
        commodity: &str,
        market: &str,
    ) -> Result<Vec<MarketRecord>, DataClientError> {
        let api_key = self
            .api_key
            .as_ref()
            .map(|key| key.expose_secret().trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(DataClientError::MissingApiKey("DATA_GOV_IN_API_KEY"))?;

        let url = format!("{}/resource/{}", self.base_url.trim_end_matches('/'), self.resource_id);
        let limit = self.limit.to_string();
        debug!(event_name = "agent.data.market_request", commodity, market, "fetching mandi prices");

        let payload: ResourcePayload = self
            .http
            .get(&url)
            .query(&[
                ("api-key", api_key.as_str()),
                ("format", "json"),
                ("offset", "0"),
                ("limit", limit.as_str()),
                ("filters[commodity]", commodity),
                ("filters[market]", market),
            ])
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(DataClientError::request)?
            .json()
            .await
            .map_err(DataClientError::decode)?;

        Ok(payload.records)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{DataGovMarketClient, MarketRecord, MarketSource};
    use crate::data::DataClientError;

    const RESOURCE: &str = "9ef84268-d588-465a-a308-a864a43d0070";

    fn client(server: &MockServer, api_key: Option<&str>) -> DataGovMarketClient {
        DataGovMarketClient::new(api_key.map(|key| key.to_string().into()), server.uri(), RESOURCE, 10)
    }

    #[tokio::test]
    async fn filters_by_commodity_and_market() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/resource/{RESOURCE}")))
            .and(query_param("api-key", "market-key"))
            .and(query_param("format", "json"))
            .and(query_param("limit", "10"))
            .and(query_param("filters[commodity]", "Potato"))
            .and(query_param("filters[market]", "Agra"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total": 1,
                "records": [{
                    "state": "Uttar Pradesh",
                    "market": "Agra",
                    "commodity": "Potato",
                    "min_price": "800",
                    "max_price": 1200,
                    "modal_price": "1000",
                    "grade": "FAQ"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let records = client(&server, Some("market-key")).prices("Potato", "Agra").await.expect("records");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].state.as_deref(), Some("Uttar Pradesh"));
        assert_eq!(records[0].max_price.as_deref(), Some("1200"));
        assert_eq!(records[0].modal_price.as_deref(), Some("1000"));
        assert_eq!(records[0].variety, None);
    }

    #[tokio::test]
    async fn missing_records_field_is_an_empty_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "no data"})))
            .mount(&server)
            .await;

        let records = client(&server, Some("market-key")).prices("Saffron", "Agra").await.expect("ok");
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn missing_key_is_reported_by_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let error = client(&server, None).prices("Potato", "Agra").await.expect_err("missing key");
        assert_eq!(error.to_string(), "DATA_GOV_IN_API_KEY not found.");
    }

    #[tokio::test]
    async fn server_error_is_a_request_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(502)).mount(&server).await;

        let error = client(&server, Some("market-key")).prices("Potato", "Agra").await.expect_err("502");
        assert!(matches!(error, DataClientError::Request(_)));
    }

    #[test]
    fn serialization_omits_absent_fields() {
        let value = serde_json::to_value(MarketRecord::prices("800", "1200", "1000")).expect("json");
        assert_eq!(value, json!({"min_price": "800", "max_price": "1200", "modal_price": "1000"}));
    }
}
