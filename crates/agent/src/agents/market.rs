use std::sync::Arc;

use async_trait::async_trait;
use kisan_core::{AgentName, Parameters};
use tracing::debug;

use crate::agents::weather::SIMPLE_FORECAST_TASK;
use crate::agents::{guidance, language_directive, present};
use crate::bridge::{AgentBridge, BridgeAgent, BridgeRequest, TaskOutcome};
use crate::data::MarketSource;
use crate::llm::CompletionClient;

/// Mandi price analysis. Every lookup is enriched with a short forecast for
/// the market town, fetched from the weather agent over the bridge.
pub struct MarketAgent {
    completion: Arc<dyn CompletionClient>,
    market: Arc<dyn MarketSource>,
    bridge: Arc<AgentBridge>,
}

impl MarketAgent {
    pub fn new(
        completion: Arc<dyn CompletionClient>,
        market: Arc<dyn MarketSource>,
        bridge: Arc<AgentBridge>,
    ) -> Self {
        Self { completion, market, bridge }
    }

    pub async fn market_price(
        &self,
        commodity: Option<&str>,
        market: Option<&str>,
        language: &str,
    ) -> String {
        let (Some(commodity), Some(market)) = (present(commodity), present(market)) else {
            return guidance(AgentName::Market);
        };

        let records = match self.market.prices(commodity, market).await {
            Ok(records) => records,
            Err(error) => return format!("Sorry, I could not fetch market data. Reason: {error}"),
        };
        debug!(event_name = "agent.market.records", commodity, market, records = records.len(), "market data fetched");

        let weather_report = self
            .bridge
            .request(BridgeRequest::new(
                AgentName::Weather,
                SIMPLE_FORECAST_TASK,
                Parameters::new().with("city", market),
            ))
            .await;

        let market_data = serde_json::to_string_pretty(&records).unwrap_or_default();
        let prompt = format!(
            "You are a market analyst for Indian farmers. Provide simple, actionable advice.\n\
Analyze the following real-time market data for '{commodity}' in '{market}'.\n\
Also consider this weather forecast: {weather_report}\n\n\
Market Data:\n{market_data}\n\n\
Provide a summary including min, max, and modal price, and a clear recommendation on whether to sell today.\n\
{}\n",
            language_directive(language)
        );
        self.completion.complete(&prompt, None).await
    }
}

#[async_trait]
impl BridgeAgent for MarketAgent {
    async fn handle_request(&self, _task: &str, _data: &Parameters) -> TaskOutcome {
        TaskOutcome::Unsupported
    }
}
