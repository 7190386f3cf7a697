use std::sync::Arc;

use kisan_core::config::AppConfig;
use kisan_core::errors::{GENERAL_FALLBACK_RESPONSE, UNCLEAR_RESPONSE};
use kisan_core::{AgentName, DomainQuery, RouteDecision};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::agents::{CropAgent, MarketAgent, OrganicAgent, SchemeAgent, SoilAgent, WeatherAgent};
use crate::bridge::AgentBridge;
use crate::data::{DataGovMarketClient, MarketSource, OpenWeatherClient, WeatherSource};
use crate::llm::{CompletionClient, GeminiClient};
use crate::router::IntentRouter;

/// The outbound capabilities every agent draws on.
#[derive(Clone)]
pub struct AgentClients {
    pub completion: Arc<dyn CompletionClient>,
    pub weather: Arc<dyn WeatherSource>,
    pub market: Arc<dyn MarketSource>,
}

impl AgentClients {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            completion: Arc::new(GeminiClient::from_config(&config.llm)),
            weather: Arc::new(OpenWeatherClient::from_config(&config.weather)),
            market: Arc::new(DataGovMarketClient::from_config(&config.market)),
        }
    }
}

/// Router, bridge, and the six agents wired together once at startup.
///
/// Front ends hold one of these for the process lifetime and call
/// [`AgentRuntime::handle_query`] or [`AgentRuntime::diagnose`] per request.
pub struct AgentRuntime {
    router: IntentRouter,
    bridge: Arc<AgentBridge>,
    crop: Arc<CropAgent>,
    market: Arc<MarketAgent>,
    scheme: Arc<SchemeAgent>,
    weather: Arc<WeatherAgent>,
    organic: Arc<OrganicAgent>,
    soil: Arc<SoilAgent>,
}

impl AgentRuntime {
    pub fn new(clients: AgentClients) -> Self {
        let AgentClients { completion, weather, market } = clients;
        let bridge = Arc::new(AgentBridge::new());

        let crop = Arc::new(CropAgent::new(completion.clone()));
        let market = Arc::new(MarketAgent::new(completion.clone(), market, bridge.clone()));
        let scheme = Arc::new(SchemeAgent::new(completion.clone()));
        let weather = Arc::new(WeatherAgent::new(completion.clone(), weather));
        let organic = Arc::new(OrganicAgent::new(completion.clone()));
        let soil = Arc::new(SoilAgent::new(completion.clone()));

        bridge.register(AgentName::Crop, crop.clone());
        bridge.register(AgentName::Market, market.clone());
        bridge.register(AgentName::Scheme, scheme.clone());
        bridge.register(AgentName::Weather, weather.clone());
        bridge.register(AgentName::Organic, organic.clone());
        bridge.register(AgentName::Soil, soil.clone());
        info!(
            event_name = "agent.runtime.ready",
            correlation_id = "bootstrap",
            registered_agents = bridge.len(),
            "agents registered on bridge"
        );

        Self {
            router: IntentRouter::new(completion),
            bridge,
            crop,
            market,
            scheme,
            weather,
            organic,
            soil,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(AgentClients::from_config(config))
    }

    pub fn bridge(&self) -> &Arc<AgentBridge> {
        &self.bridge
    }

    pub async fn route(&self, query: &str, language: &str) -> RouteDecision {
        self.router.route(query, language).await
    }

    /// Routes a free-text query and runs the chosen agent under a fresh
    /// correlation id.
    pub async fn handle_query(&self, query: &str, language: &str) -> String {
        let correlation_id = Uuid::new_v4().to_string();
        self.handle_query_with_id(&correlation_id, query, language).await
    }

    /// Same as [`AgentRuntime::handle_query`], tagged with the caller's id so
    /// front-end events and agent events share one correlation id. A blank
    /// query is answered without consulting the router.
    pub async fn handle_query_with_id(
        &self,
        correlation_id: &str,
        query: &str,
        language: &str,
    ) -> String {
        let span = info_span!("query", correlation_id = %correlation_id, language = %language);

        async {
            if query.trim().is_empty() {
                info!(event_name = "agent.runtime.empty_query", "blank query answered as unclear");
                return UNCLEAR_RESPONSE.to_string();
            }
            let decision = self.route(query, language).await;
            self.dispatch(&decision, language).await
        }
        .instrument(span)
        .await
    }

    /// Photo diagnosis goes straight to the crop agent.
    pub async fn diagnose(&self, image_path: &str, language: &str) -> String {
        let correlation_id = Uuid::new_v4().to_string();
        self.diagnose_with_id(&correlation_id, image_path, language).await
    }

    pub async fn diagnose_with_id(
        &self,
        correlation_id: &str,
        image_path: &str,
        language: &str,
    ) -> String {
        let span = info_span!("diagnose", correlation_id = %correlation_id, language = %language);
        self.crop.diagnose(Some(image_path), language).instrument(span).await
    }

    pub async fn dispatch(&self, decision: &RouteDecision, language: &str) -> String {
        if decision.is_unclear() {
            info!(event_name = "agent.runtime.unclear", "router could not classify the query");
            return UNCLEAR_RESPONSE.to_string();
        }
        let Some(query) = DomainQuery::from_decision(decision, language) else {
            return match decision.agent {
                AgentName::General => decision
                    .parameters
                    .value("response")
                    .unwrap_or(GENERAL_FALLBACK_RESPONSE)
                    .to_string(),
                _ => UNCLEAR_RESPONSE.to_string(),
            };
        };
        info!(
            event_name = "agent.runtime.dispatch",
            agent = %query.agent(),
            language = query.language(),
            "dispatching to agent"
        );
        self.perform(&query).await
    }

    pub async fn perform(&self, query: &DomainQuery) -> String {
        match query {
            DomainQuery::Crop { image_path, language } => {
                self.crop.diagnose(image_path.as_deref(), language).await
            }
            DomainQuery::Market { commodity, market, language } => {
                self.market.market_price(commodity.as_deref(), market.as_deref(), language).await
            }
            DomainQuery::Scheme { query, language } => {
                self.scheme.find_schemes(query.as_deref(), language).await
            }
            DomainQuery::Weather { city, language } => {
                self.weather.report(city.as_deref(), language).await
            }
            DomainQuery::Organic { topic, language } => {
                self.organic.tips(topic.as_deref(), language).await
            }
            DomainQuery::Soil { query, language } => {
                self.soil.analyze(query.as_deref(), language).await
            }
        }
    }
}
