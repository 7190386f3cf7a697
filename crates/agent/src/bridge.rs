use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use kisan_core::{AgentName, AssistantError, Parameters};
use tracing::{debug, warn};

/// Result of offering a named task to an agent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskOutcome {
    Handled(String),
    /// The agent takes no inter-agent tasks at all.
    Unsupported,
}

/// Inter-agent task handling. Every agent registered on the bridge implements
/// this; agents with nothing to offer return [`TaskOutcome::Unsupported`].
///
/// Handlers must stay bounded: at most one data lookup and never a completion
/// call.
#[async_trait]
pub trait BridgeAgent: Send + Sync {
    async fn handle_request(&self, task: &str, data: &Parameters) -> TaskOutcome;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BridgeRequest {
    pub target: AgentName,
    pub task: String,
    pub data: Parameters,
}

impl BridgeRequest {
    pub fn new(target: AgentName, task: impl Into<String>, data: Parameters) -> Self {
        Self { target, task: task.into(), data }
    }
}

/// Name-addressed request/response between agents.
///
/// Registration is additive and last-write-wins per name. The registry is
/// filled once at startup and only read afterwards.
#[derive(Default)]
pub struct AgentBridge {
    agents: RwLock<HashMap<AgentName, Arc<dyn BridgeAgent>>>,
}

impl AgentBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: AgentName, agent: Arc<dyn BridgeAgent>) {
        let mut agents = self.agents.write().unwrap_or_else(PoisonError::into_inner);
        agents.insert(name, agent);
        debug!(event_name = "agent.bridge.registered", agent = %name, "agent registered");
    }

    pub fn is_registered(&self, name: AgentName) -> bool {
        self.agents.read().unwrap_or_else(PoisonError::into_inner).contains_key(&name)
    }

    pub fn len(&self) -> usize {
        self.agents.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delivers `request` to its target and returns the handler's text
    /// unmodified. A missing or incapable target yields descriptive text
    /// instead of an error.
    pub async fn request(&self, request: BridgeRequest) -> String {
        let BridgeRequest { target, task, data } = request;
        debug!(event_name = "agent.bridge.request", target = %target, task = %task, "routing bridge request");

        let agent = self.agents.read().unwrap_or_else(PoisonError::into_inner).get(&target).cloned();
        let Some(agent) = agent else {
            warn!(event_name = "agent.bridge.target_missing", target = %target, "bridge target not registered");
            return AssistantError::BridgeTargetMissing { target: target.label().to_string() }
                .user_message();
        };

        match agent.handle_request(&task, &data).await {
            TaskOutcome::Handled(text) => text,
            TaskOutcome::Unsupported => {
                warn!(event_name = "agent.bridge.target_incapable", target = %target, "bridge target takes no tasks");
                AssistantError::BridgeTargetIncapable { target: target.label().to_string() }
                    .user_message()
            }
        }
    }
}

impl std::fmt::Debug for AgentBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let agents = self.agents.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<_> = agents.keys().map(AgentName::label).collect();
        names.sort_unstable();
        f.debug_struct("AgentBridge").field("agents", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use kisan_core::{AgentName, Parameters};

    use super::{AgentBridge, BridgeAgent, BridgeRequest, TaskOutcome};

    struct Echo(&'static str);

    #[async_trait]
    impl BridgeAgent for Echo {
        async fn handle_request(&self, task: &str, data: &Parameters) -> TaskOutcome {
            TaskOutcome::Handled(format!("{}:{task}:{}", self.0, data.value("city").unwrap_or("-")))
        }
    }

    struct Mute;

    #[async_trait]
    impl BridgeAgent for Mute {
        async fn handle_request(&self, _task: &str, _data: &Parameters) -> TaskOutcome {
            TaskOutcome::Unsupported
        }
    }

    #[tokio::test]
    async fn unregistered_target_names_the_agent() {
        let bridge = AgentBridge::new();
        let reply = bridge
            .request(BridgeRequest::new(AgentName::Weather, "get_simple_forecast", Parameters::new()))
            .await;

        assert_eq!(reply, "Error: Agent 'WeatherAgent' not found.");
    }

    #[tokio::test]
    async fn incapable_target_reports_incapacity() {
        let bridge = AgentBridge::new();
        bridge.register(AgentName::Scheme, Arc::new(Mute));

        let reply =
            bridge.request(BridgeRequest::new(AgentName::Scheme, "anything", Parameters::new())).await;
        assert_eq!(reply, "Error: Agent 'SchemeAgent' cannot handle requests.");
    }

    #[tokio::test]
    async fn handler_text_is_returned_unmodified() {
        let bridge = AgentBridge::new();
        bridge.register(AgentName::Weather, Arc::new(Echo("weather")));

        let reply = bridge
            .request(BridgeRequest::new(
                AgentName::Weather,
                "get_simple_forecast",
                Parameters::new().with("city", "Pune"),
            ))
            .await;
        assert_eq!(reply, "weather:get_simple_forecast:Pune");
    }

    #[tokio::test]
    async fn last_registration_wins() {
        let bridge = AgentBridge::new();
        bridge.register(AgentName::Weather, Arc::new(Echo("first")));
        bridge.register(AgentName::Weather, Arc::new(Echo("second")));

        assert_eq!(bridge.len(), 1);
        let reply =
            bridge.request(BridgeRequest::new(AgentName::Weather, "t", Parameters::new())).await;
        assert!(reply.starts_with("second:"));
    }
}
