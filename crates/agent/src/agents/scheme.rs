use std::sync::Arc;

use async_trait::async_trait;
use kisan_core::{AgentName, Parameters};

use crate::agents::{guidance, language_directive, present};
use crate::bridge::{BridgeAgent, TaskOutcome};
use crate::llm::CompletionClient;

pub struct SchemeAgent {
    completion: Arc<dyn CompletionClient>,
}

impl SchemeAgent {
    pub fn new(completion: Arc<dyn CompletionClient>) -> Self {
        Self { completion }
    }

    /// Government schemes and subsidies relevant to the farmer's ask.
    pub async fn find_schemes(&self, query: Option<&str>, language: &str) -> String {
        let Some(query) = present(query) else {
            return guidance(AgentName::Scheme);
        };

        let prompt = format!(
            "You are an expert on Indian government agricultural schemes.\n\
A farmer has asked for help with: '{query}'.\n\
Identify the most relevant schemes. For each, explain the benefit, eligibility, and how to apply.\n\
{}\n",
            language_directive(language)
        );
        self.completion.complete(&prompt, None).await
    }
}

#[async_trait]
impl BridgeAgent for SchemeAgent {
    async fn handle_request(&self, _task: &str, _data: &Parameters) -> TaskOutcome {
        TaskOutcome::Unsupported
    }
}
