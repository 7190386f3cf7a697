use std::sync::Arc;

use async_trait::async_trait;
use kisan_core::{AgentName, Parameters};

use crate::agents::{guidance, language_directive, present};
use crate::bridge::{BridgeAgent, TaskOutcome};
use crate::llm::CompletionClient;

pub struct OrganicAgent {
    completion: Arc<dyn CompletionClient>,
}

impl OrganicAgent {
    pub fn new(completion: Arc<dyn CompletionClient>) -> Self {
        Self { completion }
    }

    pub async fn tips(&self, topic: Option<&str>, language: &str) -> String {
        let Some(topic) = present(topic) else {
            return guidance(AgentName::Organic);
        };

        let prompt = format!(
            "You are an expert in organic farming in India. A farmer wants to know about '{topic}'.\n\
Provide a practical, step-by-step guide.\n\
{}\n",
            language_directive(language)
        );
        self.completion.complete(&prompt, None).await
    }
}

#[async_trait]
impl BridgeAgent for OrganicAgent {
    async fn handle_request(&self, _task: &str, _data: &Parameters) -> TaskOutcome {
        TaskOutcome::Unsupported
    }
}
