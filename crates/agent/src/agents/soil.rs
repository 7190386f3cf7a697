use std::sync::Arc;

use async_trait::async_trait;
use kisan_core::{AgentName, Parameters};

use crate::agents::{guidance, present};
use crate::bridge::{BridgeAgent, TaskOutcome};
use crate::llm::CompletionClient;

/// Soil analysis from the farmer's own description.
pub struct SoilAgent {
    completion: Arc<dyn CompletionClient>,
}

impl SoilAgent {
    pub fn new(completion: Arc<dyn CompletionClient>) -> Self {
        Self { completion }
    }

    pub async fn analyze(&self, description: Option<&str>, language: &str) -> String {
        let Some(description) = present(description) else {
            return guidance(AgentName::Soil);
        };

        let prompt = format!(
            "You are an expert soil scientist for Indian agriculture. A farmer has described their soil: \"{description}\".\n\
Provide an analysis: Likely soil type, characteristics, suitable crops, and improvement steps.\n\
IMPORTANT: Provide the entire response in a clear, easy-to-understand format in the following language: {language}.\n"
        );
        self.completion.complete(&prompt, None).await
    }
}

#[async_trait]
impl BridgeAgent for SoilAgent {
    async fn handle_request(&self, _task: &str, _data: &Parameters) -> TaskOutcome {
        TaskOutcome::Unsupported
    }
}
