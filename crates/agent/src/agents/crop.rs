use std::sync::Arc;

use async_trait::async_trait;
use kisan_core::{AgentName, AssistantError, Parameters};

use crate::agents::{guidance, language_directive};
use crate::bridge::{BridgeAgent, TaskOutcome};
use crate::image::encode_image_file;
use crate::llm::CompletionClient;

/// Disease diagnosis from a photo of the affected plant.
pub struct CropAgent {
    completion: Arc<dyn CompletionClient>,
}

impl CropAgent {
    pub fn new(completion: Arc<dyn CompletionClient>) -> Self {
        Self { completion }
    }

    pub async fn diagnose(&self, image_path: Option<&str>, language: &str) -> String {
        // Paths are used verbatim; only all-blank input counts as missing.
        let Some(image_path) = image_path.filter(|path| !path.trim().is_empty()) else {
            return guidance(AgentName::Crop);
        };
        let Some(image) = encode_image_file(image_path).await else {
            return AssistantError::UnreadableImage { path: image_path.to_string() }.user_message();
        };

        let prompt = format!(
            "You are an expert agronomist specializing in crop diseases in India.\n\
Analyze the provided image of a plant leaf.\n\
1. Identify the plant if possible (e.g., tomato, rice).\n\
2. Identify the disease or pest causing the symptoms shown.\n\
3. Explain the cause of the disease.\n\
4. Provide a list of actionable steps the farmer should take.\n\
5. Suggest at least two affordable, locally available remedies (one organic/natural, one chemical).\n\n\
{}\n",
            language_directive(language)
        );
        self.completion.complete(&prompt, Some(&image)).await
    }
}

#[async_trait]
impl BridgeAgent for CropAgent {
    async fn handle_request(&self, _task: &str, _data: &Parameters) -> TaskOutcome {
        TaskOutcome::Unsupported
    }
}
