use async_trait::async_trait;
use kisan_core::config::LlmConfig;
use kisan_core::AssistantError;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const SERVICE_NAME: &str = "Google AI";

/// Image bytes already in the transport encoding the completion API expects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImagePayload {
    pub mime_type: String,
    /// Standard base64 of the file contents.
    pub data: String,
}

/// Text and vision completion.
///
/// Implementations never fail past this boundary: missing credentials,
/// transport failures, and empty responses all come back as readable text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str, image: Option<&ImagePayload>) -> String;
}

/// Gemini `generateContent` client.
#[derive(Clone, Debug)]
pub struct GeminiClient {
    http: Client,
    api_key: Option<SecretString>,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(
        api_key: Option<SecretString>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self { http: Client::new(), api_key, base_url: base_url.into(), model: model.into() }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(config.api_key.clone(), config.base_url.clone(), config.model.clone())
    }

    pub async fn generate(
        &self,
        prompt: &str,
        image: Option<&ImagePayload>,
    ) -> Result<String, AssistantError> {
        let api_key = self
            .api_key
            .as_ref()
            .map(|key| key.expose_secret().trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| AssistantError::MissingCredential {
                credential: "GOOGLE_API_KEY".to_string(),
            })?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        let body = GenerateContentRequest::new(prompt, image);

        debug!(
            event_name = "agent.llm.request",
            model = %self.model,
            with_image = image.is_some(),
            prompt_chars = prompt.len(),
            "sending completion request"
        );

        let response = self
            .http
            .post(&url)
            .query(&[("key", api_key.as_str())])
            .json(&body)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|error| {
                warn!(event_name = "agent.llm.request_failed", error = %error.without_url(), "completion request failed");
                AssistantError::UpstreamUnavailable {
                    service: SERVICE_NAME.to_string(),
                    detail: "Please check your API key and ensure the API is enabled in your Google Cloud project."
                        .to_string(),
                }
            })?;

        let payload: GenerateContentResponse = response.json().await.map_err(|error| {
            warn!(event_name = "agent.llm.decode_failed", error = %error.without_url(), "completion response could not be decoded");
            AssistantError::UpstreamUnavailable {
                service: SERVICE_NAME.to_string(),
                detail: "The response could not be understood.".to_string(),
            }
        })?;

        payload.first_text().ok_or_else(|| {
            warn!(event_name = "agent.llm.empty_response", "completion returned no candidates");
            AssistantError::EmptyOrBlockedResponse
        })
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    async fn complete(&self, prompt: &str, image: Option<&ImagePayload>) -> String {
        match self.generate(prompt, image).await {
            Ok(text) => text,
            Err(error) => error.user_message(),
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

impl<'a> GenerateContentRequest<'a> {
    fn new(prompt: &'a str, image: Option<&'a ImagePayload>) -> Self {
        let mut parts = vec![RequestPart::Text { text: prompt }];
        if let Some(image) = image {
            parts.push(RequestPart::InlineData {
                inline_data: InlineData { mime_type: &image.mime_type, data: &image.data },
            });
        }
        Self { contents: vec![RequestContent { role: "user", parts }] }
    }
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.text)
    }
}
