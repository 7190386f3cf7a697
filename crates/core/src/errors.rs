use thiserror::Error;

use crate::domain::agent::AgentName;

pub const UNCLEAR_RESPONSE: &str =
    "I'm sorry, I'm not sure how to help with that. Could you please rephrase your question?";
pub const GENERAL_FALLBACK_RESPONSE: &str = "You're welcome!";
pub const GENERIC_FAILURE_RESPONSE: &str = "Sorry, something went wrong.";

/// Failure taxonomy shared by every boundary in the assistant.
///
/// None of these is ever surfaced as a fault: each boundary converts it to
/// [`AssistantError::user_message`] and returns that as its plain-text result.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AssistantError {
    #[error("missing credential `{credential}`")]
    MissingCredential { credential: String },
    #[error("{service} unavailable: {detail}")]
    UpstreamUnavailable { service: String, detail: String },
    #[error("completion returned no usable content")]
    EmptyOrBlockedResponse,
    #[error("router output was not a routing decision: {0}")]
    MalformedRouterOutput(String),
    #[error("missing required parameter for {agent}")]
    MissingRequiredParameter { agent: AgentName },
    #[error("image `{path}` could not be read")]
    UnreadableImage { path: String },
    #[error("bridge target `{target}` is not registered")]
    BridgeTargetMissing { target: String },
    #[error("bridge target `{target}` cannot handle requests")]
    BridgeTargetIncapable { target: String },
}

impl AssistantError {
    pub fn missing_parameter(agent: AgentName) -> Self {
        Self::MissingRequiredParameter { agent }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::MissingCredential { credential } => format!(
                "Error: {credential} not found. Please add it to your environment or .env file."
            ),
            Self::UpstreamUnavailable { service, detail } => {
                format!("API Request Error: Could not connect to {service}. {detail}")
            }
            Self::EmptyOrBlockedResponse => {
                "The AI model responded, but the content may have been blocked for safety reasons."
                    .to_string()
            }
            Self::MalformedRouterOutput(_) => UNCLEAR_RESPONSE.to_string(),
            Self::MissingRequiredParameter { agent } => guidance_for(*agent).to_string(),
            Self::UnreadableImage { .. } => {
                "Error: Could not read or encode the image file.".to_string()
            }
            Self::BridgeTargetMissing { target } => format!("Error: Agent '{target}' not found."),
            Self::BridgeTargetIncapable { target } => {
                format!("Error: Agent '{target}' cannot handle requests.")
            }
        }
    }
}

fn guidance_for(agent: AgentName) -> &'static str {
    match agent {
        AgentName::Crop => {
            "To diagnose a crop problem, please upload a photo of the affected plant."
        }
        AgentName::Market => {
            "To get market prices, please tell me the crop and the market name (mandi)."
        }
        AgentName::Scheme => "Please tell me what kind of scheme or subsidy you are looking for.",
        AgentName::Weather => "Please tell me the city or town for the weather forecast.",
        AgentName::Organic => "Please tell me what organic farming topic you are interested in.",
        AgentName::Soil => {
            "Please describe your soil. For example, 'My soil is red and does not hold water well'."
        }
        AgentName::General | AgentName::Unclear => UNCLEAR_RESPONSE,
    }
}

/// Errors raised at the front-end edge, mapped to user-safe text.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. } | Self::Internal { correlation_id, .. } => {
                correlation_id
            }
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::Internal { .. } => GENERIC_FAILURE_RESPONSE,
        }
    }
}
