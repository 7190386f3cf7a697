use serde::{Deserialize, Serialize};

use crate::domain::agent::AgentName;
use crate::domain::route::{Parameters, RouteDecision};

/// Per-agent input bundle.
///
/// `language` is present on every variant and is only ever forwarded into the
/// outbound prompt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "agent", rename_all = "snake_case")]
pub enum DomainQuery {
    Crop { image_path: Option<String>, language: String },
    Market { commodity: Option<String>, market: Option<String>, language: String },
    Scheme { query: Option<String>, language: String },
    Weather { city: Option<String>, language: String },
    Organic { topic: Option<String>, language: String },
    Soil { query: Option<String>, language: String },
}

impl DomainQuery {
    /// Builds the query a specialist reads from a routing decision. `General`
    /// and `Unclear` have no agent to call and yield `None`.
    pub fn from_decision(decision: &RouteDecision, language: &str) -> Option<Self> {
        let parameters = &decision.parameters;
        let language = language.to_string();
        let query = match decision.agent {
            AgentName::Crop => {
                Self::Crop { image_path: owned(parameters, "image_path"), language }
            }
            AgentName::Market => Self::Market {
                commodity: owned(parameters, "commodity"),
                market: owned(parameters, "market"),
                language,
            },
            AgentName::Scheme => Self::Scheme { query: owned(parameters, "query"), language },
            AgentName::Weather => Self::Weather { city: owned(parameters, "city"), language },
            AgentName::Organic => Self::Organic { topic: owned(parameters, "topic"), language },
            AgentName::Soil => Self::Soil { query: owned(parameters, "query"), language },
            AgentName::General | AgentName::Unclear => return None,
        };
        Some(query)
    }

    pub fn agent(&self) -> AgentName {
        match self {
            Self::Crop { .. } => AgentName::Crop,
            Self::Market { .. } => AgentName::Market,
            Self::Scheme { .. } => AgentName::Scheme,
            Self::Weather { .. } => AgentName::Weather,
            Self::Organic { .. } => AgentName::Organic,
            Self::Soil { .. } => AgentName::Soil,
        }
    }

    pub fn language(&self) -> &str {
        match self {
            Self::Crop { language, .. }
            | Self::Market { language, .. }
            | Self::Scheme { language, .. }
            | Self::Weather { language, .. }
            | Self::Organic { language, .. }
            | Self::Soil { language, .. } => language,
        }
    }
}

fn owned(parameters: &Parameters, key: &str) -> Option<String> {
    parameters.value(key).map(str::to_string)
}
