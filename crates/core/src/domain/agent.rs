use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of routing targets.
///
/// The six specialists own one capability each; `General` carries a closing
/// remark straight back to the user and `Unclear` is the fallback for anything
/// the router could not classify.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgentName {
    #[serde(rename = "CropAgent")]
    Crop,
    #[serde(rename = "MarketAgent")]
    Market,
    #[serde(rename = "SchemeAgent")]
    Scheme,
    #[serde(rename = "WeatherAgent")]
    Weather,
    #[serde(rename = "OrganicAgent")]
    Organic,
    #[serde(rename = "SoilAgent")]
    Soil,
    General,
    Unclear,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown agent label `{0}`")]
pub struct UnknownAgentLabel(pub String);

impl AgentName {
    pub const SPECIALISTS: [AgentName; 6] =
        [Self::Crop, Self::Market, Self::Scheme, Self::Weather, Self::Organic, Self::Soil];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Crop => "CropAgent",
            Self::Market => "MarketAgent",
            Self::Scheme => "SchemeAgent",
            Self::Weather => "WeatherAgent",
            Self::Organic => "OrganicAgent",
            Self::Soil => "SoilAgent",
            Self::General => "General",
            Self::Unclear => "Unclear",
        }
    }

    pub fn is_specialist(&self) -> bool {
        !matches!(self, Self::General | Self::Unclear)
    }

    /// Maps an untrusted label onto the closed set; anything outside it is
    /// `Unclear`.
    pub fn from_label(raw: &str) -> Self {
        raw.parse().unwrap_or(Self::Unclear)
    }
}

impl fmt::Display for AgentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AgentName {
    type Err = UnknownAgentLabel;

    // Accepts both `WeatherAgent` and the bare `Weather`, case-insensitively.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        let stem = normalized.strip_suffix("agent").unwrap_or(&normalized);
        match stem {
            "crop" => Ok(Self::Crop),
            "market" => Ok(Self::Market),
            "scheme" => Ok(Self::Scheme),
            "weather" => Ok(Self::Weather),
            "organic" => Ok(Self::Organic),
            "soil" => Ok(Self::Soil),
            "general" => Ok(Self::General),
            "unclear" => Ok(Self::Unclear),
            _ => Err(UnknownAgentLabel(value.to_string())),
        }
    }
}
