//! The six specialists.
//!
//! Each checks its required inputs first and answers with fixed guidance text
//! when one is missing, so no network call is made. Otherwise it builds one
//! prompt and hands it to the completion client, returning the reply as-is.

pub mod crop;
pub mod market;
pub mod organic;
pub mod scheme;
pub mod soil;
pub mod weather;

pub use crop::CropAgent;
pub use market::MarketAgent;
pub use organic::OrganicAgent;
pub use scheme::SchemeAgent;
pub use soil::SoilAgent;
pub use weather::WeatherAgent;

use kisan_core::{AgentName, AssistantError};

/// Treats blank input the same as missing input.
pub(crate) fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

pub(crate) fn language_directive(language: &str) -> String {
    format!("IMPORTANT: Provide the entire response in the following language: {language}.")
}

pub(crate) fn guidance(agent: AgentName) -> String {
    AssistantError::missing_parameter(agent).user_message()
}
