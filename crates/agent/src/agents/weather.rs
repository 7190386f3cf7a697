use std::sync::Arc;

use async_trait::async_trait;
use kisan_core::{AgentName, Parameters};
use serde_json::json;
use tracing::debug;

use crate::agents::{guidance, language_directive, present};
use crate::bridge::{BridgeAgent, TaskOutcome};
use crate::data::WeatherSource;
use crate::llm::CompletionClient;

pub const SIMPLE_FORECAST_TASK: &str = "get_simple_forecast";

pub struct WeatherAgent {
    completion: Arc<dyn CompletionClient>,
    weather: Arc<dyn WeatherSource>,
}

impl WeatherAgent {
    pub fn new(completion: Arc<dyn CompletionClient>, weather: Arc<dyn WeatherSource>) -> Self {
        Self { completion, weather }
    }

    /// Full report for the farmer, written by the completion model from the
    /// current observation.
    pub async fn report(&self, city: Option<&str>, language: &str) -> String {
        let Some(city) = present(city) else {
            return guidance(AgentName::Weather);
        };

        let observation = match self.weather.current(city).await {
            Ok(observation) => observation,
            Err(error) => return format!("Could not get weather for '{city}'. Reason: {error}"),
        };

        let report_data = json!({
            "city": observation.city,
            "condition": title_case(&observation.description),
            "temperature_celsius": observation.temperature_c,
            "humidity_percent": observation.humidity_pct,
        });

        let prompt = format!(
            "You are a weather reporter for an Indian farmer.\n\
Take the following weather data and present it as a simple, clear report.\n\n\
Weather Data:\n{report_data}\n\n\
Example format:\n\
Weather for [City]:\n\
- Condition: [Condition]\n\
- Temperature: [Temperature]°C\n\
- Humidity: [Humidity]%\n\n\
{}\n",
            language_directive(language)
        );
        self.completion.complete(&prompt, None).await
    }

    /// One deterministic sentence for other agents. Reads the weather source
    /// once and never calls the completion model.
    pub async fn simple_forecast(&self, city: Option<&str>) -> String {
        let Some(city) = present(city) else {
            return "No city provided.".to_string();
        };

        match self.weather.current(city).await {
            Ok(observation) => format!(
                "Forecast for {city}: {} with temperatures around {}°C.",
                title_case(&observation.description),
                observation.temperature_c
            ),
            Err(error) => {
                debug!(event_name = "agent.weather.forecast_unavailable", city, error = %error, "forecast lookup failed");
                "Weather data unavailable.".to_string()
            }
        }
    }
}

#[async_trait]
impl BridgeAgent for WeatherAgent {
    async fn handle_request(&self, task: &str, data: &Parameters) -> TaskOutcome {
        let reply = match task {
            SIMPLE_FORECAST_TASK => self.simple_forecast(data.value("city")).await,
            _ => "Unknown task.".to_string(),
        };
        TaskOutcome::Handled(reply)
    }
}

/// Capitalises the first letter of every alphabetic run and lowercases the
/// rest: "light rain" becomes "Light Rain".
pub(crate) fn title_case(text: &str) -> String {
    let mut titled = String::with_capacity(text.len());
    let mut previous_alphabetic = false;
    for character in text.chars() {
        if character.is_alphabetic() {
            if previous_alphabetic {
                titled.extend(character.to_lowercase());
            } else {
                titled.extend(character.to_uppercase());
            }
            previous_alphabetic = true;
        } else {
            titled.push(character);
            previous_alphabetic = false;
        }
    }
    titled
}
