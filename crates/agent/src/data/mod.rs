//! Domain data lookups consumed by the weather and market agents.

pub mod market;
pub mod weather;

use thiserror::Error;

pub use market::{DataGovMarketClient, MarketRecord, MarketSource};
pub use weather::{OpenWeatherClient, WeatherObservation, WeatherSource};

/// Failure of a data lookup. The `Display` text is what agents quote back to
/// the farmer as the reason.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DataClientError {
    #[error("{0} not found.")]
    MissingApiKey(&'static str),
    #[error("{0}")]
    Request(String),
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("unexpected response: {0}")]
    Malformed(String),
}

impl DataClientError {
    fn request(error: reqwest::Error) -> Self {
        Self::Request(error.without_url().to_string())
    }

    fn decode(error: reqwest::Error) -> Self {
        Self::Decode(error.without_url().to_string())
    }
}
