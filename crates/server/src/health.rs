use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use kisan_core::AppConfig;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    missing_credentials: Vec<&'static str>,
}

impl HealthState {
    pub fn from_config(config: &AppConfig) -> Self {
        Self { missing_credentials: config.missing_credentials() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub completion: HealthCheck,
    pub weather: HealthCheck,
    pub market: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let completion = credential_check(&state, "GOOGLE_API_KEY");
    let weather = credential_check(&state, "OPENWEATHER_API_KEY");
    let market = credential_check(&state, "DATA_GOV_IN_API_KEY");
    let ready = state.missing_credentials.is_empty();

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "kisan-server runtime initialized".to_string(),
        },
        completion,
        weather,
        market,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn credential_check(state: &HealthState, credential: &str) -> HealthCheck {
    if state.missing_credentials.iter().any(|missing| *missing == credential) {
        HealthCheck {
            status: "degraded",
            detail: format!("{credential} is not configured; replies will report it"),
        }
    } else {
        HealthCheck { status: "ready", detail: format!("{credential} configured") }
    }
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode, Json};
    use kisan_core::AppConfig;

    use crate::health::{health, HealthState};

    #[tokio::test]
    async fn health_is_ready_when_every_key_is_configured() {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("g".to_string().into());
        config.weather.api_key = Some("w".to_string().into());
        config.market.api_key = Some("m".to_string().into());

        let (status, Json(payload)) = health(State(HealthState::from_config(&config))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.completion.status, "ready");
        assert_eq!(payload.market.status, "ready");
    }

    #[tokio::test]
    async fn health_degrades_and_names_missing_keys() {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("g".to_string().into());

        let (status, Json(payload)) = health(State(HealthState::from_config(&config))).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.service.status, "ready");
        assert_eq!(payload.completion.status, "ready");
        assert_eq!(payload.weather.status, "degraded");
        assert!(payload.weather.detail.contains("OPENWEATHER_API_KEY"));
        assert_eq!(payload.market.status, "degraded");
    }
}
