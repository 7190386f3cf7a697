use std::sync::Arc;

use axum::Router;
use kisan_agent::AgentRuntime;
use kisan_core::config::AppConfig;
use thiserror::Error;
use tracing::{info, warn};

use crate::health::{self, HealthState};
use crate::web::{self, WebState};

pub struct Application {
    pub config: AppConfig,
    pub runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("upload directory `{path}` could not be created: {source}")]
    UploadDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl Application {
    pub fn router(&self) -> Router {
        let web_state = WebState::new(
            self.runtime.clone(),
            self.config.assistant.default_language.clone(),
            self.config.server.upload_dir.clone(),
        );
        web::router(web_state).merge(health::router(HealthState::from_config(&self.config)))
    }
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let upload_dir = &config.server.upload_dir;
    tokio::fs::create_dir_all(upload_dir).await.map_err(|source| BootstrapError::UploadDir {
        path: upload_dir.display().to_string(),
        source,
    })?;

    let missing = config.missing_credentials();
    if !missing.is_empty() {
        warn!(
            event_name = "system.bootstrap.credentials_missing",
            correlation_id = "bootstrap",
            missing = %missing.join(","),
            "some API keys are not configured; affected agents will reply with an error message"
        );
    }

    let runtime = Arc::new(AgentRuntime::from_config(&config));
    info!(
        event_name = "system.bootstrap.agents_ready",
        correlation_id = "bootstrap",
        registered_agents = runtime.bridge().len(),
        "agents initialized"
    );

    Ok(Application { config, runtime })
}
