//! Kisan Core - shared vocabulary for the farmer assistant
//!
//! - `domain` - agent names, routing decisions, per-agent queries
//! - `errors` - the failure taxonomy and the user-facing text each maps to
//! - `config` - layered configuration (defaults, `kisan.toml`, env, overrides)
//! - `logging` - tracing subscriber setup shared by the binaries

pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions};
pub use domain::agent::AgentName;
pub use domain::query::DomainQuery;
pub use domain::route::{Parameters, RouteDecision};
pub use errors::{AssistantError, InterfaceError};
