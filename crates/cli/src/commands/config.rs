use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use kisan_core::config::{AppConfig, LoadOptions, DEFAULT_CONFIG_FILE};
use secrecy::{ExposeSecret, SecretString};
use toml::Value;

/// One rendered setting: dotted key, display value, and the environment
/// variables that can set it (first match wins).
struct Setting {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for setting in settings(&config) {
        let source = field_source(
            setting.key,
            setting.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(format!("- {} = {} (source: {source})", setting.key, setting.value));
    }

    let missing = config.missing_credentials();
    if !missing.is_empty() {
        lines.push(format!("missing credentials: {}", missing.join(", ")));
    }

    lines.join("\n")
}

fn settings(config: &AppConfig) -> Vec<Setting> {
    vec![
        Setting {
            key: "llm.api_key",
            value: redact_secret(config.llm.api_key.as_ref()),
            env_keys: &["KISAN_LLM_API_KEY", "GOOGLE_API_KEY"],
        },
        Setting { key: "llm.base_url", value: config.llm.base_url.clone(), env_keys: &["KISAN_LLM_BASE_URL"] },
        Setting { key: "llm.model", value: config.llm.model.clone(), env_keys: &["KISAN_LLM_MODEL"] },
        Setting {
            key: "weather.api_key",
            value: redact_secret(config.weather.api_key.as_ref()),
            env_keys: &["KISAN_WEATHER_API_KEY", "OPENWEATHER_API_KEY"],
        },
        Setting {
            key: "weather.base_url",
            value: config.weather.base_url.clone(),
            env_keys: &["KISAN_WEATHER_BASE_URL"],
        },
        Setting {
            key: "market.api_key",
            value: redact_secret(config.market.api_key.as_ref()),
            env_keys: &["KISAN_MARKET_API_KEY", "DATA_GOV_IN_API_KEY"],
        },
        Setting {
            key: "market.base_url",
            value: config.market.base_url.clone(),
            env_keys: &["KISAN_MARKET_BASE_URL"],
        },
        Setting {
            key: "market.resource_id",
            value: config.market.resource_id.clone(),
            env_keys: &["KISAN_MARKET_RESOURCE_ID"],
        },
        Setting {
            key: "market.limit",
            value: config.market.limit.to_string(),
            env_keys: &["KISAN_MARKET_LIMIT"],
        },
        Setting {
            key: "server.bind_address",
            value: config.server.bind_address.clone(),
            env_keys: &["KISAN_SERVER_BIND_ADDRESS"],
        },
        Setting {
            key: "server.port",
            value: config.server.port.to_string(),
            env_keys: &["KISAN_SERVER_PORT"],
        },
        Setting {
            key: "server.upload_dir",
            value: config.server.upload_dir.display().to_string(),
            env_keys: &["KISAN_SERVER_UPLOAD_DIR"],
        },
        Setting {
            key: "assistant.default_language",
            value: config.assistant.default_language.clone(),
            env_keys: &["KISAN_ASSISTANT_DEFAULT_LANGUAGE"],
        },
        Setting {
            key: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["KISAN_LOGGING_LEVEL", "KISAN_LOG_LEVEL"],
        },
        Setting {
            key: "logging.format",
            value: format!("{:?}", config.logging.format),
            env_keys: &["KISAN_LOGGING_FORMAT", "KISAN_LOG_FORMAT"],
        },
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from("config").join(DEFAULT_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|env_key| env::var_os(env_key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

/// Shows only that a key is set and its last four characters.
fn redact_secret(secret: Option<&SecretString>) -> String {
    let Some(secret) = secret else {
        return "<unset>".to_string();
    };
    let trimmed = secret.expose_secret().trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    let chars: Vec<char> = trimmed.chars().collect();
    if chars.len() <= 8 {
        return "<redacted>".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("***{tail}")
}
