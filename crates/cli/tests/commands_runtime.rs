use std::env;
use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};

use kisan_agent::data::WeatherObservation;
use kisan_agent::fixtures::{ScriptedCompletion, StaticMarket, StaticWeather};
use kisan_agent::{AgentClients, AgentRuntime};
use kisan_cli::commands::{ask, chat, config, diagnose, doctor};
use kisan_cli::speech::SpeechCleaner;
use kisan_core::errors::UNCLEAR_RESPONSE;
use serde_json::Value;

#[test]
fn doctor_reports_each_missing_credential() {
    with_env(&[], || {
        let payload = parse_payload(&doctor::run(true));

        assert_eq!(payload["overall_status"], "fail");
        assert_eq!(check(&payload, "config_validation")["status"], "pass");
        for name in ["completion_credentials", "weather_credentials", "market_credentials"] {
            assert_eq!(check(&payload, name)["status"], "fail", "{name}");
        }
        let weather = check(&payload, "weather_credentials")["details"].as_str().unwrap_or_default();
        assert!(weather.contains("OPENWEATHER_API_KEY"));
    });
}

#[test]
fn doctor_passes_with_fallback_key_names() {
    with_env(
        &[
            ("GOOGLE_API_KEY", "google-test"),
            ("OPENWEATHER_API_KEY", "weather-test"),
            ("DATA_GOV_IN_API_KEY", "market-test"),
        ],
        || {
            let payload = parse_payload(&doctor::run(true));
            assert_eq!(payload["overall_status"], "pass");
            assert_eq!(payload["summary"], "doctor: all readiness checks passed");
        },
    );
}

#[test]
fn doctor_skips_credential_checks_when_config_is_invalid() {
    with_env(&[("KISAN_SERVER_PORT", "not-a-port")], || {
        let payload = parse_payload(&doctor::run(true));

        assert_eq!(payload["overall_status"], "fail");
        assert_eq!(check(&payload, "config_validation")["status"], "fail");
        assert_eq!(check(&payload, "market_credentials")["status"], "skipped");
    });
}

#[test]
fn doctor_human_output_marks_failures() {
    with_env(&[("GOOGLE_API_KEY", "google-test")], || {
        let output = doctor::run(false);
        assert!(output.starts_with("doctor: one or more readiness checks failed"));
        assert!(output.contains("- [ok] completion_credentials: GOOGLE_API_KEY configured"));
        assert!(output.contains("- [fail] market_credentials:"));
    });
}

#[test]
fn config_redacts_keys_and_attributes_env_sources() {
    with_env(
        &[
            ("KISAN_LLM_API_KEY", "gemini-secret-abcd"),
            ("KISAN_ASSISTANT_DEFAULT_LANGUAGE", "Hindi"),
        ],
        || {
            let output = config::run();

            assert!(!output.contains("gemini-secret-abcd"));
            assert!(output.contains("- llm.api_key = ***abcd (source: env (KISAN_LLM_API_KEY))"));
            assert!(output.contains("- weather.api_key = <unset> (source: default)"));
            assert!(output.contains(
                "- assistant.default_language = Hindi (source: env (KISAN_ASSISTANT_DEFAULT_LANGUAGE))"
            ));
            assert!(output.contains("missing credentials: OPENWEATHER_API_KEY, DATA_GOV_IN_API_KEY"));
        },
    );
}

#[test]
fn config_reports_validation_failure() {
    with_env(&[("KISAN_MARKET_LIMIT", "lots")], || {
        assert!(config::run().starts_with("config validation failed:"));
    });
}

#[test]
fn ask_without_a_completion_key_falls_back_to_unclear() {
    with_env(&[], || {
        let result = ask::run("price of onion in Nashik", Some("English"));

        assert_eq!(result.exit_code, 0);
        assert_eq!(result.output, UNCLEAR_RESPONSE);
    });
}

#[test]
fn ask_returns_config_failure_code_for_invalid_config() {
    with_env(&[("KISAN_SERVER_PORT", "99999")], || {
        let result = ask::run("hello", None);

        assert_eq!(result.exit_code, 2);
        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "ask");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[tokio::test]
async fn ask_execute_prints_the_agent_reply() {
    let runtime = runtime(&[
        r#"{"agent": "WeatherAgent", "parameters": {"city": "Pune"}}"#,
        "Light rain in Pune today.",
    ]);

    let result = ask::execute(&runtime, "weather in Pune", "English").await;

    assert_eq!(result.exit_code, 0);
    assert_eq!(result.output, "Light rain in Pune today.");
}

#[tokio::test]
async fn diagnose_execute_rejects_missing_files() {
    let runtime = runtime(&[]);

    let result = diagnose::execute(&runtime, Path::new("/nonexistent/leaf.jpg"), "English").await;

    assert_eq!(result.exit_code, 1);
    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "diagnose");
    assert_eq!(payload["error_class"], "image_not_found");
}

#[tokio::test]
async fn diagnose_execute_sends_the_photo() {
    let dir = tempfile::tempdir().expect("tempdir");
    let photo = dir.path().join("leaf.png");
    std::fs::write(&photo, [0x89, 0x50, 0x4e, 0x47]).expect("write photo");
    let completion = Arc::new(ScriptedCompletion::new(["Early blight. Remove affected leaves."]));
    let runtime = runtime_with(completion.clone());

    let result = diagnose::execute(&runtime, &photo, "English").await;

    assert_eq!(result.output, "Early blight. Remove affected leaves.");
    let image = completion.last_image().expect("image sent");
    assert_eq!(image.mime_type, "image/png");
}

#[tokio::test]
async fn chat_session_greets_answers_and_says_goodbye() {
    let runtime = runtime(&[r#"{"agent": "General", "parameters": {"response": "Happy to help!"}}"#]);
    let input = Cursor::new("thank you\n\nplease stop now\nnever read\n");
    let mut output = Vec::new();

    chat::session(&runtime, "English", None, input, &mut output).await.expect("session");

    let transcript = String::from_utf8(output).expect("utf8");
    let lines: Vec<&str> = transcript.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Kisan Mitra: Welcome! I am your Kisan Mitra. How can I assist you?",
            "Kisan Mitra: Happy to help!",
            "Kisan Mitra: Goodbye!",
        ]
    );
}

#[tokio::test]
async fn chat_session_cleans_replies_for_speech() {
    let runtime = runtime(&[
        r#"{"agent": "MarketAgent", "parameters": {"commodity": "Onion", "market": "Nashik"}}"#,
        "**Sell** now (prices are high) at ₹1200.",
    ]);
    let cleaner = SpeechCleaner::new().expect("patterns compile");
    let input = Cursor::new("onion price in Nashik\nexit\n");
    let mut output = Vec::new();

    chat::session(&runtime, "English", Some(&cleaner), input, &mut output)
        .await
        .expect("session");

    let transcript = String::from_utf8(output).expect("utf8");
    assert!(transcript.contains("Kisan Mitra: Sell now at rupees1200."), "{transcript}");
}

#[tokio::test]
async fn chat_photo_line_goes_to_crop_diagnosis() {
    let completion = Arc::new(ScriptedCompletion::new(Vec::<String>::new()));
    let runtime = runtime_with(completion.clone());
    let input = Cursor::new("/photo /nonexistent/leaf.jpg\nquit\n");
    let mut output = Vec::new();

    chat::session(&runtime, "English", None, input, &mut output).await.expect("session");

    let transcript = String::from_utf8(output).expect("utf8");
    assert!(transcript.contains("Kisan Mitra: Error: Could not read or encode the image file."));
    assert_eq!(completion.call_count(), 0);
}

#[tokio::test]
async fn chat_photo_path_with_an_exit_word_is_still_diagnosed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let photo = dir.path().join("stopwatch_leaf.png");
    std::fs::write(&photo, [0x89, 0x50, 0x4e, 0x47]).expect("write photo");
    let completion = Arc::new(ScriptedCompletion::new(["Leaf spot. Spray neem oil."]));
    let runtime = runtime_with(completion.clone());
    let input = Cursor::new(format!("/photo {}\nexit\n", photo.display()));
    let mut output = Vec::new();

    chat::session(&runtime, "English", None, input, &mut output).await.expect("session");

    let transcript = String::from_utf8(output).expect("utf8");
    let lines: Vec<&str> = transcript.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Kisan Mitra: Welcome! I am your Kisan Mitra. How can I assist you?",
            "Kisan Mitra: Leaf spot. Spray neem oil.",
            "Kisan Mitra: Goodbye!",
        ]
    );
    assert_eq!(completion.call_count(), 1);
}

#[tokio::test]
async fn diagnose_execute_keeps_whitespace_in_file_names() {
    let dir = tempfile::tempdir().expect("tempdir");
    let photo = dir.path().join(" leaf.png ");
    std::fs::write(&photo, [0x89, 0x50, 0x4e, 0x47]).expect("write photo");
    let completion = Arc::new(ScriptedCompletion::new(["Healthy leaf."]));
    let runtime = runtime_with(completion.clone());

    let result = diagnose::execute(&runtime, &photo, "English").await;

    assert_eq!(result.exit_code, 0);
    assert_eq!(result.output, "Healthy leaf.");
    assert!(completion.last_image().is_some());
}

fn runtime(replies: &[&str]) -> AgentRuntime {
    runtime_with(Arc::new(ScriptedCompletion::new(replies.iter().copied())))
}

fn runtime_with(completion: Arc<ScriptedCompletion>) -> AgentRuntime {
    AgentRuntime::new(AgentClients {
        completion,
        weather: Arc::new(StaticWeather::returning(WeatherObservation {
            city: "Pune".to_string(),
            description: "light rain".to_string(),
            temperature_c: 24.0,
            humidity_pct: Some(80.0),
        })),
        market: Arc::new(StaticMarket::returning(Vec::new())),
    })
}

fn check<'a>(payload: &'a Value, name: &str) -> &'a Value {
    payload["checks"]
        .as_array()
        .and_then(|checks| checks.iter().find(|check| check["name"] == name))
        .unwrap_or_else(|| panic!("missing check {name}"))
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "KISAN_LLM_API_KEY",
        "KISAN_LLM_BASE_URL",
        "KISAN_LLM_MODEL",
        "GOOGLE_API_KEY",
        "KISAN_WEATHER_API_KEY",
        "KISAN_WEATHER_BASE_URL",
        "OPENWEATHER_API_KEY",
        "KISAN_MARKET_API_KEY",
        "KISAN_MARKET_BASE_URL",
        "KISAN_MARKET_RESOURCE_ID",
        "KISAN_MARKET_LIMIT",
        "DATA_GOV_IN_API_KEY",
        "KISAN_SERVER_BIND_ADDRESS",
        "KISAN_SERVER_PORT",
        "KISAN_SERVER_UPLOAD_DIR",
        "KISAN_ASSISTANT_DEFAULT_LANGUAGE",
        "KISAN_LOGGING_LEVEL",
        "KISAN_LOGGING_FORMAT",
        "KISAN_LOG_LEVEL",
        "KISAN_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
