use std::sync::Arc;

use kisan_core::{AgentName, AssistantError, Parameters, RouteDecision};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::llm::CompletionClient;

const AGENT_DESCRIPTIONS: [(AgentName, &str); 7] = [
    (AgentName::Weather, "For questions about weather, forecast, rain, temperature, humidity."),
    (AgentName::Market, "For questions about market prices, mandi rates, crop prices."),
    (AgentName::Scheme, "For questions about government schemes, subsidies, PM-KISAN, loans."),
    (
        AgentName::Soil,
        "For questions describing soil type (e.g., \"my soil is red and sandy\", \"black and sticky\").",
    ),
    (AgentName::Organic, "For questions about organic farming, compost, natural pesticides."),
    (
        AgentName::Crop,
        "For questions about crop diseases, pests, sick plants (usually triggered by a photo).",
    ),
    (AgentName::General, "For polite closings like \"thank you\", \"ok\", \"bye\"."),
];

/// Classifies a free-text query into an agent and its parameters with a
/// single completion call.
///
/// The reply is untrusted: anything that is not a JSON object carrying a
/// string `agent` and an object `parameters` becomes [`RouteDecision::unclear`].
/// There is no retry and no caching.
#[derive(Clone)]
pub struct IntentRouter {
    completion: Arc<dyn CompletionClient>,
}

impl IntentRouter {
    pub fn new(completion: Arc<dyn CompletionClient>) -> Self {
        Self { completion }
    }

    pub async fn route(&self, query: &str, language: &str) -> RouteDecision {
        let prompt = build_prompt(query, language);
        let reply = self.completion.complete(&prompt, None).await;

        match parse_decision(&reply) {
            Ok(decision) => {
                info!(
                    event_name = "agent.router.decision",
                    agent = %decision.agent,
                    parameter_count = decision.parameters.len(),
                    "query routed"
                );
                decision
            }
            Err(error) => {
                warn!(event_name = "agent.router.parse_failed", error = %error, "router reply rejected");
                RouteDecision::unclear()
            }
        }
    }
}

/// Router prompt: the query, the closed label list, one worked example per
/// label, and the reply-shape instruction.
pub fn build_prompt(query: &str, language: &str) -> String {
    let agents = AGENT_DESCRIPTIONS
        .iter()
        .map(|(agent, description)| format!("- \"{}\": {description}", agent.label()))
        .collect::<Vec<_>>()
        .join("\n");

    let examples = worked_examples()
        .into_iter()
        .map(|(query, decision)| format!("- Query: \"{query}\" -> {decision}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are an intelligent router for an agricultural AI assistant called Kisan Mitra. \
Your job is to analyze a farmer's query and determine which expert agent should handle it. \
You must also extract any necessary information (parameters) from the query.\n\n\
The user's query is: \"{query}\"\n\
The farmer is writing in: {language}. Keep parameter values as the farmer wrote them.\n\n\
Here are the available agents and the keywords they respond to:\n{agents}\n\n\
Your response must be a single, clean JSON object with two keys: \"agent\" and \"parameters\".\n\n\
Examples:\n{examples}\n"
    )
}

fn worked_examples() -> Vec<(&'static str, Value)> {
    vec![
        ("weather in hyderabad?", json!({"agent": "WeatherAgent", "parameters": {"city": "Hyderabad"}})),
        (
            "What is the price of potato in Agra?",
            json!({"agent": "MarketAgent", "parameters": {"commodity": "Potato", "market": "Agra"}}),
        ),
        (
            "Tell me about the PM-KISAN scheme",
            json!({"agent": "SchemeAgent", "parameters": {"query": "PM-KISAN scheme"}}),
        ),
        (
            "My soil is black and sticky",
            json!({"agent": "SoilAgent", "parameters": {"query": "My soil is black and sticky"}}),
        ),
        ("Hyderabad", json!({"agent": "WeatherAgent", "parameters": {"city": "Hyderabad"}})),
        (
            "how to make compost",
            json!({"agent": "OrganicAgent", "parameters": {"topic": "how to make compost"}}),
        ),
        ("my tomato leaves have brown spots", json!({"agent": "CropAgent", "parameters": {}})),
        (
            "thank you",
            json!({
                "agent": "General",
                "parameters": {"response": "You're welcome! Let me know if you have more questions."}
            }),
        ),
    ]
}

/// Parses a router reply after trimming it and removing code-fence markers.
///
/// Labels outside the closed set map to `Unclear`; parameter values are
/// coerced to text or dropped.
pub fn parse_decision(reply: &str) -> Result<RouteDecision, AssistantError> {
    let cleaned = reply.trim().replace("```json", "").replace("```", "");
    let value: Value = serde_json::from_str(cleaned.trim())
        .map_err(|error| AssistantError::MalformedRouterOutput(error.to_string()))?;

    let object = value
        .as_object()
        .ok_or_else(|| AssistantError::MalformedRouterOutput("reply is not an object".into()))?;
    let agent = object
        .get("agent")
        .and_then(Value::as_str)
        .ok_or_else(|| AssistantError::MalformedRouterOutput("missing string `agent`".into()))?;
    let parameters = object
        .get("parameters")
        .and_then(Value::as_object)
        .ok_or_else(|| AssistantError::MalformedRouterOutput("missing object `parameters`".into()))?;

    Ok(RouteDecision::new(AgentName::from_label(agent), Parameters::from_json_object(parameters)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use kisan_core::{AgentName, AssistantError, Parameters, RouteDecision};

    use super::{build_prompt, parse_decision, IntentRouter};
    use crate::fixtures::ScriptedCompletion;

    #[test]
    fn prompt_lists_every_label_with_an_example() {
        let prompt = build_prompt("price of onion in Nashik", "Marathi");

        assert!(prompt.contains("The user's query is: \"price of onion in Nashik\""));
        assert!(prompt.contains("Marathi"));
        for label in ["WeatherAgent", "MarketAgent", "SchemeAgent", "SoilAgent", "OrganicAgent", "CropAgent", "General"] {
            assert!(prompt.contains(&format!("- \"{label}\":")), "missing description for {label}");
            assert!(prompt.contains(&format!("\"agent\":\"{label}\"")), "missing example for {label}");
        }
        assert!(prompt.contains("two keys: \"agent\" and \"parameters\""));
    }

    #[test]
    fn fenced_json_is_accepted() {
        let reply = "```json\n{\"agent\": \"MarketAgent\", \"parameters\": {\"commodity\": \"Potato\", \"market\": \"Agra\"}}\n```";

        assert_eq!(
            parse_decision(reply),
            Ok(RouteDecision::new(
                AgentName::Market,
                Parameters::new().with("commodity", "Potato").with("market", "Agra"),
            ))
        );
    }

    #[test]
    fn unknown_label_becomes_unclear_with_parameters_kept() {
        let decision =
            parse_decision(r#"{"agent": "PoetryAgent", "parameters": {"topic": "monsoon"}}"#).expect("parsed");

        assert_eq!(decision.agent, AgentName::Unclear);
        assert_eq!(decision.parameters.value("topic"), Some("monsoon"));
    }

    #[test]
    fn structurally_wrong_replies_are_rejected() {
        for reply in [
            "",
            "[]",
            r#"{"agent": "WeatherAgent"}"#,
            r#"{"parameters": {}}"#,
            r#"{"agent": 7, "parameters": {}}"#,
            r#"{"agent": "WeatherAgent", "parameters": "Pune"}"#,
        ] {
            assert!(
                matches!(parse_decision(reply), Err(AssistantError::MalformedRouterOutput(_))),
                "accepted {reply:?}"
            );
        }
    }

    #[tokio::test]
    async fn chatty_partial_reply_routes_to_unclear() {
        let completion = Arc::new(ScriptedCompletion::new(["Sure! {\"agent\": \"WeatherAgent\"}"]));
        let router = IntentRouter::new(completion.clone());

        let decision = router.route("weather in Pune", "English").await;

        assert_eq!(decision, RouteDecision::unclear());
        assert!(decision.parameters.is_empty());
        assert_eq!(completion.call_count(), 1);
        assert!(completion.prompts()[0].contains("weather in Pune"));
        assert!(completion.images_seen().iter().all(|seen| !seen));
    }

    #[tokio::test]
    async fn well_formed_reply_is_returned_as_is() {
        let completion = Arc::new(ScriptedCompletion::new([
            r#"{"agent": "WeatherAgent", "parameters": {"city": "Hyderabad"}}"#,
        ]));
        let router = IntentRouter::new(completion);

        let decision = router.route("Hyderabad", "Telugu").await;
        assert_eq!(
            decision,
            RouteDecision::new(AgentName::Weather, Parameters::new().with("city", "Hyderabad"))
        );
    }
}
