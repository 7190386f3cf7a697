use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::agent::AgentName;

/// String-to-string parameter bag extracted by the router.
///
/// Keys are never validated against a schema. Readers go through
/// [`Parameters::value`], which treats a missing key, an empty string, and
/// whitespace alike as absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters(BTreeMap<String, String>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|value| value.trim()).filter(|value| !value.is_empty())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    /// Coerces an untrusted JSON object into parameters.
    ///
    /// Strings are kept, numbers and booleans are rendered as text, and null,
    /// arrays, or nested objects are dropped.
    pub fn from_json_object(object: &Map<String, Value>) -> Self {
        let entries = object
            .iter()
            .filter_map(|(key, value)| {
                let coerced = match value {
                    Value::String(text) => text.clone(),
                    Value::Number(number) => number.to_string(),
                    Value::Bool(flag) => flag.to_string(),
                    Value::Null | Value::Array(_) | Value::Object(_) => return None,
                };
                Some((key.clone(), coerced))
            })
            .collect();
        Self(entries)
    }
}

/// Output of one routing call. Created per query, consumed once by dispatch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDecision {
    pub agent: AgentName,
    #[serde(default)]
    pub parameters: Parameters,
}

impl RouteDecision {
    pub fn new(agent: AgentName, parameters: Parameters) -> Self {
        Self { agent, parameters }
    }

    pub fn unclear() -> Self {
        Self { agent: AgentName::Unclear, parameters: Parameters::new() }
    }

    pub fn is_unclear(&self) -> bool {
        self.agent == AgentName::Unclear
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Parameters, RouteDecision};
    use crate::domain::agent::AgentName;

    #[test]
    fn blank_values_read_as_absent() {
        let parameters = Parameters::new().with("city", "   ").with("market", "Agra");

        assert_eq!(parameters.value("city"), None);
        assert_eq!(parameters.value("commodity"), None);
        assert_eq!(parameters.value("market"), Some("Agra"));
    }

    #[test]
    fn json_coercion_keeps_scalars_and_drops_structures() {
        let object = json!({
            "city": "Pune",
            "days": 3,
            "metric": true,
            "nothing": null,
            "list": ["a"],
            "nested": {"k": "v"}
        });
        let parameters =
            Parameters::from_json_object(object.as_object().expect("fixture is an object"));

        assert_eq!(parameters.len(), 3);
        assert_eq!(parameters.value("city"), Some("Pune"));
        assert_eq!(parameters.value("days"), Some("3"));
        assert_eq!(parameters.value("metric"), Some("true"));
        assert_eq!(parameters.value("nested"), None);
    }

    #[test]
    fn decision_serializes_with_routing_labels() {
        let decision = RouteDecision::new(
            AgentName::Market,
            Parameters::new().with("commodity", "Potato").with("market", "Agra"),
        );

        let encoded = serde_json::to_value(&decision).expect("serialize");
        assert_eq!(
            encoded,
            json!({"agent": "MarketAgent", "parameters": {"commodity": "Potato", "market": "Agra"}})
        );
    }

    #[test]
    fn unclear_decision_is_empty() {
        let decision = RouteDecision::unclear();
        assert!(decision.is_unclear());
        assert!(decision.parameters.is_empty());
    }
}
