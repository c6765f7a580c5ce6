//! Response envelope definitions
//!
//! Every `api.php` reply is a JSON object that may carry an `error` object,
//! a `warnings` map and an action-specific payload. [`CoreResponse`] holds
//! the shared part; each action's response flattens it next to its payload.

use super::serde_helpers::WireBool;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::collections::BTreeMap;

/// Non-fatal messages keyed by the module that raised them
pub type Warnings = BTreeMap<String, Value>;

/// `continue` object of a partial result; send it back to get the next page
pub type Continuation = BTreeMap<String, Value>;

/// API-level error object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Machine-readable code, e.g. `badtoken`
    pub code: String,
    /// Human-readable message
    pub info: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docref: Option<String>,
}

/// Fields every envelope may carry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoreResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Warnings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batchcomplete: Option<WireBool>,

    /// Continuation parameters for the next page of a query
    #[serde(rename = "continue", default, skip_serializing_if = "Option::is_none")]
    pub continuation: Option<Continuation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servedby: Option<String>,
}

impl CoreResponse {
    /// Whether every property module finished its batch
    pub fn is_batch_complete(&self) -> bool {
        self.batchcomplete.as_ref().is_some_and(WireBool::value)
    }
}

/// A decodable response shape
pub trait Envelope: DeserializeOwned + Serialize + Send {
    /// Shared envelope fields
    fn core(&self) -> &CoreResponse;

    /// Whether the action-specific success payload is present
    fn has_payload(&self) -> bool;

    fn error(&self) -> Option<&ApiError> {
        self.core().error.as_ref()
    }

    fn warnings(&self) -> Option<&Warnings> {
        self.core().warnings.as_ref()
    }

    /// Parameters for the next page, when the result is partial
    fn continuation(&self) -> Option<&Continuation> {
        self.core().continuation.as_ref()
    }
}

impl Envelope for CoreResponse {
    fn core(&self) -> &CoreResponse {
        self
    }

    fn has_payload(&self) -> bool {
        false
    }
}

/// Reply to `action=query&meta=tokens`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokensResponse {
    #[serde(flatten)]
    pub core: CoreResponse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<TokensQuery>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokensQuery {
    #[serde(default)]
    pub tokens: BTreeMap<String, String>,
}

impl TokensResponse {
    /// Token stored under `<kind>token`, if present and non-empty
    pub fn token(&self, kind: &str) -> Option<&str> {
        self.query
            .as_ref()?
            .tokens
            .get(&format!("{}token", kind))
            .map(String::as_str)
            .filter(|t| !t.is_empty())
    }
}

impl Envelope for TokensResponse {
    fn core(&self) -> &CoreResponse {
        &self.core
    }

    fn has_payload(&self) -> bool {
        self.query.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_parse_full_envelope() {
        let body = json!({
            "batchcomplete": "",
            "warnings": {"tokens": {"*": "Warning!"}},
            "query": {"tokens": {"logintoken": "!!TOKEN!!"}},
            "error": {"code": "anerror", "info": "You got an error."}
        });

        let r: TokensResponse = serde_json::from_value(body).unwrap();

        assert!(r.core.is_batch_complete());
        assert_eq!(r.core.batchcomplete, Some(WireBool::Text(String::new())));
        assert_eq!(r.warnings().unwrap()["tokens"]["*"], "Warning!");
        assert_eq!(r.token("login"), Some("!!TOKEN!!"));
        let error = r.error().unwrap();
        assert_eq!(error.code, "anerror");
        assert_eq!(error.info, "You got an error.");
    }

    #[test]
    fn test_empty_token_is_absent() {
        let r: TokensResponse =
            serde_json::from_value(json!({"query": {"tokens": {"csrftoken": ""}}})).unwrap();
        assert_eq!(r.token("csrf"), None);
        assert_eq!(r.token("watch"), None);
    }

    #[test]
    fn test_continuation_round_trip() {
        let body = json!({
            "batchcomplete": false,
            "continue": {"rvcontinue": "20240101|42", "continue": "||"},
            "query": {"tokens": {}}
        });
        let r: TokensResponse = serde_json::from_value(body.clone()).unwrap();
        assert_eq!(r.continuation().unwrap()["rvcontinue"], "20240101|42");
        assert!(!r.core.is_batch_complete());
        assert_eq!(serde_json::to_value(&r).unwrap(), body);
    }

    #[test]
    fn test_informational_envelope_has_no_payload() {
        let r: CoreResponse = serde_json::from_value(json!({"batchcomplete": true})).unwrap();
        assert!(!r.has_payload());
        assert!(r.error().is_none());
    }
}
