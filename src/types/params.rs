//! Request envelope
//!
//! The flat string-keyed parameter map sent to `api.php`, and the option
//! functions action builders use to fill it.

use super::response::Continuation;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A deferred mutation of the request parameters
pub type ParamOption = Arc<dyn Fn(&mut Params) + Send + Sync>;

/// Outbound parameter map. Later writes to the same key win.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, String>);

impl Params {
    /// Empty parameter map
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameter map with `action` already set
    pub fn action(name: &str) -> Self {
        let mut params = Self::new();
        params.set("action", name);
        params
    }

    /// Set `key`, replacing any previous value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Builder-style [`Params::set`]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Remove `key`, returning its value
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// Value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Whether `key` is set
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Apply options in order
    pub fn apply(&mut self, options: &[ParamOption]) {
        for option in options {
            option(self);
        }
    }

    /// Iterate over key/value pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Passwords and tokens travel in here.
impl fmt::Debug for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.0 {
            if is_secret(key) {
                map.entry(key, &"<redacted>");
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}

fn is_secret(key: &str) -> bool {
    key.ends_with("password") || key.ends_with("token")
}

/// Option setting `key` to `value`
pub fn param(key: impl Into<String>, value: impl Into<String>) -> ParamOption {
    let key = key.into();
    let value = value.into();
    Arc::new(move |params: &mut Params| {
        params.set(key.clone(), value.clone());
    })
}

/// Option for a boolean parameter. The API treats any present value as
/// true, so `false` removes the key instead of sending "false".
pub fn flag(key: impl Into<String>, on: bool) -> ParamOption {
    let key = key.into();
    Arc::new(move |params: &mut Params| {
        if on {
            params.set(key.clone(), "1");
        } else {
            params.remove(&key);
        }
    })
}

/// Option for a multi-value parameter, joined with `|`
pub fn list<I, S>(key: impl Into<String>, values: I) -> ParamOption
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = values
        .into_iter()
        .map(|v| v.as_ref().to_string())
        .collect::<Vec<_>>()
        .join("|");
    param(key, joined)
}

/// Option echoing a `continue` object back to fetch the next page
pub fn continuation(next: &Continuation) -> ParamOption {
    let pairs: Vec<(String, String)> = next
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect();
    Arc::new(move |params: &mut Params| {
        for (key, value) in &pairs {
            params.set(key.clone(), value.clone());
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_action_constructor() {
        let params = Params::action("edit");
        assert_eq!(params.get("action"), Some("edit"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_options_apply_in_order_last_write_wins() {
        let mut params = Params::action("edit");
        params.apply(&[param("title", "First"), param("summary", "s"), param("title", "Second")]);

        assert_eq!(params.get("title"), Some("Second"));
        assert_eq!(params.get("summary"), Some("s"));
    }

    #[test]
    fn test_flag_sets_and_clears() {
        let mut params = Params::new();
        params.apply(&[flag("minor", true)]);
        assert_eq!(params.get("minor"), Some("1"));

        params.apply(&[flag("minor", false)]);
        assert!(!params.contains("minor"));
    }

    #[test]
    fn test_list_joins_with_pipe() {
        let mut params = Params::new();
        params.apply(&[list("titles", ["A", "B", "C"])]);
        assert_eq!(params.get("titles"), Some("A|B|C"));
    }

    #[test]
    fn test_continuation_echoes_every_key() {
        let next: Continuation = serde_json::from_str(
            r#"{"apcontinue":"Banana","continue":"-||","offset":20}"#,
        )
        .unwrap();
        let mut params = Params::action("query");
        params.apply(&[continuation(&next)]);

        assert_eq!(params.get("apcontinue"), Some("Banana"));
        assert_eq!(params.get("continue"), Some("-||"));
        assert_eq!(params.get("offset"), Some("20"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let params = Params::action("login")
            .with("lgname", "Bot")
            .with("lgpassword", "hunter2")
            .with("lgtoken", "abc+\\");
        let debug = format!("{:?}", params);
        assert!(debug.contains("Bot"));
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("abc+"));
    }

    #[test]
    fn test_serializes_as_flat_map() {
        let params = Params::action("query").with("meta", "tokens");
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json, serde_json::json!({"action": "query", "meta": "tokens"}));
    }
}
