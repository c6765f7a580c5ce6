//! Custom serde deserializers for flexible type handling
//!
//! The API encodes boolean flags differently depending on `formatversion`:
//! version 2 sends JSON booleans, version 1 sends an empty string for true
//! and omits the key for false.

use serde::{Deserialize, Deserializer, Serialize, de};

/// A flag kept in the encoding it arrived in.
///
/// Envelope-level flags such as `batchcomplete` come back as `""` from
/// formatversion 1 and as `true` from formatversion 2. Keeping the wire form
/// lets the decoded envelope re-encode to exactly what the server sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireBool {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl WireBool {
    /// Truth value under the API's rules: `""` marks a set flag
    pub fn value(&self) -> bool {
        match self {
            WireBool::Bool(b) => *b,
            WireBool::Int(i) => *i > 0,
            WireBool::Text(s) => !matches!(s.trim().to_lowercase().as_str(), "false" | "0"),
        }
    }
}

impl From<bool> for WireBool {
    fn from(value: bool) -> Self {
        WireBool::Bool(value)
    }
}

/// Deserialize a flag that can be:
/// - JSON boolean: `true`, `false`
/// - Integer: `0` (false), positive integer (true)
/// - String: `""` (formatversion 1 "present" marker, true), `"0"`, `"1"`,
///   `"false"`, `"true"` (case-insensitive)
///
/// Use with `#[serde(default)]` so an absent key reads as `None`.
pub fn deserialize_flexible_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum FlexibleBool {
        Bool(bool),
        Int(i64),
        String(String),
    }

    let value: Option<FlexibleBool> = Option::deserialize(deserializer)?;

    match value {
        None => Ok(None),
        Some(FlexibleBool::Bool(b)) => Ok(Some(b)),
        Some(FlexibleBool::Int(i)) => Ok(Some(i > 0)),
        Some(FlexibleBool::String(s)) => {
            let s_lower = s.trim().to_lowercase();
            match s_lower.as_str() {
                "" | "true" | "1" => Ok(Some(true)),
                "false" | "0" => Ok(Some(false)),
                _ => Err(de::Error::custom(format!("invalid boolean string: {}", s))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct TestStruct {
        #[serde(default, deserialize_with = "deserialize_flexible_bool")]
        value: Option<bool>,
    }

    fn parse(value: serde_json::Value) -> Result<Option<bool>, serde_json::Error> {
        serde_json::from_value::<TestStruct>(value).map(|s| s.value)
    }

    #[test]
    fn test_deserialize_json_bool() {
        assert_eq!(parse(json!({"value": true})).unwrap(), Some(true));
        assert_eq!(parse(json!({"value": false})).unwrap(), Some(false));
    }

    #[test]
    fn test_deserialize_formatversion1_marker() {
        assert_eq!(parse(json!({"value": ""})).unwrap(), Some(true));
    }

    #[test]
    fn test_deserialize_ints() {
        assert_eq!(parse(json!({"value": 0})).unwrap(), Some(false));
        assert_eq!(parse(json!({"value": 1})).unwrap(), Some(true));
        assert_eq!(parse(json!({"value": -1})).unwrap(), Some(false));
    }

    #[test]
    fn test_deserialize_strings_case_insensitive() {
        assert_eq!(parse(json!({"value": "True"})).unwrap(), Some(true));
        assert_eq!(parse(json!({"value": " 0 "})).unwrap(), Some(false));
        assert_eq!(parse(json!({"value": "FALSE"})).unwrap(), Some(false));
    }

    #[test]
    fn test_deserialize_missing_and_null() {
        assert_eq!(parse(json!({})).unwrap(), None);
        assert_eq!(parse(json!({"value": null})).unwrap(), None);
    }

    #[test]
    fn test_wire_bool_keeps_encoding() {
        for raw in [json!(""), json!(true), json!(false), json!(1), json!("0")] {
            let flag: WireBool = serde_json::from_value(raw.clone()).unwrap();
            assert_eq!(serde_json::to_value(&flag).unwrap(), raw);
        }
    }

    #[test]
    fn test_wire_bool_value() {
        assert!(WireBool::Text(String::new()).value());
        assert!(WireBool::Bool(true).value());
        assert!(!WireBool::Bool(false).value());
        assert!(!WireBool::Int(0).value());
        assert!(!WireBool::Text("0".to_string()).value());
    }

    #[test]
    fn test_deserialize_invalid_string() {
        let err = parse(json!({"value": "yes"})).unwrap_err();
        assert!(err.to_string().contains("invalid boolean string"));
    }
}
