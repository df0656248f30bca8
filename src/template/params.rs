//! Template tag parameters.
//!
//! The payload of `!{{name}{payload}}` is a JSON object whose braces may be
//! omitted. Values are kept in payload order and converted to text when they
//! replace `{{key}}` placeholders.

use compact_str::CompactString;
use serde_json::{Map, Number, Value};
use std::fmt;

/// A single parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Str(String),
    Number(Number),
    Bool(bool),
    Null,
    /// Nested array or object, kept as compact JSON text.
    Json(String),
}

impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => Self::Str(s),
            Value::Number(n) => Self::Number(n),
            Value::Bool(b) => Self::Bool(b),
            Value::Null => Self::Null,
            nested @ (Value::Array(_) | Value::Object(_)) => Self::Json(nested.to_string()),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) | Self::Json(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Null => f.write_str("null"),
        }
    }
}

/// Ordered key → value mapping parsed from a tag payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(Vec<(CompactString, ParamValue)>);

impl Params {
    /// Parse a raw tag payload.
    ///
    /// Empty and `{}` payloads give no parameters. Braces are added when the
    /// trimmed payload is not already wrapped in them.
    pub fn parse(payload: &str) -> Result<Self, serde_json::Error> {
        let payload = payload.trim();
        if payload.is_empty() || payload == "{}" {
            return Ok(Self::default());
        }

        let object: Map<String, Value> = if payload.starts_with('{') && payload.ends_with('}') {
            serde_json::from_str(payload)?
        } else {
            serde_json::from_str(&format!("{{{payload}}}"))?
        };

        Ok(Self(
            object
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        ))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Replace every `{{key}}` in `body`, in payload order.
    ///
    /// Placeholders without a matching key are left as they are.
    pub fn apply(&self, body: &str) -> String {
        let mut out = body.to_owned();
        if self.is_empty() {
            return out;
        }
        for (key, value) in &self.0 {
            let placeholder = format!("{{{{{key}}}}}");
            if out.contains(&placeholder) {
                out = out.replace(&placeholder, &value.to_string());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get<'a>(params: &'a Params, key: &str) -> Option<&'a ParamValue> {
        params.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    #[test]
    fn test_empty_payloads() {
        assert!(Params::parse("").unwrap().is_empty());
        assert!(Params::parse("   \n ").unwrap().is_empty());
        assert!(Params::parse("{}").unwrap().is_empty());
        assert!(Params::parse(" {} ").unwrap().is_empty());
    }

    #[test]
    fn test_braces_are_optional() {
        let wrapped = Params::parse(r#"{"title": "Hi", "n": 3}"#).unwrap();
        let bare = Params::parse(r#""title": "Hi", "n": 3"#).unwrap();

        assert_eq!(wrapped, bare);
        assert_eq!(get(&bare, "title"), Some(&ParamValue::Str("Hi".into())));
    }

    #[test]
    fn test_invalid_payload() {
        assert!(Params::parse("not json").is_err());
        assert!(Params::parse(r#""a": "#).is_err());
        assert!(Params::parse("[1, 2]").is_err());
    }

    #[test]
    fn test_value_conversion() {
        let params = Params::parse(
            r#""s": "text", "i": 42, "f": 1.5, "t": true, "z": null, "a": [1, "x"], "o": {"k": 1}"#,
        )
        .unwrap();

        let shown: Vec<String> = ["s", "i", "f", "t", "z", "a", "o"]
            .iter()
            .map(|k| get(&params, k).unwrap().to_string())
            .collect();
        assert_eq!(
            shown,
            ["text", "42", "1.5", "true", "null", r#"[1,"x"]"#, r#"{"k":1}"#]
        );
    }

    #[test]
    fn test_order_is_preserved() {
        let params = Params::parse(r#""z": 1, "a": 2, "m": 3"#).unwrap();
        let keys: Vec<&str> = params.0.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn test_apply_replaces_all_occurrences() {
        let params = Params::parse(r#""name": "Ada""#).unwrap();
        assert_eq!(
            params.apply("{{name}} and {{name}}, {{other}}"),
            "Ada and Ada, {{other}}"
        );
    }

    #[test]
    fn test_apply_without_params_is_identity() {
        let body = "# {{title}}\n\n{{body}}";
        assert_eq!(Params::default().apply(body), body);
    }
}
