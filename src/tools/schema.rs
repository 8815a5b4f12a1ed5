//! Declared tool parameters.
//!
//! A [`ParameterSchema`] is the single description of a tool's arguments:
//! it renders the JSON Schema published by `tools/list` and validates the
//! arguments of `tools/call`, filling in defaults.

use std::collections::HashMap;

use serde_json::{Map, Value as JsonValue};

use crate::error::{McpError, Result};

/// Type of a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    /// Any JSON string.
    String,
    /// Boolean, with lax coercion from numbers and strings.
    Boolean,
    /// String from a fixed set, matched case-insensitively.
    ///
    /// With a `fallback`, unmatched values resolve to it instead of failing.
    Enum {
        /// Allowed values, lowercase.
        values: &'static [&'static str],
        /// Value used when the input matches nothing.
        fallback: Option<&'static str>,
    },
}

impl ParamKind {
    fn type_name(&self) -> &'static str {
        match self {
            ParamKind::Boolean => "boolean",
            ParamKind::String | ParamKind::Enum { .. } => "string",
        }
    }
}

/// A validated (or default) parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// String or enum value.
    Str(String),
    /// Boolean value.
    Bool(bool),
}

impl ParamValue {
    fn to_json(&self) -> JsonValue {
        match self {
            ParamValue::Str(s) => JsonValue::String(s.clone()),
            ParamValue::Bool(b) => JsonValue::Bool(*b),
        }
    }
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    /// Argument name.
    pub name: &'static str,
    /// Human readable description.
    pub description: String,
    /// Declared type.
    pub kind: ParamKind,
    /// Whether the caller must supply the argument.
    pub required: bool,
    /// Value used when the argument is absent.
    pub default: Option<ParamValue>,
}

impl ParamSpec {
    /// A required parameter.
    pub fn required(name: &'static str, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            name,
            description: description.into(),
            kind,
            required: true,
            default: None,
        }
    }

    /// An optional parameter with a default.
    pub fn optional(
        name: &'static str,
        kind: ParamKind,
        default: ParamValue,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name,
            description: description.into(),
            kind,
            required: false,
            default: Some(default),
        }
    }

    fn to_json(&self) -> JsonValue {
        let mut prop = Map::new();
        prop.insert("type".to_string(), self.kind.type_name().into());
        if let Some(default) = &self.default {
            prop.insert("default".to_string(), default.to_json());
        }
        if let ParamKind::Enum { values, .. } = &self.kind {
            prop.insert("enum".to_string(), (*values).into());
        }
        prop.insert("description".to_string(), self.description.clone().into());
        JsonValue::Object(prop)
    }

    fn coerce(&self, value: &JsonValue) -> Result<ParamValue> {
        let mismatch = || McpError::TypeMismatch {
            name: self.name.to_string(),
            expected: self.kind.type_name(),
        };

        match &self.kind {
            ParamKind::String => value
                .as_str()
                .map(|s| ParamValue::Str(s.to_string()))
                .ok_or_else(mismatch),
            ParamKind::Boolean => coerce_bool(value).map(ParamValue::Bool).ok_or_else(mismatch),
            ParamKind::Enum { values, fallback } => {
                let raw = value.as_str().ok_or_else(mismatch)?;
                let folded = raw.to_lowercase();
                match values.iter().find(|v| **v == folded) {
                    Some(v) => Ok(ParamValue::Str(v.to_string())),
                    None => match fallback {
                        Some(f) => {
                            tracing::debug!(
                                param = self.name,
                                value = raw,
                                fallback = f,
                                "Unrecognized enum value, using fallback"
                            );
                            Ok(ParamValue::Str(f.to_string()))
                        }
                        None => Err(McpError::InvalidEnumValue {
                            name: self.name.to_string(),
                            value: raw.to_string(),
                            allowed: values.join(", "),
                        }),
                    },
                }
            }
        }
    }
}

/// Lax boolean coercion: booleans, 0/1, and the usual yes/no spellings.
fn coerce_bool(value: &JsonValue) -> Option<bool> {
    match value {
        JsonValue::Bool(b) => Some(*b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        JsonValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "on" | "1" => Some(true),
            "false" | "f" | "no" | "n" | "off" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Ordered parameter declarations of a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSchema {
    params: Vec<ParamSpec>,
}

impl ParameterSchema {
    /// Create a schema from parameters in declaration order.
    pub fn new(params: Vec<ParamSpec>) -> Self {
        Self { params }
    }

    /// Declared parameters.
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Render as a JSON Schema object.
    pub fn to_json(&self) -> JsonValue {
        let props: Map<String, JsonValue> = self
            .params
            .iter()
            .map(|p| (p.name.to_string(), p.to_json()))
            .collect();
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();

        serde_json::json!({
            "type": "object",
            "properties": props,
            "required": required
        })
    }

    /// Validate arguments, applying defaults. Unknown arguments are ignored.
    pub fn validate(&self, args: &Map<String, JsonValue>) -> Result<ValidatedArgs> {
        let mut values = HashMap::with_capacity(self.params.len());

        for param in &self.params {
            let value = match args.get(param.name) {
                Some(raw) => param.coerce(raw)?,
                None => match &param.default {
                    Some(default) => default.clone(),
                    None if param.required => {
                        return Err(McpError::MissingArg(param.name.to_string()))
                    }
                    None => continue,
                },
            };
            values.insert(param.name, value);
        }

        Ok(ValidatedArgs { values })
    }
}

/// Arguments after validation, every declared default filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedArgs {
    values: HashMap<&'static str, ParamValue>,
}

impl ValidatedArgs {
    /// A string or enum argument.
    pub fn string(&self, name: &str) -> Result<&str> {
        match self.values.get(name) {
            Some(ParamValue::Str(s)) => Ok(s.as_str()),
            _ => Err(McpError::Internal(format!("no string argument '{}'", name))),
        }
    }

    /// A boolean argument.
    pub fn boolean(&self, name: &str) -> Result<bool> {
        match self.values.get(name) {
            Some(ParamValue::Bool(b)) => Ok(*b),
            _ => Err(McpError::Internal(format!("no boolean argument '{}'", name))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const COLORS: &[&str] = &["red", "green"];

    fn schema(fallback: Option<&'static str>) -> ParameterSchema {
        ParameterSchema::new(vec![
            ParamSpec::required("text", ParamKind::String, "Input"),
            ParamSpec::optional("flag", ParamKind::Boolean, ParamValue::Bool(true), "A flag"),
            ParamSpec::optional(
                "color",
                ParamKind::Enum {
                    values: COLORS,
                    fallback,
                },
                ParamValue::Str("red".to_string()),
                "A color",
            ),
        ])
    }

    fn args(value: JsonValue) -> Map<String, JsonValue> {
        match value {
            JsonValue::Object(m) => m,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_defaults_applied() {
        let validated = schema(None).validate(&args(json!({"text": ""}))).unwrap();
        assert_eq!(validated.string("text").unwrap(), "");
        assert!(validated.boolean("flag").unwrap());
        assert_eq!(validated.string("color").unwrap(), "red");
    }

    #[test]
    fn test_missing_required() {
        let err = schema(None).validate(&args(json!({"flag": false}))).unwrap_err();
        assert_eq!(err, McpError::MissingArg("text".to_string()));
    }

    #[test]
    fn test_string_is_not_coerced() {
        let err = schema(None).validate(&args(json!({"text": 42}))).unwrap_err();
        assert_eq!(err.field(), Some("text"));
        assert!(matches!(err, McpError::TypeMismatch { expected: "string", .. }));
    }

    #[test]
    fn test_boolean_coercion() {
        let s = schema(None);
        for (raw, expected) in [
            (json!(false), false),
            (json!(1), true),
            (json!("No"), false),
            (json!("true"), true),
        ] {
            let validated = s.validate(&args(json!({"text": "x", "flag": raw}))).unwrap();
            assert_eq!(validated.boolean("flag").unwrap(), expected);
        }

        for raw in [json!("maybe"), json!(2), json!(null), json!([true])] {
            let err = s.validate(&args(json!({"text": "x", "flag": raw}))).unwrap_err();
            assert!(matches!(err, McpError::TypeMismatch { expected: "boolean", .. }));
        }
    }

    #[test]
    fn test_strict_enum_rejects() {
        let err = schema(None)
            .validate(&args(json!({"text": "x", "color": "blue"})))
            .unwrap_err();
        assert_eq!(
            err,
            McpError::InvalidEnumValue {
                name: "color".to_string(),
                value: "blue".to_string(),
                allowed: "red, green".to_string(),
            }
        );
    }

    #[test]
    fn test_lenient_enum_folds_case_and_falls_back() {
        let s = schema(Some("red"));
        let validated = s.validate(&args(json!({"text": "x", "color": "GREEN"}))).unwrap();
        assert_eq!(validated.string("color").unwrap(), "green");

        let validated = s.validate(&args(json!({"text": "x", "color": "blue"}))).unwrap();
        assert_eq!(validated.string("color").unwrap(), "red");
    }

    #[test]
    fn test_json_schema_shape() {
        let rendered = schema(None).to_json();
        assert_eq!(rendered["type"], "object");
        assert_eq!(rendered["required"], json!(["text"]));
        assert_eq!(rendered["properties"]["flag"]["default"], json!(true));
        assert_eq!(rendered["properties"]["color"]["enum"], json!(["red", "green"]));
        assert!(rendered["properties"]["text"].get("default").is_none());
    }
}
