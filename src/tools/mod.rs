//! Tool registry.
//!
//! Holds the static tool catalog and turns raw `tools/call` arguments into
//! validated [`ConvertRequest`]s.

pub mod kana;
pub mod schema;

use serde_json::{Map, Value as JsonValue};

use crate::error::{McpError, Result};

pub use kana::{ConversionTool, ConvertRequest};
pub use schema::{ParamKind, ParamSpec, ParamValue, ParameterSchema, ValidatedArgs};

/// A tool definition for the MCP tools/list response.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDef {
    /// Tool name (e.g., "convert_to_hiragana")
    pub name: String,
    /// Tool description
    pub description: String,
    /// Declared parameters
    pub schema: ParameterSchema,
}

impl ToolDef {
    /// Create a new tool definition.
    pub fn new(name: &str, description: &str, schema: ParameterSchema) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            schema,
        }
    }

    /// Wire form: `{name, description, inputSchema}`.
    pub fn to_json(&self) -> JsonValue {
        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.schema.to_json()
        })
    }
}

/// Registry of all available tools.
pub struct ToolRegistry {
    tools: Vec<ToolDef>,
}

impl ToolRegistry {
    /// Create a new registry with all tools registered.
    pub fn new() -> Self {
        Self {
            tools: kana::tools(),
        }
    }

    /// Get all tool definitions.
    pub fn tools(&self) -> &[ToolDef] {
        &self.tools
    }

    /// Find a tool definition by name.
    pub fn get(&self, name: &str) -> Option<&ToolDef> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Validate a tool call against the tool's schema.
    ///
    /// Pure: no converter is built here.
    pub fn validate(&self, name: &str, args: &Map<String, JsonValue>) -> Result<ConvertRequest> {
        let (def, tool) = self
            .get(name)
            .zip(ConversionTool::from_name(name))
            .ok_or_else(|| McpError::UnknownTool(name.to_string()))?;

        let validated = def.schema.validate(args)?;
        ConvertRequest::from_args(tool, &validated)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
