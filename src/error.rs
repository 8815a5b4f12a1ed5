//! Error types for the MCP server.
//!
//! Validation and invocation errors end up as text content in a tool result;
//! only protocol and transport errors reach the JSON-RPC error object.

use std::time::Duration;

/// MCP server errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum McpError {
    /// Unknown tool requested.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Missing required argument.
    #[error("missing required argument: {0}")]
    MissingArg(String),

    /// Argument present but not coercible to the declared type.
    #[error("invalid argument '{name}': expected {expected}")]
    TypeMismatch {
        /// Argument name
        name: String,
        /// Declared type of the argument
        expected: &'static str,
    },

    /// Argument outside a strict enumeration.
    #[error("invalid argument '{name}': '{value}' is not one of {allowed}")]
    InvalidEnumValue {
        /// Argument name
        name: String,
        /// Value as received
        value: String,
        /// Comma separated list of allowed values
        allowed: String,
    },

    /// The converter failed to build or to convert.
    #[error("{0}")]
    Invocation(String),

    /// The converter did not finish in time.
    #[error("conversion timed out after {0:?}")]
    Timeout(Duration),

    /// JSON-RPC protocol error.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for McpError {
    fn from(err: std::io::Error) -> Self {
        McpError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for McpError {
    fn from(err: serde_json::Error) -> Self {
        McpError::Protocol(format!("JSON error: {}", err))
    }
}

/// JSON-RPC error codes.
pub mod rpc_codes {
    /// Parse error - Invalid JSON was received.
    pub const PARSE_ERROR: i32 = -32700;
    /// Invalid Request - The JSON sent is not a valid Request object.
    pub const INVALID_REQUEST: i32 = -32600;
    /// Method not found - The method does not exist / is not available.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid params - Invalid method parameter(s).
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal error - Internal JSON-RPC error.
    pub const INTERNAL_ERROR: i32 = -32603;
}

impl McpError {
    /// Convert to JSON-RPC error code.
    pub fn rpc_code(&self) -> i32 {
        match self {
            McpError::UnknownTool(_) => rpc_codes::METHOD_NOT_FOUND,
            McpError::MissingArg(_)
            | McpError::TypeMismatch { .. }
            | McpError::InvalidEnumValue { .. } => rpc_codes::INVALID_PARAMS,
            McpError::Protocol(_) => rpc_codes::INVALID_REQUEST,
            _ => rpc_codes::INTERNAL_ERROR,
        }
    }

    /// The argument a validation error refers to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            McpError::MissingArg(name)
            | McpError::TypeMismatch { name, .. }
            | McpError::InvalidEnumValue { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Whether the error was raised before any converter was touched.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            McpError::UnknownTool(_)
                | McpError::MissingArg(_)
                | McpError::TypeMismatch { .. }
                | McpError::InvalidEnumValue { .. }
        )
    }
}

/// Result type for MCP operations.
pub type Result<T> = std::result::Result<T, McpError>;
