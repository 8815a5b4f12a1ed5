//! Tool call dispatch.
//!
//! A call is validated, resolved to a cached converter, then invoked on the
//! blocking pool. Every failure along the way becomes a
//! [`ResultEnvelope::Failure`]; nothing escapes as an error.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value as JsonValue};

use crate::cache::ConverterCache;
use crate::converter::TextConverter;
use crate::error::{McpError, Result};
use crate::tools::{ConvertRequest, ToolRegistry};

/// Outcome of one tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultEnvelope {
    /// Converted text, unchanged.
    Success {
        /// Converter output.
        text: String,
    },
    /// Validation or invocation failure.
    Failure {
        /// Human readable message.
        message: String,
        /// Offending argument, for validation errors.
        field: Option<String>,
    },
}

impl ResultEnvelope {
    /// Whether the call succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, ResultEnvelope::Success { .. })
    }

    /// Text shown to the caller: the output, or `Error: <message>`.
    pub fn content_text(&self) -> String {
        match self {
            ResultEnvelope::Success { text } => text.clone(),
            ResultEnvelope::Failure { message, .. } => format!("Error: {}", message),
        }
    }

    /// MCP `tools/call` result with a single text content item.
    pub fn to_json(&self) -> JsonValue {
        serde_json::json!({
            "content": [{
                "type": "text",
                "text": self.content_text()
            }]
        })
    }
}

impl From<McpError> for ResultEnvelope {
    fn from(err: McpError) -> Self {
        ResultEnvelope::Failure {
            field: err.field().map(str::to_string),
            message: err.to_string(),
        }
    }
}

/// Routes tool calls to converters.
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    cache: Arc<ConverterCache>,
    timeout: Option<Duration>,
}

impl Dispatcher {
    /// Create a dispatcher. `timeout` bounds converter lookup plus conversion
    /// for each call, `None` waits forever.
    pub fn new(
        registry: Arc<ToolRegistry>,
        cache: Arc<ConverterCache>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            registry,
            cache,
            timeout,
        }
    }

    /// Run one tool call to a single envelope.
    pub async fn dispatch(&self, name: &str, args: &Map<String, JsonValue>) -> ResultEnvelope {
        match self.try_dispatch(name, args).await {
            Ok(text) => {
                tracing::debug!(tool = name, chars = text.chars().count(), "Tool call succeeded");
                ResultEnvelope::Success { text }
            }
            Err(err) => {
                if err.is_validation() {
                    tracing::warn!(tool = name, error = %err, "Tool call rejected");
                } else {
                    tracing::error!(tool = name, error = %err, "Error in tool");
                }
                err.into()
            }
        }
    }

    async fn try_dispatch(&self, name: &str, args: &Map<String, JsonValue>) -> Result<String> {
        let request = self.registry.validate(name, args)?;

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.run(request))
                .await
                .map_err(|_| McpError::Timeout(limit))?,
            None => self.run(request).await,
        }
    }

    /// Resolve the converter and invoke it. A blocking task left behind by an
    /// expired deadline runs to completion and its result is dropped.
    async fn run(&self, request: ConvertRequest) -> Result<String> {
        let converter = self.cache.get_or_create(&request.config).await?;
        self.invoke(converter, request).await
    }

    async fn invoke(
        &self,
        converter: Arc<dyn TextConverter>,
        request: ConvertRequest,
    ) -> Result<String> {
        let ConvertRequest { tool, text, .. } = request;
        tokio::task::spawn_blocking(move || tool.apply(converter.as_ref(), &text))
            .await
            .map_err(|e| McpError::Invocation(format!("conversion task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::{ConverterFactory, ResolvedConfig};
    use serde_json::json;

    /// Tags output with the tool and separator so routing is visible.
    struct Tagging {
        separator: String,
    }

    impl TextConverter for Tagging {
        fn to_hiragana(&self, text: &str) -> Result<String> {
            Ok(format!("h{}{}", self.separator, text))
        }
        fn to_katakana(&self, text: &str) -> Result<String> {
            if text == "boom" {
                return Err(McpError::Invocation("reading lookup failed".to_string()));
            }
            Ok(format!("k{}{}", self.separator, text))
        }
        fn to_roman(&self, text: &str) -> Result<String> {
            if text == "panic" {
                panic!("converter crashed");
            }
            if text == "slow" {
                std::thread::sleep(Duration::from_millis(500));
            }
            Ok(format!("r{}{}", self.separator, text))
        }
    }

    struct TaggingFactory;

    impl ConverterFactory for TaggingFactory {
        fn build(&self, config: &ResolvedConfig) -> Result<Arc<dyn TextConverter>> {
            if config.use_unidic {
                return Err(McpError::Invocation("unidic not installed".to_string()));
            }
            if config.separator == "slow" {
                std::thread::sleep(Duration::from_millis(500));
            }
            Ok(Arc::new(Tagging {
                separator: config.separator.clone(),
            }))
        }
    }

    fn dispatcher(timeout: Option<Duration>) -> Dispatcher {
        Dispatcher::new(
            Arc::new(ToolRegistry::new()),
            Arc::new(ConverterCache::new(Arc::new(TaggingFactory))),
            timeout,
        )
    }

    fn args(value: JsonValue) -> Map<String, JsonValue> {
        match value {
            JsonValue::Object(m) => m,
            _ => Map::new(),
        }
    }

    #[tokio::test]
    async fn test_routes_by_tool_name() {
        let d = dispatcher(None);
        let a = args(json!({"text": "x", "separator": "|"}));
        assert_eq!(
            d.dispatch("convert_to_hiragana", &a).await,
            ResultEnvelope::Success { text: "h|x".to_string() }
        );
        assert_eq!(d.dispatch("convert_to_katakana", &a).await.content_text(), "k|x");
        assert_eq!(d.dispatch("convert_to_roman", &a).await.content_text(), "r|x");
    }

    #[tokio::test]
    async fn test_validation_failure_tags_field() {
        let d = dispatcher(None);
        let envelope = d
            .dispatch("convert_to_roman", &args(json!({"separator": "/"})))
            .await;
        assert_eq!(
            envelope,
            ResultEnvelope::Failure {
                message: "missing required argument: text".to_string(),
                field: Some("text".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let d = dispatcher(None);
        let envelope = d.dispatch("convert_to_morse", &args(json!({"text": "x"}))).await;
        assert_eq!(envelope.content_text(), "Error: unknown tool: convert_to_morse");
    }

    #[tokio::test]
    async fn test_converter_error_becomes_failure() {
        let d = dispatcher(None);
        let envelope = d
            .dispatch("convert_to_katakana", &args(json!({"text": "boom"})))
            .await;
        assert_eq!(envelope.content_text(), "Error: reading lookup failed");
    }

    #[tokio::test]
    async fn test_construction_error_becomes_failure() {
        let d = dispatcher(None);
        let envelope = d
            .dispatch(
                "convert_to_hiragana",
                &args(json!({"text": "x", "use_unidic": true})),
            )
            .await;
        assert_eq!(envelope.content_text(), "Error: unidic not installed");
    }

    #[tokio::test]
    async fn test_converter_panic_becomes_failure() {
        let d = dispatcher(None);
        let envelope = d
            .dispatch("convert_to_roman", &args(json!({"text": "panic"})))
            .await;
        assert!(!envelope.is_success());
        assert!(envelope.content_text().starts_with("Error: conversion task failed"));
    }

    #[tokio::test]
    async fn test_timeout_becomes_failure() {
        let d = dispatcher(Some(Duration::from_millis(50)));
        let envelope = d
            .dispatch("convert_to_roman", &args(json!({"text": "slow"})))
            .await;
        assert!(envelope.content_text().starts_with("Error: conversion timed out"));
    }

    #[tokio::test]
    async fn test_slow_construction_hits_timeout() {
        let d = dispatcher(Some(Duration::from_millis(50)));
        let started = std::time::Instant::now();
        let envelope = d
            .dispatch(
                "convert_to_hiragana",
                &args(json!({"text": "x", "separator": "slow"})),
            )
            .await;
        assert!(envelope.content_text().starts_with("Error: conversion timed out"));
        assert!(started.elapsed() < Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_empty_text_is_not_an_error() {
        let d = dispatcher(None);
        let envelope = d
            .dispatch("convert_to_hiragana", &args(json!({"text": "", "separator": ""})))
            .await;
        assert_eq!(envelope, ResultEnvelope::Success { text: "h".to_string() });
    }

    #[test]
    fn test_envelope_json() {
        let failure: ResultEnvelope = McpError::UnknownTool("x".to_string()).into();
        assert_eq!(
            failure.to_json(),
            json!({"content": [{"type": "text", "text": "Error: unknown tool: x"}]})
        );
    }
}
