//! Kanji conversion tools.
//!
//! Tools: convert_to_hiragana, convert_to_katakana, convert_to_roman

use crate::converter::{DictType, ResolvedConfig, TextConverter};
use crate::error::Result;
use crate::tools::schema::{ParamKind, ParamSpec, ParamValue, ParameterSchema, ValidatedArgs};
use crate::tools::ToolDef;

/// A conversion tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionTool {
    /// `convert_to_hiragana`
    Hiragana,
    /// `convert_to_katakana`
    Katakana,
    /// `convert_to_roman`
    Roman,
}

impl ConversionTool {
    /// All tools, in listing order.
    pub const ALL: [ConversionTool; 3] = [
        ConversionTool::Hiragana,
        ConversionTool::Katakana,
        ConversionTool::Roman,
    ];

    /// Tool name on the wire.
    pub fn name(self) -> &'static str {
        match self {
            ConversionTool::Hiragana => "convert_to_hiragana",
            ConversionTool::Katakana => "convert_to_katakana",
            ConversionTool::Roman => "convert_to_roman",
        }
    }

    /// Look up a tool by wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    fn target(self) -> &'static str {
        match self {
            ConversionTool::Hiragana => "hiragana",
            ConversionTool::Katakana => "katakana",
            ConversionTool::Roman => "roman alphabet",
        }
    }

    /// Run the tool's conversion.
    pub fn apply(self, converter: &dyn TextConverter, text: &str) -> Result<String> {
        match self {
            ConversionTool::Hiragana => converter.to_hiragana(text),
            ConversionTool::Katakana => converter.to_katakana(text),
            ConversionTool::Roman => converter.to_roman(text),
        }
    }

    /// Tool definition for `tools/list`.
    pub fn def(self) -> ToolDef {
        ToolDef::new(
            self.name(),
            &format!(
                "Convert Japanese text (including kanji) to {}",
                self.target()
            ),
            schema(self),
        )
    }
}

/// Shared parameters of the conversion tools.
fn schema(tool: ConversionTool) -> ParameterSchema {
    let defaults = ResolvedConfig::default();
    ParameterSchema::new(vec![
        ParamSpec::required(
            "text",
            ParamKind::String,
            format!("Japanese text to convert to {}", tool.target()),
        ),
        ParamSpec::optional(
            "separator",
            ParamKind::String,
            ParamValue::Str(defaults.separator),
            "Separator character between words (default: '/', use '' for no separator)",
        ),
        ParamSpec::optional(
            "use_custom_readings",
            ParamKind::Boolean,
            ParamValue::Bool(defaults.use_custom_readings),
            "Use custom readings dictionary as fallback",
        ),
        ParamSpec::optional(
            "use_unidic",
            ParamKind::Boolean,
            ParamValue::Bool(defaults.use_unidic),
            "Use UniDic for improved reading accuracy",
        ),
        ParamSpec::optional(
            "sudachi_dict_type",
            ParamKind::Enum {
                values: &DictType::NAMES,
                fallback: Some(DictType::Full.as_str()),
            },
            ParamValue::Str(defaults.dict_type.as_str().to_string()),
            "Type of Sudachi dictionary to use",
        ),
    ])
}

/// Get all conversion tool definitions.
pub fn tools() -> Vec<ToolDef> {
    ConversionTool::ALL.into_iter().map(ConversionTool::def).collect()
}

/// A validated conversion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertRequest {
    /// Tool to run.
    pub tool: ConversionTool,
    /// Text to convert.
    pub text: String,
    /// Converter settings.
    pub config: ResolvedConfig,
}

impl ConvertRequest {
    /// Build a request from validated arguments.
    pub fn from_args(tool: ConversionTool, args: &ValidatedArgs) -> Result<Self> {
        let config = ResolvedConfig {
            separator: args.string("separator")?.to_string(),
            use_custom_readings: args.boolean("use_custom_readings")?,
            use_unidic: args.boolean("use_unidic")?,
            dict_type: DictType::parse(args.string("sudachi_dict_type")?).unwrap_or_default(),
        };

        Ok(Self {
            tool,
            text: args.string("text")?.to_string(),
            config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_names_round_trip() {
        for tool in ConversionTool::ALL {
            assert_eq!(ConversionTool::from_name(tool.name()), Some(tool));
        }
        assert_eq!(ConversionTool::from_name("convert_to_cyrillic"), None);
    }

    #[test]
    fn test_schema_defaults_match_resolved_default() {
        let schema = schema(ConversionTool::Roman).to_json();
        let props = &schema["properties"];
        assert_eq!(props["separator"]["default"], "/");
        assert_eq!(props["use_custom_readings"]["default"], true);
        assert_eq!(props["use_unidic"]["default"], false);
        assert_eq!(props["sudachi_dict_type"]["default"], "full");
        assert_eq!(
            props["sudachi_dict_type"]["enum"],
            serde_json::json!(["full", "small", "core"])
        );
        assert_eq!(
            props["text"]["description"],
            "Japanese text to convert to roman alphabet"
        );
    }

    #[test]
    fn test_descriptions() {
        let defs = tools();
        assert_eq!(
            defs[0].description,
            "Convert Japanese text (including kanji) to hiragana"
        );
        assert_eq!(
            defs[2].description,
            "Convert Japanese text (including kanji) to roman alphabet"
        );
    }
}
