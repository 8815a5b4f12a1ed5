//! Conversion capability.
//!
//! A [`TextConverter`] turns Japanese text into hiragana, katakana or romaji.
//! Converters are built by a [`ConverterFactory`] from a [`ResolvedConfig`];
//! building one may load dictionaries, so the server keeps them in a
//! [`ConverterCache`](crate::cache::ConverterCache).

pub mod lexicon;

use std::fmt;
use std::sync::Arc;

use crate::error::Result;

pub use lexicon::{LexiconConverter, LexiconFactory};

/// Sudachi dictionary tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DictType {
    /// Full dictionary.
    #[default]
    Full,
    /// Small dictionary.
    Small,
    /// Core dictionary.
    Core,
}

impl DictType {
    /// Wire names, in schema order.
    pub const NAMES: [&'static str; 3] = ["full", "small", "core"];

    /// Wire name of the tier.
    pub fn as_str(self) -> &'static str {
        match self {
            DictType::Full => "full",
            DictType::Small => "small",
            DictType::Core => "core",
        }
    }

    /// Parse a tier name, ignoring case. Unrecognized names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "full" => Some(DictType::Full),
            "small" => Some(DictType::Small),
            "core" => Some(DictType::Core),
            _ => None,
        }
    }
}

impl fmt::Display for DictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully defaulted converter settings.
///
/// Two requests resolving to equal values share a converter instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedConfig {
    /// Inserted between words.
    pub separator: String,
    /// Fall back to the custom readings dictionary.
    pub use_custom_readings: bool,
    /// Prefer UniDic readings.
    pub use_unidic: bool,
    /// Sudachi dictionary tier.
    pub dict_type: DictType,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            separator: "/".to_string(),
            use_custom_readings: true,
            use_unidic: false,
            dict_type: DictType::Full,
        }
    }
}

impl ResolvedConfig {
    /// Default settings with a different separator.
    pub fn with_separator(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
            ..Self::default()
        }
    }

    /// Configurations warmed at startup: slash, space and no separator.
    pub fn presets() -> Vec<Self> {
        ["/", " ", ""].into_iter().map(Self::with_separator).collect()
    }
}

/// Japanese script conversion.
///
/// Implementations are shared across requests and must be usable from
/// several threads at once.
pub trait TextConverter: Send + Sync {
    /// Convert text to hiragana.
    fn to_hiragana(&self, text: &str) -> Result<String>;

    /// Convert text to katakana.
    fn to_katakana(&self, text: &str) -> Result<String>;

    /// Convert text to the roman alphabet.
    fn to_roman(&self, text: &str) -> Result<String>;
}

/// Builds converters for a configuration.
pub trait ConverterFactory: Send + Sync {
    /// Build a converter. May block while dictionaries load.
    fn build(&self, config: &ResolvedConfig) -> Result<Arc<dyn TextConverter>>;
}
