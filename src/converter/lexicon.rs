//! Dictionary backed converter.
//!
//! Words are found by longest match against reading lexicons; text the
//! lexicons do not cover is split into runs of the same script. Kana is
//! transliterated with `wana_kana`, uncovered kanji pass through unchanged.
//!
//! Lexicons are tab separated `surface<TAB>reading` files inside the
//! dictionary directory:
//!
//! - `sudachi-<tier>.tsv` for the configured tier (required)
//! - `unidic.tsv` when UniDic is enabled (required), consulted first
//! - `custom_readings.tsv` when custom readings are enabled (optional), consulted last

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use unicode_normalization::UnicodeNormalization;
use wana_kana::ConvertJapanese;

use crate::converter::{ConverterFactory, ResolvedConfig, TextConverter};
use crate::error::{McpError, Result};

const UNIDIC_FILE: &str = "unidic.tsv";
const CUSTOM_READINGS_FILE: &str = "custom_readings.tsv";

/// Surface form to reading map.
#[derive(Debug, Default)]
pub struct Lexicon {
    entries: HashMap<String, String>,
    /// Longest surface, in chars.
    max_len: usize,
}

impl Lexicon {
    /// Parse lexicon text. Blank lines and lines starting with `#` are skipped.
    pub fn parse(source: &str, origin: &Path) -> Result<Self> {
        let mut lexicon = Lexicon::default();
        for (idx, line) in source.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let (surface, reading) = line.split_once('\t').ok_or_else(|| {
                McpError::Invocation(format!(
                    "malformed dictionary entry at {}:{}",
                    origin.display(),
                    idx + 1
                ))
            })?;
            lexicon.insert(surface.trim(), reading.trim());
        }
        Ok(lexicon)
    }

    /// Load a lexicon file.
    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path).map_err(|e| {
            McpError::Invocation(format!("failed to read dictionary {}: {}", path.display(), e))
        })?;
        let lexicon = Self::parse(&source, path)?;
        tracing::debug!(path = %path.display(), entries = lexicon.len(), "Loaded lexicon");
        Ok(lexicon)
    }

    /// Add an entry. Later entries replace earlier ones.
    pub fn insert(&mut self, surface: &str, reading: &str) {
        let surface: String = surface.nfc().collect();
        if surface.is_empty() {
            return;
        }
        self.max_len = self.max_len.max(surface.chars().count());
        self.entries.insert(surface, reading.nfc().collect());
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the lexicon has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Longest entry starting at `chars[start]`, as (length in chars, reading).
    fn longest_match(&self, chars: &[char], start: usize) -> Option<(usize, &str)> {
        let limit = self.max_len.min(chars.len() - start);
        (1..=limit).rev().find_map(|len| {
            let surface: String = chars[start..start + len].iter().collect();
            self.entries.get(&surface).map(|r| (len, r.as_str()))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Script {
    Kanji,
    Hiragana,
    Katakana,
    Alnum,
    Space,
    Symbol,
}

impl Script {
    fn of(c: char, prev: Option<Script>) -> Script {
        match c {
            // Prolonged sound mark belongs to the kana run it follows.
            'ー' if matches!(prev, Some(Script::Hiragana)) => Script::Hiragana,
            '\u{3041}'..='\u{309F}' => Script::Hiragana,
            '\u{30A0}'..='\u{30FF}' | '\u{31F0}'..='\u{31FF}' | '\u{FF66}'..='\u{FF9F}' => {
                Script::Katakana
            }
            '\u{4E00}'..='\u{9FFF}'
            | '\u{3400}'..='\u{4DBF}'
            | '\u{F900}'..='\u{FAFF}'
            | '々'
            | '〆' => Script::Kanji,
            c if c.is_whitespace() => Script::Space,
            c if c.is_alphanumeric() => Script::Alnum,
            _ => Script::Symbol,
        }
    }

    fn is_kana(self) -> bool {
        matches!(self, Script::Hiragana | Script::Katakana)
    }
}

#[derive(Debug)]
struct Token<'a> {
    surface: String,
    reading: Option<&'a str>,
    script: Script,
}

/// Converter over a stack of lexicons.
pub struct LexiconConverter {
    /// Consulted in order; the first lexicon with a match wins.
    lexicons: Vec<Lexicon>,
    separator: String,
}

impl LexiconConverter {
    /// Create a converter from lexicons in lookup order.
    pub fn new(lexicons: Vec<Lexicon>, separator: impl Into<String>) -> Self {
        Self {
            lexicons,
            separator: separator.into(),
        }
    }

    fn lookup(&self, chars: &[char], start: usize) -> Option<(usize, &str)> {
        self.lexicons
            .iter()
            .find_map(|lexicon| lexicon.longest_match(chars, start))
    }

    fn tokenize(&self, text: &str) -> Vec<Token<'_>> {
        let chars: Vec<char> = text.nfc().collect();
        let mut tokens = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            if let Some((len, reading)) = self.lookup(&chars, i) {
                tokens.push(Token {
                    surface: chars[i..i + len].iter().collect(),
                    reading: Some(reading),
                    script: Script::of(chars[i], None),
                });
                i += len;
                continue;
            }

            let script = Script::of(chars[i], None);
            let mut end = i + 1;
            if script != Script::Symbol {
                let mut prev = script;
                while end < chars.len() {
                    let next = Script::of(chars[end], Some(prev));
                    if next != script || self.lookup(&chars, end).is_some() {
                        break;
                    }
                    prev = next;
                    end += 1;
                }
            }

            tokens.push(Token {
                surface: chars[i..end].iter().collect(),
                reading: None,
                script,
            });
            i = end;
        }

        tokens
    }

    fn render(&self, text: &str, kana: impl Fn(&str) -> String) -> String {
        self.tokenize(text)
            .into_iter()
            .map(|token| match token.reading {
                Some(reading) => kana(reading),
                None if token.script.is_kana() => kana(token.surface.as_str()),
                None => token.surface,
            })
            .collect::<Vec<_>>()
            .join(&self.separator)
    }
}

impl TextConverter for LexiconConverter {
    fn to_hiragana(&self, text: &str) -> Result<String> {
        Ok(self.render(text, |s| s.to_hiragana()))
    }

    fn to_katakana(&self, text: &str) -> Result<String> {
        Ok(self.render(text, |s| s.to_katakana()))
    }

    fn to_roman(&self, text: &str) -> Result<String> {
        Ok(self.render(text, |s| s.to_romaji()))
    }
}

/// Builds [`LexiconConverter`]s from a dictionary directory.
#[derive(Debug, Clone, Default)]
pub struct LexiconFactory {
    dict_dir: Option<PathBuf>,
}

impl LexiconFactory {
    /// Create a factory. Without a directory, converters only handle kana.
    pub fn new(dict_dir: Option<PathBuf>) -> Self {
        Self { dict_dir }
    }

    /// Path of the lexicon for a dictionary tier.
    pub fn tier_path(dir: &Path, config: &ResolvedConfig) -> PathBuf {
        dir.join(format!("sudachi-{}.tsv", config.dict_type))
    }
}

impl ConverterFactory for LexiconFactory {
    fn build(&self, config: &ResolvedConfig) -> Result<Arc<dyn TextConverter>> {
        let mut lexicons = Vec::new();

        if let Some(dir) = &self.dict_dir {
            if config.use_unidic {
                lexicons.push(Lexicon::load(&dir.join(UNIDIC_FILE))?);
            }
            lexicons.push(Lexicon::load(&Self::tier_path(dir, config))?);
            if config.use_custom_readings {
                let custom = dir.join(CUSTOM_READINGS_FILE);
                if custom.is_file() {
                    lexicons.push(Lexicon::load(&custom)?);
                }
            }
        }

        Ok(Arc::new(LexiconConverter::new(
            lexicons,
            config.separator.clone(),
        )))
    }
}
