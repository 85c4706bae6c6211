use anyhow::{bail, Context, Result};
use regex::Regex;
use std::path::Path;

use crate::comments::strip_comments;
use crate::fs::FileSystem;
use crate::text::{decode, unescape};

/// Body of an Objective-C string literal, honoring backslash escapes
const LITERAL_BODY: &str = r#"(?:\\.|[^"\\])*"#;

/// Something that can pull localization keys out of comment-free text.
///
/// Implemented by the regex based [`KeyExtractor`]; a token based scanner can
/// be dropped in without touching callers.
pub trait KeyScanner {
    fn scan(&self, text: &str) -> Vec<String>;
}

/// Finds `<function>(@"key", ...)` calls and yields the first literal.
///
/// Trailing arguments may be identifiers, numbers, or further `@"..."`
/// literals. A call whose first argument is not a string literal, or whose
/// trailing arguments are anything else, is not matched.
#[derive(Debug, Clone)]
pub struct KeyExtractor {
    regex: Regex,
}

impl KeyExtractor {
    pub fn new(function: &str) -> Result<Self> {
        let function = function.trim();
        if function.is_empty() {
            bail!("Localization function name must not be empty");
        }

        // `\b` only makes sense when the name starts with a word character.
        let boundary = match function.chars().next() {
            Some(c) if c.is_alphanumeric() || c == '_' => r"\b",
            _ => "",
        };
        let pattern = format!(
            r#"(?s){boundary}{name}\s*\(\s*@"({body})"\s*(?:,\s*\w*|@"{body}"\s*)*\s*\)"#,
            boundary = boundary,
            name = regex::escape(function),
            body = LITERAL_BODY,
        );
        let regex = Regex::new(&pattern)
            .with_context(|| format!("Invalid localization function name: {}", function))?;

        Ok(Self { regex })
    }

    /// Keys in order of appearance, duplicates included, un-escaped.
    pub fn extract(&self, text: &str) -> Vec<String> {
        self.regex
            .captures_iter(text)
            .filter_map(|captures| captures.get(1))
            .map(|key| unescape(key.as_str()).into_owned())
            .collect()
    }
}

impl KeyScanner for KeyExtractor {
    fn scan(&self, text: &str) -> Vec<String> {
        self.extract(text)
    }
}

/// Extract keys from source text, ignoring calls inside comments
pub fn extract_from_source<S: KeyScanner + ?Sized>(source: &str, scanner: &S) -> Vec<String> {
    scanner.scan(&strip_comments(source))
}

/// Read a source file and extract its keys
pub fn extract_from_file<S, F>(path: &Path, scanner: &S, fs: &F) -> Result<Vec<String>>
where
    S: KeyScanner + ?Sized,
    F: FileSystem,
{
    let bytes = fs
        .read(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let source =
        decode(&bytes).with_context(|| format!("Failed to decode file: {}", path.display()))?;
    Ok(extract_from_source(&source, scanner))
}
