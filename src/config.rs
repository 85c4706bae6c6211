use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "locsheet.json";

/// Configuration for locsheet
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Name of the localization routine (e.g., "Localize", "NSLocalizedString")
    #[serde(default = "default_function")]
    pub function: String,

    /// Extensions of source files to scan, without the dot (e.g., ["m", "mm"])
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Directory the translation table lives in
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// File name of the translation table
    #[serde(default = "default_file_name")]
    pub file_name: String,

    /// Language columns used when no table exists yet
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,

    /// Language placed first when languages are discovered from directories
    #[serde(default = "default_language")]
    pub default_language: String,

    /// Suffix of per-language resource directories (e.g., "lproj" for "en.lproj")
    #[serde(default = "default_resource_dir_suffix")]
    pub resource_dir_suffix: String,

    /// Extension of legacy resource files
    #[serde(default = "default_resource_extension")]
    pub resource_extension: String,

    /// Glob patterns of paths that are never scanned
    #[serde(default)]
    pub ignore: Vec<String>,
}

fn default_function() -> String {
    "Localize".to_string()
}

fn default_extensions() -> Vec<String> {
    vec!["m".to_string(), "mm".to_string()]
}

fn default_output_dir() -> String {
    ".".to_string()
}

fn default_file_name() -> String {
    "Localization.csv".to_string()
}

fn default_languages() -> Vec<String> {
    vec!["en".to_string()]
}

fn default_language() -> String {
    "en".to_string()
}

fn default_resource_dir_suffix() -> String {
    "lproj".to_string()
}

fn default_resource_extension() -> String {
    "strings".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            function: default_function(),
            extensions: default_extensions(),
            output_dir: default_output_dir(),
            file_name: default_file_name(),
            languages: default_languages(),
            default_language: default_language(),
            resource_dir_suffix: default_resource_dir_suffix(),
            resource_extension: default_resource_extension(),
            ignore: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_json_string(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load configuration from a JSON string
    pub fn from_json_string(json_str: &str) -> Result<Self> {
        let config: Config =
            serde_json::from_str(json_str).with_context(|| "Failed to parse config JSON string")?;
        config.validate()?;
        Ok(config)
    }

    /// Try to load from default config file, or return default config
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.function.trim().is_empty() {
            bail!("`function` must not be empty");
        }
        if self.file_name.trim().is_empty() {
            bail!("`fileName` must not be empty");
        }
        if self.extensions.iter().all(|e| e.trim().is_empty()) {
            bail!("`extensions` must contain at least one extension");
        }
        if let Some(language) = first_duplicate(&self.languages) {
            bail!("`languages` lists '{}' more than once", language);
        }
        Ok(())
    }

    /// Absolute path of the translation table.
    ///
    /// A relative `output_dir` is resolved against `cwd`.
    pub fn table_path(&self, cwd: &Path) -> PathBuf {
        let dir = Path::new(&self.output_dir);
        let mut path = if dir.is_absolute() {
            PathBuf::new()
        } else {
            cwd.to_path_buf()
        };
        path.extend(
            dir.components()
                .filter(|c| !matches!(c, std::path::Component::CurDir)),
        );
        path.join(&self.file_name)
    }
}

/// Split a comma-separated CLI list, dropping blanks and a leading dot
/// on each entry.
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim().trim_start_matches('.'))
        .filter(|item| !item.is_empty())
        .map(|item| item.to_string())
        .collect()
}

/// First entry that appears more than once in `items`
pub fn first_duplicate(items: &[String]) -> Option<&str> {
    let mut seen = std::collections::HashSet::new();
    items
        .iter()
        .find(|item| !seen.insert(item.as_str()))
        .map(|item| item.as_str())
}
