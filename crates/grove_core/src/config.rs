//! Vault-local policy loaded from `.grove/config.toml`.
//!
//! Vault owns policy, the engine enforces it: every threshold the validator,
//! maturity machine and link graph apply lives here with a default, so a vault
//! without a config file is checked against the documented conventions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const CONFIG_DIR: &str = ".grove";
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct GroveConfig {
    #[serde(default)]
    pub vault: VaultConfig,
    #[serde(default)]
    pub maturity: MaturityPolicy,
    #[serde(default)]
    pub schema: SchemaPolicy,
    #[serde(default)]
    pub links: LinkPolicy,
    /// Template contract overrides keyed by kind name (e.g. `shell-tool`).
    #[serde(default)]
    pub templates: BTreeMap<String, TemplateOverride>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct VaultConfig {
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            ignore: default_ignore(),
            extensions: default_extensions(),
        }
    }
}

fn default_ignore() -> Vec<String> {
    vec![
        "templates/**".to_string(),
        ".obsidian/**".to_string(),
        ".grove/**".to_string(),
    ]
}

fn default_extensions() -> Vec<String> {
    vec![".md".to_string()]
}

/// Thresholds for the seed -> growing -> evergreen progression.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct MaturityPolicy {
    #[serde(default = "default_growing_min_words")]
    pub growing_min_words: usize,
    #[serde(default = "default_evergreen_min_words")]
    pub evergreen_min_words: usize,
    #[serde(default = "default_growing_min_examples")]
    pub growing_min_examples: usize,
    #[serde(default = "default_evergreen_min_examples")]
    pub evergreen_min_examples: usize,
}

impl Default for MaturityPolicy {
    fn default() -> Self {
        Self {
            growing_min_words: default_growing_min_words(),
            evergreen_min_words: default_evergreen_min_words(),
            growing_min_examples: default_growing_min_examples(),
            evergreen_min_examples: default_evergreen_min_examples(),
        }
    }
}

fn default_growing_min_words() -> usize {
    1000
}

fn default_evergreen_min_words() -> usize {
    3000
}

fn default_growing_min_examples() -> usize {
    2
}

fn default_evergreen_min_examples() -> usize {
    3
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SchemaPolicy {
    #[serde(default = "default_min_examples")]
    pub min_examples: usize,
    /// Additional fenced-block languages that count as examples.
    #[serde(default)]
    pub extra_example_languages: Vec<String>,
}

impl Default for SchemaPolicy {
    fn default() -> Self {
        Self {
            min_examples: default_min_examples(),
            extra_example_languages: Vec::new(),
        }
    }
}

fn default_min_examples() -> usize {
    3
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct LinkPolicy {
    /// Report dangling wikilinks as errors instead of warnings.
    #[serde(default)]
    pub strict_dangling: bool,
    /// Only count back-references that appear in the target's Related Topics section.
    #[serde(default)]
    pub backlinks_in_related_topics_only: bool,
}

/// Partial replacement of a built-in template contract.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct TemplateOverride {
    #[serde(default)]
    pub required_sections: Option<Vec<String>>,
    #[serde(default)]
    pub ordered: Option<bool>,
    #[serde(default)]
    pub min_examples: Option<usize>,
    #[serde(default)]
    pub require_callouts: Option<bool>,
}

impl GroveConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Self::from_toml_at(content, CONFIG_FILENAME)
    }

    fn from_toml_at(content: &str, path: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    /// Load `<vault_root>/.grove/config.toml`; a missing file yields defaults.
    pub fn load(vault_root: &Path) -> Result<Self, ConfigError> {
        let path = config_path(vault_root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let display = path.display().to_string();
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        Self::from_toml_at(&content, &display)
    }
}

pub fn config_path(vault_root: &Path) -> PathBuf {
    vault_root.join(CONFIG_DIR).join(CONFIG_FILENAME)
}

/// Walk up from `start` looking for a directory that carries `.grove/`.
pub fn discover_vault_root(start: &Path) -> Option<PathBuf> {
    let mut current = if start.is_dir() {
        Some(start)
    } else {
        start.parent()
    };
    while let Some(dir) = current {
        if dir.join(CONFIG_DIR).is_dir() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}
