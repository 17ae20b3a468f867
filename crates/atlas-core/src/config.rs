//! Project configuration
//!
//! Loads an optional `atlas.toml` from the indexed root.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AtlasError;
use crate::model::Language;

/// Config file looked up at the indexed root.
pub const CONFIG_FILE: &str = "atlas.toml";

/// Default size limit for indexed files: 1 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;

/// Top-level Atlas configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    pub index: IndexConfig,
    pub resolver: ResolverConfig,
    /// Extra builtin names per language, keyed by language name.
    pub builtins: BTreeMap<String, BuiltinOverrides>,
}

impl AtlasConfig {
    /// Load configuration from the given path.
    pub fn load(path: &Path) -> Result<Self, AtlasError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, AtlasError> {
        let config: AtlasConfig =
            toml::from_str(content).map_err(|e| AtlasError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `atlas.toml` from `root`, or return defaults if it doesn't exist.
    /// A file that exists but does not parse is an error.
    pub fn load_or_default(root: &Path) -> Result<Self, AtlasError> {
        let path = root.join(CONFIG_FILE);
        if path.is_file() {
            tracing::debug!("Loading config from {}", path.display());
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Languages selected by `[index] languages`; empty means all.
    pub fn enabled_languages(&self) -> Vec<Language> {
        self.index
            .languages
            .iter()
            .filter_map(|name| Language::from_name(name))
            .collect()
    }

    fn validate(&self) -> Result<(), AtlasError> {
        for name in self.index.languages.iter().chain(self.builtins.keys()) {
            if Language::from_name(name).is_none() {
                return Err(AtlasError::Config(format!("unknown language {name:?}")));
            }
        }
        if self.index.max_file_size == 0 {
            return Err(AtlasError::Config("index.max_file_size must be positive".to_string()));
        }
        Ok(())
    }
}

/// File discovery settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Glob patterns excluded from indexing, relative to the root.
    pub exclude: Vec<String>,
    /// Files larger than this many bytes are skipped.
    pub max_file_size: u64,
    /// Language names to index; empty indexes every supported language.
    pub languages: Vec<String>,
    /// Honour `.gitignore` and friends during discovery.
    pub respect_gitignore: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            exclude: Vec::new(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            languages: Vec::new(),
            respect_gitignore: true,
        }
    }
}

/// Dependency resolution settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Emit `instantiates` rather than `calls` for constructor expressions.
    pub instantiates: bool,
}

/// Names added to a language's shipped builtin table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuiltinOverrides {
    pub functions: Vec<String>,
    pub types: Vec<String>,
    pub modules: Vec<String>,
}
