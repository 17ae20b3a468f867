//! Per-language builtin identifier tables
//!
//! The shipped tables live in `builtins/<language>.toml` and are embedded at
//! compile time. `[builtins.<language>]` in `atlas.toml` extends them.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use atlas_core::{AtlasError, BuiltinOverrides, Language};
use serde::Deserialize;

const GO: &str = include_str!("../builtins/go.toml");
const PYTHON: &str = include_str!("../builtins/python.toml");
const TYPESCRIPT: &str = include_str!("../builtins/typescript.toml");
const JAVASCRIPT: &str = include_str!("../builtins/javascript.toml");
const RUST: &str = include_str!("../builtins/rust.toml");
const JAVA: &str = include_str!("../builtins/java.toml");
const C: &str = include_str!("../builtins/c.toml");

static SHIPPED: LazyLock<HashMap<Language, BuiltinTable>> = LazyLock::new(|| {
    [
        (Language::Go, GO),
        (Language::Python, PYTHON),
        (Language::TypeScript, TYPESCRIPT),
        (Language::JavaScript, JAVASCRIPT),
        (Language::Rust, RUST),
        (Language::Java, JAVA),
        (Language::C, C),
    ]
    .into_iter()
    .map(|(language, text)| {
        let table = BuiltinTable::from_toml(text).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed builtin table for {}: {}", language, e);
            BuiltinTable::default()
        });
        (language, table)
    })
    .collect()
});

/// Denylist of names excluded from the dependency graph.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BuiltinTable {
    functions: HashSet<String>,
    types: HashSet<String>,
    modules: HashSet<String>,
}

impl BuiltinTable {
    pub fn from_toml(text: &str) -> Result<Self, AtlasError> {
        toml::from_str(text).map_err(|e| AtlasError::Config(e.to_string()))
    }

    /// The table shipped for `language`; empty for languages without one.
    pub fn shipped(language: Language) -> BuiltinTable {
        SHIPPED.get(&language).cloned().unwrap_or_default()
    }

    pub fn extend(&mut self, overrides: &BuiltinOverrides) {
        self.functions.extend(overrides.functions.iter().cloned());
        self.types.extend(overrides.types.iter().cloned());
        self.modules.extend(overrides.modules.iter().cloned());
    }

    /// A bare name listed as a function or type, or a qualified name whose
    /// first segment is a listed type or module.
    pub fn is_builtin(&self, name: &str, separators: &[&str]) -> bool {
        if self.functions.contains(name) || self.types.contains(name) {
            return true;
        }
        match first_segment(name, separators) {
            Some(head) => self.types.contains(head) || self.modules.contains(head),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.functions.len() + self.types.len() + self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Text before the left-most separator, when `name` is qualified.
fn first_segment<'a>(name: &'a str, separators: &[&str]) -> Option<&'a str> {
    separators
        .iter()
        .filter(|s| !s.is_empty())
        .filter_map(|sep| name.find(sep))
        .min()
        .map(|pos| &name[..pos])
        .filter(|head| !head.is_empty())
}
