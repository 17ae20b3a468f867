//! Language front-ends and the registry that selects them

pub mod c;
pub mod go;
pub mod java;
pub mod python;
pub mod rust;
pub mod typescript;

use std::collections::HashMap;
use std::path::Path;

use atlas_core::{AtlasConfig, AtlasError, Entity, EntityKind, Language, compute_hashes};

use crate::builtins::BuiltinTable;
use crate::extractor::{EntityWithNode, LanguageFrontend};
use crate::syntax::SyntaxNode;

const DEFAULT_SEPARATORS: &[&str] = &["."];

/// Front-ends by file extension, plus each language's builtin table.
pub struct LanguageRegistry {
    frontends: Vec<Box<dyn LanguageFrontend>>,
    builtins: HashMap<Language, BuiltinTable>,
}

impl LanguageRegistry {
    /// Every shipped front-end with the shipped builtin tables.
    pub fn new() -> Self {
        Self::with_config(&AtlasConfig::default())
    }

    /// Front-ends selected by `[index] languages`, builtin tables extended
    /// by `[builtins.<language>]`.
    pub fn with_config(config: &AtlasConfig) -> Self {
        let enabled = config.enabled_languages();
        let all: Vec<Box<dyn LanguageFrontend>> = vec![
            Box::new(go::GoFrontend),
            Box::new(python::PythonFrontend),
            Box::new(typescript::TypeScriptFrontend::typescript()),
            Box::new(typescript::TypeScriptFrontend::tsx()),
            Box::new(typescript::TypeScriptFrontend::javascript()),
            Box::new(rust::RustFrontend),
            Box::new(java::JavaFrontend),
            Box::new(c::CFrontend),
        ];
        let frontends: Vec<_> = all
            .into_iter()
            .filter(|f| enabled.is_empty() || enabled.contains(&f.language()))
            .collect();

        let mut builtins = HashMap::new();
        for frontend in &frontends {
            let language = frontend.language();
            builtins.entry(language).or_insert_with(|| {
                let mut table = BuiltinTable::shipped(language);
                for (name, overrides) in &config.builtins {
                    if Language::from_name(name) == Some(language) {
                        table.extend(overrides);
                    }
                }
                table
            });
        }

        tracing::debug!(
            "Registered front-ends: {}",
            frontends.iter().map(|f| f.name()).collect::<Vec<_>>().join(", ")
        );

        LanguageRegistry { frontends, builtins }
    }

    /// Front-end for a file, by extension.
    pub fn for_path(&self, path: &Path) -> Option<&dyn LanguageFrontend> {
        let ext = path.extension()?.to_str()?;
        self.frontends
            .iter()
            .find(|f| f.file_extensions().contains(&ext))
            .map(|f| f.as_ref())
    }

    /// First front-end registered for `language`. Dialects of one language
    /// share their reference rules.
    pub fn get(&self, language: Language) -> Option<&dyn LanguageFrontend> {
        self.frontends
            .iter()
            .find(|f| f.language() == language)
            .map(|f| f.as_ref())
    }

    /// Like [`get`](Self::get), but a missing front-end is a contract violation.
    pub fn rules(&self, language: Language) -> Result<&dyn LanguageFrontend, AtlasError> {
        self.get(language).ok_or_else(|| {
            AtlasError::Contract(format!("no front-end registered for language {language}"))
        })
    }

    pub fn is_builtin(&self, language: Language, name: &str) -> bool {
        let separators = self
            .get(language)
            .map(|f| f.separators())
            .unwrap_or(DEFAULT_SEPARATORS);
        self.builtins
            .get(&language)
            .is_some_and(|t| t.is_builtin(name, separators))
    }

    pub fn frontends(&self) -> impl Iterator<Item = &dyn LanguageFrontend> {
        self.frontends.iter().map(|f| f.as_ref())
    }

    pub fn supports(&self, path: &Path) -> bool {
        self.for_path(path).is_some()
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ── Shared extraction helpers ─────────────────────────────────

/// Accumulates the entities of one file.
pub(crate) struct Collector<'t> {
    file: String,
    language: Language,
    items: Vec<EntityWithNode<'t>>,
}

impl<'t> Collector<'t> {
    pub(crate) fn new(file: &str, language: Language) -> Self {
        Collector {
            file: file.to_string(),
            language,
            items: Vec::new(),
        }
    }

    /// A fresh entity spanning `node`.
    pub(crate) fn entity(&self, kind: EntityKind, name: &str, node: SyntaxNode<'_>) -> Entity {
        Entity::new(
            kind,
            name.trim(),
            self.file.as_str(),
            node.start_line(),
            node.end_line(),
            self.language,
        )
    }

    /// Hash and keep `entity`; nameless entities are dropped.
    pub(crate) fn push(&mut self, mut entity: Entity, node: SyntaxNode<'t>) {
        if entity.name.is_empty() {
            return;
        }
        compute_hashes(&mut entity);
        self.items.push(EntityWithNode { entity, node });
    }

    pub(crate) fn finish(self) -> Vec<EntityWithNode<'t>> {
        self.items
    }
}

/// Trimmed text of an optional node; empty when absent.
pub(crate) fn text_of(node: Option<SyntaxNode<'_>>) -> String {
    node.map(|n| squash(n.text())).unwrap_or_default()
}

/// Collapse whitespace runs to single spaces.
pub(crate) fn squash(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip one layer of matching quotes.
pub(crate) fn unquote(text: &str) -> String {
    let t = text.trim();
    for q in ['"', '\'', '`'] {
        if t.len() >= 2 && t.starts_with(q) && t.ends_with(q) {
            return t[1..t.len() - 1].to_string();
        }
    }
    t.to_string()
}

/// `Foo<T>` / `Foo[T]` -> `Foo`.
pub(crate) fn strip_generics(name: &str) -> &str {
    let end = name.find(['<', '[']).unwrap_or(name.len());
    name[..end].trim()
}

/// Dotted name of a member-access chain rooted at an identifier.
///
/// `member` is the chain node kind, `object`/`property` its field names and
/// `roots` the node kinds accepted at the base. Anything else (calls,
/// subscripts, literals) yields `None`.
pub(crate) fn member_chain(
    node: SyntaxNode<'_>,
    member: &[&str],
    object: &str,
    property: &str,
    roots: &[&str],
) -> Option<String> {
    let kind = node.kind();
    if roots.contains(&kind) {
        let text = node.text().trim();
        return (!text.is_empty()).then(|| text.to_string());
    }
    if member.contains(&kind) {
        let base = member_chain(node.child_by_field_name(object)?, member, object, property, roots)?;
        let prop = node.child_by_field_name(property)?.text().trim();
        if prop.is_empty() {
            return None;
        }
        return Some(format!("{base}.{prop}"));
    }
    None
}

/// `true` when a node of one of `kinds` is a direct child.
pub(crate) fn has_child_kind(node: SyntaxNode<'_>, kinds: &[&str]) -> bool {
    node.children().any(|c| kinds.contains(&c.kind()))
}
