//! Resolver-facing projection of entities

use atlas_core::{AtlasError, Entity, EntityKind, Language};

use crate::extractor::EntityWithNode;
use crate::languages::LanguageRegistry;
use crate::syntax::{NodeIdx, SyntaxNode, SyntaxTree};

/// Minimal view of an entity used during one resolution pass.
#[derive(Debug, Clone)]
pub struct CallGraphEntity<'t> {
    pub id: String,
    pub name: String,
    /// Receiver type joined to the name with the language's primary
    /// separator, or the bare name.
    pub qualified_name: String,
    pub kind: EntityKind,
    pub file: String,
    pub line: u32,
    /// `file:line`.
    pub location: String,
    pub language: Language,
    /// Receiver type with any modifier stripped.
    pub receiver: Option<String>,
    pub node: SyntaxNode<'t>,
}

impl<'t> CallGraphEntity<'t> {
    pub fn new(entity: &Entity, node: SyntaxNode<'t>, separator: &str) -> Self {
        let receiver = entity.receiver_type().map(str::to_string);
        let qualified_name = match &receiver {
            Some(owner) => format!("{}{}{}", owner, separator, entity.name),
            None => entity.name.clone(),
        };
        CallGraphEntity {
            id: entity.id(),
            name: entity.name.clone(),
            qualified_name,
            kind: entity.kind,
            file: entity.file.clone(),
            line: entity.start_line,
            location: entity.location(),
            language: entity.language,
            receiver,
            node,
        }
    }

    /// Project from a raw arena index; an index outside `tree` is a
    /// contract violation.
    pub fn from_handle(
        entity: &Entity,
        tree: &'t SyntaxTree,
        idx: NodeIdx,
        separator: &str,
    ) -> Result<Self, AtlasError> {
        let node = tree.node(idx)?;
        Ok(Self::new(entity, node, separator))
    }

    /// Coarse tag for the entity kind.
    pub fn type_tag(&self) -> &'static str {
        self.kind.as_str()
    }
}

/// Project a collected batch, using each language's primary separator.
pub fn project<'t>(
    items: &[EntityWithNode<'t>],
    registry: &LanguageRegistry,
) -> Result<Vec<CallGraphEntity<'t>>, AtlasError> {
    items
        .iter()
        .map(|item| {
            let rules = registry.rules(item.entity.language)?;
            let separator = rules.separators().first().copied().unwrap_or(".");
            Ok(CallGraphEntity::new(&item.entity, item.node, separator))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::SyntaxTreeBuilder;

    fn tree() -> SyntaxTree {
        let mut b = SyntaxTreeBuilder::new("fn save() {}");
        b.push(None, "source_file", None, true, 0, 12);
        b.finish()
    }

    #[test]
    fn qualified_name_uses_separator_and_strips_modifier() {
        let tree = tree();
        let mut e = Entity::new(EntityKind::Method, "save", "repo.rs", 1, 1, Language::Rust);
        e.receiver = Some("Repo (static)".to_string());
        let cg = CallGraphEntity::new(&e, tree.root().unwrap(), "::");
        assert_eq!(cg.qualified_name, "Repo::save");
        assert_eq!(cg.receiver.as_deref(), Some("Repo"));
        assert_eq!(cg.location, "repo.rs:1");
        assert_eq!(cg.type_tag(), "method");
        assert_eq!(cg.id, e.id());
    }

    #[test]
    fn free_function_keeps_bare_name() {
        let tree = tree();
        let e = Entity::new(EntityKind::Function, "save", "repo.py", 4, 6, Language::Python);
        let cg = CallGraphEntity::new(&e, tree.root().unwrap(), ".");
        assert_eq!(cg.qualified_name, "save");
        assert_eq!(cg.receiver, None);
    }

    #[test]
    fn dangling_handle_is_contract_error() {
        let tree = tree();
        let e = Entity::new(EntityKind::Function, "save", "repo.py", 4, 6, Language::Python);
        let err = CallGraphEntity::from_handle(&e, &tree, NodeIdx(42), ".").unwrap_err();
        assert!(err.is_contract());
    }

    #[test]
    fn project_rejects_languages_without_front_end() {
        let tree = tree();
        let registry = LanguageRegistry::new();
        let items = vec![EntityWithNode {
            entity: Entity::new(EntityKind::Function, "f", "a.txt", 1, 1, Language::Other),
            node: tree.root().unwrap(),
        }];
        assert!(project(&items, &registry).unwrap_err().is_contract());
    }
}
