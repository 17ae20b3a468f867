//! Front-end traits: entity extraction and reference recognition per language

use atlas_core::{DepType, Entity, Language};

use crate::syntax::{SyntaxNode, SyntaxTree};

/// An entity paired with the declaration node it was extracted from.
///
/// The node borrows the tree, so the pair cannot outlive the parse.
#[derive(Debug, Clone)]
pub struct EntityWithNode<'t> {
    pub entity: Entity,
    pub node: SyntaxNode<'t>,
}

/// Per-language entity extraction from an arena syntax tree.
pub trait LanguageExtractor: Send + Sync {
    /// The language this extractor produces entities for.
    fn language(&self) -> Language;

    /// Short display name; distinguishes dialects that share a language.
    fn name(&self) -> &'static str;

    /// File extensions this extractor handles, without the dot.
    fn file_extensions(&self) -> &'static [&'static str];

    /// Grammar used to parse files for this extractor.
    fn tree_sitter_language(&self) -> tree_sitter::Language;

    /// Extract every entity of `tree`, each paired with its declaration node.
    /// Returned entities already carry their hashes.
    fn extract<'t>(&self, tree: &'t SyntaxTree, file: &str) -> Vec<EntityWithNode<'t>>;

    /// Entities only.
    fn extract_entities(&self, tree: &SyntaxTree, file: &str) -> Vec<Entity> {
        self.extract(tree, file)
            .into_iter()
            .map(|e| e.entity)
            .collect()
    }
}

/// How a node inside a body refers to another entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefClass {
    Call,
    Construct,
    TypeRef,
    Decorator,
}

/// One entry of a base-class or interface clause.
#[derive(Debug, Clone)]
pub struct BaseType<'t> {
    pub name: String,
    pub node: SyntaxNode<'t>,
    /// `Extends` or `Implements`.
    pub dep_type: DepType,
}

/// Grammar knowledge the dependency resolver needs for one language.
pub trait ReferenceRules: Send + Sync {
    /// Scope separators, primary first.
    fn separators(&self) -> &'static [&'static str] {
        &["."]
    }

    /// Statement body of a callable declaration.
    fn body<'t>(&self, decl: SyntaxNode<'t>) -> Option<SyntaxNode<'t>>;

    /// Decorator or annotation nodes attached to a callable declaration.
    fn decorators<'t>(&self, _decl: SyntaxNode<'t>) -> Vec<SyntaxNode<'t>> {
        Vec::new()
    }

    /// Member list of a type declaration, walked for field type annotations.
    fn type_body<'t>(&self, decl: SyntaxNode<'t>) -> Option<SyntaxNode<'t>>;

    /// Base-class and interface clause entries of a type declaration.
    fn base_types<'t>(&self, decl: SyntaxNode<'t>) -> Vec<BaseType<'t>>;

    /// Whether `node` is a call, construction, type reference or decorator.
    fn classify(&self, node: SyntaxNode<'_>) -> Option<RefClass>;

    /// Raw target name for a classified node. `None` when the target is not
    /// a simple or qualified identifier.
    fn target_name(&self, node: SyntaxNode<'_>, class: RefClass) -> Option<String>;

    /// if / switch / match / try / catch and the like.
    fn is_conditional(&self, kind: &str) -> bool;

    /// Function, class and closure nodes that end an ancestor walk.
    fn is_boundary(&self, kind: &str) -> bool;

    /// Nodes that own methods (classes, interfaces, impl blocks).
    fn is_type_declaration(&self, kind: &str) -> bool;

    /// Decorator or attribute wrappers skipped when looking for an owner.
    fn is_wrapper(&self, _kind: &str) -> bool {
        false
    }

    /// Name of a node for which [`is_type_declaration`] holds.
    ///
    /// [`is_type_declaration`]: ReferenceRules::is_type_declaration
    fn type_declaration_name(&self, node: SyntaxNode<'_>) -> Option<String>;
}

/// A complete language front-end.
pub trait LanguageFrontend: LanguageExtractor + ReferenceRules {}

impl<T: LanguageExtractor + ReferenceRules> LanguageFrontend for T {}
