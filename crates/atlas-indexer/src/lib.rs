//! Parsing, per-language extraction and dependency resolution

pub mod syntax;
pub mod parser;
pub mod extractor;
pub mod builtins;
pub mod languages;
pub mod projection;
pub mod resolver;
pub mod coordinator;


#[cfg(test)]
pub mod test_utils;

pub use syntax::{NodeIdx, SyntaxNode, SyntaxTree, SyntaxTreeBuilder};
pub use parser::parse_source;
pub use extractor::{BaseType, EntityWithNode, LanguageExtractor, LanguageFrontend, ReferenceRules, RefClass};
pub use builtins::BuiltinTable;
pub use languages::LanguageRegistry;
pub use projection::{CallGraphEntity, project};
pub use resolver::{DependencyResolver, ResolverOptions};
pub use coordinator::{Coordinator, IndexOutput};
