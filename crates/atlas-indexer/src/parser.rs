//! Tree-sitter parsing into arena trees
//!
//! Tree-sitter parsers are not `Sync`, so each worker thread keeps its own
//! parser and re-targets it at whatever grammar the next file needs.

use std::cell::RefCell;

use atlas_core::AtlasError;
use tree_sitter::{Language, Parser};

use crate::syntax::SyntaxTree;

thread_local! {
    static PARSER: RefCell<Parser> = RefCell::new(Parser::new());
}

/// Parse `source` with `language` on the calling thread's parser.
pub fn parse_source(language: &Language, source: String) -> Result<SyntaxTree, AtlasError> {
    PARSER.with(|cell| {
        let mut parser = cell
            .try_borrow_mut()
            .map_err(|_| AtlasError::Parse("parser re-entered on the same thread".to_string()))?;
        parse_with(&mut parser, language, source)
    })
}

/// Parse with an explicit parser.
pub fn parse_with(
    parser: &mut Parser,
    language: &Language,
    source: String,
) -> Result<SyntaxTree, AtlasError> {
    parser
        .set_language(language)
        .map_err(|e| AtlasError::Parse(format!("failed to load grammar: {e}")))?;
    let tree = parser
        .parse(&source, None)
        .ok_or_else(|| AtlasError::Parse("parser returned no tree".to_string()))?;
    let syntax = SyntaxTree::from_tree_sitter(&tree, source);
    if syntax.has_errors() {
        tracing::debug!("Parsed with error recovery ({} nodes)", syntax.len());
    }
    Ok(syntax)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_on_thread_local_parser() {
        let go: Language = tree_sitter_go::LANGUAGE.into();
        let tree = parse_source(&go, "package main\nfunc main() {}\n".to_string()).unwrap();
        let root = tree.root().unwrap();
        assert_eq!(root.kind(), "source_file");
        assert_eq!(root.descendants_of_kind("function_declaration").len(), 1);
    }

    #[test]
    fn switching_grammars_reuses_parser() {
        let py: Language = tree_sitter_python::LANGUAGE.into();
        let c: Language = tree_sitter_c::LANGUAGE.into();
        let a = parse_source(&py, "def f():\n    pass\n".to_string()).unwrap();
        let b = parse_source(&c, "int f(void) { return 0; }\n".to_string()).unwrap();
        assert_eq!(a.root().unwrap().kind(), "module");
        assert_eq!(b.root().unwrap().kind(), "translation_unit");
    }

    #[test]
    fn broken_source_still_yields_tree() {
        let js: Language = tree_sitter_javascript::LANGUAGE.into();
        let tree = parse_source(&js, "function (".to_string()).unwrap();
        assert!(tree.has_errors());
    }
}
