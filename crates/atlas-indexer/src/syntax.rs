//! Arena syntax tree
//!
//! A tree-sitter tree is flattened once into a `Vec` of node records owned
//! together with the source. Nodes are addressed by [`NodeIdx`]; the
//! [`SyntaxNode`] handle borrows the tree, so no node can outlive it.

use std::fmt;

use atlas_core::AtlasError;

/// Index of a node inside its [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIdx(pub u32);

impl NodeIdx {
    fn as_usize(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: &'static str,
    field: Option<&'static str>,
    named: bool,
    parent: Option<NodeIdx>,
    /// Position among the parent's children.
    slot: u32,
    children: Vec<NodeIdx>,
    start_byte: usize,
    end_byte: usize,
}

/// Flattened syntax tree plus the source text it spans.
pub struct SyntaxTree {
    source: String,
    nodes: Vec<NodeData>,
    /// Byte offset of the first character of every line.
    line_starts: Vec<usize>,
    has_error: bool,
}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("nodes", &self.nodes.len())
            .field("bytes", &self.source.len())
            .finish()
    }
}

impl SyntaxTree {
    /// Flatten a tree-sitter tree. `source` must be the text it was parsed from.
    pub fn from_tree_sitter(tree: &tree_sitter::Tree, source: String) -> SyntaxTree {
        let mut builder = SyntaxTreeBuilder::new(source);
        let mut cursor = tree.walk();
        let mut stack: Vec<NodeIdx> = Vec::new();

        loop {
            let node = cursor.node();
            let idx = builder.push(
                stack.last().copied(),
                node.kind(),
                cursor.field_name(),
                node.is_named(),
                node.start_byte(),
                node.end_byte(),
            );
            if cursor.goto_first_child() {
                stack.push(idx);
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    let mut syntax = builder.finish();
                    syntax.has_error |= tree.root_node().has_error();
                    return syntax;
                }
                stack.pop();
            }
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The root node. An empty tree yields `None`.
    pub fn root(&self) -> Option<SyntaxNode<'_>> {
        (!self.nodes.is_empty()).then_some(SyntaxNode {
            tree: self,
            idx: NodeIdx(0),
        })
    }

    /// Handle for `idx`; an index outside the arena is a contract violation.
    pub fn node(&self, idx: NodeIdx) -> Result<SyntaxNode<'_>, AtlasError> {
        if idx.as_usize() < self.nodes.len() {
            Ok(SyntaxNode { tree: self, idx })
        } else {
            Err(AtlasError::Contract(format!(
                "node index {} out of range for tree with {} nodes",
                idx.0,
                self.nodes.len()
            )))
        }
    }

    /// True when the parser had to recover from a syntax error somewhere.
    pub fn has_errors(&self) -> bool {
        self.has_error
    }

    fn data(&self, idx: NodeIdx) -> &NodeData {
        &self.nodes[idx.as_usize()]
    }

    /// 0-based row containing `byte`, clamped to the last line.
    fn row_of(&self, byte: usize) -> usize {
        match self.line_starts.binary_search(&byte) {
            Ok(row) => row,
            Err(next) => next.saturating_sub(1),
        }
    }
}

/// Builds a [`SyntaxTree`] node by node. The first node pushed is the root.
pub struct SyntaxTreeBuilder {
    source: String,
    nodes: Vec<NodeData>,
}

impl SyntaxTreeBuilder {
    pub fn new(source: impl Into<String>) -> Self {
        SyntaxTreeBuilder {
            source: source.into(),
            nodes: Vec::new(),
        }
    }

    /// Append a node under `parent`. A `None` parent after the root attaches
    /// the node to the root.
    pub fn push(
        &mut self,
        parent: Option<NodeIdx>,
        kind: &'static str,
        field: Option<&'static str>,
        named: bool,
        start_byte: usize,
        end_byte: usize,
    ) -> NodeIdx {
        let idx = NodeIdx(self.nodes.len() as u32);
        let parent = match parent {
            Some(p) if p.as_usize() < self.nodes.len() => Some(p),
            _ if self.nodes.is_empty() => None,
            _ => Some(NodeIdx(0)),
        };
        let slot = match parent {
            Some(p) => {
                let siblings = &mut self.nodes[p.as_usize()].children;
                siblings.push(idx);
                (siblings.len() - 1) as u32
            }
            None => 0,
        };
        self.nodes.push(NodeData {
            kind,
            field,
            named,
            parent,
            slot,
            children: Vec::new(),
            start_byte,
            end_byte: end_byte.max(start_byte),
        });
        idx
    }

    /// Convenience for synthetic trees: a named node spanning the first
    /// occurrence of `text` at or after `from`. Falls back to an empty span.
    pub fn push_text(
        &mut self,
        parent: Option<NodeIdx>,
        kind: &'static str,
        field: Option<&'static str>,
        text: &str,
        from: usize,
    ) -> NodeIdx {
        let start = self
            .source
            .get(from..)
            .and_then(|rest| rest.find(text))
            .map(|pos| from + pos)
            .unwrap_or(from);
        self.push(parent, kind, field, true, start, start + text.len())
    }

    pub fn finish(self) -> SyntaxTree {
        let mut line_starts = vec![0];
        line_starts.extend(
            self.source
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        let has_error = self.nodes.iter().any(|n| n.kind == "ERROR");
        SyntaxTree {
            source: self.source,
            nodes: self.nodes,
            line_starts,
            has_error,
        }
    }
}

/// Borrowed handle to one node of a [`SyntaxTree`].
#[derive(Clone, Copy)]
pub struct SyntaxNode<'t> {
    tree: &'t SyntaxTree,
    idx: NodeIdx,
}

impl PartialEq for SyntaxNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.idx == other.idx
    }
}

impl Eq for SyntaxNode<'_> {}

impl fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}#{} [{}-{}]",
            self.kind(),
            self.idx.0,
            self.start_line(),
            self.end_line()
        )
    }
}

impl<'t> SyntaxNode<'t> {
    fn data(self) -> &'t NodeData {
        self.tree.data(self.idx)
    }

    fn at(self, idx: NodeIdx) -> SyntaxNode<'t> {
        SyntaxNode { tree: self.tree, idx }
    }

    pub fn idx(self) -> NodeIdx {
        self.idx
    }

    pub fn tree(self) -> &'t SyntaxTree {
        self.tree
    }

    pub fn kind(self) -> &'static str {
        self.data().kind
    }

    /// Field name this node occupies in its parent, if any.
    pub fn field_name(self) -> Option<&'static str> {
        self.data().field
    }

    pub fn is_named(self) -> bool {
        self.data().named
    }

    pub fn parent(self) -> Option<SyntaxNode<'t>> {
        self.data().parent.map(|p| self.at(p))
    }

    pub fn child_count(self) -> usize {
        self.data().children.len()
    }

    pub fn child(self, i: usize) -> Option<SyntaxNode<'t>> {
        self.data().children.get(i).map(|c| self.at(*c))
    }

    pub fn children(self) -> impl Iterator<Item = SyntaxNode<'t>> {
        self.data().children.iter().map(move |c| self.at(*c))
    }

    pub fn named_children(self) -> impl Iterator<Item = SyntaxNode<'t>> {
        self.children().filter(|c| c.is_named())
    }

    pub fn child_by_field_name(self, field: &str) -> Option<SyntaxNode<'t>> {
        self.children().find(|c| c.field_name() == Some(field))
    }

    /// Named children carrying `field`. Separator tokens between repeated
    /// field members can report the same field name and are skipped.
    pub fn children_by_field_name(self, field: &str) -> impl Iterator<Item = SyntaxNode<'t>> {
        self.children()
            .filter(move |c| c.is_named() && c.field_name() == Some(field))
    }

    /// First direct child of the given kind.
    pub fn child_of_kind(self, kind: &str) -> Option<SyntaxNode<'t>> {
        self.children().find(|c| c.kind() == kind)
    }

    pub fn next_sibling(self) -> Option<SyntaxNode<'t>> {
        let parent = self.parent()?;
        parent.child(self.data().slot as usize + 1)
    }

    pub fn prev_sibling(self) -> Option<SyntaxNode<'t>> {
        let parent = self.parent()?;
        let slot = self.data().slot as usize;
        if slot == 0 {
            None
        } else {
            parent.child(slot - 1)
        }
    }

    pub fn prev_named_sibling(self) -> Option<SyntaxNode<'t>> {
        let mut cur = self.prev_sibling();
        while let Some(node) = cur {
            if node.is_named() {
                return Some(node);
            }
            cur = node.prev_sibling();
        }
        None
    }

    /// Parent, grandparent, ... up to the root. Excludes `self`.
    pub fn ancestors(self) -> impl Iterator<Item = SyntaxNode<'t>> {
        std::iter::successors(self.parent(), |n| n.parent())
    }

    /// Every node below `self` in depth-first pre-order. Excludes `self`.
    pub fn descendants(self) -> Descendants<'t> {
        let mut stack: Vec<NodeIdx> = self.data().children.clone();
        stack.reverse();
        Descendants {
            tree: self.tree,
            stack,
        }
    }

    /// Descendants of one kind, in pre-order.
    pub fn descendants_of_kind(self, kind: &str) -> Vec<SyntaxNode<'t>> {
        self.descendants().filter(|n| n.kind() == kind).collect()
    }

    /// Source text of this node. Out-of-range or non-boundary spans yield `""`.
    pub fn text(self) -> &'t str {
        let data = self.data();
        self.tree
            .source
            .get(data.start_byte..data.end_byte)
            .unwrap_or("")
    }

    pub fn start_byte(self) -> usize {
        self.data().start_byte
    }

    pub fn end_byte(self) -> usize {
        self.data().end_byte
    }

    /// 1-based first line.
    pub fn start_line(self) -> u32 {
        self.tree.row_of(self.data().start_byte) as u32 + 1
    }

    /// 1-based last line, inclusive. A span ending at column 0 of a later
    /// row ends on the row before.
    pub fn end_line(self) -> u32 {
        let data = self.data();
        let start_row = self.tree.row_of(data.start_byte);
        let mut end_row = self.tree.row_of(data.end_byte);
        let at_line_start = self.tree.line_starts.get(end_row) == Some(&data.end_byte);
        if at_line_start && end_row > start_row {
            end_row -= 1;
        }
        end_row as u32 + 1
    }

    /// `file:line` style location of the node start.
    pub fn location(self, file: &str) -> String {
        format!("{}:{}", file, self.start_line())
    }
}

/// Pre-order iterator returned by [`SyntaxNode::descendants`].
pub struct Descendants<'t> {
    tree: &'t SyntaxTree,
    stack: Vec<NodeIdx>,
}

impl<'t> Iterator for Descendants<'t> {
    type Item = SyntaxNode<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.stack.pop()?;
        let data = self.tree.data(idx);
        self.stack.extend(data.children.iter().rev().copied());
        Some(SyntaxNode {
            tree: self.tree,
            idx,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `fn f() {\n  g();\n}\n` built by hand.
    fn synthetic() -> (SyntaxTree, NodeIdx, NodeIdx) {
        let src = "fn f() {\n  g();\n}\n";
        let mut b = SyntaxTreeBuilder::new(src);
        let root = b.push(None, "source_file", None, true, 0, src.len());
        let func = b.push(Some(root), "function_item", None, true, 0, 17);
        b.push_text(Some(func), "identifier", Some("name"), "f", 3);
        let body = b.push_text(Some(func), "block", Some("body"), "{\n  g();\n}", 0);
        let call = b.push_text(Some(body), "call_expression", None, "g()", 0);
        b.push_text(Some(call), "identifier", Some("function"), "g", 9);
        (b.finish(), func, call)
    }

    #[test]
    fn navigation_and_text() {
        let (tree, func, call) = synthetic();
        let func = tree.node(func).unwrap();
        assert_eq!(func.kind(), "function_item");
        assert_eq!(func.child_by_field_name("name").unwrap().text(), "f");
        assert_eq!((func.start_line(), func.end_line()), (1, 3));

        let call = tree.node(call).unwrap();
        assert_eq!(call.text(), "g()");
        assert_eq!(call.start_line(), 2);
        let kinds: Vec<_> = call.ancestors().map(|n| n.kind()).collect();
        assert_eq!(kinds, vec!["block", "function_item", "source_file"]);
        assert_eq!(func.descendants_of_kind("identifier").len(), 2);
    }

    #[test]
    fn repeated_field_skips_separator_tokens() {
        let src = "a, b";
        let mut b = SyntaxTreeBuilder::new(src);
        let root = b.push(None, "const_spec", None, true, 0, 4);
        b.push(Some(root), "identifier", Some("name"), true, 0, 1);
        b.push(Some(root), ",", Some("name"), false, 1, 2);
        b.push(Some(root), "identifier", Some("name"), true, 3, 4);
        let tree = b.finish();
        let names: Vec<_> = tree
            .root()
            .unwrap()
            .children_by_field_name("name")
            .map(|n| n.text())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn siblings() {
        let (tree, func, _) = synthetic();
        let func = tree.node(func).unwrap();
        let name = func.child(0).unwrap();
        let body = name.next_sibling().unwrap();
        assert_eq!(body.kind(), "block");
        assert_eq!(body.prev_sibling(), Some(name));
        assert_eq!(name.prev_sibling(), None);
        assert_eq!(body.next_sibling(), None);
    }

    #[test]
    fn out_of_range_spans_yield_empty_text() {
        let mut b = SyntaxTreeBuilder::new("héllo");
        let root = b.push(None, "root", None, true, 0, 6);
        let past_end = b.push(Some(root), "x", None, true, 3, 400);
        let mid_char = b.push(Some(root), "y", None, true, 2, 3);
        let tree = b.finish();
        assert_eq!(tree.node(root).unwrap().text(), "héllo");
        assert_eq!(tree.node(past_end).unwrap().text(), "");
        assert_eq!(tree.node(mid_char).unwrap().text(), "");
    }

    #[test]
    fn foreign_index_is_contract_error() {
        let (tree, _, _) = synthetic();
        let err = tree.node(NodeIdx(999)).unwrap_err();
        assert!(err.is_contract());
    }

    #[test]
    fn span_ending_at_column_zero_ends_on_previous_line() {
        let src = "a\nb\n";
        let mut b = SyntaxTreeBuilder::new(src);
        let root = b.push(None, "root", None, true, 0, src.len());
        let tree = b.finish();
        let root = tree.node(root).unwrap();
        assert_eq!((root.start_line(), root.end_line()), (1, 2));
    }

    #[test]
    fn flattens_tree_sitter_output() {
        let src = "fn main() { helper(); }\n";
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_rust::LANGUAGE.into())
            .unwrap();
        let ts = parser.parse(src, None).unwrap();
        let tree = SyntaxTree::from_tree_sitter(&ts, src.to_string());

        let root = tree.root().unwrap();
        assert_eq!(root.kind(), "source_file");
        let func = root.child_of_kind("function_item").unwrap();
        assert_eq!(func.child_by_field_name("name").unwrap().text(), "main");
        let calls = root.descendants_of_kind("call_expression");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].child_by_field_name("function").unwrap().text(), "helper");
        assert_eq!(func.end_line(), 1);
        assert!(!tree.has_errors());
    }
}
