//! Rust front-end using tree-sitter-rust

use atlas_core::{DepType, Entity, EntityKind, EnumValue, Field, Language, Param, TypeKind, Visibility};

use super::{Collector, has_child_kind, member_chain, squash, strip_generics, text_of};
use crate::extractor::{BaseType, EntityWithNode, LanguageExtractor, RefClass, ReferenceRules};
use crate::syntax::{SyntaxNode, SyntaxTree};

/// Rust language front-end.
pub struct RustFrontend;

impl LanguageExtractor for RustFrontend {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn name(&self) -> &'static str {
        "rust"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["rs"]
    }

    fn tree_sitter_language(&self) -> tree_sitter::Language {
        tree_sitter_rust::LANGUAGE.into()
    }

    fn extract<'t>(&self, tree: &'t SyntaxTree, file: &str) -> Vec<EntityWithNode<'t>> {
        let mut out = Collector::new(file, Language::Rust);
        if let Some(root) = tree.root() {
            extract_items(root, &mut out);
        }
        out.finish()
    }
}

// ── Entity Extraction ─────────────────────────────────────────────────────

fn extract_items<'t>(container: SyntaxNode<'t>, out: &mut Collector<'t>) {
    for item in container.named_children() {
        match item.kind() {
            "function_item" => {
                if let Some(e) = extract_fn(item, EntityKind::Function, None, out) {
                    out.push(e, item);
                }
            }
            "struct_item" | "union_item" => {
                if let Some(e) = extract_struct(item, out) {
                    out.push(e, item);
                }
            }
            "enum_item" => {
                if let Some(e) = extract_enum(item, out) {
                    out.push(e, item);
                }
            }
            "type_item" => {
                if let Some(name) = item.child_by_field_name("name") {
                    let mut e = out.entity(EntityKind::Type, name.text(), item);
                    e.type_kind = Some(TypeKind::Alias);
                    e.visibility = rust_visibility(item);
                    out.push(e, item);
                }
            }
            "const_item" | "static_item" => {
                if let Some(e) = extract_value(item, out) {
                    out.push(e, item);
                }
            }
            "trait_item" => extract_trait(item, out),
            "impl_item" => extract_impl(item, out),
            "use_declaration" => {
                let mut uses = Vec::new();
                if let Some(arg) = item.child_by_field_name("argument") {
                    flatten_use(arg, "", &mut uses);
                }
                for (name, path, alias) in uses {
                    let mut e = out.entity(EntityKind::Import, &name, item);
                    e.import_path = Some(path);
                    e.import_alias = alias;
                    e.visibility = rust_visibility(item);
                    out.push(e, item);
                }
            }
            "mod_item" => {
                if let Some(body) = item.child_by_field_name("body") {
                    extract_items(body, out);
                }
            }
            _ => {}
        }
    }
}

fn extract_fn(
    item: SyntaxNode<'_>,
    kind: EntityKind,
    receiver: Option<&str>,
    out: &Collector<'_>,
) -> Option<Entity> {
    let name = item.child_by_field_name("name")?.text();
    let mut entity = out.entity(kind, name, item);
    entity.visibility = rust_visibility(item);
    entity.decorators = attributes(item).iter().map(|a| attribute_text(*a)).collect();
    entity.is_async = item
        .child_of_kind("function_modifiers")
        .is_some_and(|m| has_child_kind(m, &["async"]));

    if let Some(params) = item.child_by_field_name("parameters") {
        entity.params = params
            .named_children()
            .filter(|p| p.kind() == "parameter")
            .map(|p| {
                Param::new(
                    text_of(p.child_by_field_name("pattern")),
                    text_of(p.child_by_field_name("type")),
                )
            })
            .collect();
    }
    if let Some(owner) = receiver {
        let takes_self = item
            .child_by_field_name("parameters")
            .is_some_and(|p| has_child_kind(p, &["self_parameter"]));
        entity.receiver = Some(if takes_self {
            owner.to_string()
        } else {
            format!("{owner} (static)")
        });
    }
    let ret = text_of(item.child_by_field_name("return_type"));
    if !ret.is_empty() && ret != "()" {
        entity.returns = vec![ret];
    }
    if let Some(body) = item.child_by_field_name("body") {
        entity.raw_body = body.text().to_string();
    }
    Some(entity)
}

fn extract_struct(item: SyntaxNode<'_>, out: &Collector<'_>) -> Option<Entity> {
    let name = item.child_by_field_name("name")?.text();
    let mut entity = out.entity(EntityKind::Type, name, item);
    entity.type_kind = Some(if item.kind() == "union_item" {
        TypeKind::Union
    } else {
        TypeKind::Struct
    });
    entity.visibility = rust_visibility(item);
    entity.decorators = attributes(item).iter().map(|a| attribute_text(*a)).collect();
    entity.implements = trait_impls(item).into_iter().map(|b| b.name).collect();
    if let Some(body) = item.child_by_field_name("body") {
        entity.fields = struct_fields(body);
    }
    Some(entity)
}

fn struct_fields(body: SyntaxNode<'_>) -> Vec<Field> {
    match body.kind() {
        "field_declaration_list" => body
            .named_children()
            .filter(|f| f.kind() == "field_declaration")
            .map(|f| {
                Field::new(
                    text_of(f.child_by_field_name("name")),
                    text_of(f.child_by_field_name("type")),
                    rust_visibility(f),
                )
            })
            .collect(),
        "ordered_field_declaration_list" => {
            let visibility = |ty: SyntaxNode<'_>| match ty.prev_named_sibling() {
                Some(v) if v.kind() == "visibility_modifier" => visibility_of(v.text()),
                _ => Visibility::Private,
            };
            body.children_by_field_name("type")
                .enumerate()
                .map(|(i, ty)| Field::new(i.to_string(), squash(ty.text()), visibility(ty)))
                .collect()
        }
        _ => Vec::new(),
    }
}

fn extract_enum(item: SyntaxNode<'_>, out: &Collector<'_>) -> Option<Entity> {
    let name = item.child_by_field_name("name")?.text();
    let mut entity = out.entity(EntityKind::Enum, name, item);
    entity.visibility = rust_visibility(item);
    let attrs = attributes(item);
    entity.decorators = attrs.iter().map(|a| attribute_text(*a)).collect();
    entity.value_type = entity
        .decorators
        .iter()
        .find_map(|a| a.strip_prefix("repr(")?.strip_suffix(')'))
        .map(str::to_string);
    entity.implements = trait_impls(item).into_iter().map(|b| b.name).collect();
    if let Some(body) = item.child_by_field_name("body") {
        entity.enum_values = body
            .named_children()
            .filter(|v| v.kind() == "enum_variant")
            .filter_map(|v| {
                let name = v.child_by_field_name("name")?.text();
                Some(EnumValue::new(name, text_of(v.child_by_field_name("value"))))
            })
            .collect();
    }
    Some(entity)
}

fn extract_value(item: SyntaxNode<'_>, out: &Collector<'_>) -> Option<Entity> {
    let name = item.child_by_field_name("name")?.text();
    let kind = if item.kind() == "const_item" {
        EntityKind::Constant
    } else {
        EntityKind::Variable
    };
    let mut entity = out.entity(kind, name, item);
    entity.visibility = rust_visibility(item);
    entity.value_type = item.child_by_field_name("type").map(|t| squash(t.text()));
    if let Some(value) = item.child_by_field_name("value") {
        entity.set_value(value.text());
    }
    Some(entity)
}

fn extract_trait<'t>(item: SyntaxNode<'t>, out: &mut Collector<'t>) {
    let Some(name) = item.child_by_field_name("name").map(|n| n.text()) else {
        return;
    };
    let body = item.child_by_field_name("body");
    let mut entity = out.entity(EntityKind::Type, name, item);
    entity.type_kind = Some(TypeKind::Interface);
    entity.visibility = rust_visibility(item);
    entity.implements = trait_bounds(item).into_iter().map(|b| b.name).collect();
    if let Some(body) = body {
        entity.fields = body
            .named_children()
            .filter(|m| matches!(m.kind(), "function_item" | "function_signature_item"))
            .filter_map(|m| {
                let method = m.child_by_field_name("name")?.text();
                let params = text_of(m.child_by_field_name("parameters"));
                let ret = text_of(m.child_by_field_name("return_type"));
                let signature = if ret.is_empty() {
                    params
                } else {
                    format!("{params} -> {ret}")
                };
                Some(Field::new(method, signature, Visibility::Public))
            })
            .collect();
    }
    out.push(entity, item);

    for member in body.into_iter().flat_map(|b| b.named_children()) {
        if matches!(member.kind(), "function_item" | "function_signature_item") {
            if let Some(mut e) = extract_fn(member, EntityKind::Method, Some(name), out) {
                e.visibility = Visibility::Public;
                out.push(e, member);
            }
        }
    }
}

fn extract_impl<'t>(item: SyntaxNode<'t>, out: &mut Collector<'t>) {
    let Some(owner) = impl_type_name(item) else {
        return;
    };
    let is_trait_impl = item.child_by_field_name("trait").is_some();
    let Some(body) = item.child_by_field_name("body") else {
        return;
    };
    for member in body.named_children().filter(|m| m.kind() == "function_item") {
        if let Some(mut e) = extract_fn(member, EntityKind::Method, Some(&owner), out) {
            if is_trait_impl {
                e.visibility = Visibility::Public;
            }
            out.push(e, member);
        }
    }
}

/// `impl<T> Stack<T>` -> `Stack`; `impl Display for &Wrapper` -> `Wrapper`.
fn impl_type_name(item: SyntaxNode<'_>) -> Option<String> {
    let ty = item.child_by_field_name("type")?;
    let text = squash(ty.text());
    let name = strip_generics(text.trim_start_matches('&').trim_start_matches("mut ")).to_string();
    (!name.is_empty()).then_some(name)
}

/// Flatten a use tree into `(name, path, alias)` triples.
fn flatten_use(node: SyntaxNode<'_>, prefix: &str, out: &mut Vec<(String, String, Option<String>)>) {
    let join = |tail: &str| {
        if prefix.is_empty() {
            tail.to_string()
        } else {
            format!("{prefix}::{tail}")
        }
    };
    match node.kind() {
        "identifier" | "scoped_identifier" | "crate" | "super" | "self" => {
            let text = squash(node.text());
            if text == "self" && !prefix.is_empty() {
                let name = prefix.rsplit("::").next().unwrap_or(prefix);
                out.push((name.to_string(), prefix.to_string(), None));
                return;
            }
            let path = join(&text);
            let name = path.rsplit("::").next().unwrap_or(&path).to_string();
            out.push((name, path, None));
        }
        "use_as_clause" => {
            let path = join(&text_of(node.child_by_field_name("path")));
            let name = path.rsplit("::").next().unwrap_or(&path).to_string();
            let alias = node.child_by_field_name("alias").map(|a| a.text().to_string());
            out.push((name, path, alias));
        }
        "use_wildcard" => {
            let base = node
                .named_children()
                .next()
                .map(|p| join(&squash(p.text())))
                .unwrap_or_else(|| prefix.to_string());
            out.push(("*".to_string(), base, None));
        }
        "scoped_use_list" => {
            let base = node
                .child_by_field_name("path")
                .map(|p| join(&squash(p.text())))
                .unwrap_or_else(|| prefix.to_string());
            if let Some(list) = node.child_by_field_name("list") {
                flatten_use(list, &base, out);
            }
        }
        "use_list" => {
            for child in node.named_children() {
                flatten_use(child, prefix, out);
            }
        }
        _ => {}
    }
}

/// `pub` public; `pub(crate)`, `pub(super)`, `pub(in ...)` protected;
/// no modifier private.
fn rust_visibility(item: SyntaxNode<'_>) -> Visibility {
    match item.child_of_kind("visibility_modifier") {
        Some(v) => visibility_of(v.text()),
        None => Visibility::Private,
    }
}

fn visibility_of(modifier: &str) -> Visibility {
    if modifier.trim() == "pub" {
        Visibility::Public
    } else {
        Visibility::Protected
    }
}

/// Outer attributes written directly above an item.
fn attributes(item: SyntaxNode<'_>) -> Vec<SyntaxNode<'_>> {
    let mut found = Vec::new();
    let mut cur = item.prev_named_sibling();
    while let Some(node) = cur {
        match node.kind() {
            "attribute_item" => found.push(node),
            "line_comment" | "block_comment" => {}
            _ => break,
        }
        cur = node.prev_named_sibling();
    }
    found.reverse();
    found
}

/// `#[derive(Debug)]` -> `derive(Debug)`.
fn attribute_text(item: SyntaxNode<'_>) -> String {
    item.named_children()
        .find(|c| c.kind() == "attribute")
        .map(|a| squash(a.text()))
        .unwrap_or_default()
}

/// `impl Trait for Name` blocks anywhere in the file.
fn trait_impls(item: SyntaxNode<'_>) -> Vec<BaseType<'_>> {
    let Some(name) = item.child_by_field_name("name").map(|n| n.text()) else {
        return Vec::new();
    };
    let Some(root) = item.tree().root() else {
        return Vec::new();
    };
    root.descendants_of_kind("impl_item")
        .into_iter()
        .filter(|imp| impl_type_name(*imp).as_deref() == Some(name))
        .filter_map(|imp| {
            let trait_node = imp.child_by_field_name("trait")?;
            Some(BaseType {
                name: strip_generics(&squash(trait_node.text())).to_string(),
                node: trait_node,
                dep_type: DepType::Implements,
            })
        })
        .collect()
}

/// Supertraits: `trait Repo: Clone + Store`.
fn trait_bounds(item: SyntaxNode<'_>) -> Vec<BaseType<'_>> {
    item.child_by_field_name("bounds")
        .map(|bounds| {
            bounds
                .named_children()
                .filter(|b| {
                    matches!(
                        b.kind(),
                        "type_identifier" | "scoped_type_identifier" | "generic_type"
                    )
                })
                .map(|b| BaseType {
                    name: strip_generics(&squash(b.text())).to_string(),
                    node: b,
                    dep_type: DepType::Extends,
                })
                .collect()
        })
        .unwrap_or_default()
}

// ── Reference Rules ───────────────────────────────────────────────────────

impl ReferenceRules for RustFrontend {
    fn separators(&self) -> &'static [&'static str] {
        &["::", "."]
    }

    fn body<'t>(&self, decl: SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
        decl.child_by_field_name("body")
    }

    fn decorators<'t>(&self, decl: SyntaxNode<'t>) -> Vec<SyntaxNode<'t>> {
        attributes(decl)
    }

    fn type_body<'t>(&self, decl: SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
        match decl.kind() {
            "type_item" => decl.child_by_field_name("type"),
            _ => decl.child_by_field_name("body"),
        }
    }

    fn base_types<'t>(&self, decl: SyntaxNode<'t>) -> Vec<BaseType<'t>> {
        match decl.kind() {
            "trait_item" => trait_bounds(decl),
            "struct_item" | "union_item" | "enum_item" => trait_impls(decl),
            _ => Vec::new(),
        }
    }

    fn classify(&self, node: SyntaxNode<'_>) -> Option<RefClass> {
        match node.kind() {
            "call_expression" | "macro_invocation" => Some(RefClass::Call),
            "struct_expression" => Some(RefClass::Construct),
            "attribute_item" => Some(RefClass::Decorator),
            "scoped_type_identifier" => Some(RefClass::TypeRef),
            "type_identifier" => {
                let parent = node.parent().map(|p| p.kind());
                let excluded = matches!(
                    parent,
                    Some("scoped_type_identifier" | "type_parameters" | "constrained_type_parameter")
                ) || (node.field_name() == Some("name") && parent != Some("generic_type"));
                (!excluded).then_some(RefClass::TypeRef)
            }
            _ => None,
        }
    }

    fn target_name(&self, node: SyntaxNode<'_>, class: RefClass) -> Option<String> {
        match class {
            RefClass::Call if node.kind() == "macro_invocation" => {
                Some(squash(node.child_by_field_name("macro")?.text()))
            }
            RefClass::Call => callee(node.child_by_field_name("function")?),
            RefClass::Construct => {
                let name = node.child_by_field_name("name")?;
                match name.kind() {
                    "generic_type_with_turbofish" | "generic_type" => {
                        Some(squash(name.child_by_field_name("type")?.text()))
                    }
                    _ => Some(squash(name.text())),
                }
            }
            RefClass::Decorator => {
                let attr = node.named_children().find(|c| c.kind() == "attribute")?;
                let path = attr.named_children().next()?;
                matches!(path.kind(), "identifier" | "scoped_identifier").then(|| squash(path.text()))
            }
            RefClass::TypeRef => Some(squash(node.text())),
        }
    }

    fn is_conditional(&self, kind: &str) -> bool {
        matches!(kind, "if_expression" | "match_expression")
    }

    fn is_boundary(&self, kind: &str) -> bool {
        matches!(
            kind,
            "function_item" | "closure_expression" | "impl_item" | "trait_item" | "mod_item"
        )
    }

    fn is_type_declaration(&self, kind: &str) -> bool {
        matches!(kind, "impl_item" | "trait_item")
    }

    fn type_declaration_name(&self, node: SyntaxNode<'_>) -> Option<String> {
        match node.kind() {
            "impl_item" => impl_type_name(node),
            _ => node.child_by_field_name("name").map(|n| n.text().to_string()),
        }
    }
}

fn callee(node: SyntaxNode<'_>) -> Option<String> {
    match node.kind() {
        "scoped_identifier" => Some(squash(node.text())),
        "generic_function" => callee(node.child_by_field_name("function")?),
        _ => member_chain(
            node,
            &["field_expression"],
            "value",
            "field",
            &["identifier", "self", "scoped_identifier"],
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    fn extract(src: &str) -> Vec<Entity> {
        let tree = parse_source(&RustFrontend.tree_sitter_language(), src.to_string()).unwrap();
        RustFrontend.extract_entities(&tree, "src/lib.rs")
    }

    fn find<'a>(entities: &'a [Entity], name: &str) -> &'a Entity {
        entities.iter().find(|e| e.name == name).unwrap()
    }

    #[test]
    fn extract_rust_functions_and_methods() {
        let src = r#"pub async fn fetch(url: &str, retries: u32) -> Result<Vec<u8>, Error> {
    todo!()
}

struct Stack<T> {
    items: Vec<T>,
    pub(crate) len: usize,
}

impl<T> Stack<T> {
    pub fn new() -> Self {
        Stack { items: Vec::new(), len: 0 }
    }

    fn push(&mut self, item: T) {
        self.items.push(item);
    }
}
"#;
        let entities = extract(src);
        let fetch = find(&entities, "fetch");
        assert_eq!(fetch.kind, EntityKind::Function);
        assert!(fetch.is_async);
        assert_eq!(fetch.visibility, Visibility::Public);
        assert_eq!(
            fetch.params,
            vec![Param::new("url", "&str"), Param::new("retries", "u32")]
        );
        assert_eq!(fetch.returns, vec!["Result<Vec<u8>, Error>"]);

        let stack = find(&entities, "Stack");
        assert_eq!(stack.type_kind, Some(TypeKind::Struct));
        assert_eq!(stack.visibility, Visibility::Private);
        assert_eq!(
            stack.fields,
            vec![
                Field::new("items", "Vec<T>", Visibility::Private),
                Field::new("len", "usize", Visibility::Protected),
            ]
        );

        let new = find(&entities, "new");
        assert_eq!(new.kind, EntityKind::Method);
        assert_eq!(new.receiver.as_deref(), Some("Stack (static)"));
        let push = find(&entities, "push");
        assert_eq!(push.receiver.as_deref(), Some("Stack"));
        assert_eq!(push.params, vec![Param::new("item", "T")]);
        assert!(push.returns.is_empty());
    }

    #[test]
    fn extract_rust_traits_enums_and_values() {
        let src = r#"pub trait Store: Clone {
    fn get(&self, key: &str) -> Option<String>;
}

#[derive(Debug)]
#[repr(u8)]
pub enum Level {
    Low = 1,
    High,
}

pub struct Meters(pub f64);

const LIMIT: usize = 64;
static mut COUNTER: u32 = 0;
type Map = HashMap<String, Level>;
"#;
        let entities = extract(src);
        let store = find(&entities, "Store");
        assert_eq!(store.type_kind, Some(TypeKind::Interface));
        assert_eq!(store.implements, vec!["Clone"]);
        assert_eq!(store.fields[0].type_name, "(&self, key: &str) -> Option<String>");
        let get = find(&entities, "get");
        assert_eq!(get.receiver.as_deref(), Some("Store"));
        assert!(get.body_hash.is_none());

        let level = find(&entities, "Level");
        assert_eq!(level.kind, EntityKind::Enum);
        assert_eq!(level.value_type.as_deref(), Some("u8"));
        assert_eq!(level.decorators, vec!["derive(Debug)", "repr(u8)"]);
        assert_eq!(
            level.enum_values,
            vec![EnumValue::new("Low", "1"), EnumValue::new("High", "")]
        );

        let meters = find(&entities, "Meters");
        assert_eq!(meters.fields, vec![Field::new("0", "f64", Visibility::Public)]);

        let limit = find(&entities, "LIMIT");
        assert_eq!(limit.kind, EntityKind::Constant);
        assert_eq!(limit.value_type.as_deref(), Some("usize"));
        assert_eq!(limit.value.as_deref(), Some("64"));
        assert_eq!(find(&entities, "COUNTER").kind, EntityKind::Variable);
        assert_eq!(find(&entities, "Map").type_kind, Some(TypeKind::Alias));
    }

    #[test]
    fn extract_rust_use_trees() {
        let src = "use std::collections::{HashMap, BTreeMap as Tree};\nuse crate::model::*;\nuse super::config::{self, Config};\n";
        let entities = extract(src);
        let imports: Vec<_> = entities
            .iter()
            .map(|e| {
                (
                    e.name.as_str(),
                    e.import_path.as_deref().unwrap_or(""),
                    e.import_alias.as_deref(),
                )
            })
            .collect();
        assert_eq!(
            imports,
            vec![
                ("HashMap", "std::collections::HashMap", None),
                ("BTreeMap", "std::collections::BTreeMap", Some("Tree")),
                ("*", "crate::model", None),
                ("config", "super::config", None),
                ("Config", "super::config::Config", None),
            ]
        );
    }

    #[test]
    fn trait_impls_and_scoped_calls_resolve() {
        use crate::languages::LanguageRegistry;
        use crate::projection::project;
        use crate::resolver::{DependencyResolver, ResolverOptions};

        let src = r#"struct Parser;

trait Visitor {}

impl Visitor for Parser {}

impl Parser {
    fn new() -> Self {
        Parser
    }

    #[inline]
    fn run(&self) {
        let p = Parser::new();
        println!("{}", 1);
        if true {
            self.step();
        }
    }

    fn step(&self) {}
}
"#;
        let tree = parse_source(&RustFrontend.tree_sitter_language(), src.to_string()).unwrap();
        let items = RustFrontend.extract(&tree, "parser.rs");
        let registry = LanguageRegistry::new();
        let batch = project(&items, &registry).unwrap();
        let deps = DependencyResolver::new(batch, &registry, ResolverOptions::default())
            .resolve_all()
            .unwrap();

        let id = |name: &str| items.iter().find(|i| i.entity.name == name).unwrap().entity.id();
        let implements = deps
            .iter()
            .find(|d| d.dep_type == DepType::Implements)
            .unwrap();
        assert_eq!(implements.from_id, id("Parser"));
        assert_eq!(implements.to_id, id("Visitor"));
        assert_eq!(implements.location, "parser.rs:5");

        let run: Vec<_> = deps
            .iter()
            .filter(|d| d.from_id == id("run"))
            .map(|d| (d.dep_type, d.to_qualified.as_deref().unwrap_or(&d.to_name), d.optional))
            .collect();
        assert_eq!(
            run,
            vec![
                (DepType::Calls, "Parser::new", false),
                (DepType::Calls, "self.step", true),
                (DepType::MethodOf, "Parser", false),
            ]
        );
        let new_call = deps
            .iter()
            .find(|d| d.to_qualified.as_deref() == Some("Parser::new"))
            .unwrap();
        assert_eq!(new_call.to_id, id("new"));
    }

    #[test]
    fn if_let_marks_references_optional() {
        use crate::languages::LanguageRegistry;
        use crate::projection::project;
        use crate::resolver::{DependencyResolver, ResolverOptions};

        let src = "fn run(v: Option<u8>) {\n    if let Some(x) = v {\n        emit(x);\n    }\n}\n\nfn emit(x: u8) {}\n";
        let tree = parse_source(&RustFrontend.tree_sitter_language(), src.to_string()).unwrap();
        let items = RustFrontend.extract(&tree, "opt.rs");
        let registry = LanguageRegistry::new();
        let batch = project(&items, &registry).unwrap();
        let deps = DependencyResolver::new(batch, &registry, ResolverOptions::default())
            .resolve_all()
            .unwrap();

        let run = items.iter().find(|i| i.entity.name == "run").unwrap().entity.id();
        let calls: Vec<_> = deps
            .iter()
            .filter(|d| d.from_id == run)
            .map(|d| (d.dep_type, d.to_name.as_str(), d.optional))
            .collect();
        assert_eq!(calls, vec![(DepType::Calls, "emit", true)]);
        assert!(RustFrontend.is_conditional("if_expression"));
        assert!(!RustFrontend.is_conditional("if_let_expression"));
    }
}
