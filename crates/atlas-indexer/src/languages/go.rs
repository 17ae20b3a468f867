//! Go front-end using tree-sitter-go

use atlas_core::{DepType, Entity, EntityKind, Field, Language, Param, TypeKind, Visibility};

use super::{Collector, member_chain, strip_generics, text_of, unquote};
use crate::extractor::{BaseType, EntityWithNode, LanguageExtractor, RefClass, ReferenceRules};
use crate::syntax::{SyntaxNode, SyntaxTree};

/// Go language front-end.
pub struct GoFrontend;

impl LanguageExtractor for GoFrontend {
    fn language(&self) -> Language {
        Language::Go
    }

    fn name(&self) -> &'static str {
        "go"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["go"]
    }

    fn tree_sitter_language(&self) -> tree_sitter::Language {
        tree_sitter_go::LANGUAGE.into()
    }

    fn extract<'t>(&self, tree: &'t SyntaxTree, file: &str) -> Vec<EntityWithNode<'t>> {
        let mut out = Collector::new(file, Language::Go);
        if let Some(root) = tree.root() {
            for child in root.named_children() {
                extract_top_level(child, &mut out);
            }
        }
        out.finish()
    }
}

// ── Entity Extraction ─────────────────────────────────────────────────────

fn extract_top_level<'t>(node: SyntaxNode<'t>, out: &mut Collector<'t>) {
    match node.kind() {
        "function_declaration" => {
            if let Some(e) = extract_function(node, out) {
                out.push(e, node);
            }
        }
        "method_declaration" => {
            if let Some(e) = extract_method(node, out) {
                out.push(e, node);
            }
        }
        "type_declaration" => {
            for spec in node.named_children() {
                if matches!(spec.kind(), "type_spec" | "type_alias") {
                    if let Some(e) = extract_type_spec(spec, out) {
                        out.push(e, spec);
                    }
                }
            }
        }
        "const_declaration" => {
            for spec in specs(node, "const_spec") {
                extract_value_spec(spec, EntityKind::Constant, out);
            }
        }
        "var_declaration" => {
            for spec in specs(node, "var_spec") {
                extract_value_spec(spec, EntityKind::Variable, out);
            }
        }
        "import_declaration" => {
            for spec in specs(node, "import_spec") {
                if let Some(e) = extract_import(spec, out) {
                    out.push(e, spec);
                }
            }
        }
        _ => {}
    }
}

/// Specs directly under a declaration or inside its parenthesised list.
fn specs<'t>(decl: SyntaxNode<'t>, kind: &str) -> Vec<SyntaxNode<'t>> {
    let mut found = Vec::new();
    for child in decl.named_children() {
        if child.kind() == kind {
            found.push(child);
        } else if child.kind().ends_with("_list") {
            found.extend(child.named_children().filter(|c| c.kind() == kind));
        }
    }
    found
}

fn extract_function(node: SyntaxNode<'_>, out: &Collector<'_>) -> Option<Entity> {
    let name = node.child_by_field_name("name")?.text();
    let mut entity = out.entity(EntityKind::Function, name, node);
    fill_signature(&mut entity, node);
    Some(entity)
}

fn extract_method(node: SyntaxNode<'_>, out: &Collector<'_>) -> Option<Entity> {
    let name = node.child_by_field_name("name")?.text();
    let mut entity = out.entity(EntityKind::Method, name, node);
    entity.receiver = receiver_type(node);
    fill_signature(&mut entity, node);
    Some(entity)
}

fn fill_signature(entity: &mut Entity, node: SyntaxNode<'_>) {
    if let Some(params) = node.child_by_field_name("parameters") {
        entity.params = parameters(params);
    }
    if let Some(result) = node.child_by_field_name("result") {
        entity.returns = if result.kind() == "parameter_list" {
            parameters(result).into_iter().map(|p| p.type_name).collect()
        } else {
            vec![text_of(Some(result))]
        };
    }
    entity.visibility = go_visibility(&entity.name);
    if let Some(body) = node.child_by_field_name("body") {
        entity.raw_body = body.text().to_string();
    }
}

/// One `Param` per declared name; unnamed parameters keep only their type.
fn parameters(list: SyntaxNode<'_>) -> Vec<Param> {
    let mut params = Vec::new();
    for decl in list.named_children() {
        let variadic = decl.kind() == "variadic_parameter_declaration";
        if !variadic && decl.kind() != "parameter_declaration" {
            continue;
        }
        let mut type_name = text_of(decl.child_by_field_name("type"));
        if variadic {
            type_name = format!("...{type_name}");
        }
        let names: Vec<_> = decl.children_by_field_name("name").collect();
        if names.is_empty() {
            params.push(Param::new("", type_name));
        } else {
            for name in names {
                params.push(Param::new(name.text(), type_name.clone()));
            }
        }
    }
    params
}

/// Receiver type without pointer or type arguments: `(s *List[T])` -> `List`.
fn receiver_type(node: SyntaxNode<'_>) -> Option<String> {
    let receiver = node.child_by_field_name("receiver")?;
    let decl = receiver
        .named_children()
        .find(|c| c.kind() == "parameter_declaration")?;
    let text = text_of(decl.child_by_field_name("type"));
    let clean = strip_generics(text.trim_start_matches('*'));
    (!clean.is_empty()).then(|| clean.to_string())
}

fn extract_type_spec(spec: SyntaxNode<'_>, out: &Collector<'_>) -> Option<Entity> {
    let name = spec.child_by_field_name("name")?.text();
    let type_node = spec.child_by_field_name("type");
    let mut entity = out.entity(EntityKind::Type, name, spec);
    entity.visibility = go_visibility(name);
    entity.type_kind = Some(match (spec.kind(), type_node.map(|t| t.kind())) {
        ("type_spec", Some("struct_type")) => TypeKind::Struct,
        ("type_spec", Some("interface_type")) => TypeKind::Interface,
        _ => TypeKind::Alias,
    });

    if let Some(type_node) = type_node {
        match type_node.kind() {
            "struct_type" => entity.fields = struct_fields(type_node),
            "interface_type" => entity.fields = interface_methods(type_node),
            _ => {}
        }
    }
    entity.implements = embedded_types(spec).into_iter().map(|(n, _)| n).collect();
    Some(entity)
}

fn struct_fields(struct_type: SyntaxNode<'_>) -> Vec<Field> {
    let mut fields = Vec::new();
    for decl in struct_type.descendants_of_kind("field_declaration") {
        // Skip fields of nested anonymous structs.
        if decl.ancestors().find(|a| a.kind() == "struct_type") != Some(struct_type) {
            continue;
        }
        let type_name = text_of(decl.child_by_field_name("type"));
        let names: Vec<_> = decl.children_by_field_name("name").collect();
        if names.is_empty() {
            fields.push(Field::new("", type_name.clone(), Visibility::Public));
        }
        for name in names {
            fields.push(Field::new(name.text(), type_name.clone(), go_visibility(name.text())));
        }
    }
    fields
}

fn interface_methods(interface: SyntaxNode<'_>) -> Vec<Field> {
    interface
        .named_children()
        .filter(|c| matches!(c.kind(), "method_elem" | "method_spec"))
        .filter_map(|m| {
            let name = m.child_by_field_name("name")?.text();
            let params = text_of(m.child_by_field_name("parameters"));
            let result = text_of(m.child_by_field_name("result"));
            let signature = if result.is_empty() {
                params
            } else {
                format!("{params} {result}")
            };
            Some(Field::new(name, signature, go_visibility(name)))
        })
        .collect()
}

/// Embedded struct fields and embedded interfaces, in declaration order.
fn embedded_types(spec: SyntaxNode<'_>) -> Vec<(String, SyntaxNode<'_>)> {
    let Some(type_node) = spec.child_by_field_name("type") else {
        return Vec::new();
    };
    let mut found = Vec::new();
    match type_node.kind() {
        "struct_type" => {
            for decl in type_node.descendants_of_kind("field_declaration") {
                if decl.child_by_field_name("name").is_some() {
                    continue;
                }
                if let Some(t) = decl.child_by_field_name("type") {
                    found.push((strip_generics(t.text().trim_start_matches('*')).to_string(), t));
                }
            }
        }
        "interface_type" => {
            for child in type_node.named_children() {
                match child.kind() {
                    "type_elem" | "constraint_elem" => {
                        for t in child.named_children() {
                            if matches!(t.kind(), "type_identifier" | "qualified_type" | "generic_type") {
                                found.push((strip_generics(t.text()).to_string(), t));
                            }
                        }
                    }
                    "type_identifier" | "qualified_type" => {
                        found.push((child.text().to_string(), child));
                    }
                    _ => {}
                }
            }
        }
        _ => {}
    }
    found.retain(|(name, _)| !name.is_empty());
    found
}

fn extract_value_spec<'t>(spec: SyntaxNode<'t>, kind: EntityKind, out: &mut Collector<'t>) {
    let type_name = text_of(spec.child_by_field_name("type"));
    let values: Vec<_> = spec
        .child_by_field_name("value")
        .map(|list| list.named_children().collect())
        .unwrap_or_default();
    let names = spec
        .children_by_field_name("name")
        .filter(|n| n.kind() == "identifier");
    for (i, name) in names.enumerate() {
        let mut entity = out.entity(kind, name.text(), spec);
        entity.visibility = go_visibility(name.text());
        if !type_name.is_empty() {
            entity.value_type = Some(type_name.clone());
        }
        if let Some(value) = values.get(i) {
            entity.set_value(value.text());
        }
        out.push(entity, spec);
    }
}

fn extract_import(spec: SyntaxNode<'_>, out: &Collector<'_>) -> Option<Entity> {
    let path = unquote(spec.child_by_field_name("path")?.text());
    let alias = spec
        .child_by_field_name("name")
        .map(|n| n.text().to_string())
        .filter(|a| !a.is_empty());
    let name = path.rsplit('/').next().unwrap_or(&path).to_string();
    let mut entity = out.entity(EntityKind::Import, &name, spec);
    entity.import_path = Some(path);
    entity.import_alias = alias;
    Some(entity)
}

fn go_visibility(name: &str) -> Visibility {
    if name.chars().next().is_some_and(|c| c.is_uppercase()) {
        Visibility::Public
    } else {
        Visibility::Private
    }
}

// ── Reference Rules ───────────────────────────────────────────────────────

impl ReferenceRules for GoFrontend {
    fn body<'t>(&self, decl: SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
        decl.child_by_field_name("body")
    }

    fn type_body<'t>(&self, decl: SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
        decl.child_by_field_name("type")
    }

    fn base_types<'t>(&self, decl: SyntaxNode<'t>) -> Vec<BaseType<'t>> {
        embedded_types(decl)
            .into_iter()
            .map(|(name, node)| BaseType {
                name,
                node,
                dep_type: DepType::Extends,
            })
            .collect()
    }

    fn classify(&self, node: SyntaxNode<'_>) -> Option<RefClass> {
        match node.kind() {
            "call_expression" => Some(RefClass::Call),
            "composite_literal" => Some(RefClass::Construct),
            "qualified_type" => Some(RefClass::TypeRef),
            "type_identifier" => {
                let parent = node.parent().map(|p| p.kind());
                let is_decl_name = node.field_name() == Some("name");
                (parent != Some("qualified_type") && !is_decl_name).then_some(RefClass::TypeRef)
            }
            _ => None,
        }
    }

    fn target_name(&self, node: SyntaxNode<'_>, class: RefClass) -> Option<String> {
        match class {
            RefClass::Call => {
                let callee = node.child_by_field_name("function")?;
                member_chain(callee, &["selector_expression"], "operand", "field", &["identifier"])
            }
            RefClass::Construct => {
                let ty = node.child_by_field_name("type")?;
                match ty.kind() {
                    "type_identifier" | "qualified_type" => Some(ty.text().to_string()),
                    "generic_type" => ty.child_by_field_name("type").map(|t| t.text().to_string()),
                    _ => None,
                }
            }
            RefClass::TypeRef => Some(node.text().to_string()),
            RefClass::Decorator => None,
        }
    }

    fn is_conditional(&self, kind: &str) -> bool {
        matches!(
            kind,
            "if_statement" | "expression_switch_statement" | "type_switch_statement" | "select_statement"
        )
    }

    fn is_boundary(&self, kind: &str) -> bool {
        matches!(kind, "function_declaration" | "method_declaration" | "func_literal")
    }

    fn is_type_declaration(&self, kind: &str) -> bool {
        matches!(kind, "type_spec" | "type_alias")
    }

    fn type_declaration_name(&self, node: SyntaxNode<'_>) -> Option<String> {
        node.child_by_field_name("name").map(|n| n.text().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    fn extract(src: &str) -> Vec<Entity> {
        let tree = parse_source(&GoFrontend.tree_sitter_language(), src.to_string()).unwrap();
        GoFrontend.extract_entities(&tree, "pkg/server.go")
    }

    fn find<'a>(entities: &'a [Entity], name: &str) -> &'a Entity {
        entities.iter().find(|e| e.name == name).unwrap()
    }

    #[test]
    fn extract_go_function() {
        let src = "package main\n\nfunc Add(a, b int) (int, error) {\n\treturn a + b, nil\n}\n";
        let entities = extract(src);
        let add = find(&entities, "Add");
        assert_eq!(add.kind, EntityKind::Function);
        assert_eq!(add.params, vec![Param::new("a", "int"), Param::new("b", "int")]);
        assert_eq!(add.returns, vec!["int", "error"]);
        assert_eq!((add.start_line, add.end_line), (3, 5));
        assert_eq!(add.visibility, Visibility::Public);
        assert!(add.body_hash.is_some());
        assert_eq!(add.sig_hash.len(), 8);
    }

    #[test]
    fn extract_go_method() {
        let src = "package main\n\nfunc (s *Server) start(port int) {}\n";
        let entities = extract(src);
        let m = find(&entities, "start");
        assert_eq!(m.kind, EntityKind::Method);
        assert_eq!(m.receiver.as_deref(), Some("Server"));
        assert_eq!(m.visibility, Visibility::Private);
        assert_eq!(m.returns, Vec::<String>::new());
    }

    #[test]
    fn extract_go_struct_and_interface() {
        let src = r#"package main

type Server struct {
	Base
	Name, Host string
	port int
}

type Handler interface {
	io.Closer
	Serve(req *Request) error
}

type ID string
"#;
        let entities = extract(src);
        let server = find(&entities, "Server");
        assert_eq!(server.type_kind, Some(TypeKind::Struct));
        assert_eq!(
            server.fields,
            vec![
                Field::new("", "Base", Visibility::Public),
                Field::new("Name", "string", Visibility::Public),
                Field::new("Host", "string", Visibility::Public),
                Field::new("port", "int", Visibility::Private),
            ]
        );
        assert_eq!(server.implements, vec!["Base"]);

        let handler = find(&entities, "Handler");
        assert_eq!(handler.type_kind, Some(TypeKind::Interface));
        assert_eq!(handler.fields[0].name, "Serve");
        assert_eq!(handler.fields[0].type_name, "(req *Request) error");
        assert_eq!(handler.implements, vec!["io.Closer"]);

        assert_eq!(find(&entities, "ID").type_kind, Some(TypeKind::Alias));
    }

    #[test]
    fn extract_go_values_and_imports() {
        let src = r#"package main

import (
	"fmt"
	str "strings"
	"net/http"
)

const MaxSize int = 100
const (
	a, b = 1, 2
)

var registry = map[string]int{}
"#;
        let entities = extract(src);
        let max = find(&entities, "MaxSize");
        assert_eq!(max.kind, EntityKind::Constant);
        assert_eq!(max.value_type.as_deref(), Some("int"));
        assert_eq!(max.value.as_deref(), Some("100"));
        assert_eq!(find(&entities, "a").value.as_deref(), Some("1"));
        assert_eq!(find(&entities, "b").value.as_deref(), Some("2"));
        assert!(entities.iter().all(|e| e.name != ","));
        assert_eq!(find(&entities, "registry").kind, EntityKind::Variable);

        let http = find(&entities, "http");
        assert_eq!(http.import_path.as_deref(), Some("net/http"));
        let aliased = find(&entities, "strings");
        assert_eq!(aliased.import_path.as_deref(), Some("strings"));
        assert_eq!(aliased.import_alias.as_deref(), Some("str"));
        assert_eq!(find(&entities, "fmt").import_alias, None);
    }

    #[test]
    fn method_of_falls_back_to_receiver() {
        use crate::languages::LanguageRegistry;
        use crate::projection::project;
        use crate::resolver::{DependencyResolver, ResolverOptions};

        let src = r#"package main

type Server struct{}

func (s *Server) Start() {
	if s.ready() {
		fmt.Println("up")
		s.listen()
	}
	cfg := Config{}
	_ = cfg
}
"#;
        let tree = parse_source(&GoFrontend.tree_sitter_language(), src.to_string()).unwrap();
        let items = GoFrontend.extract(&tree, "server.go");
        let registry = LanguageRegistry::new();
        let batch = project(&items, &registry).unwrap();
        let deps = DependencyResolver::new(batch, &registry, ResolverOptions::default())
            .resolve_all()
            .unwrap();

        let server_id = items.iter().find(|i| i.entity.name == "Server").unwrap().entity.id();
        let method_of = deps.iter().find(|d| d.dep_type == DepType::MethodOf).unwrap();
        assert_eq!(method_of.to_name, "Server");
        assert_eq!(method_of.to_id, server_id);

        let calls: Vec<_> = deps
            .iter()
            .filter(|d| d.dep_type == DepType::Calls)
            .map(|d| (d.to_qualified.as_deref().unwrap_or(&d.to_name), d.optional))
            .collect();
        assert_eq!(calls, vec![("Config", false), ("s.listen", true), ("s.ready", true)]);
    }
}
