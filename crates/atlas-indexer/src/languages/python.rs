//! Python front-end using tree-sitter-python

use atlas_core::{DepType, Entity, EntityKind, EnumValue, Field, Language, Param, TypeKind, Visibility};

use super::{Collector, has_child_kind, member_chain, squash, text_of, unquote};
use crate::extractor::{BaseType, EntityWithNode, LanguageExtractor, RefClass, ReferenceRules};
use crate::syntax::{SyntaxNode, SyntaxTree};

const ENUM_BASES: &[&str] = &["Enum", "IntEnum", "StrEnum", "Flag", "IntFlag"];
const INTERFACE_BASES: &[&str] = &["ABC", "Protocol"];

/// Python language front-end.
pub struct PythonFrontend;

impl LanguageExtractor for PythonFrontend {
    fn language(&self) -> Language {
        Language::Python
    }

    fn name(&self) -> &'static str {
        "python"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["py", "pyi"]
    }

    fn tree_sitter_language(&self) -> tree_sitter::Language {
        tree_sitter_python::LANGUAGE.into()
    }

    fn extract<'t>(&self, tree: &'t SyntaxTree, file: &str) -> Vec<EntityWithNode<'t>> {
        let mut out = Collector::new(file, Language::Python);
        if let Some(root) = tree.root() {
            for child in root.named_children() {
                extract_module_item(child, &mut out);
            }
        }
        out.finish()
    }
}

// ── Entity Extraction ─────────────────────────────────────────────────────

fn extract_module_item<'t>(node: SyntaxNode<'t>, out: &mut Collector<'t>) {
    match node.kind() {
        "function_definition" | "decorated_definition" => {
            let Some(def) = unwrap_decorated(node) else {
                return;
            };
            match def.kind() {
                "function_definition" => {
                    if let Some(e) = extract_function(def, None, out) {
                        out.push(e, def);
                    }
                }
                "class_definition" => extract_class(def, out),
                _ => {}
            }
        }
        "class_definition" => extract_class(node, out),
        "expression_statement" => {
            for assign in node.named_children().filter(|c| c.kind() == "assignment") {
                if let Some(e) = extract_assignment(assign, out) {
                    out.push(e, assign);
                }
            }
        }
        "import_statement" | "import_from_statement" => {
            for e in extract_imports(node, out) {
                out.push(e, node);
            }
        }
        _ => {}
    }
}

/// The definition inside a `decorated_definition`, or the node itself.
fn unwrap_decorated(node: SyntaxNode<'_>) -> Option<SyntaxNode<'_>> {
    if node.kind() == "decorated_definition" {
        node.child_by_field_name("definition")
    } else {
        Some(node)
    }
}

/// Decorator expressions without the `@`, outermost first.
fn decorator_names(def: SyntaxNode<'_>) -> Vec<String> {
    decorator_nodes(def)
        .into_iter()
        .map(|d| squash(d.text().trim_start_matches('@')))
        .collect()
}

fn decorator_nodes(def: SyntaxNode<'_>) -> Vec<SyntaxNode<'_>> {
    match def.parent() {
        Some(parent) if parent.kind() == "decorated_definition" => parent
            .named_children()
            .filter(|c| c.kind() == "decorator")
            .collect(),
        _ => Vec::new(),
    }
}

fn extract_function(def: SyntaxNode<'_>, class: Option<&str>, out: &Collector<'_>) -> Option<Entity> {
    let name = def.child_by_field_name("name")?.text();
    let kind = if class.is_some() {
        EntityKind::Method
    } else {
        EntityKind::Function
    };
    let mut entity = out.entity(kind, name, def);
    entity.decorators = decorator_names(def);
    entity.is_async = has_child_kind(def, &["async"]);
    entity.visibility = python_visibility(name);

    if let Some(class) = class {
        let modifier = if entity.decorators.iter().any(|d| d == "staticmethod") {
            " (static)"
        } else if entity.decorators.iter().any(|d| d == "classmethod") {
            " (class)"
        } else {
            ""
        };
        entity.receiver = Some(format!("{class}{modifier}"));
    }
    if let Some(params) = def.child_by_field_name("parameters") {
        entity.params = parameters(params, class.is_some());
    }
    if let Some(ret) = def.child_by_field_name("return_type") {
        let ret = squash(ret.text());
        if ret != "None" {
            entity.returns = vec![ret];
        }
    }
    if let Some(body) = def.child_by_field_name("body") {
        entity.raw_body = body.text().to_string();
    }
    Some(entity)
}

fn parameters(list: SyntaxNode<'_>, is_method: bool) -> Vec<Param> {
    let mut params = Vec::new();
    for p in list.named_children() {
        let (name, type_name) = match p.kind() {
            "identifier" => (p.text().to_string(), String::new()),
            "typed_parameter" => {
                let name = p
                    .named_children()
                    .find(|c| c.field_name().is_none())
                    .map(|c| c.text().to_string())
                    .unwrap_or_default();
                (name, text_of(p.child_by_field_name("type")))
            }
            "default_parameter" | "typed_default_parameter" => (
                text_of(p.child_by_field_name("name")),
                text_of(p.child_by_field_name("type")),
            ),
            "list_splat_pattern" | "dictionary_splat_pattern" => (p.text().to_string(), String::new()),
            _ => continue,
        };
        if is_method && params.is_empty() && (name == "self" || name == "cls") {
            continue;
        }
        params.push(Param::new(name, type_name));
    }
    params
}

fn extract_class<'t>(def: SyntaxNode<'t>, out: &mut Collector<'t>) {
    let Some(name) = def.child_by_field_name("name").map(|n| n.text()) else {
        return;
    };
    let bases: Vec<String> = base_nodes(def).iter().map(|b| b.text().to_string()).collect();
    let is_enum = bases.iter().any(|b| ENUM_BASES.contains(&last_segment(b)));

    let mut entity = out.entity(if is_enum { EntityKind::Enum } else { EntityKind::Type }, name, def);
    entity.decorators = decorator_names(def);
    entity.visibility = python_visibility(name);
    entity.implements = bases.clone();
    let body = def.child_by_field_name("body");

    if is_enum {
        entity.value_type = bases
            .iter()
            .map(|b| last_segment(b))
            .find(|b| !ENUM_BASES.contains(b))
            .map(str::to_string)
            .or_else(|| match bases.iter().map(|b| last_segment(b)).find(|b| ENUM_BASES.contains(b)) {
                Some("IntEnum" | "IntFlag") => Some("int".to_string()),
                Some("StrEnum") => Some("str".to_string()),
                _ => None,
            });
        if let Some(body) = body {
            entity.enum_values = class_assignments(body)
                .into_iter()
                .map(|(name, _, value)| EnumValue::new(name, value))
                .collect();
        }
    } else {
        entity.type_kind = Some(if bases.iter().any(|b| INTERFACE_BASES.contains(&last_segment(b))) {
            TypeKind::Interface
        } else {
            TypeKind::Struct
        });
        if let Some(body) = body {
            entity.fields = class_fields(body);
        }
    }
    out.push(entity, def);

    let Some(body) = body else {
        return;
    };
    for member in body.named_children() {
        let Some(inner) = unwrap_decorated(member) else {
            continue;
        };
        match inner.kind() {
            "function_definition" => {
                if let Some(e) = extract_function(inner, Some(name), out) {
                    out.push(e, inner);
                }
            }
            "class_definition" => extract_class(inner, out),
            _ => {}
        }
    }
}

fn base_nodes(def: SyntaxNode<'_>) -> Vec<SyntaxNode<'_>> {
    def.child_by_field_name("superclasses")
        .map(|args| {
            args.named_children()
                .filter(|a| matches!(a.kind(), "identifier" | "attribute"))
                .collect()
        })
        .unwrap_or_default()
}

/// `(name, type, value)` of each plain assignment directly in a class body.
fn class_assignments(body: SyntaxNode<'_>) -> Vec<(String, String, String)> {
    body.named_children()
        .filter(|s| s.kind() == "expression_statement")
        .filter_map(|s| s.named_children().find(|c| c.kind() == "assignment"))
        .filter_map(|a| {
            let left = a.child_by_field_name("left")?;
            (left.kind() == "identifier").then(|| {
                (
                    left.text().to_string(),
                    text_of(a.child_by_field_name("type")),
                    text_of(a.child_by_field_name("right")),
                )
            })
        })
        .collect()
}

/// Class-level assignments, then `self.x` assignments in `__init__`.
fn class_fields(body: SyntaxNode<'_>) -> Vec<Field> {
    let mut fields: Vec<Field> = class_assignments(body)
        .into_iter()
        .map(|(name, type_name, _)| {
            let visibility = python_visibility(&name);
            Field::new(name, type_name, visibility)
        })
        .collect();

    let init = body
        .named_children()
        .filter_map(unwrap_decorated)
        .find(|f| {
            f.kind() == "function_definition"
                && f.child_by_field_name("name").map(|n| n.text()) == Some("__init__")
        });
    let Some(init_body) = init.and_then(|f| f.child_by_field_name("body")) else {
        return fields;
    };
    for assign in init_body.descendants_of_kind("assignment") {
        let Some(left) = assign.child_by_field_name("left") else {
            continue;
        };
        if left.kind() != "attribute" {
            continue;
        }
        let is_self = left.child_by_field_name("object").map(|o| o.text()) == Some("self");
        let Some(attr) = left.child_by_field_name("attribute").map(|a| a.text()) else {
            continue;
        };
        if is_self && !fields.iter().any(|f| f.name == attr) {
            fields.push(Field::new(
                attr,
                text_of(assign.child_by_field_name("type")),
                python_visibility(attr),
            ));
        }
    }
    fields
}

fn extract_assignment(assign: SyntaxNode<'_>, out: &Collector<'_>) -> Option<Entity> {
    let left = assign.child_by_field_name("left")?;
    if left.kind() != "identifier" {
        return None;
    }
    let name = left.text();
    let is_constant = name.chars().any(|c| c.is_ascii_alphabetic())
        && name.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
    let kind = if is_constant {
        EntityKind::Constant
    } else {
        EntityKind::Variable
    };
    let mut entity = out.entity(kind, name, assign);
    entity.visibility = python_visibility(name);
    entity.value_type = assign
        .child_by_field_name("type")
        .map(|t| squash(t.text()));
    if let Some(right) = assign.child_by_field_name("right") {
        entity.set_value(right.text());
    }
    Some(entity)
}

fn extract_imports(stmt: SyntaxNode<'_>, out: &Collector<'_>) -> Vec<Entity> {
    let module = stmt
        .child_by_field_name("module_name")
        .map(|m| m.text().to_string());
    let mut imports = Vec::new();
    let mut push = |name: &str, path: String, alias: Option<String>| {
        let mut entity = out.entity(EntityKind::Import, name, stmt);
        entity.import_path = Some(path);
        entity.import_alias = alias;
        imports.push(entity);
    };

    for item in stmt.children_by_field_name("name") {
        let (name, alias) = match item.kind() {
            "aliased_import" => (
                text_of(item.child_by_field_name("name")),
                item.child_by_field_name("alias").map(|a| a.text().to_string()),
            ),
            _ => (item.text().to_string(), None),
        };
        let path = module.clone().unwrap_or_else(|| name.clone());
        push(&name, path, alias);
    }
    if let (Some(module), true) = (&module, has_child_kind(stmt, &["wildcard_import"])) {
        push("*", module.clone(), None);
    }
    imports
}

/// `__name` private, `_name` protected, dunders and everything else public.
fn python_visibility(name: &str) -> Visibility {
    if name.starts_with("__") && !name.ends_with("__") {
        Visibility::Private
    } else if name.starts_with('_') && !name.starts_with("__") {
        Visibility::Protected
    } else {
        Visibility::Public
    }
}

fn last_segment(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

// ── Reference Rules ───────────────────────────────────────────────────────

impl ReferenceRules for PythonFrontend {
    fn body<'t>(&self, decl: SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
        decl.child_by_field_name("body")
    }

    fn decorators<'t>(&self, decl: SyntaxNode<'t>) -> Vec<SyntaxNode<'t>> {
        decorator_nodes(decl)
    }

    fn type_body<'t>(&self, decl: SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
        decl.child_by_field_name("body")
    }

    fn base_types<'t>(&self, decl: SyntaxNode<'t>) -> Vec<BaseType<'t>> {
        base_nodes(decl)
            .into_iter()
            .map(|node| BaseType {
                name: node.text().to_string(),
                node,
                dep_type: DepType::Extends,
            })
            .collect()
    }

    fn classify(&self, node: SyntaxNode<'_>) -> Option<RefClass> {
        match node.kind() {
            "call" => Some(RefClass::Call),
            "decorator" => Some(RefClass::Decorator),
            "type" => Some(RefClass::TypeRef),
            _ => None,
        }
    }

    fn target_name(&self, node: SyntaxNode<'_>, class: RefClass) -> Option<String> {
        match class {
            RefClass::Call | RefClass::Construct => dotted(node.child_by_field_name("function")?),
            RefClass::Decorator => {
                let expr = node.named_children().next()?;
                match expr.kind() {
                    "call" => dotted(expr.child_by_field_name("function")?),
                    _ => dotted(expr),
                }
            }
            RefClass::TypeRef => type_name(node.named_children().next()?),
        }
    }

    fn is_conditional(&self, kind: &str) -> bool {
        matches!(
            kind,
            "if_statement" | "conditional_expression" | "try_statement" | "except_clause" | "match_statement"
        )
    }

    fn is_boundary(&self, kind: &str) -> bool {
        matches!(kind, "function_definition" | "class_definition" | "lambda")
    }

    fn is_type_declaration(&self, kind: &str) -> bool {
        kind == "class_definition"
    }

    fn is_wrapper(&self, kind: &str) -> bool {
        kind == "decorated_definition"
    }

    fn type_declaration_name(&self, node: SyntaxNode<'_>) -> Option<String> {
        node.child_by_field_name("name").map(|n| n.text().to_string())
    }
}

fn dotted(node: SyntaxNode<'_>) -> Option<String> {
    member_chain(node, &["attribute"], "object", "attribute", &["identifier"])
}

/// Head name of an annotation: `List[int]` -> `List`, `"Foo"` -> `Foo`.
fn type_name(node: SyntaxNode<'_>) -> Option<String> {
    match node.kind() {
        "identifier" | "attribute" => dotted(node),
        "generic_type" => node
            .named_children()
            .next()
            .and_then(dotted),
        "subscript" => dotted(node.child_by_field_name("value")?),
        "string" => {
            let name = unquote(node.text());
            (!name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.'))
                .then_some(name)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    fn extract(src: &str) -> Vec<Entity> {
        let tree = parse_source(&PythonFrontend.tree_sitter_language(), src.to_string()).unwrap();
        PythonFrontend.extract_entities(&tree, "app/models.py")
    }

    fn find<'a>(entities: &'a [Entity], name: &str) -> &'a Entity {
        entities.iter().find(|e| e.name == name).unwrap()
    }

    #[test]
    fn extract_python_function() {
        let src = "async def fetch(url: str, retries=3, *args, **kwargs) -> bytes:\n    return b''\n";
        let entities = extract(src);
        let f = find(&entities, "fetch");
        assert_eq!(f.kind, EntityKind::Function);
        assert!(f.is_async);
        assert_eq!(
            f.params,
            vec![
                Param::new("url", "str"),
                Param::new("retries", ""),
                Param::new("*args", ""),
                Param::new("**kwargs", ""),
            ]
        );
        assert_eq!(f.returns, vec!["bytes"]);
        assert!(f.body_hash.is_some());
    }

    #[test]
    fn extract_python_class_and_methods() {
        let src = r#"class Repo(Base):
    table: str = "repos"

    def __init__(self, db):
        self.db = db
        self._cache = {}

    @staticmethod
    def create() -> "Repo":
        return Repo(None)

    def __flush(self):
        pass
"#;
        let entities = extract(src);
        let repo = find(&entities, "Repo");
        assert_eq!(repo.kind, EntityKind::Type);
        assert_eq!(repo.type_kind, Some(TypeKind::Struct));
        assert_eq!(repo.implements, vec!["Base"]);
        let names: Vec<_> = repo.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["table", "db", "_cache"]);
        assert_eq!(repo.fields[0].type_name, "str");
        assert_eq!(repo.fields[2].visibility, Visibility::Protected);

        let init = find(&entities, "__init__");
        assert_eq!(init.kind, EntityKind::Method);
        assert_eq!(init.receiver.as_deref(), Some("Repo"));
        assert_eq!(init.params, vec![Param::new("db", "")]);

        let create = find(&entities, "create");
        assert_eq!(create.receiver.as_deref(), Some("Repo (static)"));
        assert_eq!(create.decorators, vec!["staticmethod"]);

        assert_eq!(find(&entities, "__flush").visibility, Visibility::Private);
    }

    #[test]
    fn extract_python_enum_and_protocol() {
        let src = r#"class Color(IntEnum):
    RED = 1
    GREEN = 2

class Reader(Protocol):
    def read(self) -> bytes: ...
"#;
        let entities = extract(src);
        let color = find(&entities, "Color");
        assert_eq!(color.kind, EntityKind::Enum);
        assert_eq!(color.value_type.as_deref(), Some("int"));
        assert_eq!(
            color.enum_values,
            vec![EnumValue::new("RED", "1"), EnumValue::new("GREEN", "2")]
        );
        assert_eq!(find(&entities, "Reader").type_kind, Some(TypeKind::Interface));
    }

    #[test]
    fn extract_python_module_values_and_imports() {
        let src = r#"import os
import numpy as np
from typing import List, Optional as Opt
from .helpers import *

MAX_RETRIES: int = 5
registry = {}
"#;
        let entities = extract(src);
        let max = find(&entities, "MAX_RETRIES");
        assert_eq!(max.kind, EntityKind::Constant);
        assert_eq!(max.value_type.as_deref(), Some("int"));
        assert_eq!(max.value.as_deref(), Some("5"));
        assert_eq!(find(&entities, "registry").kind, EntityKind::Variable);

        let np = find(&entities, "numpy");
        assert_eq!(np.import_alias.as_deref(), Some("np"));
        assert_eq!(find(&entities, "List").import_path.as_deref(), Some("typing"));
        assert_eq!(find(&entities, "Optional").import_alias.as_deref(), Some("Opt"));
        assert_eq!(find(&entities, "*").import_path.as_deref(), Some(".helpers"));
        assert_eq!(find(&entities, "os").import_path.as_deref(), Some("os"));
    }

    #[test]
    fn visibility_convention() {
        assert_eq!(python_visibility("run"), Visibility::Public);
        assert_eq!(python_visibility("_run"), Visibility::Protected);
        assert_eq!(python_visibility("__run"), Visibility::Private);
        assert_eq!(python_visibility("__init__"), Visibility::Public);
    }

    #[test]
    fn decorators_and_annotations_are_references() {
        use crate::languages::LanguageRegistry;
        use crate::projection::project;
        use crate::resolver::{DependencyResolver, ResolverOptions};

        let src = r#"def route(path):
    return path

class Config:
    pass

@route("/home")
def home():
    cfg: Config = load()
    return cfg
"#;
        let tree = parse_source(&PythonFrontend.tree_sitter_language(), src.to_string()).unwrap();
        let items = PythonFrontend.extract(&tree, "web.py");
        let registry = LanguageRegistry::new();
        let batch = project(&items, &registry).unwrap();
        let deps = DependencyResolver::new(batch, &registry, ResolverOptions::default())
            .resolve_all()
            .unwrap();

        let got: Vec<_> = deps
            .iter()
            .map(|d| (d.to_name.as_str(), d.dep_type, d.to_id.is_empty()))
            .collect();
        assert_eq!(
            got,
            vec![
                ("load", DepType::Calls, true),
                ("route", DepType::Calls, false),
                ("Config", DepType::UsesType, false),
            ]
        );
    }
}
