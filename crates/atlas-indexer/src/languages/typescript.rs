//! TypeScript, TSX and JavaScript front-ends
//!
//! The three dialects share one extractor; they differ in grammar, file
//! extensions and a handful of node names (`type_identifier` vs `identifier`
//! for class names, `public_field_definition` vs `field_definition`).

use atlas_core::{DepType, Entity, EntityKind, EnumValue, Field, Language, Param, TypeKind, Visibility};

use super::{Collector, has_child_kind, member_chain, squash, text_of, unquote};
use crate::extractor::{BaseType, EntityWithNode, LanguageExtractor, RefClass, ReferenceRules};
use crate::syntax::{SyntaxNode, SyntaxTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    TypeScript,
    Tsx,
    JavaScript,
}

/// Front-end for one ECMAScript dialect.
pub struct TypeScriptFrontend {
    dialect: Dialect,
}

impl TypeScriptFrontend {
    pub fn typescript() -> Self {
        TypeScriptFrontend {
            dialect: Dialect::TypeScript,
        }
    }

    pub fn tsx() -> Self {
        TypeScriptFrontend { dialect: Dialect::Tsx }
    }

    pub fn javascript() -> Self {
        TypeScriptFrontend {
            dialect: Dialect::JavaScript,
        }
    }
}

impl LanguageExtractor for TypeScriptFrontend {
    fn language(&self) -> Language {
        match self.dialect {
            Dialect::JavaScript => Language::JavaScript,
            Dialect::TypeScript | Dialect::Tsx => Language::TypeScript,
        }
    }

    fn name(&self) -> &'static str {
        match self.dialect {
            Dialect::TypeScript => "typescript",
            Dialect::Tsx => "tsx",
            Dialect::JavaScript => "javascript",
        }
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        match self.dialect {
            Dialect::TypeScript => &["ts", "mts", "cts"],
            Dialect::Tsx => &["tsx"],
            Dialect::JavaScript => &["js", "jsx", "mjs", "cjs"],
        }
    }

    fn tree_sitter_language(&self) -> tree_sitter::Language {
        match self.dialect {
            Dialect::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Dialect::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Dialect::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        }
    }

    fn extract<'t>(&self, tree: &'t SyntaxTree, file: &str) -> Vec<EntityWithNode<'t>> {
        let mut out = Collector::new(file, self.language());
        if let Some(root) = tree.root() {
            for child in root.named_children() {
                extract_statement(child, &mut out);
            }
        }
        out.finish()
    }
}

// ── Entity Extraction ─────────────────────────────────────────────────────

fn extract_statement<'t>(node: SyntaxNode<'t>, out: &mut Collector<'t>) {
    match node.kind() {
        "export_statement" => {
            if let Some(decl) = node.child_by_field_name("declaration") {
                extract_statement(decl, out);
            }
        }
        "function_declaration" | "generator_function_declaration" => {
            if let Some(e) = extract_function(node, node, out) {
                out.push(e, node);
            }
        }
        "class_declaration" | "abstract_class_declaration" => extract_class(node, out),
        "interface_declaration" => {
            if let Some(e) = extract_interface(node, out) {
                out.push(e, node);
            }
        }
        "type_alias_declaration" => {
            if let Some(e) = extract_type_alias(node, out) {
                out.push(e, node);
            }
        }
        "enum_declaration" => {
            if let Some(e) = extract_enum(node, out) {
                out.push(e, node);
            }
        }
        "lexical_declaration" | "variable_declaration" => {
            let is_const = node.child(0).map(|k| k.text()) == Some("const");
            for declarator in node.named_children().filter(|c| c.kind() == "variable_declarator") {
                if let Some(e) = extract_declarator(declarator, is_const, out) {
                    out.push(e, declarator);
                }
            }
        }
        "import_statement" => {
            for e in extract_imports(node, out) {
                out.push(e, node);
            }
        }
        _ => {}
    }
}

/// Function entity named by `decl`, with signature and body taken from
/// `func` (the same node, or the function value of a declarator).
fn extract_function(decl: SyntaxNode<'_>, func: SyntaxNode<'_>, out: &Collector<'_>) -> Option<Entity> {
    let name = decl.child_by_field_name("name")?.text();
    let mut entity = out.entity(EntityKind::Function, name, decl);
    fill_callable(&mut entity, func);
    Some(entity)
}

fn fill_callable(entity: &mut Entity, func: SyntaxNode<'_>) {
    entity.is_async = has_child_kind(func, &["async"]);
    if let Some(params) = func.child_by_field_name("parameters") {
        entity.params = parameters(params);
    } else if let Some(param) = func.child_by_field_name("parameter") {
        entity.params = vec![Param::new(param.text(), "")];
    }
    let ret = annotation(func.child_by_field_name("return_type"));
    if !ret.is_empty() && ret != "void" {
        entity.returns = vec![ret];
    }
    if let Some(body) = func.child_by_field_name("body") {
        entity.raw_body = body.text().to_string();
    }
}

fn parameters(list: SyntaxNode<'_>) -> Vec<Param> {
    list.named_children()
        .filter_map(|p| match p.kind() {
            "required_parameter" | "optional_parameter" => {
                let mut name = text_of(p.child_by_field_name("pattern"));
                if p.kind() == "optional_parameter" {
                    name.push('?');
                }
                Some(Param::new(name, annotation(p.child_by_field_name("type"))))
            }
            "assignment_pattern" => Some(Param::new(text_of(p.child_by_field_name("left")), "")),
            "identifier" | "rest_pattern" | "object_pattern" | "array_pattern" => {
                Some(Param::new(squash(p.text()), ""))
            }
            _ => None,
        })
        .collect()
}

/// Text of a `type_annotation` without the leading colon.
fn annotation(node: Option<SyntaxNode<'_>>) -> String {
    let text = text_of(node);
    text.strip_prefix(':').map(|t| t.trim().to_string()).unwrap_or(text)
}

fn extract_declarator(decl: SyntaxNode<'_>, is_const: bool, out: &Collector<'_>) -> Option<Entity> {
    let name_node = decl.child_by_field_name("name")?;
    if name_node.kind() != "identifier" {
        return None;
    }
    let value = decl.child_by_field_name("value");
    if let Some(func) = value.filter(|v| is_function_value(v.kind())) {
        return extract_function(decl, func, out);
    }

    let kind = if is_const {
        EntityKind::Constant
    } else {
        EntityKind::Variable
    };
    let mut entity = out.entity(kind, name_node.text(), decl);
    let type_name = annotation(decl.child_by_field_name("type"));
    if !type_name.is_empty() {
        entity.value_type = Some(type_name);
    }
    if let Some(value) = value {
        entity.set_value(value.text());
    }
    Some(entity)
}

fn is_function_value(kind: &str) -> bool {
    matches!(
        kind,
        "arrow_function" | "function_expression" | "function" | "generator_function"
    )
}

fn extract_class<'t>(node: SyntaxNode<'t>, out: &mut Collector<'t>) {
    let Some(name) = node.child_by_field_name("name").map(|n| n.text()) else {
        return;
    };
    let mut entity = out.entity(EntityKind::Type, name, node);
    entity.type_kind = Some(TypeKind::Struct);
    entity.decorators = class_decorators(node).iter().map(|d| decorator_text(*d)).collect();
    entity.implements = heritage(node).into_iter().map(|b| b.name).collect();

    let body = node.child_by_field_name("body");
    if let Some(body) = body {
        entity.fields = body
            .named_children()
            .filter(|m| matches!(m.kind(), "public_field_definition" | "field_definition"))
            .filter_map(|m| {
                let prop = m
                    .child_by_field_name("name")
                    .or_else(|| m.child_by_field_name("property"))?;
                Some(Field::new(
                    prop.text(),
                    annotation(m.child_by_field_name("type")),
                    member_visibility(m, prop),
                ))
            })
            .collect();
    }
    out.push(entity, node);

    let Some(body) = body else {
        return;
    };
    for member in body.named_children() {
        if !matches!(
            member.kind(),
            "method_definition" | "method_signature" | "abstract_method_signature"
        ) {
            continue;
        }
        let Some(prop) = member.child_by_field_name("name") else {
            continue;
        };
        let mut method = out.entity(EntityKind::Method, prop.text(), member);
        let is_static = has_child_kind(member, &["static"]);
        method.receiver = Some(if is_static {
            format!("{name} (static)")
        } else {
            name.to_string()
        });
        method.visibility = member_visibility(member, prop);
        method.decorators = method_decorators(member).iter().map(|d| decorator_text(*d)).collect();
        fill_callable(&mut method, member);
        out.push(method, member);
    }
}

fn member_visibility(member: SyntaxNode<'_>, name: SyntaxNode<'_>) -> Visibility {
    if name.kind() == "private_property_identifier" {
        return Visibility::Private;
    }
    match member.child_of_kind("accessibility_modifier").map(|m| m.text()) {
        Some("private") => Visibility::Private,
        Some("protected") => Visibility::Protected,
        _ => Visibility::Public,
    }
}

fn class_decorators(class: SyntaxNode<'_>) -> Vec<SyntaxNode<'_>> {
    let mut found: Vec<_> = class
        .parent()
        .filter(|p| p.kind() == "export_statement")
        .map(|p| p.named_children().filter(|c| c.kind() == "decorator").collect())
        .unwrap_or_default();
    found.extend(class.named_children().filter(|c| c.kind() == "decorator"));
    found
}

/// Decorators written directly above a class member.
fn method_decorators(member: SyntaxNode<'_>) -> Vec<SyntaxNode<'_>> {
    let mut found = Vec::new();
    let mut cur = member.prev_named_sibling();
    while let Some(node) = cur.filter(|n| n.kind() == "decorator") {
        found.push(node);
        cur = node.prev_named_sibling();
    }
    found.reverse();
    found.extend(member.named_children().filter(|c| c.kind() == "decorator"));
    found
}

fn decorator_text(node: SyntaxNode<'_>) -> String {
    squash(node.text().trim_start_matches('@'))
}

/// `extends` / `implements` entries of a class or interface.
fn heritage<'t>(node: SyntaxNode<'t>) -> Vec<BaseType<'t>> {
    let mut bases = Vec::new();
    let mut push = |target: SyntaxNode<'t>, dep_type: DepType| {
        if let Some(name) = heritage_name(target) {
            bases.push(BaseType {
                name,
                node: target,
                dep_type,
            });
        }
    };

    for clause in node.named_children() {
        match clause.kind() {
            "class_heritage" => {
                for part in clause.named_children() {
                    match part.kind() {
                        "extends_clause" => {
                            for value in part.children_by_field_name("value") {
                                push(value, DepType::Extends);
                            }
                        }
                        "implements_clause" => {
                            for ty in part.named_children() {
                                push(ty, DepType::Implements);
                            }
                        }
                        // JavaScript: `extends <expression>` directly.
                        _ => push(part, DepType::Extends),
                    }
                }
            }
            "extends_type_clause" => {
                for ty in clause.named_children() {
                    push(ty, DepType::Extends);
                }
            }
            _ => {}
        }
    }
    bases
}

fn heritage_name(node: SyntaxNode<'_>) -> Option<String> {
    match node.kind() {
        "identifier" | "type_identifier" | "nested_type_identifier" | "member_expression" => {
            Some(squash(node.text()))
        }
        "generic_type" => heritage_name(node.child_by_field_name("name")?),
        _ => None,
    }
}

fn extract_interface(node: SyntaxNode<'_>, out: &Collector<'_>) -> Option<Entity> {
    let name = node.child_by_field_name("name")?.text();
    let mut entity = out.entity(EntityKind::Type, name, node);
    entity.type_kind = Some(TypeKind::Interface);
    entity.implements = heritage(node).into_iter().map(|b| b.name).collect();
    if let Some(body) = node.child_by_field_name("body") {
        entity.fields = object_members(body);
    }
    Some(entity)
}

/// Property and method signatures of an interface body or object type.
fn object_members(body: SyntaxNode<'_>) -> Vec<Field> {
    body.named_children()
        .filter_map(|m| {
            let name = m.child_by_field_name("name")?.text();
            let type_name = match m.kind() {
                "property_signature" => annotation(m.child_by_field_name("type")),
                "method_signature" => {
                    let params = text_of(m.child_by_field_name("parameters"));
                    let ret = annotation(m.child_by_field_name("return_type"));
                    if ret.is_empty() {
                        params
                    } else {
                        format!("{params} => {ret}")
                    }
                }
                _ => return None,
            };
            Some(Field::new(name, type_name, Visibility::Public))
        })
        .collect()
}

fn extract_type_alias(node: SyntaxNode<'_>, out: &Collector<'_>) -> Option<Entity> {
    let name = node.child_by_field_name("name")?.text();
    let value = node.child_by_field_name("value");
    let mut entity = out.entity(EntityKind::Type, name, node);
    entity.type_kind = Some(match value.map(|v| v.kind()) {
        Some("union_type") => TypeKind::Union,
        Some("object_type") => TypeKind::Struct,
        _ => TypeKind::Alias,
    });
    if let Some(object) = value.filter(|v| v.kind() == "object_type") {
        entity.fields = object_members(object);
    }
    Some(entity)
}

fn extract_enum(node: SyntaxNode<'_>, out: &Collector<'_>) -> Option<Entity> {
    let name = node.child_by_field_name("name")?.text();
    let mut entity = out.entity(EntityKind::Enum, name, node);
    let Some(body) = node.child_by_field_name("body") else {
        return Some(entity);
    };
    for member in body.named_children() {
        match member.kind() {
            "property_identifier" | "string" => {
                entity.enum_values.push(EnumValue::new(unquote(member.text()), ""));
            }
            "enum_assignment" => {
                let Some(name) = member.child_by_field_name("name") else {
                    continue;
                };
                let value = member.child_by_field_name("value");
                if entity.value_type.is_none() {
                    entity.value_type = match value.map(|v| v.kind()) {
                        Some("string") => Some("string".to_string()),
                        Some("number") => Some("number".to_string()),
                        _ => None,
                    };
                }
                entity
                    .enum_values
                    .push(EnumValue::new(unquote(name.text()), text_of(value)));
            }
            _ => {}
        }
    }
    Some(entity)
}

fn extract_imports(stmt: SyntaxNode<'_>, out: &Collector<'_>) -> Vec<Entity> {
    let Some(path) = stmt.child_by_field_name("source").map(|s| unquote(s.text())) else {
        return Vec::new();
    };
    let mut imports = Vec::new();
    let mut push = |name: &str, alias: Option<String>| {
        let mut entity = out.entity(EntityKind::Import, name, stmt);
        entity.import_path = Some(path.clone());
        entity.import_alias = alias;
        imports.push(entity);
    };

    let Some(clause) = stmt.child_of_kind("import_clause") else {
        // Side-effect import.
        push(&path, None);
        return imports;
    };
    for part in clause.named_children() {
        match part.kind() {
            "identifier" => push(part.text(), None),
            "namespace_import" => {
                let alias = part.named_children().next().map(|a| a.text().to_string());
                push("*", alias);
            }
            "named_imports" => {
                for spec in part.named_children().filter(|s| s.kind() == "import_specifier") {
                    let name = text_of(spec.child_by_field_name("name"));
                    let alias = spec.child_by_field_name("alias").map(|a| a.text().to_string());
                    push(&name, alias);
                }
            }
            _ => {}
        }
    }
    imports
}

// ── Reference Rules ───────────────────────────────────────────────────────

impl ReferenceRules for TypeScriptFrontend {
    fn body<'t>(&self, decl: SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
        match decl.kind() {
            "variable_declarator" => decl.child_by_field_name("value")?.child_by_field_name("body"),
            _ => decl.child_by_field_name("body"),
        }
    }

    fn decorators<'t>(&self, decl: SyntaxNode<'t>) -> Vec<SyntaxNode<'t>> {
        if decl.kind() == "method_definition" {
            method_decorators(decl)
        } else {
            Vec::new()
        }
    }

    fn type_body<'t>(&self, decl: SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
        match decl.kind() {
            "type_alias_declaration" => decl.child_by_field_name("value"),
            "enum_declaration" => None,
            _ => decl.child_by_field_name("body"),
        }
    }

    fn base_types<'t>(&self, decl: SyntaxNode<'t>) -> Vec<BaseType<'t>> {
        heritage(decl)
    }

    fn classify(&self, node: SyntaxNode<'_>) -> Option<RefClass> {
        match node.kind() {
            "call_expression" => Some(RefClass::Call),
            "new_expression" => Some(RefClass::Construct),
            "decorator" => Some(RefClass::Decorator),
            "nested_type_identifier" => Some(RefClass::TypeRef),
            "type_identifier" => {
                let parent = node.parent().map(|p| p.kind());
                let excluded = matches!(parent, Some("nested_type_identifier" | "type_parameter"))
                    || (node.field_name() == Some("name") && parent != Some("generic_type"));
                (!excluded).then_some(RefClass::TypeRef)
            }
            _ => None,
        }
    }

    fn target_name(&self, node: SyntaxNode<'_>, class: RefClass) -> Option<String> {
        match class {
            RefClass::Call => callee(node.child_by_field_name("function")?),
            RefClass::Construct => callee(node.child_by_field_name("constructor")?),
            RefClass::Decorator => {
                let expr = node.named_children().next()?;
                match expr.kind() {
                    "call_expression" => callee(expr.child_by_field_name("function")?),
                    _ => callee(expr),
                }
            }
            RefClass::TypeRef => Some(squash(node.text())),
        }
    }

    fn is_conditional(&self, kind: &str) -> bool {
        matches!(
            kind,
            "if_statement" | "switch_statement" | "try_statement" | "catch_clause" | "ternary_expression"
        )
    }

    fn is_boundary(&self, kind: &str) -> bool {
        matches!(
            kind,
            "function_declaration"
                | "function_expression"
                | "function"
                | "arrow_function"
                | "generator_function"
                | "generator_function_declaration"
                | "method_definition"
                | "class_declaration"
                | "abstract_class_declaration"
                | "class"
        )
    }

    fn is_type_declaration(&self, kind: &str) -> bool {
        matches!(
            kind,
            "class_declaration" | "abstract_class_declaration" | "class" | "interface_declaration"
        )
    }

    fn type_declaration_name(&self, node: SyntaxNode<'_>) -> Option<String> {
        node.child_by_field_name("name").map(|n| n.text().to_string())
    }
}

fn callee(node: SyntaxNode<'_>) -> Option<String> {
    member_chain(
        node,
        &["member_expression"],
        "object",
        "property",
        &["identifier", "this", "super"],
    )
}
