//! C front-end using tree-sitter-c

use atlas_core::{Entity, EntityKind, EnumValue, Field, Language, Param, TypeKind, Visibility};

use super::{Collector, squash, text_of, unquote};
use crate::extractor::{BaseType, EntityWithNode, LanguageExtractor, RefClass, ReferenceRules};
use crate::syntax::{SyntaxNode, SyntaxTree};

/// C language front-end.
pub struct CFrontend;

impl LanguageExtractor for CFrontend {
    fn language(&self) -> Language {
        Language::C
    }

    fn name(&self) -> &'static str {
        "c"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["c", "h"]
    }

    fn tree_sitter_language(&self) -> tree_sitter::Language {
        tree_sitter_c::LANGUAGE.into()
    }

    fn extract<'t>(&self, tree: &'t SyntaxTree, file: &str) -> Vec<EntityWithNode<'t>> {
        let mut out = Collector::new(file, Language::C);
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
            "function_definition" => {
                if let Some(e) = extract_function(item, out) {
                    out.push(e, item);
                }
            }
            "struct_specifier" | "union_specifier" | "enum_specifier" => {
                if let Some(e) = extract_specifier(item, None, item, out) {
                    out.push(e, item);
                }
            }
            "type_definition" => extract_typedef(item, out),
            "declaration" => {
                if let Some(ty) = item.child_by_field_name("type") {
                    if let Some(e) = extract_specifier(ty, None, ty, out) {
                        out.push(e, ty);
                    }
                }
                for e in extract_globals(item, out) {
                    out.push(e, item);
                }
            }
            "preproc_def" => {
                if let Some(name) = item.child_by_field_name("name") {
                    let mut e = out.entity(EntityKind::Constant, name.text(), item);
                    if let Some(value) = item.child_by_field_name("value") {
                        e.set_value(value.text());
                    }
                    out.push(e, item);
                }
            }
            "preproc_include" => {
                if let Some(path) = item.child_by_field_name("path") {
                    let path = unquote(path.text().trim_start_matches('<').trim_end_matches('>'));
                    let name = path.rsplit('/').next().unwrap_or(&path).to_string();
                    let mut e = out.entity(EntityKind::Import, &name, item);
                    e.import_path = Some(path);
                    out.push(e, item);
                }
            }
            "preproc_if" | "preproc_ifdef" | "preproc_else" | "preproc_elif" | "linkage_specification"
            | "declaration_list" => extract_items(item, out),
            _ => {}
        }
    }
}

/// Innermost name of a declarator plus the type suffix its wrappers add:
/// `**argv` -> (`argv`, `**`), `buf[16]` -> (`buf`, `[]`).
fn declarator_name(mut node: SyntaxNode<'_>) -> Option<(&str, String)> {
    let mut suffix = String::new();
    loop {
        match node.kind() {
            "identifier" | "field_identifier" | "type_identifier" => return Some((node.text(), suffix)),
            "pointer_declarator" => suffix.push('*'),
            "array_declarator" => suffix.push_str("[]"),
            "function_declarator" | "init_declarator" | "parenthesized_declarator" | "attributed_declarator" => {}
            _ => return None,
        }
        node = node
            .child_by_field_name("declarator")
            .or_else(|| node.named_children().next())?;
    }
}

/// The `function_declarator` under any pointer wrappers.
fn function_declarator(mut node: SyntaxNode<'_>) -> Option<SyntaxNode<'_>> {
    loop {
        match node.kind() {
            "function_declarator" => return Some(node),
            "pointer_declarator" | "parenthesized_declarator" | "attributed_declarator" => {
                node = node.child_by_field_name("declarator")?;
            }
            _ => return None,
        }
    }
}

/// Declared type with its qualifiers: `const char`.
fn base_type(decl: SyntaxNode<'_>) -> String {
    let ty = text_of(decl.child_by_field_name("type"));
    let qualifiers: Vec<_> = decl
        .named_children()
        .filter(|c| c.kind() == "type_qualifier")
        .map(|c| c.text())
        .collect();
    if qualifiers.is_empty() {
        ty
    } else {
        format!("{} {}", qualifiers.join(" "), ty)
    }
}

fn is_static(decl: SyntaxNode<'_>) -> bool {
    decl.named_children()
        .any(|c| c.kind() == "storage_class_specifier" && c.text() == "static")
}

fn extract_function(def: SyntaxNode<'_>, out: &Collector<'_>) -> Option<Entity> {
    let declarator = def.child_by_field_name("declarator")?;
    let func = function_declarator(declarator)?;
    let (name, _) = declarator_name(func.child_by_field_name("declarator")?)?;
    let (_, ret_suffix) = declarator_name(declarator)?;

    let mut entity = out.entity(EntityKind::Function, name, def);
    entity.visibility = if is_static(def) {
        Visibility::Private
    } else {
        Visibility::Public
    };
    let ret = format!("{}{}", base_type(def), ret_suffix);
    if ret != "void" && !ret.is_empty() {
        entity.returns = vec![ret];
    }
    if let Some(params) = func.child_by_field_name("parameters") {
        entity.params = parameters(params);
    }
    if let Some(body) = def.child_by_field_name("body") {
        entity.raw_body = body.text().to_string();
    }
    Some(entity)
}

fn parameters(list: SyntaxNode<'_>) -> Vec<Param> {
    let mut params = Vec::new();
    for p in list.named_children() {
        match p.kind() {
            "parameter_declaration" => {
                let base = base_type(p);
                match p.child_by_field_name("declarator") {
                    Some(d) => {
                        let (name, suffix) = declarator_name(d).unwrap_or(("", String::new()));
                        params.push(Param::new(name, format!("{base}{suffix}")));
                    }
                    // `f(void)` declares no parameters.
                    None if base == "void" => {}
                    None => params.push(Param::new("", base)),
                }
            }
            "variadic_parameter" => params.push(Param::new("...", "")),
            _ => {}
        }
    }
    params
}

/// Entity for a struct/union/enum specifier with a body. `name` overrides
/// the tag (anonymous specifiers named by a typedef).
fn extract_specifier(
    spec: SyntaxNode<'_>,
    name: Option<&str>,
    node: SyntaxNode<'_>,
    out: &Collector<'_>,
) -> Option<Entity> {
    let body = spec.child_by_field_name("body")?;
    let tag = spec.child_by_field_name("name").map(|n| n.text());
    let name = name.or(tag)?;

    let mut entity = match spec.kind() {
        "enum_specifier" => {
            let mut e = out.entity(EntityKind::Enum, name, node);
            e.value_type = spec
                .child_by_field_name("underlying_type")
                .map(|t| squash(t.text()));
            e.enum_values = body
                .named_children()
                .filter(|c| c.kind() == "enumerator")
                .filter_map(|c| {
                    let name = c.child_by_field_name("name")?.text();
                    Some(EnumValue::new(name, text_of(c.child_by_field_name("value"))))
                })
                .collect();
            e
        }
        "struct_specifier" | "union_specifier" => {
            let mut e = out.entity(EntityKind::Type, name, node);
            e.type_kind = Some(if spec.kind() == "union_specifier" {
                TypeKind::Union
            } else {
                TypeKind::Struct
            });
            e.fields = struct_fields(body);
            e
        }
        _ => return None,
    };
    entity.visibility = Visibility::Public;
    Some(entity)
}

fn struct_fields(body: SyntaxNode<'_>) -> Vec<Field> {
    let mut fields = Vec::new();
    for decl in body.named_children().filter(|c| c.kind() == "field_declaration") {
        let base = base_type(decl);
        for d in decl.children_by_field_name("declarator") {
            if let Some((name, suffix)) = declarator_name(d) {
                fields.push(Field::new(name, format!("{base}{suffix}"), Visibility::Public));
            }
        }
    }
    fields
}

fn extract_typedef<'t>(def: SyntaxNode<'t>, out: &mut Collector<'t>) {
    let Some(ty) = def.child_by_field_name("type") else {
        return;
    };
    let tag = ty.child_by_field_name("name").map(|n| n.text());
    let has_body = ty.child_by_field_name("body").is_some();
    if has_body && tag.is_some() {
        if let Some(e) = extract_specifier(ty, None, ty, out) {
            out.push(e, ty);
        }
    }

    for d in def.children_by_field_name("declarator") {
        let Some((alias, suffix)) = declarator_name(d) else {
            continue;
        };
        if has_body && tag.is_none() {
            if let Some(e) = extract_specifier(ty, Some(alias), def, out) {
                out.push(e, def);
            }
            continue;
        }
        if tag == Some(alias) && suffix.is_empty() {
            continue;
        }
        let mut e = out.entity(EntityKind::Type, alias, def);
        e.type_kind = Some(TypeKind::Alias);
        e.value_type = Some(format!("{}{}", squash(ty.text()), suffix));
        out.push(e, def);
    }
}

fn extract_globals(decl: SyntaxNode<'_>, out: &Collector<'_>) -> Vec<Entity> {
    let base = base_type(decl);
    let is_const = decl
        .named_children()
        .any(|c| c.kind() == "type_qualifier" && c.text() == "const");
    let visibility = if is_static(decl) {
        Visibility::Private
    } else {
        Visibility::Public
    };

    decl.children_by_field_name("declarator")
        .filter(|d| function_declarator(*d).is_none())
        .filter_map(|d| {
            let (name, suffix) = declarator_name(d)?;
            let kind = if is_const {
                EntityKind::Constant
            } else {
                EntityKind::Variable
            };
            let mut e = out.entity(kind, name, decl);
            e.visibility = visibility;
            e.value_type = Some(format!("{base}{suffix}"));
            if let Some(value) = d.child_by_field_name("value") {
                e.set_value(value.text());
            }
            Some(e)
        })
        .collect()
}

// ── Reference Rules ───────────────────────────────────────────────────────

impl ReferenceRules for CFrontend {
    fn separators(&self) -> &'static [&'static str] {
        &[".", "->"]
    }

    fn body<'t>(&self, decl: SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
        decl.child_by_field_name("body")
    }

    fn type_body<'t>(&self, decl: SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
        match decl.kind() {
            "type_definition" => {
                let ty = decl.child_by_field_name("type")?;
                ty.child_by_field_name("body").or(Some(ty))
            }
            _ => decl.child_by_field_name("body"),
        }
    }

    fn base_types<'t>(&self, _decl: SyntaxNode<'t>) -> Vec<BaseType<'t>> {
        Vec::new()
    }

    fn classify(&self, node: SyntaxNode<'_>) -> Option<RefClass> {
        match node.kind() {
            "call_expression" => Some(RefClass::Call),
            "compound_literal_expression" => Some(RefClass::Construct),
            "type_identifier" => {
                let parent = node.parent()?;
                let declares = match parent.kind() {
                    "type_definition" => node.field_name() == Some("declarator"),
                    "struct_specifier" | "union_specifier" | "enum_specifier" => {
                        parent.child_by_field_name("body").is_some()
                    }
                    _ => false,
                };
                (!declares).then_some(RefClass::TypeRef)
            }
            _ => None,
        }
    }

    fn target_name(&self, node: SyntaxNode<'_>, class: RefClass) -> Option<String> {
        match class {
            RefClass::Call => callee(node.child_by_field_name("function")?),
            RefClass::Construct => {
                let ty = node.child_by_field_name("type")?.child_by_field_name("type")?;
                match ty.kind() {
                    "type_identifier" => Some(ty.text().to_string()),
                    _ => ty.child_by_field_name("name").map(|n| n.text().to_string()),
                }
            }
            RefClass::TypeRef => Some(node.text().to_string()),
            RefClass::Decorator => None,
        }
    }

    fn is_conditional(&self, kind: &str) -> bool {
        matches!(
            kind,
            "if_statement" | "switch_statement" | "conditional_expression" | "preproc_if" | "preproc_ifdef"
        )
    }

    fn is_boundary(&self, kind: &str) -> bool {
        kind == "function_definition"
    }

    fn is_type_declaration(&self, _kind: &str) -> bool {
        false
    }

    fn type_declaration_name(&self, _node: SyntaxNode<'_>) -> Option<String> {
        None
    }
}

/// `f`, `obj.f`, `ctx->ops->f`; anything else is not a named target.
fn callee(node: SyntaxNode<'_>) -> Option<String> {
    match node.kind() {
        "identifier" => Some(node.text().to_string()),
        "field_expression" => {
            let base = callee(node.child_by_field_name("argument")?)?;
            let op = node
                .children()
                .find(|c| !c.is_named())
                .map(|c| c.text())
                .unwrap_or(".");
            let field = node.child_by_field_name("field")?.text();
            Some(format!("{base}{op}{field}"))
        }
        _ => None,
    }
}
