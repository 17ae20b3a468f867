//! Java front-end using tree-sitter-java

use atlas_core::{DepType, Entity, EntityKind, EnumValue, Field, Language, Param, TypeKind, Visibility};

use super::{Collector, member_chain, squash, strip_generics, text_of};
use crate::extractor::{BaseType, EntityWithNode, LanguageExtractor, RefClass, ReferenceRules};
use crate::syntax::{SyntaxNode, SyntaxTree};

const TYPE_DECLARATIONS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
];

/// Java language front-end.
pub struct JavaFrontend;

impl LanguageExtractor for JavaFrontend {
    fn language(&self) -> Language {
        Language::Java
    }

    fn name(&self) -> &'static str {
        "java"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["java"]
    }

    fn tree_sitter_language(&self) -> tree_sitter::Language {
        tree_sitter_java::LANGUAGE.into()
    }

    fn extract<'t>(&self, tree: &'t SyntaxTree, file: &str) -> Vec<EntityWithNode<'t>> {
        let mut out = Collector::new(file, Language::Java);
        if let Some(root) = tree.root() {
            for child in root.named_children() {
                match child.kind() {
                    "import_declaration" => {
                        if let Some(e) = extract_import(child, &out) {
                            out.push(e, child);
                        }
                    }
                    kind if TYPE_DECLARATIONS.contains(&kind) => extract_type(child, false, &mut out),
                    _ => {}
                }
            }
        }
        out.finish()
    }
}

// ── Modifiers ─────────────────────────────────────────────────────────────

struct Modifiers<'t> {
    visibility: Option<Visibility>,
    is_static: bool,
    is_final: bool,
    annotations: Vec<SyntaxNode<'t>>,
}

fn modifiers(decl: SyntaxNode<'_>) -> Modifiers<'_> {
    let mut mods = Modifiers {
        visibility: None,
        is_static: false,
        is_final: false,
        annotations: Vec::new(),
    };
    let Some(list) = decl.child_of_kind("modifiers") else {
        return mods;
    };
    for m in list.children() {
        match m.kind() {
            "public" => mods.visibility = Some(Visibility::Public),
            "private" => mods.visibility = Some(Visibility::Private),
            "protected" => mods.visibility = Some(Visibility::Protected),
            "static" => mods.is_static = true,
            "final" => mods.is_final = true,
            "marker_annotation" | "annotation" => mods.annotations.push(m),
            _ => {}
        }
    }
    mods
}

impl Modifiers<'_> {
    /// Package-private members are reported as protected.
    fn visibility(&self, in_interface: bool) -> Visibility {
        match self.visibility {
            Some(v) => v,
            None if in_interface => Visibility::Public,
            None => Visibility::Protected,
        }
    }

    fn decorators(&self) -> Vec<String> {
        self.annotations
            .iter()
            .map(|a| squash(a.text().trim_start_matches('@')))
            .collect()
    }
}

// ── Entity Extraction ─────────────────────────────────────────────────────

fn extract_type<'t>(decl: SyntaxNode<'t>, in_interface: bool, out: &mut Collector<'t>) {
    let Some(name) = decl.child_by_field_name("name").map(|n| n.text()) else {
        return;
    };
    let mods = modifiers(decl);
    let is_interface = decl.kind() == "interface_declaration";
    let kind = if decl.kind() == "enum_declaration" {
        EntityKind::Enum
    } else {
        EntityKind::Type
    };

    let mut entity = out.entity(kind, name, decl);
    entity.visibility = mods.visibility(in_interface);
    entity.decorators = mods.decorators();
    entity.implements = base_types(decl).into_iter().map(|b| b.name).collect();
    if kind == EntityKind::Type {
        entity.type_kind = Some(if is_interface {
            TypeKind::Interface
        } else {
            TypeKind::Struct
        });
    }

    let body = decl.child_by_field_name("body");
    if decl.kind() == "record_declaration" {
        if let Some(params) = decl.child_by_field_name("parameters") {
            entity.fields = parameters(params)
                .into_iter()
                .map(|p| Field::new(p.name, p.type_name, Visibility::Private))
                .collect();
        }
    }
    if let Some(body) = body {
        if kind == EntityKind::Enum {
            entity.enum_values = body
                .named_children()
                .filter(|c| c.kind() == "enum_constant")
                .filter_map(|c| {
                    let name = c.child_by_field_name("name")?.text();
                    let args = text_of(c.child_by_field_name("arguments"));
                    let value = args
                        .strip_prefix('(')
                        .and_then(|a| a.strip_suffix(')'))
                        .unwrap_or(&args)
                        .to_string();
                    Some(EnumValue::new(name, value))
                })
                .collect();
        }
        let fields = members(body)
            .into_iter()
            .filter_map(|m| instance_field(m, is_interface))
            .flatten();
        entity.fields.extend(fields);
    }
    out.push(entity, decl);

    let Some(body) = body else {
        return;
    };
    for member in members(body) {
        match member.kind() {
            "method_declaration" | "constructor_declaration" | "compact_constructor_declaration" => {
                if let Some(e) = extract_method(member, name, is_interface, out) {
                    out.push(e, member);
                }
            }
            "field_declaration" | "constant_declaration" => {
                for e in extract_constants(member, is_interface, out) {
                    out.push(e, member);
                }
            }
            kind if TYPE_DECLARATIONS.contains(&kind) => extract_type(member, is_interface, out),
            _ => {}
        }
    }
}

/// Members of a class body, including those after an enum's constants.
fn members(body: SyntaxNode<'_>) -> Vec<SyntaxNode<'_>> {
    let mut found = Vec::new();
    for child in body.named_children() {
        if child.kind() == "enum_body_declarations" {
            found.extend(child.named_children());
        } else {
            found.push(child);
        }
    }
    found
}

/// Fields for a non-constant field declaration.
fn instance_field(member: SyntaxNode<'_>, in_interface: bool) -> Option<Vec<Field>> {
    if member.kind() != "field_declaration" || is_constant(member, in_interface) {
        return None;
    }
    let mods = modifiers(member);
    let type_name = text_of(member.child_by_field_name("type"));
    Some(
        member
            .children_by_field_name("declarator")
            .filter_map(|d| d.child_by_field_name("name"))
            .map(|n| Field::new(n.text(), type_name.clone(), mods.visibility(in_interface)))
            .collect(),
    )
}

fn is_constant(member: SyntaxNode<'_>, in_interface: bool) -> bool {
    let mods = modifiers(member);
    member.kind() == "constant_declaration" || in_interface || (mods.is_static && mods.is_final)
}

fn extract_constants(member: SyntaxNode<'_>, in_interface: bool, out: &Collector<'_>) -> Vec<Entity> {
    if !is_constant(member, in_interface) {
        return Vec::new();
    }
    let mods = modifiers(member);
    let type_name = text_of(member.child_by_field_name("type"));
    member
        .children_by_field_name("declarator")
        .filter_map(|d| {
            let name = d.child_by_field_name("name")?.text();
            let mut e = out.entity(EntityKind::Constant, name, member);
            e.visibility = mods.visibility(in_interface);
            e.decorators = mods.decorators();
            e.value_type = Some(type_name.clone());
            if let Some(value) = d.child_by_field_name("value") {
                e.set_value(value.text());
            }
            Some(e)
        })
        .collect()
}

fn extract_method(
    member: SyntaxNode<'_>,
    owner: &str,
    in_interface: bool,
    out: &Collector<'_>,
) -> Option<Entity> {
    let name = member.child_by_field_name("name")?.text();
    let mods = modifiers(member);
    let mut entity = out.entity(EntityKind::Method, name, member);
    entity.visibility = mods.visibility(in_interface);
    entity.decorators = mods.decorators();
    entity.receiver = Some(if mods.is_static {
        format!("{owner} (static)")
    } else {
        owner.to_string()
    });
    if let Some(params) = member.child_by_field_name("parameters") {
        entity.params = parameters(params);
    }
    let ret = text_of(member.child_by_field_name("type"));
    if !ret.is_empty() && ret != "void" {
        entity.returns = vec![ret];
    }
    if let Some(body) = member.child_by_field_name("body") {
        entity.raw_body = body.text().to_string();
    }
    Some(entity)
}

fn parameters(list: SyntaxNode<'_>) -> Vec<Param> {
    list.named_children()
        .filter_map(|p| match p.kind() {
            "formal_parameter" => Some(Param::new(
                text_of(p.child_by_field_name("name")),
                text_of(p.child_by_field_name("type")),
            )),
            "spread_parameter" => {
                let ty = p
                    .named_children()
                    .find(|c| !matches!(c.kind(), "modifiers" | "variable_declarator" | "identifier"))
                    .map(|c| squash(c.text()))
                    .unwrap_or_default();
                let name = p
                    .child_of_kind("variable_declarator")
                    .and_then(|d| d.child_by_field_name("name"))
                    .or_else(|| p.named_children().filter(|c| c.kind() == "identifier").last())
                    .map(|n| n.text().to_string())
                    .unwrap_or_default();
                Some(Param::new(name, format!("{ty}...")))
            }
            _ => None,
        })
        .collect()
}

fn extract_import(decl: SyntaxNode<'_>, out: &Collector<'_>) -> Option<Entity> {
    let path = decl
        .named_children()
        .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))?
        .text()
        .to_string();
    let wildcard = decl.children().any(|c| c.kind() == "asterisk");
    let name = if wildcard {
        "*".to_string()
    } else {
        path.rsplit('.').next().unwrap_or(&path).to_string()
    };
    let mut entity = out.entity(EntityKind::Import, &name, decl);
    entity.import_path = Some(path);
    Some(entity)
}

fn base_types<'t>(decl: SyntaxNode<'t>) -> Vec<BaseType<'t>> {
    let mut bases = Vec::new();
    let mut collect = |clause: Option<SyntaxNode<'t>>, dep_type: DepType| {
        let Some(clause) = clause else {
            return;
        };
        for ty in clause.descendants() {
            if matches!(ty.kind(), "type_identifier" | "scoped_type_identifier" | "generic_type")
                && ty.parent().is_some_and(|p| matches!(p.kind(), "type_list" | "superclass"))
            {
                bases.push((strip_generics(&squash(ty.text())).to_string(), ty, dep_type));
            }
        }
    };
    collect(decl.child_by_field_name("superclass"), DepType::Extends);
    collect(decl.child_of_kind("extends_interfaces"), DepType::Extends);
    collect(decl.child_by_field_name("interfaces"), DepType::Implements);
    bases
        .into_iter()
        .map(|(name, node, dep_type)| BaseType { name, node, dep_type })
        .collect()
}

// ── Reference Rules ───────────────────────────────────────────────────────

impl ReferenceRules for JavaFrontend {
    fn body<'t>(&self, decl: SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
        decl.child_by_field_name("body")
    }

    fn decorators<'t>(&self, decl: SyntaxNode<'t>) -> Vec<SyntaxNode<'t>> {
        modifiers(decl).annotations
    }

    fn type_body<'t>(&self, decl: SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
        decl.child_by_field_name("body")
    }

    fn base_types<'t>(&self, decl: SyntaxNode<'t>) -> Vec<BaseType<'t>> {
        base_types(decl)
    }

    fn classify(&self, node: SyntaxNode<'_>) -> Option<RefClass> {
        match node.kind() {
            "method_invocation" => Some(RefClass::Call),
            "object_creation_expression" => Some(RefClass::Construct),
            "marker_annotation" | "annotation" => Some(RefClass::Decorator),
            "scoped_type_identifier" => {
                (node.parent().map(|p| p.kind()) != Some("scoped_type_identifier")).then_some(RefClass::TypeRef)
            }
            "type_identifier" => {
                let parent = node.parent().map(|p| p.kind());
                (!matches!(parent, Some("scoped_type_identifier" | "type_parameter"))).then_some(RefClass::TypeRef)
            }
            _ => None,
        }
    }

    fn target_name(&self, node: SyntaxNode<'_>, class: RefClass) -> Option<String> {
        match class {
            RefClass::Call => {
                let name = node.child_by_field_name("name")?.text();
                match node.child_by_field_name("object") {
                    None => Some(name.to_string()),
                    Some(object) => {
                        let base = member_chain(
                            object,
                            &["field_access"],
                            "object",
                            "field",
                            &["identifier", "this", "super"],
                        )?;
                        Some(format!("{base}.{name}"))
                    }
                }
            }
            RefClass::Construct => {
                let ty = node.child_by_field_name("type")?;
                match ty.kind() {
                    "generic_type" => ty.named_children().next().map(|t| squash(t.text())),
                    _ => Some(squash(ty.text())),
                }
            }
            RefClass::Decorator => node.child_by_field_name("name").map(|n| squash(n.text())),
            RefClass::TypeRef => Some(squash(node.text())),
        }
    }

    fn is_conditional(&self, kind: &str) -> bool {
        matches!(
            kind,
            "if_statement"
                | "switch_expression"
                | "switch_statement"
                | "try_statement"
                | "try_with_resources_statement"
                | "catch_clause"
                | "ternary_expression"
        )
    }

    fn is_boundary(&self, kind: &str) -> bool {
        matches!(
            kind,
            "method_declaration" | "constructor_declaration" | "compact_constructor_declaration" | "lambda_expression"
        ) || TYPE_DECLARATIONS.contains(&kind)
    }

    fn is_type_declaration(&self, kind: &str) -> bool {
        TYPE_DECLARATIONS.contains(&kind)
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
        let tree = parse_source(&JavaFrontend.tree_sitter_language(), src.to_string()).unwrap();
        JavaFrontend.extract_entities(&tree, "src/Account.java")
    }

    fn find<'a>(entities: &'a [Entity], name: &str) -> &'a Entity {
        entities.iter().find(|e| e.name == name).unwrap()
    }

    #[test]
    fn extract_java_class() {
        let src = r#"import java.util.List;
import com.acme.model.*;

@Entity
public class Account extends Base implements Auditable, Comparable<Account> {
    public static final int MAX = 10;
    private String owner;
    long balance;

    public Account(String owner) {
        this.owner = owner;
    }

    @Override
    public int compareTo(Account other) {
        return 0;
    }

    static void log(String... parts) {}
}
"#;
        let entities = extract(src);
        let account = find(&entities, "Account");
        assert_eq!(account.kind, EntityKind::Type);
        assert_eq!(account.type_kind, Some(TypeKind::Struct));
        assert_eq!(account.decorators, vec!["Entity"]);
        assert_eq!(account.implements, vec!["Base", "Auditable", "Comparable"]);
        assert_eq!(
            account.fields,
            vec![
                Field::new("owner", "String", Visibility::Private),
                Field::new("balance", "long", Visibility::Protected),
            ]
        );

        let max = find(&entities, "MAX");
        assert_eq!(max.kind, EntityKind::Constant);
        assert_eq!(max.value_type.as_deref(), Some("int"));
        assert_eq!(max.value.as_deref(), Some("10"));

        let ctor = entities
            .iter()
            .find(|e| e.name == "Account" && e.kind == EntityKind::Method)
            .unwrap();
        assert_eq!(ctor.params, vec![Param::new("owner", "String")]);
        assert!(ctor.returns.is_empty());

        let cmp = find(&entities, "compareTo");
        assert_eq!(cmp.returns, vec!["int"]);
        assert_eq!(cmp.decorators, vec!["Override"]);
        assert_eq!(cmp.receiver.as_deref(), Some("Account"));

        let log = find(&entities, "log");
        assert_eq!(log.receiver.as_deref(), Some("Account (static)"));
        assert_eq!(log.params, vec![Param::new("parts", "String...")]);
        assert_eq!(log.visibility, Visibility::Protected);

        assert_eq!(find(&entities, "List").import_path.as_deref(), Some("java.util.List"));
        assert_eq!(find(&entities, "*").import_path.as_deref(), Some("com.acme.model"));
    }

    #[test]
    fn extract_java_interface_and_enum() {
        let src = r#"interface Shape extends Named {
    double area();
}

enum Color {
    RED(1), GREEN(2);

    int code() { return 0; }
}
"#;
        let entities = extract(src);
        let shape = find(&entities, "Shape");
        assert_eq!(shape.type_kind, Some(TypeKind::Interface));
        assert_eq!(shape.implements, vec!["Named"]);
        assert_eq!(find(&entities, "area").visibility, Visibility::Public);

        let color = find(&entities, "Color");
        assert_eq!(color.kind, EntityKind::Enum);
        assert_eq!(
            color.enum_values,
            vec![EnumValue::new("RED", "1"), EnumValue::new("GREEN", "2")]
        );
        assert_eq!(find(&entities, "code").receiver.as_deref(), Some("Color"));
    }

    #[test]
    fn java_calls_and_constructions_resolve() {
        use crate::languages::LanguageRegistry;
        use crate::projection::project;
        use crate::resolver::{DependencyResolver, ResolverOptions};

        let src = r#"class Ledger {
    void post(Entry e) {
        Entry copy = new Entry();
        this.store.save(copy);
        try {
            audit();
        } catch (Exception ex) {
            System.out.println(ex);
        }
        builder().build();
    }

    void audit() {}
}

class Entry {}
"#;
        let tree = parse_source(&JavaFrontend.tree_sitter_language(), src.to_string()).unwrap();
        let items = JavaFrontend.extract(&tree, "Ledger.java");
        let registry = LanguageRegistry::new();
        let batch = project(&items, &registry).unwrap();
        let deps = DependencyResolver::new(batch, &registry, ResolverOptions::default())
            .resolve_all()
            .unwrap();

        let id = |name: &str| items.iter().find(|i| i.entity.name == name).unwrap().entity.id();
        let post: Vec<_> = deps
            .iter()
            .filter(|d| d.from_id == id("post"))
            .map(|d| (d.dep_type, d.to_qualified.as_deref().unwrap_or(&d.to_name), d.optional))
            .collect();
        assert_eq!(
            post,
            vec![
                (DepType::Calls, "audit", true),
                (DepType::Calls, "builder", false),
                (DepType::Calls, "this.store.save", false),
                (DepType::UsesType, "Entry", false),
                (DepType::MethodOf, "Ledger", false),
            ]
        );
    }

    #[test]
    fn method_of_skips_constructor_named_like_class() {
        use crate::languages::LanguageRegistry;
        use crate::projection::project;
        use crate::resolver::{DependencyResolver, ResolverOptions};

        let src = r#"class Account {
    Account() {}
    void save() {}
}
"#;
        let tree = parse_source(&JavaFrontend.tree_sitter_language(), src.to_string()).unwrap();
        let items = JavaFrontend.extract(&tree, "Account.java");
        let registry = LanguageRegistry::new();
        let batch = project(&items, &registry).unwrap();
        let deps = DependencyResolver::new(batch, &registry, ResolverOptions::default())
            .resolve_all()
            .unwrap();

        let class_id = items
            .iter()
            .find(|i| i.entity.kind == EntityKind::Type)
            .unwrap()
            .entity
            .id();
        let owners: Vec<_> = deps
            .iter()
            .filter(|d| d.dep_type == DepType::MethodOf)
            .map(|d| (d.location.as_str(), d.to_id.as_str()))
            .collect();
        assert_eq!(
            owners,
            vec![("Account.java:2", class_id.as_str()), ("Account.java:3", class_id.as_str())]
        );
    }
}
