//! Core data structures for the entity catalogue

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Longest textual value kept on a constant or variable.
pub const MAX_VALUE_CHARS: usize = 50;

/// Discriminates what kind of declaration an entity represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Function,
    Method,
    Type,
    Constant,
    Variable,
    Enum,
    Import,

    // ── Fallback for snapshots written by newer versions ────
    #[serde(other)]
    Unknown,
}

impl EntityKind {
    /// Functions and methods: the kinds that own a statement body.
    pub fn is_callable(self) -> bool {
        matches!(self, EntityKind::Function | EntityKind::Method)
    }

    /// Kinds whose base clauses and member annotations are resolved.
    pub fn is_type_like(self) -> bool {
        matches!(self, EntityKind::Type | EntityKind::Enum)
    }

    /// Short code used inside entity IDs.
    pub fn type_code(self) -> &'static str {
        match self {
            EntityKind::Function | EntityKind::Method => "fn",
            EntityKind::Type => "type",
            EntityKind::Constant => "const",
            EntityKind::Variable => "var",
            EntityKind::Enum => "enum",
            EntityKind::Import => "imp",
            EntityKind::Unknown => "unk",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Function => "function",
            EntityKind::Method => "method",
            EntityKind::Type => "type",
            EntityKind::Constant => "constant",
            EntityKind::Variable => "variable",
            EntityKind::Enum => "enum",
            EntityKind::Import => "import",
            EntityKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of a type declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Struct,
    Interface,
    Alias,
    Union,
}

impl TypeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TypeKind::Struct => "struct",
            TypeKind::Interface => "interface",
            TypeKind::Alias => "alias",
            TypeKind::Union => "union",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visibility of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Protected,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::Protected => "protected",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parameter of a callable, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

impl Param {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Param {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// One field (or member signature) of a type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub visibility: Visibility,
}

impl Field {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, visibility: Visibility) -> Self {
        Field {
            name: name.into(),
            type_name: type_name.into(),
            visibility,
        }
    }
}

/// One member of an enum.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnumValue {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

impl EnumValue {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        EnumValue {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Supported languages for syntax-aware extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Rust,
    TypeScript,
    JavaScript,
    Python,
    Go,
    Java,
    C,
    #[serde(other)]
    Other,
}

impl Language {
    /// Detect language from file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("rs") => Language::Rust,
            Some("ts") | Some("tsx") | Some("mts") | Some("cts") => Language::TypeScript,
            Some("js") | Some("jsx") | Some("mjs") | Some("cjs") => Language::JavaScript,
            Some("py") | Some("pyi") => Language::Python,
            Some("go") => Language::Go,
            Some("java") => Language::Java,
            Some("c") | Some("h") => Language::C,
            _ => Language::Other,
        }
    }

    /// Parse a configuration-style language name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "rust" | "rs" => Some(Language::Rust),
            "typescript" | "ts" => Some(Language::TypeScript),
            "javascript" | "js" => Some(Language::JavaScript),
            "python" | "py" => Some(Language::Python),
            "go" | "golang" => Some(Language::Go),
            "java" => Some(Language::Java),
            "c" => Some(Language::C),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
            Language::Python => "python",
            Language::Go => "go",
            Language::Java => "java",
            Language::C => "c",
            Language::Other => "other",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One extracted declaration.
///
/// Entities are plain values: they never hold syntax-tree handles. Front-ends
/// pair them with their defining node separately when a resolution pass needs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    // ── Identity / location ─────────────────────────────────
    pub kind: EntityKind,
    pub name: String,
    pub file: String,
    /// 1-based, inclusive.
    pub start_line: u32,
    /// 1-based, inclusive.
    pub end_line: u32,

    // ── Callable ────────────────────────────────────────────
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub returns: Vec<String>,
    /// Owning type name, optionally followed by a modifier: `Foo (static)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_async: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decorators: Vec<String>,

    // ── Type ────────────────────────────────────────────────
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_kind: Option<TypeKind>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub implements: Vec<String>,

    // ── Value (constant / variable; enum base type) ─────────
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    // ── Enum ────────────────────────────────────────────────
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<EnumValue>,

    // ── Import ──────────────────────────────────────────────
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_alias: Option<String>,

    // ── Cross-cutting ───────────────────────────────────────
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub sig_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_hash: Option<String>,
    /// Body text used only to compute `body_hash`; never serialized.
    #[serde(skip)]
    pub raw_body: String,
    pub language: Language,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl Entity {
    /// A bare entity of the given kind; everything else starts empty.
    pub fn new(
        kind: EntityKind,
        name: impl Into<String>,
        file: impl Into<String>,
        start_line: u32,
        end_line: u32,
        language: Language,
    ) -> Self {
        Entity {
            kind,
            name: name.into(),
            file: file.into(),
            start_line,
            end_line: end_line.max(start_line),
            params: Vec::new(),
            returns: Vec::new(),
            receiver: None,
            is_async: false,
            decorators: Vec::new(),
            type_kind: None,
            fields: Vec::new(),
            implements: Vec::new(),
            value_type: None,
            value: None,
            enum_values: Vec::new(),
            import_path: None,
            import_alias: None,
            visibility: Visibility::Public,
            sig_hash: String::new(),
            body_hash: None,
            raw_body: String::new(),
            language,
        }
    }

    /// Stable ID; see [`crate::identity::generate_entity_id`].
    pub fn id(&self) -> String {
        crate::identity::generate_entity_id(self)
    }

    /// Receiver type without any modifier suffix (`Foo (static)` -> `Foo`).
    pub fn receiver_type(&self) -> Option<&str> {
        self.receiver
            .as_deref()
            .map(strip_receiver_modifier)
            .filter(|r| !r.is_empty())
    }

    /// `Receiver.name` for methods, the bare name otherwise.
    pub fn display_name(&self) -> String {
        match self.receiver_type() {
            Some(owner) => format!("{}.{}", owner, self.name),
            None => self.name.clone(),
        }
    }

    /// `file:line` of the declaration start.
    pub fn location(&self) -> String {
        format!("{}:{}", self.file, self.start_line)
    }

    /// Set the textual value, collapsing whitespace and clipping to
    /// [`MAX_VALUE_CHARS`] characters.
    pub fn set_value(&mut self, value: &str) {
        self.value = Some(clip_value(value));
    }
}

/// Drop a trailing ` (modifier)` from a receiver string.
pub fn strip_receiver_modifier(receiver: &str) -> &str {
    match receiver.find(" (") {
        Some(pos) => receiver[..pos].trim(),
        None => receiver.trim(),
    }
}

/// Collapse whitespace runs to one space and clip to [`MAX_VALUE_CHARS`].
pub fn clip_value(value: &str) -> String {
    let squashed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    squashed.chars().take(MAX_VALUE_CHARS).collect()
}

/// Order entities by (file, start line, name), then kind for full determinism.
pub fn sort_entities(entities: &mut [Entity]) {
    entities.sort_by(|a, b| {
        a.file
            .cmp(&b.file)
            .then(a.start_line.cmp(&b.start_line))
            .then_with(|| a.name.cmp(&b.name))
            .then(a.kind.cmp(&b.kind))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receiver_modifier_is_stripped() {
        let mut e = Entity::new(EntityKind::Method, "load", "a.py", 3, 4, Language::Python);
        e.receiver = Some("Repo (static)".to_string());
        assert_eq!(e.receiver_type(), Some("Repo"));
        assert_eq!(e.display_name(), "Repo.load");
    }

    #[test]
    fn value_is_squashed_and_clipped() {
        let long = format!("[\n  {}\n]", "1, ".repeat(40));
        let clipped = clip_value(&long);
        assert_eq!(clipped.chars().count(), MAX_VALUE_CHARS);
        assert!(clipped.starts_with("[ 1, 1,"));
        assert!(!clipped.contains('\n'));
    }

    #[test]
    fn end_line_never_precedes_start() {
        let e = Entity::new(EntityKind::Constant, "X", "a.go", 7, 2, Language::Go);
        assert_eq!(e.end_line, 7);
    }

    #[test]
    fn unknown_kind_deserializes_to_fallback() {
        let kind: EntityKind = serde_json::from_str("\"macro\"").unwrap();
        assert_eq!(kind, EntityKind::Unknown);
        assert_eq!(kind.type_code(), "unk");
    }

    #[test]
    fn sort_orders_by_file_line_name() {
        let mut entities = vec![
            Entity::new(EntityKind::Function, "b", "b.go", 1, 1, Language::Go),
            Entity::new(EntityKind::Function, "z", "a.go", 5, 5, Language::Go),
            Entity::new(EntityKind::Function, "a", "a.go", 5, 5, Language::Go),
            Entity::new(EntityKind::Function, "c", "a.go", 2, 2, Language::Go),
        ];
        sort_entities(&mut entities);
        let names: Vec<_> = entities.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "z", "b"]);
    }
}
