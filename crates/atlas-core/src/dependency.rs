//! Dependency edges between entities

use std::fmt;

use serde::{Deserialize, Serialize};

/// Relationship carried by a [`Dependency`].
///
/// Declaration order is the sort order used for output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepType {
    Calls,
    UsesType,
    Extends,
    Implements,
    MethodOf,
    Instantiates,
}

impl DepType {
    pub fn as_str(self) -> &'static str {
        match self {
            DepType::Calls => "calls",
            DepType::UsesType => "uses_type",
            DepType::Extends => "extends",
            DepType::Implements => "implements",
            DepType::MethodOf => "method_of",
            DepType::Instantiates => "instantiates",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "calls" => Some(DepType::Calls),
            "uses_type" => Some(DepType::UsesType),
            "extends" => Some(DepType::Extends),
            "implements" => Some(DepType::Implements),
            "method_of" => Some(DepType::MethodOf),
            "instantiates" => Some(DepType::Instantiates),
            _ => None,
        }
    }
}

impl fmt::Display for DepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One directed edge. An empty `to_id` is a valid unresolved edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub from_id: String,
    pub to_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_qualified: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub to_id: String,
    pub dep_type: DepType,
    /// `file:line` of the reference.
    pub location: String,
    #[serde(default)]
    pub optional: bool,
}

impl Dependency {
    pub fn is_resolved(&self) -> bool {
        !self.to_id.is_empty()
    }
}

/// Sort by (from_id, dep_type, to_name), with the remaining fields as
/// tie-breaks so output is fully deterministic.
pub fn sort_dependencies(deps: &mut [Dependency]) {
    deps.sort_by(|a, b| {
        a.from_id
            .cmp(&b.from_id)
            .then(a.dep_type.cmp(&b.dep_type))
            .then_with(|| a.to_name.cmp(&b.to_name))
            .then_with(|| a.to_qualified.cmp(&b.to_qualified))
            .then_with(|| a.location.cmp(&b.location))
            .then_with(|| a.to_id.cmp(&b.to_id))
    });
}
