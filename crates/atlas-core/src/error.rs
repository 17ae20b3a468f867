//! Error type shared by the Atlas crates

/// Unified error type for Atlas.
///
/// Entity- and dependency-level problems are absorbed where they happen
/// (skip-and-continue); only the kinds below ever cross an API boundary.
#[derive(Debug, thiserror::Error)]
pub enum AtlasError {
    /// A caller broke a documented structural contract, e.g. passed a node
    /// handle that does not belong to the tree, or a batch entry whose
    /// language has no registered front-end.
    #[error("contract violation: {0}")]
    Contract(String),

    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("malformed compact line: {0}")]
    Compact(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AtlasError {
    /// True for the structural-contract kind, the only one the resolver raises.
    pub fn is_contract(&self) -> bool {
        matches!(self, AtlasError::Contract(_))
    }
}
