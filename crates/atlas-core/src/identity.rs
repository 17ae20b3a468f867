//! Stable entity identity and content hashing
//!
//! IDs are a function of (kind, file, start line, name) only. Hashes are
//! truncated SHA-256 digests used for change detection, not security.

use sha2::{Digest, Sha256};

use crate::model::{Entity, EntityKind};

/// Hex characters kept from a content digest.
pub const HASH_LEN: usize = 8;
/// Hex characters of the path digest embedded in an ID.
pub const PATH_HASH_LEN: usize = 6;
/// Longest name fragment embedded in an ID.
pub const MAX_ID_NAME_CHARS: usize = 32;

/// Full lowercase hex SHA-256 of `input`.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// First [`HASH_LEN`] hex characters of the SHA-256 of `input`.
pub fn short_hash(input: &str) -> String {
    let mut digest = sha256_hex(input);
    digest.truncate(HASH_LEN);
    digest
}

/// Trim every line, drop blank lines and rejoin with `\n`.
pub fn normalize_body(body: &str) -> String {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// The string the signature hash is computed over.
///
/// Callables: `name(t1,t2)->r1,r2` plus `|receiver` when present.
/// Types: `name|kind|field:type,...`.
pub fn signature_string(entity: &Entity) -> String {
    match entity.kind {
        EntityKind::Function | EntityKind::Method => {
            let params = entity
                .params
                .iter()
                .map(|p| p.type_name.as_str())
                .collect::<Vec<_>>()
                .join(",");
            let mut sig = format!("{}({})->{}", entity.name, params, entity.returns.join(","));
            if let Some(receiver) = entity.receiver.as_deref().filter(|r| !r.is_empty()) {
                sig.push('|');
                sig.push_str(receiver);
            }
            sig
        }
        EntityKind::Type => {
            let kind = entity.type_kind.map(|k| k.as_str()).unwrap_or("");
            let fields = entity
                .fields
                .iter()
                .map(|f| format!("{}:{}", f.name, f.type_name))
                .collect::<Vec<_>>()
                .join(",");
            format!("{}|{}|{}", entity.name, kind, fields)
        }
        EntityKind::Enum => {
            let values = entity
                .enum_values
                .iter()
                .map(|v| format!("{}={}", v.name, v.value))
                .collect::<Vec<_>>()
                .join(",");
            format!(
                "{}|enum:{}|{}",
                entity.name,
                entity.value_type.as_deref().unwrap_or(""),
                values
            )
        }
        EntityKind::Constant | EntityKind::Variable => format!(
            "{}:{}={}",
            entity.name,
            entity.value_type.as_deref().unwrap_or(""),
            entity.value.as_deref().unwrap_or("")
        ),
        EntityKind::Import => format!(
            "{}|{}|{}",
            entity.name,
            entity.import_path.as_deref().unwrap_or(""),
            entity.import_alias.as_deref().unwrap_or("")
        ),
        EntityKind::Unknown => entity.name.clone(),
    }
}

/// Fill in `sig_hash` and, when there is a body, `body_hash`.
pub fn compute_hashes(entity: &mut Entity) {
    entity.sig_hash = short_hash(&signature_string(entity));
    entity.body_hash = if entity.raw_body.is_empty() {
        None
    } else {
        Some(short_hash(&normalize_body(&entity.raw_body)))
    };
}

/// `sa-<typecode>-<path6>-<line>-<name>`.
pub fn generate_entity_id(entity: &Entity) -> String {
    let mut path_hash = sha256_hex(&entity.file);
    path_hash.truncate(PATH_HASH_LEN);
    format!(
        "sa-{}-{}-{}-{}",
        entity.kind.type_code(),
        path_hash,
        entity.start_line,
        sanitize_name(&entity.name)
    )
}

/// Clip to [`MAX_ID_NAME_CHARS`] characters and map anything outside
/// `[A-Za-z0-9_]` to `_`.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .take(MAX_ID_NAME_CHARS)
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}
