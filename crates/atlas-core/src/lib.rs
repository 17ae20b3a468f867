//! Atlas Core — entity model, identity/hashing, dependency records and compact encoding

pub mod error;
pub mod model;
pub mod identity;
pub mod dependency;
pub mod symbols;
pub mod compact;
pub mod diff;
pub mod snapshot;
pub mod config;


pub use error::AtlasError;
pub use model::{Entity, EntityKind, TypeKind, Visibility, Param, Field, EnumValue, Language, sort_entities};
pub use identity::{compute_hashes, generate_entity_id, normalize_body, short_hash, signature_string};
pub use dependency::{DepType, Dependency, sort_dependencies};
pub use symbols::{SymbolTable, split_qualified};
pub use compact::{CompactEntity, format_entity, format_dependency, parse_entity_line};
pub use diff::EntityDiff;
pub use snapshot::{IndexSnapshot, SnapshotEntity, SNAPSHOT_VERSION};
pub use config::{AtlasConfig, IndexConfig, ResolverConfig, BuiltinOverrides, CONFIG_FILE};
