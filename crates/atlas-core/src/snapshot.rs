//! JSON snapshots of one indexing pass

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dependency::Dependency;
use crate::error::AtlasError;
use crate::model::Entity;

/// Snapshot format version written into every file.
pub const SNAPSHOT_VERSION: u32 = 1;

/// An entity together with its ID, as stored in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntity {
    pub id: String,
    #[serde(flatten)]
    pub entity: Entity,
}

/// Entities and dependencies of one pass, in output order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub version: u32,
    /// Version of the tool that wrote the snapshot.
    #[serde(default)]
    pub generator: String,
    pub entities: Vec<SnapshotEntity>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

impl IndexSnapshot {
    pub fn new(entities: &[Entity], dependencies: &[Dependency]) -> Self {
        IndexSnapshot {
            version: SNAPSHOT_VERSION,
            generator: env!("CARGO_PKG_VERSION").to_string(),
            entities: entities
                .iter()
                .map(|e| SnapshotEntity {
                    id: e.id(),
                    entity: e.clone(),
                })
                .collect(),
            dependencies: dependencies.to_vec(),
        }
    }

    pub fn to_json(&self) -> Result<String, AtlasError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, AtlasError> {
        let snapshot: IndexSnapshot = serde_json::from_str(json)?;
        if snapshot.version > SNAPSHOT_VERSION {
            return Err(AtlasError::Contract(format!(
                "snapshot version {} is newer than supported version {}",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }
        Ok(snapshot)
    }

    pub fn save(&self, path: &Path) -> Result<(), AtlasError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        tracing::debug!("Snapshot saved: {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, AtlasError> {
        let json = std::fs::read_to_string(path)?;
        let snapshot = Self::from_json(&json)?;
        tracing::debug!(
            "Snapshot loaded from {}: {} entities, {} dependencies",
            path.display(),
            snapshot.entities.len(),
            snapshot.dependencies.len()
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::DepType;
    use crate::identity::compute_hashes;
    use crate::model::{EntityKind, Language, Param};

    fn sample() -> IndexSnapshot {
        let mut f = Entity::new(EntityKind::Function, "main", "main.go", 5, 9, Language::Go);
        f.params = vec![Param::new("args", "[]string")];
        f.raw_body = "run(args)".to_string();
        compute_hashes(&mut f);
        let dep = Dependency {
            from_id: f.id(),
            to_name: "run".to_string(),
            to_qualified: None,
            to_id: String::new(),
            dep_type: DepType::Calls,
            location: "main.go:6".to_string(),
            optional: false,
        };
        IndexSnapshot::new(&[f], &[dep])
    }

    #[test]
    fn json_round_trip_keeps_ids_and_hashes() {
        let snap = sample();
        let back = IndexSnapshot::from_json(&snap.to_json().unwrap()).unwrap();
        assert_eq!(back.entities[0].id, snap.entities[0].id);
        assert_eq!(back.entities[0].entity.body_hash, snap.entities[0].entity.body_hash);
        assert_eq!(back.dependencies, snap.dependencies);
        // Raw bodies are never written out.
        assert!(back.entities[0].entity.raw_body.is_empty());
    }

    #[test]
    fn newer_versions_are_rejected() {
        let mut snap = sample();
        snap.version = SNAPSHOT_VERSION + 1;
        let json = serde_json::to_string(&snap).unwrap();
        assert!(IndexSnapshot::from_json(&json).unwrap_err().is_contract());
    }

    #[test]
    fn save_and_load_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out").join("index.json");
        let snap = sample();
        snap.save(&path).unwrap();
        let loaded = IndexSnapshot::load(&path).unwrap();
        assert_eq!(loaded.entities.len(), 1);
        assert_eq!(loaded.generator, snap.generator);
    }
}
