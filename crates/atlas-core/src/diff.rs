//! Entity-level diff between two indexing passes

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::dependency::Dependency;
use crate::snapshot::{IndexSnapshot, SnapshotEntity};

/// Changes between an old and a new snapshot, keyed by entity ID.
///
/// All lists are sorted by ID so the diff itself is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDiff {
    /// IDs present only in the new snapshot.
    pub added: Vec<String>,
    /// IDs present only in the old snapshot.
    pub removed: Vec<String>,
    /// Same ID, different signature hash.
    pub signature_changed: Vec<String>,
    /// Same ID, different body hash.
    pub body_changed: Vec<String>,
    /// Edges present only in the new snapshot.
    pub added_dependencies: Vec<Dependency>,
    /// Edges present only in the old snapshot.
    pub removed_dependencies: Vec<Dependency>,
}

impl EntityDiff {
    pub fn compute(old: &IndexSnapshot, new: &IndexSnapshot) -> Self {
        let old_map = by_id(&old.entities);
        let new_map = by_id(&new.entities);

        let mut diff = EntityDiff::default();

        for (id, new_entity) in &new_map {
            match old_map.get(id) {
                None => diff.added.push((*id).to_string()),
                Some(old_entity) => {
                    if old_entity.entity.sig_hash != new_entity.entity.sig_hash {
                        diff.signature_changed.push((*id).to_string());
                    }
                    if old_entity.entity.body_hash != new_entity.entity.body_hash {
                        diff.body_changed.push((*id).to_string());
                    }
                }
            }
        }

        diff.removed = old_map
            .keys()
            .filter(|id| !new_map.contains_key(*id))
            .map(|id| (*id).to_string())
            .collect();

        let old_deps: BTreeSet<String> = old.dependencies.iter().map(edge_key).collect();
        let new_deps: BTreeSet<String> = new.dependencies.iter().map(edge_key).collect();
        diff.added_dependencies = new
            .dependencies
            .iter()
            .filter(|d| !old_deps.contains(&edge_key(d)))
            .cloned()
            .collect();
        diff.removed_dependencies = old
            .dependencies
            .iter()
            .filter(|d| !new_deps.contains(&edge_key(d)))
            .cloned()
            .collect();

        diff
    }

    /// Check if this diff is empty (no changes).
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.signature_changed.is_empty()
            && self.body_changed.is_empty()
            && self.added_dependencies.is_empty()
            && self.removed_dependencies.is_empty()
    }

    /// IDs whose entity changed in any way.
    pub fn changed_ids(&self) -> BTreeSet<&str> {
        self.added
            .iter()
            .chain(&self.removed)
            .chain(&self.signature_changed)
            .chain(&self.body_changed)
            .map(String::as_str)
            .collect()
    }
}

fn by_id(entities: &[SnapshotEntity]) -> BTreeMap<&str, &SnapshotEntity> {
    entities.iter().map(|e| (e.id.as_str(), e)).collect()
}

/// Edge identity ignores location: a call moving within its caller is not a new edge.
fn edge_key(dep: &Dependency) -> String {
    format!(
        "{}|{}|{}|{}|{}",
        dep.from_id,
        dep.dep_type,
        dep.to_name,
        dep.to_qualified.as_deref().unwrap_or(""),
        dep.to_id
    )
}
