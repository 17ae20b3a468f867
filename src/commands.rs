//! CLI command implementations

use std::fmt::Write as _;
use std::path::Path;

use anyhow::Context;
use atlas_core::{AtlasConfig, EntityDiff, IndexSnapshot, format_dependency, format_entity};
use atlas_indexer::{Coordinator, IndexOutput, LanguageRegistry};

use crate::OutputFormat;

pub fn index(
    root: &Path,
    format: OutputFormat,
    output: Option<&Path>,
    config: Option<&Path>,
) -> anyhow::Result<()> {
    tracing::info!("Indexing repository: {}", root.display());

    let config = match config {
        Some(path) => AtlasConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => AtlasConfig::load_or_default(root)?,
    };
    let coordinator = Coordinator::new(config)?;
    let result = coordinator.run_full_index(root)?;

    if result.files_skipped > 0 {
        tracing::warn!("Skipped {} files", result.files_skipped);
    }

    let rendered = match format {
        OutputFormat::Compact => render_compact(&result),
        OutputFormat::Json => IndexSnapshot::new(&result.entities, &result.dependencies).to_json()?,
    };

    match output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!("Wrote {}", path.display());
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

pub fn diff(old: &Path, new: &Path) -> anyhow::Result<()> {
    let old_snapshot = IndexSnapshot::load(old)
        .with_context(|| format!("failed to load snapshot {}", old.display()))?;
    let new_snapshot = IndexSnapshot::load(new)
        .with_context(|| format!("failed to load snapshot {}", new.display()))?;

    let diff = EntityDiff::compute(&old_snapshot, &new_snapshot);
    if diff.is_empty() {
        tracing::info!("No changes");
    }
    print!("{}", render_diff(&diff));
    Ok(())
}

pub fn languages() -> anyhow::Result<()> {
    let registry = LanguageRegistry::new();
    for frontend in registry.frontends() {
        let extensions = frontend
            .file_extensions()
            .iter()
            .map(|e| format!(".{e}"))
            .collect::<Vec<_>>()
            .join(" ");
        println!("{:<12}{}", frontend.name(), extensions);
    }
    Ok(())
}

/// One `<id> <compact line>` per entity, then one compact line per dependency.
fn render_compact(result: &IndexOutput) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# entities {}", result.entities.len());
    for entity in &result.entities {
        let _ = writeln!(out, "{} {}", entity.id(), format_entity(entity));
    }
    let _ = writeln!(out, "# dependencies {}", result.dependencies.len());
    for dep in &result.dependencies {
        let _ = writeln!(out, "{}", format_dependency(dep));
    }
    out
}

fn render_diff(diff: &EntityDiff) -> String {
    let mut out = String::new();
    for id in &diff.added {
        let _ = writeln!(out, "+ {id}");
    }
    for id in &diff.removed {
        let _ = writeln!(out, "- {id}");
    }
    for id in &diff.signature_changed {
        let _ = writeln!(out, "~sig {id}");
    }
    for id in &diff.body_changed {
        let _ = writeln!(out, "~body {id}");
    }
    for dep in &diff.added_dependencies {
        let _ = writeln!(out, "+dep {}", format_dependency(dep));
    }
    for dep in &diff.removed_dependencies {
        let _ = writeln!(out, "-dep {}", format_dependency(dep));
    }
    out
}
