//! Integration tests for Atlas
//!
//! These tests drive the coordinator and the CLI over on-disk repositories.

use std::fs;
use std::path::Path;
use std::process::Command;

use atlas_core::{AtlasConfig, DepType, Entity, EntityDiff, IndexSnapshot};
use atlas_indexer::{Coordinator, IndexOutput};
use tempfile::TempDir;

fn write_repo(files: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    for (path, content) in files {
        let full = temp_dir.path().join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }
    temp_dir
}

fn index(root: &Path) -> IndexOutput {
    Coordinator::new(AtlasConfig::default())
        .unwrap()
        .run_full_index(root)
        .unwrap()
}

fn entity<'a>(out: &'a IndexOutput, name: &str) -> &'a Entity {
    out.entities.iter().find(|e| e.name == name).unwrap()
}

const MODELS_PY: &str = "class User:\n    def __init__(self, name):\n        self.name = name\n";
const SERVICE_PY: &str = "def create(name):\n    return User(name)\n";

fn atlas() -> Command {
    Command::new(env!("CARGO_BIN_EXE_atlas"))
}

/// Test that the CLI can be invoked
#[test]
fn test_cli_invocation() {
    let output = atlas().arg("--help").output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("atlas"));
    assert!(stdout.contains("Multi-language entity catalogue and dependency resolver"));
}

#[test]
fn test_cli_lists_languages() {
    let output = atlas().arg("languages").output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.lines().any(|l| l.starts_with("go") && l.contains(".go")));
    assert!(stdout.lines().any(|l| l.starts_with("python") && l.contains(".pyi")));
}

/// Python construction resolves across files
#[test]
fn test_python_cross_file_construction() {
    let repo = write_repo(&[("app/models.py", MODELS_PY), ("app/service.py", SERVICE_PY)]);
    let out = index(repo.path());

    let create = entity(&out, "create");
    let user = entity(&out, "User");
    let dep = out
        .dependencies
        .iter()
        .find(|d| d.from_id == create.id())
        .unwrap();
    assert_eq!(dep.dep_type, DepType::Calls);
    assert_eq!(dep.to_name, "User");
    assert_eq!(dep.to_id, user.id());
    assert_eq!(dep.location, "app/service.py:2");
}

/// TypeScript heritage and calls resolve across files
#[test]
fn test_typescript_cross_file_resolution() {
    let repo = write_repo(&[
        (
            "src/store.ts",
            "export interface Store {\n  get(key: string): string;\n}\n\nexport class MemoryStore implements Store {\n  get(key: string): string {\n    return lookup(key);\n  }\n}\n",
        ),
        ("src/util.ts", "export function lookup(key: string): string {\n  return key;\n}\n"),
    ]);
    let out = index(repo.path());

    let store = entity(&out, "Store");
    let memory = entity(&out, "MemoryStore");
    let lookup = entity(&out, "lookup");
    let get = entity(&out, "get");

    assert!(out.dependencies.iter().any(|d| d.from_id == memory.id()
        && d.dep_type == DepType::Implements
        && d.to_id == store.id()));
    assert!(out.dependencies.iter().any(|d| d.from_id == get.id()
        && d.dep_type == DepType::Calls
        && d.to_id == lookup.id()));
    assert!(out.dependencies.iter().any(|d| d.from_id == get.id()
        && d.dep_type == DepType::MethodOf
        && d.to_id == memory.id()));
}

/// Snapshot survives a save/load and drives the diff
#[test]
fn test_snapshot_diff_detects_body_change() {
    let repo = write_repo(&[("app/models.py", MODELS_PY), ("app/service.py", SERVICE_PY)]);
    let before = index(repo.path());
    let path = repo.path().join(".atlas/before.json");
    IndexSnapshot::new(&before.entities, &before.dependencies)
        .save(&path)
        .unwrap();
    let old = IndexSnapshot::load(&path).unwrap();
    assert_eq!(old.entities.len(), before.entities.len());

    fs::write(
        repo.path().join("app/service.py"),
        "def create(name):\n    return User(name.strip())\n",
    )
    .unwrap();
    let after = index(repo.path());
    let new = IndexSnapshot::new(&after.entities, &after.dependencies);

    let diff = EntityDiff::compute(&old, &new);
    let create_id = entity(&after, "create").id();
    assert!(diff.added.is_empty());
    assert!(diff.removed.is_empty());
    assert!(diff.signature_changed.is_empty());
    assert_eq!(diff.body_changed, vec![create_id]);
}

/// The CLI writes a JSON snapshot that loads back
#[test]
fn test_cli_index_writes_json_snapshot() {
    let repo = write_repo(&[("app/models.py", MODELS_PY), ("app/service.py", SERVICE_PY)]);
    let out_file = repo.path().join("index.json");

    let status = atlas()
        .arg("--root")
        .arg(repo.path())
        .args(["index", "--format", "json", "--output"])
        .arg(&out_file)
        .status()
        .unwrap();
    assert!(status.success());

    let snapshot = IndexSnapshot::load(&out_file).unwrap();
    assert!(snapshot.entities.iter().any(|e| e.entity.name == "create"));
    assert_eq!(snapshot.dependencies.len(), index(repo.path()).dependencies.len());

    let output = atlas().arg("diff").arg(&out_file).arg(&out_file).output().unwrap();
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

/// Compact output goes to stdout, logs to stderr
#[test]
fn test_cli_compact_output() {
    let repo = write_repo(&[("app/service.py", SERVICE_PY)]);
    let output = atlas()
        .arg("--root")
        .arg(repo.path())
        .arg("index")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "# entities 1");
    assert!(lines[1].contains(" app/service.py:1-2|(name)|"));
    assert_eq!(lines[2], "# dependencies 1");
    assert!(lines[3].ends_with("|calls|User|@app/service.py:2"));
}
