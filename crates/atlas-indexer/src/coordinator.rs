//! Two-phase indexing pipeline
//!
//! Phase 1 parses and extracts every file in parallel. Resolution needs the
//! complete batch, so phase 2 starts only once phase 1 has finished.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use atlas_core::{AtlasConfig, AtlasError, Dependency, Entity, sort_entities};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::extractor::{EntityWithNode, LanguageFrontend};
use crate::languages::LanguageRegistry;
use crate::parser::parse_source;
use crate::projection::project;
use crate::resolver::{DependencyResolver, ResolverOptions};
use crate::syntax::SyntaxTree;

/// Result of one indexing run.
#[derive(Debug, Clone, Default)]
pub struct IndexOutput {
    /// Sorted by (file, start line, name).
    pub entities: Vec<Entity>,
    /// Sorted by (from ID, dependency type, target name).
    pub dependencies: Vec<Dependency>,
    pub files_indexed: usize,
    pub files_skipped: usize,
}

struct ParsedFile<'r> {
    path: String,
    frontend: &'r dyn LanguageFrontend,
    tree: SyntaxTree,
}

/// Drives discovery, extraction and resolution for one configuration.
pub struct Coordinator {
    config: AtlasConfig,
    registry: LanguageRegistry,
    excludes: GlobSet,
}

impl Coordinator {
    pub fn new(config: AtlasConfig) -> Result<Self, AtlasError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &config.index.exclude {
            let glob = Glob::new(pattern)
                .map_err(|e| AtlasError::Config(format!("bad exclude pattern {pattern:?}: {e}")))?;
            builder.add(glob);
        }
        let excludes = builder
            .build()
            .map_err(|e| AtlasError::Config(e.to_string()))?;
        let registry = LanguageRegistry::with_config(&config);

        Ok(Coordinator {
            config,
            registry,
            excludes,
        })
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    /// Supported, non-excluded files under `root`, sorted.
    pub fn discover(&self, root: &Path) -> Result<Vec<PathBuf>, AtlasError> {
        if !root.is_dir() {
            return Err(AtlasError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("not a directory: {}", root.display()),
            )));
        }

        let respect = self.config.index.respect_gitignore;
        let walker = WalkBuilder::new(root)
            .git_ignore(respect)
            .git_global(respect)
            .git_exclude(respect)
            .ignore(respect)
            .require_git(false)
            .follow_links(false)
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            let path = entry.path();
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            if !self.registry.supports(path) {
                continue;
            }
            if self.excludes.is_match(relative_path(root, path)) {
                debug!("Excluded {}", path.display());
                continue;
            }
            files.push(path.to_path_buf());
        }

        files.sort();
        Ok(files)
    }

    /// Index every supported file under `root`. Entity files are relative
    /// to `root` with `/` separators.
    pub fn run_full_index(&self, root: &Path) -> Result<IndexOutput, AtlasError> {
        let files = self.discover(root)?;
        info!("Discovered {} source files under {}", files.len(), root.display());

        let max_size = self.config.index.max_file_size;
        let loaded: Vec<Option<(String, String)>> = files
            .par_iter()
            .map(|path| {
                let rel = relative_path(root, path);
                match std::fs::metadata(path) {
                    Ok(meta) if meta.len() > max_size => {
                        debug!("Skipping {} ({} bytes over limit)", rel, meta.len());
                        return None;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Failed to stat {}: {}", rel, e);
                        return None;
                    }
                }
                let bytes = match std::fs::read(path) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!("Failed to read {}: {}", rel, e);
                        return None;
                    }
                };
                match String::from_utf8(bytes) {
                    Ok(content) => Some((rel, content)),
                    Err(_) => {
                        warn!("Skipping {}: not valid UTF-8", rel);
                        None
                    }
                }
            })
            .collect();

        let unread = loaded.iter().filter(|f| f.is_none()).count();
        let sources = loaded.into_iter().flatten().collect();
        let mut output = self.index_sources(sources)?;
        output.files_skipped += unread;
        Ok(output)
    }

    /// Index in-memory `(file, content)` pairs. Files without a front-end
    /// or that fail to parse are skipped.
    pub fn index_sources(&self, mut sources: Vec<(String, String)>) -> Result<IndexOutput, AtlasError> {
        sources.sort_by(|a, b| a.0.cmp(&b.0));
        let total = sources.len();

        // Phase 1: parse, then extract against the finished trees.
        let parsed: Vec<ParsedFile<'_>> = sources
            .into_par_iter()
            .filter_map(|(path, content)| self.parse_file(path, content))
            .collect();
        let files_indexed = parsed.len();

        let items: Vec<EntityWithNode<'_>> = parsed
            .par_iter()
            .map(|file| file.frontend.extract(&file.tree, &file.path))
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect();
        debug!("Extracted {} entities from {} files", items.len(), files_indexed);

        // Phase 2: the batch is complete.
        let batch = project(&items, &self.registry)?;
        let options = ResolverOptions {
            instantiates: self.config.resolver.instantiates,
        };
        let dependencies = DependencyResolver::new(batch, &self.registry, options).resolve_all()?;

        let mut seen = HashSet::new();
        let mut entities: Vec<Entity> = items
            .into_iter()
            .map(|item| item.entity)
            .filter(|entity| seen.insert(entity.id()))
            .collect();
        sort_entities(&mut entities);

        info!(
            "Indexed {} files: {} entities, {} dependencies",
            files_indexed,
            entities.len(),
            dependencies.len()
        );

        Ok(IndexOutput {
            entities,
            dependencies,
            files_indexed,
            files_skipped: total - files_indexed,
        })
    }

    fn parse_file(&self, path: String, content: String) -> Option<ParsedFile<'_>> {
        let Some(frontend) = self.registry.for_path(Path::new(&path)) else {
            debug!("No front-end for {}", path);
            return None;
        };
        match parse_source(&frontend.tree_sitter_language(), content) {
            Ok(tree) => Some(ParsedFile { path, frontend, tree }),
            Err(e) => {
                warn!("Failed to parse {}: {}", path, e);
                None
            }
        }
    }
}

fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}
