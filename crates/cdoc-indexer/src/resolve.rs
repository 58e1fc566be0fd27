//! Mapping compile entries onto the output tree.
//!
//! # Design
//! - Purely lexical: nothing here touches the filesystem, so identical inputs
//!   always produce identical units.
//! - Entries outside the source-location root are reported, not fatal.
//! - The same source compiled by several targets collapses to one unit.
//! - A different source claiming an already taken stub path is set aside as a
//!   collision so the caller can warn about it.

use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::config::GeneratorConfig;
use crate::database::CompileEntry;
use crate::error::{IndexerError, Result};

/// Subdirectory of the output directory that holds generated stubs.
pub const SOURCES_DIR: &str = "sources";
/// Extension given to generated documentation sources.
pub const STUB_EXTENSION: &str = "rst";

/// The three roots a compile entry is resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathLayout {
    /// Root that directive paths are made relative to.
    pub project_root: PathBuf,
    /// Root that output paths mirror.
    pub source_root: PathBuf,
    /// Directory holding the index and the `sources/` tree.
    pub output_dir: PathBuf,
}

impl From<&GeneratorConfig> for PathLayout {
    fn from(config: &GeneratorConfig) -> Self {
        Self {
            project_root: config.project_root.clone(),
            source_root: config.source_root.clone(),
            output_dir: config.output_dir.clone(),
        }
    }
}

/// A compile entry placed in the output tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUnit {
    /// Absolute, normalised source path.
    pub absolute_source: PathBuf,
    /// Source path relative to the project root (absolute when outside it).
    pub project_relative_source: PathBuf,
    /// Source path relative to the source-location root.
    pub source_relative: PathBuf,
    /// Stub path relative to the output directory, e.g. `sources/gui/window.rst`.
    pub stub_relative: PathBuf,
    /// Absolute stub path inside the output directory.
    pub stub_path: PathBuf,
    /// `-I` and `-D` options of the invocation, include paths made absolute.
    pub compiler_options: Vec<String>,
}

impl ResolvedUnit {
    /// Stub reference as written in the index, always `/`-separated.
    #[must_use]
    pub fn index_reference(&self) -> String {
        slash_path(&self.stub_relative)
    }
}

/// Units accepted by resolution together with what was set aside.
#[derive(Debug, Default)]
pub struct Resolution {
    /// Accepted units in database order.
    pub units: Vec<ResolvedUnit>,
    /// One `SourceOutsideTree` error per skipped entry.
    pub skipped: Vec<IndexerError>,
    /// Entries repeating a source that was already accepted.
    pub duplicates: usize,
    /// Entries whose distinct source maps onto a stub path already claimed.
    pub collisions: Vec<StubCollision>,
}

/// Two different sources that would share one stub, e.g. `a.c` and `a.cpp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubCollision {
    /// Stub path relative to the output directory.
    pub stub_relative: PathBuf,
    /// Project-relative source that owns the stub.
    pub kept: PathBuf,
    /// Project-relative source that was dropped.
    pub dropped: PathBuf,
}

impl fmt::Display for StubCollision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} maps to {} already claimed by {}",
            self.dropped.display(),
            slash_path(&self.stub_relative),
            self.kept.display()
        )
    }
}

/// Resolve a single entry.
///
/// # Errors
///
/// Returns `SourceOutsideTree` when the source is not below `layout.source_root`.
pub fn resolve_entry(layout: &PathLayout, entry: &CompileEntry) -> Result<ResolvedUnit> {
    let directory = normalize(&layout.project_root.join(&entry.directory));
    let absolute_source = normalize(&directory.join(&entry.file));

    let source_relative = match absolute_source.strip_prefix(&layout.source_root) {
        Ok(relative) if !relative.as_os_str().is_empty() => relative.to_path_buf(),
        _ => {
            return Err(IndexerError::SourceOutsideTree {
                source_file: absolute_source,
                root: layout.source_root.clone(),
            });
        }
    };
    let project_relative_source = absolute_source
        .strip_prefix(&layout.project_root)
        .map_or_else(|_| absolute_source.clone(), Path::to_path_buf);
    let stub_relative = Path::new(SOURCES_DIR).join(source_relative.with_extension(STUB_EXTENSION));
    let stub_path = layout.output_dir.join(&stub_relative);

    Ok(ResolvedUnit {
        compiler_options: compiler_options(&entry.arguments, &directory),
        absolute_source,
        project_relative_source,
        source_relative,
        stub_relative,
        stub_path,
    })
}

/// Resolve every entry, setting aside those outside the source tree.
///
/// A source seen twice collapses onto its first occurrence. A distinct source
/// whose stub path is already claimed is recorded as a [`StubCollision`].
#[must_use]
pub fn resolve_entries(layout: &PathLayout, entries: &[CompileEntry]) -> Resolution {
    let mut resolution = Resolution::default();
    let mut claimed: HashMap<PathBuf, (PathBuf, PathBuf)> = HashMap::new();

    for entry in entries {
        let unit = match resolve_entry(layout, entry) {
            Ok(unit) => unit,
            Err(err) => {
                resolution.skipped.push(err);
                continue;
            }
        };

        match claimed.get(&unit.stub_path) {
            None => {
                debug!(
                    source = %unit.project_relative_source.display(),
                    stub = %unit.stub_relative.display(),
                    "resolved entry"
                );
                claimed.insert(
                    unit.stub_path.clone(),
                    (
                        unit.absolute_source.clone(),
                        unit.project_relative_source.clone(),
                    ),
                );
                resolution.units.push(unit);
            }
            Some((owner, _)) if *owner == unit.absolute_source => {
                debug!(source = %unit.project_relative_source.display(), "duplicate entry");
                resolution.duplicates += 1;
            }
            Some((_, kept)) => resolution.collisions.push(StubCollision {
                stub_relative: unit.stub_relative,
                kept: kept.clone(),
                dropped: unit.project_relative_source,
            }),
        }
    }

    resolution
}

/// Lexically normalise a path: drop `.` components and fold `..` into its parent.
///
/// `..` directly below the root stays at the root; leading `..` of a relative
/// path are kept.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    parts.iter().collect()
}

fn compiler_options(arguments: &[String], directory: &Path) -> Vec<String> {
    let mut options = Vec::new();
    let mut tokens = arguments.iter();
    while let Some(token) = tokens.next() {
        let (flag, value) = if token == "-I" || token == "-D" {
            match tokens.next() {
                Some(value) => (&token[..2], value.as_str()),
                None => break,
            }
        } else if token.starts_with("-I") || token.starts_with("-D") {
            (&token[..2], &token[2..])
        } else {
            continue;
        };

        if flag == "-I" {
            let include = normalize(&directory.join(value));
            options.push(format!("-I{}", include.display()));
        } else {
            options.push(format!("-D{value}"));
        }
    }
    options
}

pub(crate) fn slash_path(path: &Path) -> String {
    if path.is_absolute() {
        return path.to_string_lossy().into_owned();
    }
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
