//! Writing stubs and the master index to disk.
//!
//! Every file is rendered in memory, written to a temporary sibling, and renamed
//! over its final path so readers never observe a half-written file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{IndexerError, Result};
use crate::render::{INDEX_FILE_NAME, index_references, render_index, render_stub};
use crate::resolve::ResolvedUnit;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Writes one stub per resolved unit below the output directory.
#[derive(Debug, Clone, Copy)]
pub struct TreeWriter<'a> {
    output_dir: &'a Path,
}

impl<'a> TreeWriter<'a> {
    /// Writer rooted at `output_dir`.
    #[must_use]
    pub const fn new(output_dir: &'a Path) -> Self {
        Self { output_dir }
    }

    /// Write a stub for every unit, overwriting existing files.
    ///
    /// # Errors
    ///
    /// Returns `WriteFailure` on the first directory or file that cannot be written;
    /// stubs written before the failure stay on disk.
    pub fn write_stubs(&self, units: &[ResolvedUnit]) -> Result<usize> {
        for unit in units {
            debug_assert!(unit.stub_path.starts_with(self.output_dir));
            let header = public_header(unit);
            let contents = render_stub(unit, header.as_deref());
            write_atomic(&unit.stub_path, &contents)?;
            debug!(stub = %unit.stub_path.display(), "wrote stub");
            info!(source = %unit.project_relative_source.display(), "processed source");
        }
        Ok(units.len())
    }

    /// Write the master index referencing every unit, sorted by stub path.
    ///
    /// # Errors
    ///
    /// Returns `WriteFailure` when the index cannot be written.
    pub fn write_index(&self, units: &[ResolvedUnit]) -> Result<PathBuf> {
        let index_path = self.output_dir.join(INDEX_FILE_NAME);
        let references = index_references(units);
        write_atomic(&index_path, &render_index(&references))?;
        debug!(index = %index_path.display(), entries = references.len(), "wrote index");
        Ok(index_path)
    }
}

/// Project-relative path of the header next to the unit's source, when it exists.
fn public_header(unit: &ResolvedUnit) -> Option<PathBuf> {
    let header = unit.absolute_source.with_extension("h");
    if header == unit.absolute_source || !header.is_file() {
        return None;
    }
    debug!(header = %header.display(), "found co-located header");
    Some(unit.project_relative_source.with_extension("h"))
}

/// Replace `path` with `contents`, creating parent directories as needed.
///
/// # Errors
///
/// Returns `WriteFailure` naming the directory or file that could not be written.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|source| IndexerError::write(parent, source))?;

    let mut staged =
        NamedTempFile::new_in(parent).map_err(|source| IndexerError::write(path, source))?;
    staged
        .write_all(contents.as_bytes())
        .and_then(|()| staged.flush())
        .map_err(|source| IndexerError::write(path, source))?;
    #[cfg(unix)]
    staged
        .as_file()
        .set_permissions(fs::Permissions::from_mode(0o644))
        .map_err(|source| IndexerError::write(path, source))?;
    staged
        .persist(path)
        .map_err(|err| IndexerError::write(path, err.error))?;
    Ok(())
}
