//! Generator configuration and the defaulting rules for its paths.

use std::path::{Path, PathBuf};

use cdoc_telemetry::Verbosity;

use crate::resolve::normalize;

/// Default source-location root, relative to the project root.
pub const DEFAULT_SOURCE_LOCATION: &str = "src";
/// Default compile database location, relative to the project root.
pub const DEFAULT_COMPILE_DATABASE: &str = "compile_commands.json";
/// Default output directory, relative to the project root.
pub const DEFAULT_OUTPUT_DIR: &str = "sphinx/source/_c_api";

/// Raw, unresolved settings as they arrive from the command line or environment.
#[derive(Debug, Clone)]
pub struct ConfigInputs {
    /// Project root; relative values resolve against the working directory.
    pub project_root: PathBuf,
    /// Output directory; relative values resolve against the working directory.
    /// `None` selects [`DEFAULT_OUTPUT_DIR`] under the project root.
    pub output: Option<PathBuf>,
    /// Source-location root; relative values resolve against the project root.
    pub source_location: PathBuf,
    /// Compile database; relative values resolve against the project root.
    pub compile_database: PathBuf,
    /// Exclusion rules as `field=pattern` strings.
    pub exclusions: Vec<String>,
    /// Logging verbosity.
    pub verbosity: Verbosity,
}

impl ConfigInputs {
    /// Inputs for `project_root` with every other setting defaulted.
    #[must_use]
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            output: None,
            source_location: PathBuf::from(DEFAULT_SOURCE_LOCATION),
            compile_database: PathBuf::from(DEFAULT_COMPILE_DATABASE),
            exclusions: Vec::new(),
            verbosity: Verbosity::Normal,
        }
    }
}

/// Fully resolved configuration passed through every pipeline stage.
///
/// All paths are absolute and lexically normalised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Directory receiving `api.rst` and the `sources/` tree.
    pub output_dir: PathBuf,
    /// Root that stub directives are made relative to.
    pub project_root: PathBuf,
    /// Root that output paths mirror; sources outside it are skipped.
    pub source_root: PathBuf,
    /// Location of `compile_commands.json`.
    pub compile_database: PathBuf,
    /// Exclusion rules as `field=pattern` strings, compiled by the filter stage.
    pub exclusions: Vec<String>,
    /// Logging verbosity.
    pub verbosity: Verbosity,
}

impl GeneratorConfig {
    /// Resolve raw inputs against `cwd`, the directory the tool was started from.
    #[must_use]
    pub fn from_inputs(inputs: ConfigInputs, cwd: &Path) -> Self {
        let project_root = normalize(&cwd.join(&inputs.project_root));
        let source_root = normalize(&project_root.join(&inputs.source_location));
        let compile_database = normalize(&project_root.join(&inputs.compile_database));
        let output_dir = inputs.output.map_or_else(
            || project_root.join(DEFAULT_OUTPUT_DIR),
            |output| normalize(&cwd.join(output)),
        );

        Self {
            output_dir,
            project_root,
            source_root,
            compile_database,
            exclusions: inputs.exclusions,
            verbosity: inputs.verbosity,
        }
    }
}
