//! Staged orchestration of a generator run.
//!
//! # Design
//! - Stages advance strictly in order: `Init -> Loaded -> Filtered -> Resolved ->
//!   Written -> Indexed -> Done`; any failure moves to `Failed`.
//! - Loading and filtering finish before the output directory is touched, so a bad
//!   database or rule leaves no trace on disk.
//! - Entries outside the source tree are warned about and counted, never fatal.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, info_span, warn};

use crate::config::GeneratorConfig;
use crate::database::load_database;
use crate::error::IndexerError;
use crate::filter::{compile_rules, filter_entries};
use crate::resolve::{PathLayout, resolve_entries};
use crate::writer::TreeWriter;

/// Progress of an orchestrated run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Nothing has run yet.
    Init,
    /// The compile database has been read.
    Loaded,
    /// Exclusion rules have been applied.
    Filtered,
    /// Entries have been mapped onto the output tree.
    Resolved,
    /// Stubs are on disk.
    Written,
    /// The master index is on disk.
    Indexed,
    /// The run completed.
    Done,
    /// A stage failed; see [`PipelineError`].
    Failed,
}

impl Stage {
    const fn label(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Loaded => "load",
            Self::Filtered => "filter",
            Self::Resolved => "resolve",
            Self::Written => "write",
            Self::Indexed => "index",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A run that stopped at `stage`.
#[derive(Debug, Error)]
#[error("{stage} stage failed")]
pub struct PipelineError {
    /// Stage that was being entered when the error occurred.
    pub stage: Stage,
    /// What went wrong.
    #[source]
    pub source: IndexerError,
}

/// Counts reported after a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Records in the compile database.
    pub entries_read: usize,
    /// Records dropped by exclusion rules.
    pub entries_excluded: usize,
    /// Records whose source lies outside the source-location root.
    pub entries_skipped: usize,
    /// Records that repeated an already accepted source.
    pub duplicates: usize,
    /// Records whose distinct source mapped onto an already claimed stub.
    pub stub_collisions: usize,
    /// Stub files written.
    pub stubs_written: usize,
    /// Location of the master index.
    pub index_path: PathBuf,
}

/// Drives a single generator run through its stages.
#[derive(Debug)]
pub struct Orchestrator {
    config: GeneratorConfig,
    stage: Stage,
}

impl Orchestrator {
    /// Orchestrator in the `Init` stage.
    #[must_use]
    pub const fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            stage: Stage::Init,
        }
    }

    /// Current stage.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// Run every stage in order.
    ///
    /// # Errors
    ///
    /// Returns a [`PipelineError`] naming the failing stage; the orchestrator is then
    /// left in [`Stage::Failed`].
    pub fn run(&mut self) -> Result<RunReport, PipelineError> {
        let span = info_span!("generate", project = %self.config.project_root.display());
        let _entered = span.enter();

        let entries = load_database(&self.config.compile_database)
            .map_err(|err| self.fail(Stage::Loaded, err))?;
        let entries_read = entries.len();
        self.advance(Stage::Loaded);

        let rules = compile_rules(self.config.exclusions.as_slice())
            .map_err(|err| self.fail(Stage::Filtered, err))?;
        let filtered = filter_entries(entries, &rules);
        self.advance(Stage::Filtered);

        let layout = PathLayout::from(&self.config);
        let resolution = resolve_entries(&layout, &filtered.kept);
        for skipped in &resolution.skipped {
            warn!("{skipped}; skipping");
        }
        for collision in &resolution.collisions {
            warn!("{collision}; skipping");
        }
        self.advance(Stage::Resolved);

        let output_dir = self.config.output_dir.clone();
        let writer = TreeWriter::new(&output_dir);
        let stubs_written = writer
            .write_stubs(&resolution.units)
            .map_err(|err| self.fail(Stage::Written, err))?;
        self.advance(Stage::Written);

        let index_path = writer
            .write_index(&resolution.units)
            .map_err(|err| self.fail(Stage::Indexed, err))?;
        self.advance(Stage::Indexed);

        let report = RunReport {
            entries_read,
            entries_excluded: filtered.excluded,
            entries_skipped: resolution.skipped.len(),
            duplicates: resolution.duplicates,
            stub_collisions: resolution.collisions.len(),
            stubs_written,
            index_path,
        };
        info!(
            read = report.entries_read,
            excluded = report.entries_excluded,
            skipped = report.entries_skipped,
            collisions = report.stub_collisions,
            written = report.stubs_written,
            "generated reference stubs"
        );
        self.advance(Stage::Done);
        Ok(report)
    }

    fn advance(&mut self, next: Stage) {
        self.stage = next;
    }

    fn fail(&mut self, stage: Stage, source: IndexerError) -> PipelineError {
        self.stage = Stage::Failed;
        PipelineError { stage, source }
    }
}

/// Run the whole pipeline for `config`.
///
/// # Errors
///
/// See [`Orchestrator::run`].
pub fn run(config: GeneratorConfig) -> Result<RunReport, PipelineError> {
    Orchestrator::new(config).run()
}
