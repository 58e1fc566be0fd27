#![forbid(unsafe_code)]
#![deny(
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! C reference scaffolding core: turns a `compile_commands.json` database into a
//! tree of reStructuredText stubs plus a master `api.rst` index.
//!
//! # Design
//! - `database` -> `filter` -> `resolve` are pure and testable without a filesystem.
//! - All side effects live in `writer`; every file is replaced atomically.
//! - `pipeline` sequences the stages and reports counts or the failing stage.

pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod render;
pub mod resolve;
pub mod writer;

pub use config::{ConfigInputs, GeneratorConfig};
pub use database::{CompileEntry, load_database, parse_database};
pub use error::{IndexerError, Result};
pub use filter::{EntryField, ExclusionRule, FilterOutcome, compile_rules, filter_entries};
pub use pipeline::{Orchestrator, PipelineError, RunReport, Stage, run};
pub use resolve::{
    PathLayout, Resolution, ResolvedUnit, StubCollision, resolve_entries, resolve_entry,
};
pub use writer::TreeWriter;

pub use cdoc_telemetry::Verbosity;
