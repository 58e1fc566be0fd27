use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::Context;
use cdoc_indexer::config::{DEFAULT_COMPILE_DATABASE, DEFAULT_SOURCE_LOCATION};
use cdoc_indexer::{ConfigInputs, GeneratorConfig, PipelineError, Verbosity};
use cdoc_telemetry::{LogFormat, LoggingConfig, init_logging};
use clap::{Parser, ValueEnum};
use tracing::debug;

use crate::output::render_report;

/// Parses CLI arguments, runs the generator, and prints the outcome.
/// Returns the process exit code.
#[must_use]
pub fn run() -> i32 {
    run_with(env::args_os())
}

pub(crate) fn run_with<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return err.exit_code();
        }
    };

    match execute(cli) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

fn execute(cli: Cli) -> CliResult<()> {
    let verbosity = Verbosity::from_flags(cli.verbose, cli.quiet);
    let log_format = cli.log_format.unwrap_or_else(LogFormat::infer);
    if let Err(err) = init_logging(&LoggingConfig::for_verbosity(verbosity, log_format)) {
        debug!(error = %err, "keeping the existing tracing subscriber");
    }

    let cwd = env::current_dir()
        .context("failed to resolve the working directory")
        .map_err(CliError::failure)?;
    let format = cli.format;
    let config = GeneratorConfig::from_inputs(cli.into_inputs(verbosity), &cwd);
    if !config.project_root.is_dir() {
        return Err(CliError::validation(format!(
            "project root {} is not a directory",
            config.project_root.display()
        )));
    }

    let report = cdoc_indexer::run(config)?;
    render_report(&report, format)
}

#[derive(Debug, Parser)]
#[command(
    name = "cdoc",
    version,
    about = "Generate reStructuredText stubs for C sources listed in a compile database"
)]
struct Cli {
    #[arg(
        short = 'r',
        long,
        env = "CDOC_PROJECT_ROOT",
        help = "Root of the C project; stub directives are relative to it"
    )]
    project_root: PathBuf,
    #[arg(
        short,
        long,
        env = "CDOC_OUTPUT",
        help = "Output directory [default: <project-root>/sphinx/source/_c_api]"
    )]
    output: Option<PathBuf>,
    #[arg(
        short,
        long,
        env = "CDOC_SOURCE_LOCATION",
        default_value = DEFAULT_SOURCE_LOCATION,
        help = "Source tree mirrored under <output>/sources, relative to the project root"
    )]
    source_location: PathBuf,
    #[arg(
        long,
        env = "CDOC_COMPILE_COMMANDS",
        default_value = DEFAULT_COMPILE_DATABASE,
        help = "Compile database, relative to the project root"
    )]
    compile_commands: PathBuf,
    #[arg(
        short = 'x',
        long = "exclude",
        value_name = "FIELD=PATTERN",
        env = "CDOC_EXCLUDE",
        help = "Drop entries whose field (file, directory, arguments, output) matches the pattern"
    )]
    exclusions: Vec<String>,
    #[arg(short, long, env = "CDOC_VERBOSE", help = "Log every resolved unit and file")]
    verbose: bool,
    #[arg(
        short,
        long,
        env = "CDOC_QUIET",
        help = "Only log warnings and errors; overrides --verbose"
    )]
    quiet: bool,
    #[arg(
        long,
        value_name = "pretty|json",
        env = "CDOC_LOG_FORMAT",
        help = "Log line format [default: pretty in debug builds, json otherwise]"
    )]
    log_format: Option<LogFormat>,
    #[arg(
        long,
        value_enum,
        env = "CDOC_FORMAT",
        default_value_t = OutputFormat::Table,
        help = "Select the format of the run summary"
    )]
    format: OutputFormat,
}

impl Cli {
    fn into_inputs(self, verbosity: Verbosity) -> ConfigInputs {
        ConfigInputs {
            output: self.output,
            source_location: self.source_location,
            compile_database: self.compile_commands,
            exclusions: self.exclusions,
            verbosity,
            ..ConfigInputs::new(self.project_root)
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl From<PipelineError> for CliError {
    fn from(err: PipelineError) -> Self {
        let configuration = err.source.is_configuration();
        let error = anyhow::Error::new(err);
        if configuration {
            Self::validation(format!("{error:#}"))
        } else {
            Self::failure(error)
        }
    }
}
