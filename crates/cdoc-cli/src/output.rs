//! Renderers for the run summary printed on stdout.

use anyhow::anyhow;
use cdoc_indexer::RunReport;

use crate::cli::{CliError, CliResult, OutputFormat};

pub(crate) fn render_report(report: &RunReport, format: OutputFormat) -> CliResult<()> {
    println!("{}", format_report(report, format)?);
    Ok(())
}

fn format_report(report: &RunReport, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(report)
            .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}"))),
        OutputFormat::Table => {
            let rows = [
                ("entries read", report.entries_read.to_string()),
                ("excluded", report.entries_excluded.to_string()),
                ("outside source tree", report.entries_skipped.to_string()),
                ("duplicates", report.duplicates.to_string()),
                ("stub collisions", report.stub_collisions.to_string()),
                ("stubs written", report.stubs_written.to_string()),
                ("index", report.index_path.display().to_string()),
            ];
            let lines: Vec<String> = rows
                .iter()
                .map(|(label, value)| format!("{label:<20} {value}"))
                .collect();
            Ok(lines.join("\n"))
        }
    }
}
