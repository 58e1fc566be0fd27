//! reStructuredText rendering for stubs and the master index.
//!
//! Rendering is pure string building so regenerated files are byte-identical.

use std::path::Path;

use crate::resolve::{ResolvedUnit, slash_path};

/// File name of the master index inside the output directory.
pub const INDEX_FILE_NAME: &str = "api.rst";

const INDEX_TITLE: &str = "C Code Reference";

/// Render the stub for one unit.
///
/// `public_header` is the project-relative path of a header sharing the source's
/// stem, when one exists; it adds a "Public Interface" section.
#[must_use]
pub fn render_stub(unit: &ResolvedUnit, public_header: Option<&Path>) -> String {
    let title = slash_path(&unit.source_relative);
    let clang = clang_option(&unit.compiler_options);
    let mut out = String::new();

    heading(&mut out, &title, '-');
    if let Some(header) = public_header {
        out.push('\n');
        heading(&mut out, "Public Interface", '=');
        out.push('\n');
        autodoc(&mut out, header, clang.as_deref());
    }
    out.push('\n');
    heading(&mut out, "Implementation", '=');
    out.push('\n');
    autodoc(&mut out, &unit.project_relative_source, clang.as_deref());
    out
}

/// Index references for `units`, sorted and free of repeats.
#[must_use]
pub fn index_references(units: &[ResolvedUnit]) -> Vec<String> {
    let mut references: Vec<String> = units.iter().map(ResolvedUnit::index_reference).collect();
    references.sort();
    references.dedup();
    references
}

/// Render the master index listing `references` in the given order.
#[must_use]
pub fn render_index(references: &[String]) -> String {
    let mut out = String::new();
    heading(&mut out, INDEX_TITLE, '-');
    out.push('\n');
    out.push_str(".. toctree::\n");
    out.push_str("   :maxdepth: 2\n");
    out.push_str("   :caption: Sources\n");
    if !references.is_empty() {
        out.push('\n');
        for reference in references {
            out.push_str("   ");
            out.push_str(reference);
            out.push('\n');
        }
    }
    out
}

fn heading(out: &mut String, title: &str, underline: char) {
    let width = title.chars().count();
    out.push_str(title);
    out.push('\n');
    out.extend(std::iter::repeat_n(underline, width));
    out.push('\n');
}

fn autodoc(out: &mut String, path: &Path, clang: Option<&str>) {
    out.push_str(&format!(".. c:autodoc:: {}\n", slash_path(path)));
    if let Some(options) = clang {
        out.push_str(&format!("   :clang: {options}\n"));
    }
}

fn clang_option(options: &[String]) -> Option<String> {
    if options.is_empty() {
        None
    } else {
        Some(options.join(","))
    }
}
