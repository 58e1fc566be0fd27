//! End-to-end runs of the generator against temporary project trees.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use cdoc_indexer::{ConfigInputs, GeneratorConfig, IndexerError, Stage, run};
use tempfile::TempDir;

struct Project {
    _temp: TempDir,
    root: PathBuf,
}

impl Project {
    fn new() -> Result<Self> {
        let temp = tempfile::Builder::new().prefix("cdoc-indexer-").tempdir()?;
        let root = temp.path().to_path_buf();
        Ok(Self { _temp: temp, root })
    }

    fn write(&self, relative: &str, contents: &str) -> Result<()> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents).with_context(|| format!("writing {}", path.display()))
    }

    /// Write a database with one `cc -c` record per file, all run from the root.
    fn database(&self, files: &[&str]) -> Result<()> {
        let records: Vec<serde_json::Value> = files
            .iter()
            .map(|file| {
                serde_json::json!({
                    "file": file,
                    "directory": self.root.display().to_string(),
                    "command": format!("cc -Iinclude -c {file}"),
                })
            })
            .collect();
        self.write("compile_commands.json", &serde_json::to_string(&records)?)
    }

    fn config(&self, exclusions: &[&str]) -> GeneratorConfig {
        let inputs = ConfigInputs {
            output: Some(PathBuf::from("out")),
            exclusions: exclusions.iter().map(ToString::to_string).collect(),
            ..ConfigInputs::new(&self.root)
        };
        GeneratorConfig::from_inputs(inputs, &self.root)
    }

    fn out(&self) -> PathBuf {
        self.root.join("out")
    }

    fn index(&self) -> Result<String> {
        Ok(fs::read_to_string(self.out().join("api.rst"))?)
    }

    fn stubs(&self) -> Result<Vec<String>> {
        let mut found = Vec::new();
        collect(&self.out().join("sources"), &self.out(), &mut found)?;
        found.sort();
        Ok(found)
    }

    fn snapshot(&self) -> Result<BTreeMap<String, String>> {
        let mut files = BTreeMap::new();
        for stub in self.stubs()? {
            let text = fs::read_to_string(self.out().join(&stub))?;
            files.insert(stub, text);
        }
        files.insert("api.rst".to_string(), self.index()?);
        Ok(files)
    }
}

fn collect(dir: &Path, base: &Path, found: &mut Vec<String>) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect(&path, base, found)?;
        } else {
            let relative = path.strip_prefix(base)?;
            found.push(relative.to_string_lossy().replace('\\', "/"));
        }
    }
    Ok(())
}

fn toctree_entries(index: &str) -> Vec<&str> {
    index
        .lines()
        .filter_map(|line| line.strip_prefix("   "))
        .filter(|entry| !entry.starts_with(':'))
        .collect()
}

#[test]
fn single_source_produces_stub_and_index() -> Result<()> {
    let project = Project::new()?;
    project.database(&["src/a.c"])?;

    let report = run(project.config(&[]))?;
    assert_eq!(report.stubs_written, 1);
    assert_eq!(project.stubs()?, vec!["sources/a.rst"]);
    assert_eq!(toctree_entries(&project.index()?), vec!["sources/a.rst"]);

    let stub = fs::read_to_string(project.out().join("sources/a.rst"))?;
    assert!(stub.starts_with("a.c\n---\n"));
    assert!(stub.contains(".. c:autodoc:: src/a.c"));
    let include = project.root.join("include");
    assert!(stub.contains(&format!(":clang: -I{}", include.display())));
    Ok(())
}

#[test]
fn excluded_source_leaves_an_empty_index() -> Result<()> {
    let project = Project::new()?;
    project.database(&["src/a.c"])?;

    let report = run(project.config(&[r"file=.*/a\.c"]))?;
    assert_eq!(report.entries_excluded, 1);
    assert_eq!(report.stubs_written, 0);
    assert!(project.stubs()?.is_empty());
    assert!(toctree_entries(&project.index()?).is_empty());
    Ok(())
}

#[test]
fn stub_count_is_entries_minus_sources_outside_the_tree() -> Result<()> {
    let project = Project::new()?;
    project.database(&["src/a.c", "tests/t.c", "src/x/b.c", "/elsewhere/c.c", "src/x/y/d.c"])?;

    let report = run(project.config(&[]))?;
    assert_eq!(report.entries_read, 5);
    assert_eq!(report.entries_skipped, 2);
    assert_eq!(report.stubs_written, 3);
    assert_eq!(
        project.stubs()?,
        vec!["sources/a.rst", "sources/x/b.rst", "sources/x/y/d.rst"]
    );
    Ok(())
}

#[test]
fn index_order_does_not_depend_on_database_order() -> Result<()> {
    let forward = Project::new()?;
    forward.database(&["src/b.c", "src/a.c", "src/z/c.c"])?;
    run(forward.config(&[]))?;

    let backward = Project::new()?;
    backward.database(&["src/z/c.c", "src/a.c", "src/b.c"])?;
    run(backward.config(&[]))?;

    let expected = vec!["sources/a.rst", "sources/b.rst", "sources/z/c.rst"];
    assert_eq!(toctree_entries(&forward.index()?), expected);
    assert_eq!(forward.index()?, backward.index()?);
    Ok(())
}

#[test]
fn regeneration_is_byte_identical() -> Result<()> {
    let project = Project::new()?;
    project.write("src/gui/window.h", "/* window */\n")?;
    project.database(&["src/gui/window.c", "src/main.c"])?;

    run(project.config(&[]))?;
    let first = project.snapshot()?;
    run(project.config(&[]))?;
    let second = project.snapshot()?;

    assert_eq!(first, second);
    let window = first
        .get("sources/gui/window.rst")
        .ok_or_else(|| anyhow!("window stub missing"))?;
    assert!(window.contains(".. c:autodoc:: src/gui/window.h"));
    Ok(())
}

#[test]
fn empty_database_writes_an_empty_index() -> Result<()> {
    let project = Project::new()?;
    project.write("compile_commands.json", "[]")?;

    let report = run(project.config(&[]))?;
    assert_eq!(report.entries_read, 0);
    assert_eq!(report.index_path, project.out().join("api.rst"));
    assert!(project.index()?.contains(".. toctree::"));
    assert!(toctree_entries(&project.index()?).is_empty());
    Ok(())
}

#[test]
fn malformed_database_writes_nothing() -> Result<()> {
    let project = Project::new()?;
    project.write(
        "compile_commands.json",
        r#"[{"file": "src/a.c", "command": "cc -c src/a.c"}]"#,
    )?;

    let err = run(project.config(&[]))
        .err()
        .ok_or_else(|| anyhow!("missing directory field should fail"))?;
    assert_eq!(err.stage, Stage::Loaded);
    assert!(matches!(err.source, IndexerError::MalformedDatabase { .. }));
    assert!(!project.out().exists());
    Ok(())
}

#[test]
fn stale_stubs_are_left_in_place() -> Result<()> {
    let project = Project::new()?;
    project.database(&["src/a.c", "src/b.c"])?;
    run(project.config(&[]))?;

    project.database(&["src/a.c"])?;
    run(project.config(&[]))?;

    assert_eq!(project.stubs()?, vec!["sources/a.rst", "sources/b.rst"]);
    assert_eq!(toctree_entries(&project.index()?), vec!["sources/a.rst"]);
    Ok(())
}

#[test]
fn blocked_sources_dir_fails_in_the_write_stage() -> Result<()> {
    let project = Project::new()?;
    project.database(&["src/a.c"])?;
    project.write("out/sources", "not a directory")?;

    let err = run(project.config(&[]))
        .err()
        .ok_or_else(|| anyhow!("a file in place of sources/ should fail"))?;
    assert_eq!(err.stage, Stage::Written);
    match err.source {
        IndexerError::WriteFailure { path, .. } => assert_eq!(path, project.out().join("sources")),
        other => return Err(anyhow!("unexpected error: {other}")),
    }
    assert!(!project.out().join("api.rst").exists());
    Ok(())
}

#[test]
fn sources_sharing_a_stem_keep_the_first_and_report_the_rest() -> Result<()> {
    let project = Project::new()?;
    project.database(&["src/a.c", "src/a.cpp", "src/a.c"])?;

    let report = run(project.config(&[]))?;
    assert_eq!(report.stubs_written, 1);
    assert_eq!(report.duplicates, 1);
    assert_eq!(report.stub_collisions, 1);

    let stub = fs::read_to_string(project.out().join("sources/a.rst"))?;
    assert!(stub.contains(".. c:autodoc:: src/a.c\n"));
    assert!(!stub.contains("a.cpp"));
    Ok(())
}
