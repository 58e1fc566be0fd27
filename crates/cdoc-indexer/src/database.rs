//! Reading `compile_commands.json`.
//!
//! # Design
//! - The document is parsed as untyped JSON first so failures can name the record index.
//! - Each record is then checked against a strict schema; missing fields are reported
//!   as `MalformedDatabase` instead of surfacing on first access.
//! - `command` strings and `arguments` lists are normalised into one token list.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{IndexerError, Result};

/// One translation unit as described by the compile database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileEntry {
    /// Source file exactly as written in the record.
    pub file: PathBuf,
    /// Directory the compiler ran in.
    pub directory: PathBuf,
    /// Compiler invocation, one token per element.
    pub arguments: Vec<String>,
    /// Object file produced by the invocation, when recorded.
    pub output: Option<PathBuf>,
}

#[derive(Deserialize)]
struct RawRecord {
    file: Option<String>,
    directory: Option<String>,
    command: Option<String>,
    arguments: Option<Vec<String>>,
    output: Option<String>,
}

/// Load and parse the compile database at `path`.
///
/// # Errors
///
/// Returns `DatabaseNotFound` when `path` does not exist, `DatabaseRead` when it
/// cannot be read, and `MalformedDatabase` when its contents break the schema.
pub fn load_database(path: &Path) -> Result<Vec<CompileEntry>> {
    if !path.exists() {
        return Err(IndexerError::DatabaseNotFound {
            path: path.to_path_buf(),
        });
    }

    let raw = fs::read_to_string(path).map_err(|source| IndexerError::DatabaseRead {
        path: path.to_path_buf(),
        source,
    })?;
    let entries = parse_database(&raw, path)?;
    debug!(path = %path.display(), entries = entries.len(), "loaded compile database");
    Ok(entries)
}

/// Parse compile database text; `path` is only used for error reporting.
///
/// # Errors
///
/// Returns `MalformedDatabase` when the text is not a JSON array of valid records.
pub fn parse_database(raw: &str, path: &Path) -> Result<Vec<CompileEntry>> {
    let document: Value = serde_json::from_str(raw)
        .map_err(|err| IndexerError::malformed(path, format!("invalid JSON: {err}")))?;
    let Value::Array(records) = document else {
        return Err(IndexerError::malformed(
            path,
            "expected a JSON array of records",
        ));
    };

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| parse_record(index, record, path))
        .collect()
}

fn parse_record(index: usize, record: Value, path: &Path) -> Result<CompileEntry> {
    if !record.is_object() {
        return Err(IndexerError::malformed(
            path,
            format!("record {index}: expected an object"),
        ));
    }
    let raw: RawRecord = serde_json::from_value(record)
        .map_err(|err| IndexerError::malformed(path, format!("record {index}: {err}")))?;

    let missing = |field: &str| {
        IndexerError::malformed(path, format!("record {index}: missing field '{field}'"))
    };
    let file = raw.file.ok_or_else(|| missing("file"))?;
    let directory = raw.directory.ok_or_else(|| missing("directory"))?;
    let arguments = match (raw.arguments, raw.command) {
        (Some(arguments), _) => arguments,
        (None, Some(command)) => split_command(&command).map_err(|detail| {
            IndexerError::malformed(path, format!("record {index}: command {detail}"))
        })?,
        (None, None) => return Err(missing("command' or 'arguments")),
    };

    Ok(CompileEntry {
        file: PathBuf::from(file),
        directory: PathBuf::from(directory),
        arguments,
        output: raw.output.map(PathBuf::from),
    })
}

/// Split a shell command line into words following POSIX quoting rules.
///
/// # Errors
///
/// Returns a short description when a quote is left open or the line ends in a
/// dangling backslash.
pub fn split_command(command: &str) -> std::result::Result<Vec<String>, &'static str> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = command.chars();

    while let Some(ch) = chars.next() {
        match ch {
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            '\\' => match chars.next() {
                Some('\n') => {}
                Some(escaped) => {
                    current.push(escaped);
                    in_word = true;
                }
                None => return Err("ends with a dangling backslash"),
            },
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => current.push(c),
                        None => return Err("has an unterminated single quote"),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c @ ('"' | '\\' | '$' | '`')) => current.push(c),
                            Some('\n') => {}
                            Some(c) => {
                                current.push('\\');
                                current.push(c);
                            }
                            None => return Err("has an unterminated double quote"),
                        },
                        Some(c) => current.push(c),
                        None => return Err("has an unterminated double quote"),
                    }
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if in_word {
        words.push(current);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use tempfile::TempDir;

    fn db() -> &'static Path {
        Path::new("compile_commands.json")
    }

    #[test]
    fn parse_database_accepts_command_and_arguments_forms() -> std::result::Result<(), Box<dyn Error>>
    {
        let raw = r#"[
            {"file": "src/a.c", "directory": "/proj", "command": "cc -Iinclude -DNAME=\"x y\" -c src/a.c", "output": "a.o"},
            {"file": "src/b.c", "directory": "/proj", "arguments": ["cc", "-c", "src/b.c"]}
        ]"#;
        let entries = parse_database(raw, db())?;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].file, PathBuf::from("src/a.c"));
        assert_eq!(
            entries[0].arguments,
            vec!["cc", "-Iinclude", "-DNAME=x y", "-c", "src/a.c"]
        );
        assert_eq!(entries[0].output, Some(PathBuf::from("a.o")));
        assert_eq!(entries[1].arguments, vec!["cc", "-c", "src/b.c"]);
        assert_eq!(entries[1].output, None);
        Ok(())
    }

    #[test]
    fn arguments_take_precedence_over_command() -> std::result::Result<(), Box<dyn Error>> {
        let raw = r#"[{"file": "a.c", "directory": "/p", "command": "gcc a.c", "arguments": ["clang", "a.c"]}]"#;
        let entries = parse_database(raw, db())?;
        assert_eq!(entries[0].arguments, vec!["clang", "a.c"]);
        Ok(())
    }

    #[test]
    fn parse_database_reports_missing_fields_with_record_index() {
        let raw = r#"[
            {"file": "a.c", "directory": "/p", "command": "cc a.c"},
            {"directory": "/p", "command": "cc b.c"}
        ]"#;
        let err = parse_database(raw, db()).err();
        match err {
            Some(IndexerError::MalformedDatabase { detail, .. }) => {
                assert_eq!(detail, "record 1: missing field 'file'");
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let raw = r#"[{"file": "a.c", "directory": "/p"}]"#;
        match parse_database(raw, db()).err() {
            Some(IndexerError::MalformedDatabase { detail, .. }) => {
                assert!(detail.contains("'command' or 'arguments'"), "{detail}");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn parse_database_rejects_non_array_and_wrong_types() {
        for raw in [
            "{}",
            "not json",
            "[1]",
            r#"[{"file": 3, "directory": "/p", "command": "cc"}]"#,
            r#"[{"file": "a.c", "directory": "/p", "command": "cc 'open"}]"#,
        ] {
            assert!(
                matches!(
                    parse_database(raw, db()),
                    Err(IndexerError::MalformedDatabase { .. })
                ),
                "expected malformed error for {raw}"
            );
        }
    }

    #[test]
    fn empty_database_is_valid() -> std::result::Result<(), Box<dyn Error>> {
        assert!(parse_database("[]", db())?.is_empty());
        Ok(())
    }

    #[test]
    fn load_database_distinguishes_missing_files() -> std::result::Result<(), Box<dyn Error>> {
        let temp = TempDir::new()?;
        let missing = temp.path().join("compile_commands.json");
        assert!(matches!(
            load_database(&missing),
            Err(IndexerError::DatabaseNotFound { .. })
        ));

        fs::write(
            &missing,
            r#"[{"file": "a.c", "directory": "/p", "command": "cc a.c"}]"#,
        )?;
        assert_eq!(load_database(&missing)?.len(), 1);
        Ok(())
    }

    #[test]
    fn split_command_follows_shell_quoting() {
        assert_eq!(
            split_command(r#"cc  -c 'a b.c' "x\"y" z\ w"#),
            Ok(vec![
                "cc".to_string(),
                "-c".to_string(),
                "a b.c".to_string(),
                "x\"y".to_string(),
                "z w".to_string(),
            ])
        );
        assert_eq!(split_command("  "), Ok(Vec::new()));
        assert_eq!(split_command("''"), Ok(vec![String::new()]));
        assert!(split_command("cc \"open").is_err());
        assert!(split_command("cc \\").is_err());
    }

    #[test]
    fn split_command_drops_line_continuations() {
        assert_eq!(
            split_command("cc \\\n-c a.c"),
            Ok(vec!["cc".to_string(), "-c".to_string(), "a.c".to_string()])
        );
        assert_eq!(
            split_command("cc -DNA\\\nME"),
            Ok(vec!["cc".to_string(), "-DNAME".to_string()])
        );
    }
}
