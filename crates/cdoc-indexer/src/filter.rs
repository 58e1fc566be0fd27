//! Exclusion rules applied to compile entries before resolution.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use regex::Regex;
use tracing::debug;

use crate::database::CompileEntry;
use crate::error::{IndexerError, Result};

/// Compile entry field an exclusion rule inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryField {
    /// The `file` value as written in the database.
    File,
    /// The `directory` value.
    Directory,
    /// The invocation tokens joined by single spaces.
    Arguments,
    /// The `output` value, empty when absent.
    Output,
}

impl EntryField {
    /// Stringified value of this field on `entry`.
    #[must_use]
    pub fn value_of(self, entry: &CompileEntry) -> Cow<'_, str> {
        match self {
            Self::File => entry.file.to_string_lossy(),
            Self::Directory => entry.directory.to_string_lossy(),
            Self::Arguments => Cow::Owned(entry.arguments.join(" ")),
            Self::Output => entry
                .output
                .as_deref()
                .map_or(Cow::Borrowed(""), |output| output.to_string_lossy()),
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "directory",
            Self::Arguments => "arguments",
            Self::Output => "output",
        }
    }
}

impl fmt::Display for EntryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EntryField {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim() {
            "file" | "source" => Ok(Self::File),
            "directory" | "dir" => Ok(Self::Directory),
            "arguments" | "command" => Ok(Self::Arguments),
            "output" => Ok(Self::Output),
            other => Err(format!(
                "unknown field '{other}' (expected file, directory, arguments or output)"
            )),
        }
    }
}

/// A compiled `field=pattern` exclusion rule.
///
/// Patterns match from the start of the field value; add `$` to pin the end.
#[derive(Debug, Clone)]
pub struct ExclusionRule {
    field: EntryField,
    pattern: Regex,
    spec: String,
}

impl ExclusionRule {
    /// Parse and compile a rule written as `field=pattern`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidExclusionRule` when the text is not `field=pattern` or names an
    /// unknown field, and `InvalidExclusionPattern` when the pattern does not compile.
    pub fn parse(spec: &str) -> Result<Self> {
        let (field, pattern) =
            spec.split_once('=')
                .ok_or_else(|| IndexerError::InvalidExclusionRule {
                    rule: spec.to_string(),
                    detail: "expected field=pattern".to_string(),
                })?;
        let field = field
            .parse::<EntryField>()
            .map_err(|detail| IndexerError::InvalidExclusionRule {
                rule: spec.to_string(),
                detail,
            })?;
        let pattern = Regex::new(&format!("^(?:{pattern})")).map_err(|source| {
            IndexerError::InvalidExclusionPattern {
                rule: spec.to_string(),
                source,
            }
        })?;

        Ok(Self {
            field,
            pattern,
            spec: spec.to_string(),
        })
    }

    /// Field this rule inspects.
    #[must_use]
    pub const fn field(&self) -> EntryField {
        self.field
    }

    /// Whether this rule excludes `entry`.
    #[must_use]
    pub fn matches(&self, entry: &CompileEntry) -> bool {
        self.pattern.is_match(&self.field.value_of(entry))
    }
}

impl fmt::Display for ExclusionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spec)
    }
}

/// Compile every rule up front so a bad pattern fails before anything is filtered.
///
/// # Errors
///
/// Returns the error of the first rule that fails to parse.
pub fn compile_rules<S: AsRef<str>>(specs: &[S]) -> Result<Vec<ExclusionRule>> {
    specs
        .iter()
        .map(|spec| ExclusionRule::parse(spec.as_ref()))
        .collect()
}

/// Entries that survived filtering plus how many were dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutcome {
    /// Surviving entries in their original order.
    pub kept: Vec<CompileEntry>,
    /// Number of entries removed by at least one rule.
    pub excluded: usize,
}

/// Drop every entry matched by any rule, preserving the order of the rest.
#[must_use]
pub fn filter_entries(entries: Vec<CompileEntry>, rules: &[ExclusionRule]) -> FilterOutcome {
    let total = entries.len();
    let kept: Vec<CompileEntry> = entries
        .into_iter()
        .filter(|entry| match rules.iter().find(|rule| rule.matches(entry)) {
            Some(rule) => {
                debug!(file = %entry.file.display(), rule = %rule, "excluded entry");
                false
            }
            None => true,
        })
        .collect();

    FilterOutcome {
        excluded: total - kept.len(),
        kept,
    }
}
