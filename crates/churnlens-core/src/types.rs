use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Inclusive line interval `[start, end]`.
///
/// Describes either the lines a diff hunk affected or the body of a class or
/// method.
///
/// # Examples
///
/// ```
/// use churnlens_core::LineRange;
///
/// let hunk = LineRange::new(7, 7);
/// let method = LineRange::new(5, 8);
/// assert!(hunk.overlaps(&method));
/// assert!(!LineRange::new(9, 12).overlaps(&method));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineRange {
    /// First line (1-indexed).
    pub start: u32,
    /// Last line, inclusive.
    pub end: u32,
}

impl LineRange {
    /// Create a range, swapping the bounds if they are given in reverse.
    pub fn new(start: u32, end: u32) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// A range covering exactly one line.
    pub fn single(line: u32) -> Self {
        Self {
            start: line,
            end: line,
        }
    }

    /// Whether the two ranges share at least one line.
    pub fn overlaps(&self, other: &LineRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Whether `line` falls inside this range.
    pub fn contains(&self, line: u32) -> bool {
        self.start <= line && line <= self.end
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Line ranges touched in one file across every hunk of the diff.
///
/// Ranges are kept in the order the hunks were read and are never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChangeRecord {
    /// Repository-relative path.
    pub path: String,
    /// Removed and added ranges, in diff order.
    pub ranges: Vec<LineRange>,
}

impl FileChangeRecord {
    /// An empty record for `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ranges: Vec::new(),
        }
    }
}

/// How many times each file was mentioned in the change log.
///
/// Iterates in the order paths were first seen, so sorting by count with a
/// stable sort keeps ties in log order.
///
/// # Examples
///
/// ```
/// use churnlens_core::ChangeCount;
///
/// let mut counts = ChangeCount::default();
/// counts.record("src/lib.rs");
/// counts.record("README.md");
/// counts.record("src/lib.rs");
/// assert_eq!(counts.get("src/lib.rs"), Some(2));
/// assert_eq!(counts.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeCount {
    entries: Vec<(String, u32)>,
    positions: HashMap<String, usize>,
}

impl ChangeCount {
    /// Count one more mention of `path`.
    pub fn record(&mut self, path: &str) {
        match self.positions.get(path) {
            Some(&idx) => self.entries[idx].1 += 1,
            None => {
                self.positions.insert(path.to_string(), self.entries.len());
                self.entries.push((path.to_string(), 1));
            }
        }
    }

    /// Count for `path`, if it was ever mentioned.
    pub fn get(&self, path: &str) -> Option<u32> {
        self.positions.get(path).map(|&idx| self.entries[idx].1)
    }

    /// Drop every path mentioned fewer than `minimum` times.
    pub fn retain_at_least(&mut self, minimum: u32) {
        self.entries.retain(|(_, count)| *count >= minimum);
        self.positions = self
            .entries
            .iter()
            .enumerate()
            .map(|(idx, (path, _))| (path.clone(), idx))
            .collect();
    }

    /// `(path, count)` pairs in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().map(|(path, count)| (path.as_str(), *count))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Named entities of one kind (classes, or methods) and where their bodies sit.
///
/// Names keep first-insertion order. A class that is reopened, or a method
/// defined twice, collects several ranges under one name.
///
/// # Examples
///
/// ```
/// use churnlens_core::{EntityRangeIndex, LineRange};
///
/// let mut index = EntityRangeIndex::default();
/// index.insert("Foo", LineRange::new(1, 10));
/// index.insert("Foo", LineRange::new(40, 52));
/// assert_eq!(index.len(), 1);
/// assert_eq!(index.ranges("Foo").unwrap().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityRangeIndex {
    entries: Vec<(String, Vec<LineRange>)>,
    positions: HashMap<String, usize>,
}

impl EntityRangeIndex {
    /// Add a body range for `name`.
    pub fn insert(&mut self, name: impl Into<String>, range: LineRange) {
        let name = name.into();
        match self.positions.get(&name) {
            Some(&idx) => self.entries[idx].1.push(range),
            None => {
                self.positions.insert(name.clone(), self.entries.len());
                self.entries.push((name, vec![range]));
            }
        }
    }

    /// All ranges recorded for `name`.
    pub fn ranges(&self, name: &str) -> Option<&[LineRange]> {
        self.positions
            .get(name)
            .map(|&idx| self.entries[idx].1.as_slice())
    }

    /// `(name, ranges)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[LineRange])> {
        self.entries
            .iter()
            .map(|(name, ranges)| (name.as_str(), ranges.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Into<String>> FromIterator<(N, LineRange)> for EntityRangeIndex {
    fn from_iter<I: IntoIterator<Item = (N, LineRange)>>(iter: I) -> Self {
        let mut index = Self::default();
        for (name, range) in iter {
            index.insert(name, range);
        }
        index
    }
}

/// Classes and methods declared in one file, produced by a single parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuralIndex {
    /// Keyed by class (or module, struct, trait...) name.
    pub classes: EntityRangeIndex,
    /// Keyed by `Class#method`, or `#function` outside any class.
    pub methods: EntityRangeIndex,
}

/// One file in the churn report.
///
/// # Examples
///
/// ```
/// use churnlens_core::ChurnEntry;
///
/// let entry = ChurnEntry {
///     file_path: "lib/foo.rb".into(),
///     times_changed: 12,
///     changed_classes: vec!["Foo".into()],
///     changed_methods: vec!["Foo#bar".into()],
/// };
/// assert_eq!(entry.times_changed, 12);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChurnEntry {
    /// Repository-relative path.
    pub file_path: String,
    /// Number of log entries mentioning the file.
    pub times_changed: u32,
    /// Classes whose bodies overlap the current diff, first-detection order.
    pub changed_classes: Vec<String>,
    /// Methods whose bodies overlap the current diff, first-detection order.
    pub changed_methods: Vec<String>,
}

/// The finished churn report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChurnReport {
    /// Files at or above the churn threshold, most-changed first.
    pub changes: Vec<ChurnEntry>,
    /// Raw per-file diff ranges the entity matching was based on.
    pub changed_files: Vec<FileChangeRecord>,
}

impl ChurnReport {
    /// Touched classes per entry, index-aligned with `changes`.
    pub fn changed_classes(&self) -> Vec<&[String]> {
        self.changes
            .iter()
            .map(|entry| entry.changed_classes.as_slice())
            .collect()
    }

    /// Touched methods per entry, index-aligned with `changes`.
    pub fn changed_methods(&self) -> Vec<&[String]> {
        self.changes
            .iter()
            .map(|entry| entry.changed_methods.as_slice())
            .collect()
    }
}

/// Output format for CLI subcommands.
///
/// Implements [`FromStr`] so it can be used directly with `clap` argument parsing.
///
/// # Examples
///
/// ```
/// use churnlens_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable table.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
