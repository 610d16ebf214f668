use std::collections::HashMap;

use churnlens_core::{
    ChurnEntry, ChurnError, ChurnReport, LineRange, StructuralParser, VcsBackend,
};
use churnlens_difflens::parser::parse_diff_headers;
use churnlens_history::counter::count_changes;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::matcher::touched_entities;

/// Knobs for one report run.
///
/// # Examples
///
/// ```
/// use churnlens_report::ReportOptions;
///
/// let options = ReportOptions::default();
/// assert_eq!(options.minimum_churn_count, 5);
/// assert_eq!(options.jobs, 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    /// Files changed fewer times than this are left out.
    pub minimum_churn_count: u32,
    /// Worker threads for entity matching; 0 uses the rayon default.
    pub jobs: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            minimum_churn_count: 5,
            jobs: 0,
        }
    }
}

/// Build a churn report from raw log and diff-header lines.
///
/// Files are ranked by change count, most changed first, ties kept in log
/// order. Only files with diff ranges are handed to `parser`; a parser
/// failure leaves that file's entity lists empty.
///
/// # Errors
///
/// Returns [`ChurnError::MalformedDiffInput`] if a diff line cannot be
/// decoded, or [`ChurnError::WorkerPool`] if the worker pool cannot start.
///
/// # Examples
///
/// ```
/// use churnlens_core::{ChurnError, StructuralIndex, StructuralParser};
/// use churnlens_report::{build_report, ReportOptions};
///
/// struct NoEntities;
///
/// impl StructuralParser for NoEntities {
///     fn entity_ranges(&self, _file_path: &str) -> Result<StructuralIndex, ChurnError> {
///         Ok(StructuralIndex::default())
///     }
/// }
///
/// let log = ["foo.rb", "foo.rb", "bar.rb", "foo.rb", "foo.rb", "foo.rb"];
/// let report = build_report(log, Vec::<String>::new(), &NoEntities, &ReportOptions::default()).unwrap();
/// assert_eq!(report.changes.len(), 1);
/// assert_eq!(report.changes[0].file_path, "foo.rb");
/// assert_eq!(report.changes[0].times_changed, 5);
/// ```
pub fn build_report<L, LS, D, DS, P>(
    change_log: L,
    diff_lines: D,
    parser: &P,
    options: &ReportOptions,
) -> Result<ChurnReport, ChurnError>
where
    L: IntoIterator<Item = LS>,
    LS: AsRef<str>,
    D: IntoIterator<Item = DS>,
    DS: AsRef<str>,
    P: StructuralParser + ?Sized,
{
    let mut counts = count_changes(change_log);
    let changed_files = parse_diff_headers(diff_lines)?;

    counts.retain_at_least(options.minimum_churn_count);
    let mut ranked: Vec<(&str, u32)> = counts.iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let ranges_by_path: HashMap<&str, &[LineRange]> = changed_files
        .iter()
        .map(|record| (record.path.as_str(), record.ranges.as_slice()))
        .collect();

    let changes = in_pool(options.jobs, || {
        ranked
            .par_iter()
            .map(|&(path, times_changed)| {
                match_file(path, times_changed, ranges_by_path.get(path).copied(), parser)
            })
            .collect::<Vec<_>>()
    })?;

    debug!(
        files = changes.len(),
        diffed = changed_files.len(),
        "built churn report"
    );

    Ok(ChurnReport {
        changes,
        changed_files,
    })
}

fn match_file<P: StructuralParser + ?Sized>(
    path: &str,
    times_changed: u32,
    ranges: Option<&[LineRange]>,
    parser: &P,
) -> ChurnEntry {
    let mut entry = ChurnEntry {
        file_path: path.to_string(),
        times_changed,
        changed_classes: Vec::new(),
        changed_methods: Vec::new(),
    };

    let Some(ranges) = ranges.filter(|r| !r.is_empty()) else {
        return entry;
    };

    match parser.entity_ranges(path) {
        Ok(index) => {
            entry.changed_classes = touched_entities(ranges, &index.classes);
            entry.changed_methods = touched_entities(ranges, &index.methods);
        }
        Err(e) => warn!(file = path, error = %e, "could not index file"),
    }
    entry
}

/// Run `work` on a dedicated pool of `jobs` threads, or on the global pool for 0.
fn in_pool<T, F>(jobs: usize, work: F) -> Result<T, ChurnError>
where
    T: Send,
    F: FnOnce() -> T + Send,
{
    if jobs == 0 {
        return Ok(work());
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| ChurnError::WorkerPool(e.to_string()))?;
    Ok(pool.install(work))
}

/// Runs the whole pipeline against a version-control backend.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use churnlens_history::git::GitBackend;
/// use churnlens_history::HistoryOptions;
/// use churnlens_report::{ChurnReportBuilder, ReportOptions};
/// use churnlens_structure::TreeSitterParser;
///
/// let vcs = GitBackend::open(Path::new("."), HistoryOptions::default()).unwrap();
/// let parser = TreeSitterParser::new(vcs.root());
/// let report = ChurnReportBuilder::new(&vcs, &parser)
///     .options(ReportOptions { minimum_churn_count: 10, jobs: 4 })
///     .build()
///     .unwrap();
/// println!("{} files", report.changes.len());
/// ```
pub struct ChurnReportBuilder<'a> {
    vcs: &'a dyn VcsBackend,
    parser: &'a dyn StructuralParser,
    options: ReportOptions,
}

impl<'a> ChurnReportBuilder<'a> {
    pub fn new(vcs: &'a dyn VcsBackend, parser: &'a dyn StructuralParser) -> Self {
        Self {
            vcs,
            parser,
            options: ReportOptions::default(),
        }
    }

    pub fn options(mut self, options: ReportOptions) -> Self {
        self.options = options;
        self
    }

    /// Read the log and diff from the backend and build the report.
    ///
    /// # Errors
    ///
    /// Returns [`ChurnError::Vcs`] if either stream cannot be read, plus the
    /// errors of [`build_report`].
    pub fn build(&self) -> Result<ChurnReport, ChurnError> {
        let change_log = self.vcs.change_log()?;
        let diff_lines = self.vcs.diff_header_lines()?;
        debug!(
            mentions = change_log.len(),
            diff_lines = diff_lines.len(),
            "read version-control input"
        );
        build_report(&change_log, &diff_lines, self.parser, &self.options)
    }
}
