//! Version-control history: change logs, working-copy diffs, change counts.
//!
//! Backends for git (via git2) and subversion (via the `svn` CLI) implement
//! [`VcsBackend`], handing the churn engine raw log and diff-header lines.
//! [`counter::count_changes`] turns a log into per-file change counts.

pub mod counter;
pub mod git;
pub mod svn;

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use churnlens_core::{ChurnError, VcsBackend, VcsKind};

/// Options shared by every backend.
///
/// # Examples
///
/// ```
/// use churnlens_history::HistoryOptions;
///
/// let opts = HistoryOptions::default();
/// assert!(opts.since.is_none());
/// assert!(opts.diff_base.is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct HistoryOptions {
    /// Only read log entries from this date on.
    pub since: Option<NaiveDate>,
    /// Revision to diff the working tree against instead of the index.
    pub diff_base: Option<String>,
}

/// An opened backend and the root its paths are relative to.
pub struct OpenedBackend {
    pub backend: Box<dyn VcsBackend>,
    pub root: PathBuf,
}

/// Open the backend of the requested kind for the working copy at `path`.
///
/// The kind is never guessed here; callers decide it from configuration.
///
/// # Errors
///
/// Returns [`ChurnError::UnsupportedRepository`] if `path` is not a working
/// copy of that kind.
pub fn open_backend(
    kind: VcsKind,
    path: &Path,
    options: HistoryOptions,
) -> Result<OpenedBackend, ChurnError> {
    match kind {
        VcsKind::Git => {
            let backend = git::GitBackend::open(path, options)?;
            let root = backend.root().to_path_buf();
            Ok(OpenedBackend {
                backend: Box::new(backend),
                root,
            })
        }
        VcsKind::Svn => {
            let backend = svn::SvnBackend::open(path, options)?;
            let root = backend.root().to_path_buf();
            Ok(OpenedBackend {
                backend: Box::new(backend),
                root,
            })
        }
    }
}
