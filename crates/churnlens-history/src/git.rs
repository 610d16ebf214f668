//! Git history and working-tree diffs via git2.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveTime};
use churnlens_core::{ChurnError, VcsBackend};
use git2::{DiffFormat, DiffOptions, ErrorCode, Repository, Sort};
use tracing::debug;

use crate::HistoryOptions;

/// A git working copy.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use churnlens_core::VcsBackend;
/// use churnlens_history::git::GitBackend;
/// use churnlens_history::HistoryOptions;
///
/// let backend = GitBackend::open(Path::new("."), HistoryOptions::default()).unwrap();
/// for path in backend.change_log().unwrap() {
///     println!("{path}");
/// }
/// ```
pub struct GitBackend {
    repo: Repository,
    root: PathBuf,
    options: HistoryOptions,
}

impl GitBackend {
    /// Open the repository containing `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ChurnError::UnsupportedRepository`] if `path` is not inside
    /// a non-bare git repository.
    pub fn open(path: &Path, options: HistoryOptions) -> Result<Self, ChurnError> {
        let repo = Repository::discover(path)
            .map_err(|_| ChurnError::UnsupportedRepository(path.to_path_buf()))?;
        let root = repo
            .workdir()
            .ok_or_else(|| ChurnError::UnsupportedRepository(path.to_path_buf()))?
            .to_path_buf();
        Ok(Self {
            repo,
            root,
            options,
        })
    }

    /// Root of the working tree; log and diff paths are relative to it.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl VcsBackend for GitBackend {
    /// Equivalent of `git log --after=<start> --name-only --pretty=format:`.
    ///
    /// Merge commits contribute no paths, matching `git log` without `-m`.
    fn change_log(&self) -> Result<Vec<String>, ChurnError> {
        let mut revwalk = self
            .repo
            .revwalk()
            .map_err(|e| ChurnError::Vcs(format!("failed to create revwalk: {e}")))?;
        revwalk
            .set_sorting(Sort::TIME)
            .map_err(|e| ChurnError::Vcs(format!("failed to sort revwalk: {e}")))?;

        if let Err(e) = revwalk.push_head() {
            if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) {
                return Ok(Vec::new());
            }
            return Err(ChurnError::Vcs(format!("failed to push HEAD: {e}")));
        }

        let cutoff = self.options.since.map(start_of_day);
        let mut paths = Vec::new();
        let mut commits = 0usize;

        for oid_result in revwalk {
            let oid = oid_result.map_err(|e| ChurnError::Vcs(format!("revwalk error: {e}")))?;
            let commit = self
                .repo
                .find_commit(oid)
                .map_err(|e| ChurnError::Vcs(format!("failed to find commit: {e}")))?;

            if let Some(cutoff) = cutoff {
                if commit.time().seconds() < cutoff {
                    break;
                }
            }
            if commit.parent_count() > 1 {
                continue;
            }

            commits += 1;
            paths.extend(changed_paths(&self.repo, &commit)?);
        }

        debug!(commits, mentions = paths.len(), "read git log");
        Ok(paths)
    }

    /// Equivalent of `git diff --unified=0`, keeping only header lines.
    ///
    /// With a `diff_base` the working tree (plus index) is compared against
    /// that revision instead of the index.
    fn diff_header_lines(&self) -> Result<Vec<String>, ChurnError> {
        let mut opts = DiffOptions::new();
        opts.context_lines(0);

        let diff = match &self.options.diff_base {
            Some(rev) => {
                let tree = self
                    .repo
                    .revparse_single(rev)
                    .and_then(|object| object.peel_to_tree())
                    .map_err(|e| ChurnError::Vcs(format!("failed to resolve '{rev}': {e}")))?;
                self.repo
                    .diff_tree_to_workdir_with_index(Some(&tree), Some(&mut opts))
            }
            None => self.repo.diff_index_to_workdir(None, Some(&mut opts)),
        }
        .map_err(|e| ChurnError::Vcs(format!("failed to compute diff: {e}")))?;

        let mut lines = Vec::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            let content = String::from_utf8_lossy(line.content());
            match line.origin() {
                'F' => lines.extend(
                    content
                        .lines()
                        .filter(|l| l.starts_with("---") || l.starts_with("+++"))
                        .map(str::to_string),
                ),
                'H' => lines.push(content.trim_end().to_string()),
                _ => {}
            }
            true
        })
        .map_err(|e| ChurnError::Vcs(format!("failed to print diff: {e}")))?;

        debug!(lines = lines.len(), "read git diff headers");
        Ok(lines)
    }
}

fn start_of_day(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

fn changed_paths(repo: &Repository, commit: &git2::Commit) -> Result<Vec<String>, ChurnError> {
    let commit_tree = commit
        .tree()
        .map_err(|e| ChurnError::Vcs(format!("failed to get commit tree: {e}")))?;

    let parent_tree = if commit.parent_count() > 0 {
        let parent = commit
            .parent(0)
            .map_err(|e| ChurnError::Vcs(format!("failed to get parent: {e}")))?;
        Some(
            parent
                .tree()
                .map_err(|e| ChurnError::Vcs(format!("failed to get parent tree: {e}")))?,
        )
    } else {
        None
    };

    let mut diff = repo
        .diff_tree_to_tree(parent_tree.as_ref(), Some(&commit_tree), None)
        .map_err(|e| ChurnError::Vcs(format!("failed to compute diff: {e}")))?;

    let mut find_opts = git2::DiffFindOptions::new();
    find_opts.renames(true);
    diff.find_similar(Some(&mut find_opts))
        .map_err(|e| ChurnError::Vcs(format!("failed to find renames: {e}")))?;

    Ok(diff
        .deltas()
        .filter_map(|delta| {
            delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())
                .map(|path| path.to_string_lossy().to_string())
        })
        .filter(|path| !path.is_empty())
        .collect())
}
