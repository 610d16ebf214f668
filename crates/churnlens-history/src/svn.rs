//! Subversion history and diffs via the `svn` command line.

use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::NaiveDate;
use churnlens_core::{ChurnError, VcsBackend};
use churnlens_difflens::parser::filter_header_lines;
use tracing::debug;

use crate::HistoryOptions;

/// A subversion working copy.
pub struct SvnBackend {
    root: PathBuf,
    options: HistoryOptions,
    /// Repository path of `root`, without a trailing slash (`/trunk`, or
    /// empty at the repository root).
    log_prefix: String,
}

impl SvnBackend {
    /// Open the working copy at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ChurnError::UnsupportedRepository`] if `svn info` does not
    /// recognize `path` as a working copy (or `svn` is not installed).
    pub fn open(path: &Path, options: HistoryOptions) -> Result<Self, ChurnError> {
        let mut backend = Self {
            root: path.to_path_buf(),
            options,
            log_prefix: String::new(),
        };
        let relative_url = backend
            .run(&["info", "--show-item", "relative-url"])
            .map_err(|_| ChurnError::UnsupportedRepository(path.to_path_buf()))?;
        backend.log_prefix = log_prefix(&relative_url);
        debug!(prefix = %backend.log_prefix, "opened svn working copy");
        Ok(backend)
    }

    /// Working copy root the commands run in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn run(&self, args: &[&str]) -> Result<String, ChurnError> {
        let output = Command::new("svn")
            .args(args)
            .current_dir(&self.root)
            .output()
            .map_err(|e| ChurnError::Vcs(format!("failed to run svn: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ChurnError::Vcs(format!(
                "svn {} failed: {}",
                args.join(" "),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl VcsBackend for SvnBackend {
    /// Paths of the added and modified entries in `svn log --verbose`,
    /// relative to the working copy root. Entries outside it are dropped.
    fn change_log(&self) -> Result<Vec<String>, ChurnError> {
        let mut args = vec!["log".to_string(), "--verbose".to_string()];
        if let Some(since) = self.options.since {
            args.push("--revision".into());
            args.push(revision_window(since));
        }
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        let log = self.run(&args)?;
        let paths: Vec<String> = log
            .lines()
            .filter_map(parse_change_line)
            .filter_map(|path| working_copy_path(&path, &self.log_prefix))
            .collect();
        debug!(mentions = paths.len(), "read svn log");
        Ok(paths)
    }

    /// Header lines of `svn diff` with zero context lines.
    fn diff_header_lines(&self) -> Result<Vec<String>, ChurnError> {
        let mut args = vec!["diff", "-x", "-U0"];
        if let Some(rev) = self.options.diff_base.as_deref() {
            args.push("-r");
            args.push(rev);
        }
        let diff = self.run(&args)?;
        let lines = filter_header_lines(&diff);
        debug!(lines = lines.len(), "read svn diff headers");
        Ok(lines)
    }
}

/// `{start}:HEAD` revision range for `svn log --revision`.
///
/// A `{date}` bound means midnight at the start of that day, so the upper
/// end is `HEAD` to keep commits made today.
fn revision_window(since: NaiveDate) -> String {
    format!("{{{}}}:HEAD", since.format("%Y-%m-%d"))
}

/// Repository path from `svn info --show-item relative-url` output (`^/trunk`).
fn log_prefix(relative_url: &str) -> String {
    let path = relative_url.trim();
    let path = path.strip_prefix('^').unwrap_or(path);
    percent_decode(path).trim_end_matches('/').to_string()
}

/// Map a repository path from the log onto the working copy rooted at
/// `prefix`. Paths outside the working copy, and the root itself, map to
/// `None`.
fn working_copy_path(repo_path: &str, prefix: &str) -> Option<String> {
    let rest = repo_path.strip_prefix(prefix)?.strip_prefix('/')?;
    (!rest.is_empty()).then(|| rest.to_string())
}

/// Decode `%XX` escapes; malformed escapes are kept verbatim.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes
                .get(i + 1..i + 3)
                .and_then(|pair| std::str::from_utf8(pair).ok())
                .and_then(|pair| u8::from_str_radix(pair, 16).ok());
            if let Some(byte) = hex {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Extract the path from an `svn log --verbose` changed-path line.
///
/// Only added (`A`) and modified (`M`) entries count; a copy source suffix
/// such as ` (from /trunk/old.rb:12)` is dropped.
fn parse_change_line(line: &str) -> Option<String> {
    let rest = line.trim_start();
    let mut chars = rest.chars();
    if !matches!(chars.next()?, 'A' | 'M') {
        return None;
    }
    let rest = chars.as_str();
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let path = rest.trim_start();
    if !path.starts_with('/') {
        return None;
    }
    let path = path.split(" (from ").next().unwrap_or(path).trim_end();
    Some(path.to_string())
}
