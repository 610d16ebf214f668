//! Collaborator traits at the edges of the churn engine.

use crate::error::ChurnError;
use crate::types::StructuralIndex;

/// Source of raw version-control text.
///
/// Implementations run whatever commands or library calls their system needs;
/// the engine only sees the resulting lines.
pub trait VcsBackend {
    /// One file path per log mention, in log order, blank lines removed.
    ///
    /// # Errors
    ///
    /// Returns [`ChurnError::Vcs`] if the log cannot be read.
    fn change_log(&self) -> Result<Vec<String>, ChurnError>;

    /// Only the `---`, `+++` and `@@` lines of the current diff, in order.
    ///
    /// # Errors
    ///
    /// Returns [`ChurnError::Vcs`] if the diff cannot be produced.
    fn diff_header_lines(&self) -> Result<Vec<String>, ChurnError>;
}

/// Maps a file to the line ranges of the classes and methods it declares.
///
/// Must be shareable across worker threads; the report builder indexes files
/// in parallel.
pub trait StructuralParser: Sync {
    /// Index the file at the repository-relative `file_path`.
    ///
    /// # Errors
    ///
    /// Returns [`ChurnError::StructuralParse`] when the file is gone or
    /// cannot be parsed. Callers treat this as "no entities".
    fn entity_ranges(&self, file_path: &str) -> Result<StructuralIndex, ChurnError>;
}
