use std::path::PathBuf;

/// Errors that can occur across churnlens.
///
/// Library crates use this type directly; the binary reports it through
/// `miette`, which renders the `help` hints.
///
/// # Examples
///
/// ```
/// use churnlens_core::ChurnError;
///
/// let err = ChurnError::MalformedDiffInput {
///     line_number: 3,
///     line: "??? weird".into(),
/// };
/// assert!(err.to_string().contains("??? weird"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ChurnError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(help("see `churnlens init` for a commented default configuration"))]
    Config(String),

    /// The selected version-control backend found no working copy at the path.
    #[error("churning requires a git or subversion working copy: {}", .0.display())]
    #[diagnostic(
        code(churnlens::unsupported_repository),
        help("run churnlens inside a working copy, or pass --path and --backend")
    )]
    UnsupportedRepository(PathBuf),

    /// Version-control command or library failure.
    #[error("version control error: {0}")]
    Vcs(String),

    /// A line in the diff header stream is not a file or hunk header.
    #[error("malformed diff input at line {line_number}: {line}")]
    #[diagnostic(code(churnlens::malformed_diff))]
    MalformedDiffInput {
        /// 1-based position in the header stream.
        line_number: usize,
        /// The offending line.
        line: String,
    },

    /// The structural parser could not index a file.
    #[error("failed to parse structure of {path}: {message}")]
    StructuralParse {
        /// Repository-relative path of the file.
        path: String,
        /// What went wrong.
        message: String,
    },

    /// The worker pool for per-file matching could not be created.
    #[error("worker pool error: {0}")]
    WorkerPool(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
