use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ChurnError;

/// Top-level configuration loaded from `.churnlens.toml`.
///
/// Supports layered resolution: CLI flags > local config > defaults.
///
/// # Examples
///
/// ```
/// use churnlens_core::ChurnConfig;
///
/// let config = ChurnConfig::default();
/// assert_eq!(config.churn.minimum_churn_count, 5);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChurnConfig {
    /// What to count and where to look.
    #[serde(default)]
    pub churn: ChurnSettings,
    /// Report presentation.
    #[serde(default)]
    pub output: OutputSettings,
}

impl ChurnConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ChurnError::Io`] if the file cannot be read, or
    /// [`ChurnError::Toml`] if the content is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self, ChurnError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ChurnError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use churnlens_core::{ChurnConfig, VcsKind};
    ///
    /// let toml = r#"
    /// [churn]
    /// minimum_churn_count = 10
    /// backend = "svn"
    /// "#;
    /// let config = ChurnConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.churn.minimum_churn_count, 10);
    /// assert_eq!(config.churn.backend, VcsKind::Svn);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, ChurnError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// Settings for a churn run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChurnSettings {
    /// Files changed fewer times than this are left out (default: 5).
    #[serde(default = "default_minimum_churn_count")]
    pub minimum_churn_count: u32,
    /// Only count log entries after this date. ISO `YYYY-MM-DD` or
    /// relative, e.g. `"90 days ago"`.
    pub start_date: Option<String>,
    /// Version-control system holding the working copy (default: git).
    #[serde(default)]
    pub backend: VcsKind,
    /// Revision to diff the working tree against. Unset compares the
    /// working tree with the index, like `git diff`.
    pub diff_base: Option<String>,
    /// Worker threads for per-file matching; 0 picks the rayon default.
    #[serde(default)]
    pub jobs: usize,
}

fn default_minimum_churn_count() -> u32 {
    5
}

impl Default for ChurnSettings {
    fn default() -> Self {
        Self {
            minimum_churn_count: default_minimum_churn_count(),
            start_date: None,
            backend: VcsKind::default(),
            diff_base: None,
            jobs: 0,
        }
    }
}

impl ChurnSettings {
    /// Resolve `start_date` against `today`.
    ///
    /// # Errors
    ///
    /// Returns [`ChurnError::Config`] if the date cannot be understood.
    pub fn resolve_start_date(&self, today: NaiveDate) -> Result<Option<NaiveDate>, ChurnError> {
        self.start_date
            .as_deref()
            .map(|raw| parse_start_date(raw, today))
            .transpose()
    }
}

/// Report presentation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Maximum entries to print; 0 prints all.
    #[serde(default)]
    pub limit: usize,
}

/// Supported version-control systems.
///
/// # Examples
///
/// ```
/// use churnlens_core::VcsKind;
///
/// assert_eq!("svn".parse::<VcsKind>().unwrap(), VcsKind::Svn);
/// assert_eq!(VcsKind::default(), VcsKind::Git);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VcsKind {
    #[default]
    Git,
    Svn,
}

impl fmt::Display for VcsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VcsKind::Git => write!(f, "git"),
            VcsKind::Svn => write!(f, "svn"),
        }
    }
}

impl FromStr for VcsKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "git" => Ok(VcsKind::Git),
            "svn" | "subversion" => Ok(VcsKind::Svn),
            other => Err(format!("unknown backend: {other}")),
        }
    }
}

/// Parse a start date given as `YYYY-MM-DD`, `today`, `yesterday`, or
/// `<n> <days|weeks|months|years> ago`.
///
/// # Errors
///
/// Returns [`ChurnError::Config`] for anything else.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use churnlens_core::parse_start_date;
///
/// let today = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
/// assert_eq!(
///     parse_start_date("2 weeks ago", today).unwrap(),
///     NaiveDate::from_ymd_opt(2024, 3, 17).unwrap()
/// );
/// assert_eq!(
///     parse_start_date("2023-12-01", today).unwrap(),
///     NaiveDate::from_ymd_opt(2023, 12, 1).unwrap()
/// );
/// ```
pub fn parse_start_date(input: &str, today: NaiveDate) -> Result<NaiveDate, ChurnError> {
    let trimmed = input.trim().to_lowercase();
    let invalid = || ChurnError::Config(format!("unrecognized start_date: {input}"));

    match trimmed.as_str() {
        "today" => return Ok(today),
        "yesterday" => return today.checked_sub_days(Days::new(1)).ok_or_else(invalid),
        _ => {}
    }

    if let Ok(date) = NaiveDate::parse_from_str(&trimmed, "%Y-%m-%d") {
        return Ok(date);
    }

    let words: Vec<&str> = trimmed.split_whitespace().collect();
    let [amount, unit, "ago"] = words.as_slice() else {
        return Err(invalid());
    };
    let amount: u32 = amount.parse().map_err(|_| invalid())?;

    let resolved = match unit.trim_end_matches('s') {
        "day" => today.checked_sub_days(Days::new(u64::from(amount))),
        "week" => today.checked_sub_days(Days::new(u64::from(amount) * 7)),
        "month" => today.checked_sub_months(Months::new(amount)),
        "year" => amount
            .checked_mul(12)
            .and_then(|months| today.checked_sub_months(Months::new(months))),
        _ => None,
    };
    resolved.ok_or_else(invalid)
}
