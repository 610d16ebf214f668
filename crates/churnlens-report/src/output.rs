use std::fmt::Write;

use churnlens_core::{ChurnEntry, ChurnError, ChurnReport, FileChangeRecord, OutputFormat};
use serde::Serialize;

/// JSON view of a report with the entry limit applied.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportOutput<'a> {
    changes: &'a [ChurnEntry],
    changed_files: &'a [FileChangeRecord],
}

/// Render `report` in `format`, showing at most `limit` entries (0 = all).
///
/// # Errors
///
/// Returns [`ChurnError::Serialization`] if JSON rendering fails.
pub fn render(report: &ChurnReport, format: OutputFormat, limit: usize) -> Result<String, ChurnError> {
    match format {
        OutputFormat::Text => Ok(format_text(report, limit)),
        OutputFormat::Json => format_json(report, limit),
        OutputFormat::Markdown => Ok(format_markdown(report, limit)),
    }
}

fn limited(report: &ChurnReport, limit: usize) -> &[ChurnEntry] {
    if limit == 0 {
        &report.changes
    } else {
        &report.changes[..limit.min(report.changes.len())]
    }
}

/// Plain-text table, one row per file with touched entities underneath.
///
/// # Examples
///
/// ```
/// use churnlens_core::{ChurnEntry, ChurnReport};
/// use churnlens_report::output::format_text;
///
/// let report = ChurnReport {
///     changes: vec![ChurnEntry {
///         file_path: "lib/foo.rb".into(),
///         times_changed: 12,
///         changed_classes: vec!["Foo".into()],
///         changed_methods: vec![],
///     }],
///     changed_files: vec![],
/// };
/// let text = format_text(&report, 0);
/// assert!(text.contains("lib/foo.rb"));
/// assert!(text.contains("classes: Foo"));
/// ```
pub fn format_text(report: &ChurnReport, limit: usize) -> String {
    let entries = limited(report, limit);
    if entries.is_empty() {
        return "No churned files found.\n".into();
    }

    let mut out = String::new();
    let _ = writeln!(out, "{:>4}  {:>7}  File", "#", "Changes");
    let _ = writeln!(out, "{:-<72}", "");
    for (i, entry) in entries.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>4}  {:>7}  {}",
            format!("{}.", i + 1),
            entry.times_changed,
            entry.file_path
        );
        if !entry.changed_classes.is_empty() {
            let _ = writeln!(out, "{:15}classes: {}", "", entry.changed_classes.join(", "));
        }
        if !entry.changed_methods.is_empty() {
            let _ = writeln!(out, "{:15}methods: {}", "", entry.changed_methods.join(", "));
        }
    }
    if entries.len() < report.changes.len() {
        let _ = writeln!(
            out,
            "\n... {} more files not shown",
            report.changes.len() - entries.len()
        );
    }
    out
}

/// Pretty-printed JSON with camelCase keys.
///
/// # Errors
///
/// Returns [`ChurnError::Serialization`] if serialization fails.
///
/// # Examples
///
/// ```
/// use churnlens_core::ChurnReport;
/// use churnlens_report::output::format_json;
///
/// let json = format_json(&ChurnReport::default(), 0).unwrap();
/// assert!(json.contains("\"changedFiles\""));
/// ```
pub fn format_json(report: &ChurnReport, limit: usize) -> Result<String, ChurnError> {
    let output = ReportOutput {
        changes: limited(report, limit),
        changed_files: &report.changed_files,
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Markdown report with a ranking table.
pub fn format_markdown(report: &ChurnReport, limit: usize) -> String {
    let entries = limited(report, limit);
    let mut out = String::from("# Churn Report\n\n");
    if entries.is_empty() {
        out.push_str("No churned files found.\n");
        return out;
    }

    out.push_str("| Rank | File | Changes | Classes | Methods |\n");
    out.push_str("|------|------|---------|---------|---------|\n");
    for (i, entry) in entries.iter().enumerate() {
        let _ = writeln!(
            out,
            "| {} | `{}` | {} | {} | {} |",
            i + 1,
            entry.file_path,
            entry.times_changed,
            code_list(&entry.changed_classes),
            code_list(&entry.changed_methods),
        );
    }
    out
}

fn code_list(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("`{name}`"))
        .collect::<Vec<_>>()
        .join(", ")
}
