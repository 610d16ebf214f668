//! Churn report assembly: ranking, entity matching, rendering.
//!
//! [`build_report`] combines a change log and diff-header lines with a
//! [`StructuralParser`](churnlens_core::StructuralParser) into a
//! [`ChurnReport`](churnlens_core::ChurnReport). [`ChurnReportBuilder`] reads
//! both streams from a [`VcsBackend`](churnlens_core::VcsBackend) first.
//! [`output`] renders the result as text, JSON, or Markdown.

pub mod builder;
pub mod matcher;
pub mod output;

pub use builder::{build_report, ChurnReportBuilder, ReportOptions};
