use std::collections::HashMap;

use churnlens_core::{ChurnError, FileChangeRecord, LineRange};
use tracing::debug;

/// Decode header-only diff lines into per-file changed line ranges.
///
/// Expects the `---`, `+++` and `@@` lines of a unified diff, in order.
/// File headers move the current-file cursor; each hunk header appends its
/// removed range and then its added range to the current file. A side
/// written as `-start,length` covers `[start, start + length]`; a side with
/// no length covers the single line `start`.
///
/// `/dev/null` never becomes the current file, so the hunks of a deleted
/// file stay with its old path and those of a new file with its new path.
///
/// # Errors
///
/// Returns [`ChurnError::MalformedDiffInput`] for a non-empty line that is
/// not a file or hunk header, for an undecodable hunk header, and for a hunk
/// header that precedes every file header.
///
/// # Examples
///
/// ```
/// use churnlens_core::LineRange;
/// use churnlens_difflens::parser::parse_diff_headers;
///
/// let records = parse_diff_headers(["--- a/foo.rb", "+++ b/foo.rb", "@@ -10,2 +10,3 @@"]).unwrap();
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].path, "foo.rb");
/// assert_eq!(records[0].ranges, vec![LineRange::new(10, 12), LineRange::new(10, 13)]);
/// ```
pub fn parse_diff_headers<I, S>(lines: I) -> Result<Vec<FileChangeRecord>, ChurnError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut records: Vec<FileChangeRecord> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut current: Option<usize> = None;
    let mut hunks = 0usize;

    for (idx, line) in lines.into_iter().enumerate() {
        let line = line.as_ref();
        let malformed = || ChurnError::MalformedDiffInput {
            line_number: idx + 1,
            line: line.to_string(),
        };

        if line.is_empty() {
            continue;
        }

        if let Some(raw) = line
            .strip_prefix("---")
            .or_else(|| line.strip_prefix("+++"))
        {
            let path = parse_path(raw);
            if path.is_empty() {
                return Err(malformed());
            }
            if path == "/dev/null" {
                continue;
            }
            let position = match positions.get(&path) {
                Some(&position) => position,
                None => {
                    positions.insert(path.clone(), records.len());
                    records.push(FileChangeRecord::new(path));
                    records.len() - 1
                }
            };
            current = Some(position);
            continue;
        }

        if line.starts_with("@@") {
            let position = current.ok_or_else(malformed)?;
            let (removed, added) = parse_hunk_header(line).ok_or_else(malformed)?;
            let record = &mut records[position];
            record.ranges.push(removed.range().ok_or_else(malformed)?);
            record.ranges.push(added.range().ok_or_else(malformed)?);
            hunks += 1;
            continue;
        }

        return Err(malformed());
    }

    debug!(files = records.len(), hunks, "decoded diff headers");
    Ok(records)
}

/// Reduce a full unified diff to the header lines [`parse_diff_headers`] expects.
///
/// Hunk bodies are skipped by the line counts announced in each `@@` header,
/// so a removed line whose text starts with `--` is not taken for a file
/// header. Everything else outside the `---`, `+++` and `@@` lines (`diff
/// --git`, `index`, svn's `Index:` banners) is dropped.
///
/// # Examples
///
/// ```
/// use churnlens_difflens::parser::filter_header_lines;
///
/// let diff = "\
/// Index: lib/foo.rb
/// ===================================================================
/// --- lib/foo.rb\t(revision 41)
/// +++ lib/foo.rb\t(working copy)
/// @@ -3 +3 @@
/// --- old comment
/// +-- new comment
/// ";
/// let headers = filter_header_lines(diff);
/// assert_eq!(headers.len(), 3);
/// assert!(headers[2].starts_with("@@"));
/// ```
pub fn filter_header_lines(diff: &str) -> Vec<String> {
    let mut headers = Vec::new();
    let mut pending_removed = 0u32;
    let mut pending_added = 0u32;

    for line in diff.lines() {
        if pending_removed > 0 || pending_added > 0 {
            match line.chars().next() {
                Some('-') => {
                    pending_removed = pending_removed.saturating_sub(1);
                    continue;
                }
                Some('+') => {
                    pending_added = pending_added.saturating_sub(1);
                    continue;
                }
                Some(' ') | None => {
                    pending_removed = pending_removed.saturating_sub(1);
                    pending_added = pending_added.saturating_sub(1);
                    continue;
                }
                Some('\\') => continue,
                Some(_) => {
                    // Body shorter than announced; resync on this line.
                    pending_removed = 0;
                    pending_added = 0;
                }
            }
        }

        if line.starts_with("---") || line.starts_with("+++") {
            headers.push(line.to_string());
        } else if line.starts_with("@@") {
            if let Some((removed, added)) = parse_hunk_header(line) {
                pending_removed = removed.body_lines();
                pending_added = added.body_lines();
            }
            headers.push(line.to_string());
        }
    }

    headers
}

/// One side (`-` or `+`) of a hunk header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HunkSide {
    start: u32,
    length: Option<u32>,
}

impl HunkSide {
    fn range(&self) -> Option<LineRange> {
        match self.length {
            Some(length) => Some(LineRange::new(
                self.start,
                self.start.checked_add(length)?,
            )),
            None => Some(LineRange::single(self.start)),
        }
    }

    fn body_lines(&self) -> u32 {
        self.length.unwrap_or(1)
    }
}

fn parse_hunk_header(line: &str) -> Option<(HunkSide, HunkSide)> {
    let mut tokens = line.trim_start_matches('@').split_whitespace();
    let removed = parse_side(tokens.next()?.strip_prefix('-')?)?;
    let added = parse_side(tokens.next()?.strip_prefix('+')?)?;
    Some((removed, added))
}

fn parse_side(spec: &str) -> Option<HunkSide> {
    if let Some((start, length)) = spec.split_once(',') {
        Some(HunkSide {
            start: start.parse().ok()?,
            length: Some(length.parse().ok()?),
        })
    } else {
        Some(HunkSide {
            start: spec.parse().ok()?,
            length: None,
        })
    }
}

fn parse_path(raw: &str) -> String {
    let raw = raw.strip_prefix(' ').unwrap_or(raw);
    // svn appends "\t(revision N)", git a tab when the name has spaces.
    let raw = raw.split('\t').next().unwrap_or(raw);
    let normalized = raw.trim_end().trim_matches('"');

    if normalized == "/dev/null" {
        return normalized.to_string();
    }

    normalized
        .strip_prefix("a/")
        .or_else(|| normalized.strip_prefix("b/"))
        .unwrap_or(normalized)
        .to_string()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn side() -> impl Strategy<Value = (u32, Option<u32>)> {
        (0u32..1_000_000, prop::option::of(0u32..10_000))
    }

    fn spec(sign: char, (start, length): (u32, Option<u32>)) -> String {
        match length {
            Some(length) => format!("{sign}{start},{length}"),
            None => format!("{sign}{start}"),
        }
    }

    fn expected((start, length): (u32, Option<u32>)) -> LineRange {
        LineRange::new(start, start + length.unwrap_or(0))
    }

    proptest! {
        #[test]
        fn hunk_headers_decode_to_their_ranges(
            hunks in prop::collection::vec((side(), side()), 1..20),
            trailer in prop::option::of("[a-z_ ()]{0,12}"),
        ) {
            let mut lines = vec!["--- a/src/lib.rs".to_string(), "+++ b/src/lib.rs".to_string()];
            for &(removed, added) in &hunks {
                let mut header = format!("@@ {} {} @@", spec('-', removed), spec('+', added));
                if let Some(text) = &trailer {
                    header.push(' ');
                    header.push_str(text);
                }
                lines.push(header);
            }

            let records = parse_diff_headers(&lines).unwrap();
            prop_assert_eq!(records.len(), 1);

            let want: Vec<LineRange> = hunks
                .iter()
                .flat_map(|&(removed, added)| [expected(removed), expected(added)])
                .collect();
            prop_assert_eq!(&records[0].ranges, &want);
        }

        #[test]
        fn filtered_diff_keeps_every_header(
            hunks in prop::collection::vec((1u32..500, 0u32..5, 1u32..500, 0u32..5), 1..10),
        ) {
            let mut diff = String::from("--- a/x.sql\n+++ b/x.sql\n");
            for &(a, b, c, d) in &hunks {
                diff.push_str(&format!("@@ -{a},{b} +{c},{d} @@\n"));
                for _ in 0..b {
                    diff.push_str("--- removed\n");
                }
                for _ in 0..d {
                    diff.push_str("+++ added\n");
                }
            }

            let headers = filter_header_lines(&diff);
            prop_assert_eq!(headers.len(), 2 + hunks.len());
            let records = parse_diff_headers(&headers).unwrap();
            prop_assert_eq!(records[0].ranges.len(), 2 * hunks.len());
        }
    }
}
