//! Per-file change counting over a log.

use churnlens_core::ChangeCount;
use tracing::debug;

/// Count how many times each path is mentioned in a change log.
///
/// Expects one path per mention, as [`VcsBackend::change_log`] returns.
/// Blank lines are ignored. Counts iterate in first-mention order.
///
/// [`VcsBackend::change_log`]: churnlens_core::VcsBackend::change_log
///
/// # Examples
///
/// ```
/// use churnlens_history::counter::count_changes;
///
/// let mut counts = count_changes(["foo.rb", "foo.rb", "bar.rb", "foo.rb", "foo.rb", "foo.rb"]);
/// counts.retain_at_least(5);
/// assert_eq!(counts.get("foo.rb"), Some(5));
/// assert_eq!(counts.get("bar.rb"), None);
/// ```
pub fn count_changes<I, S>(lines: I) -> ChangeCount
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut counts = ChangeCount::default();
    let mut mentions = 0usize;
    for line in lines {
        let path = line.as_ref().trim();
        if path.is_empty() {
            continue;
        }
        counts.record(path);
        mentions += 1;
    }
    debug!(mentions, files = counts.len(), "counted log mentions");
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_log_has_no_counts() {
        let counts = count_changes(Vec::<String>::new());
        assert!(counts.is_empty());
    }

    #[test]
    fn repeats_are_tallied_per_path() {
        let counts = count_changes(["foo.rb", "foo.rb", "bar.rb", "foo.rb", "foo.rb", "foo.rb"]);
        assert_eq!(counts.get("foo.rb"), Some(5));
        assert_eq!(counts.get("bar.rb"), Some(1));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn threshold_drops_rare_files() {
        let mut counts =
            count_changes(["foo.rb", "foo.rb", "bar.rb", "foo.rb", "foo.rb", "foo.rb"]);
        counts.retain_at_least(5);
        let pairs: Vec<_> = counts.iter().collect();
        assert_eq!(pairs, vec![("foo.rb", 5)]);
    }

    #[test]
    fn blank_and_padded_lines() {
        let counts = count_changes(["", "  src/a.rs  ", "src/a.rs", "   "]);
        assert_eq!(counts.get("src/a.rs"), Some(2));
        assert_eq!(counts.len(), 1);
    }

    #[test]
    fn iteration_follows_first_mention() {
        let counts = count_changes(["c", "a", "b", "a", "c"]);
        let order: Vec<_> = counts.iter().map(|(path, _)| path).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }
}
