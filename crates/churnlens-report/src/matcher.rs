use churnlens_core::{EntityRangeIndex, LineRange};

/// Names of the entities whose ranges overlap any changed range.
///
/// Entities are visited in index order and reported once, at their first
/// overlap; the remaining ranges of an entity are not checked after a hit.
///
/// # Examples
///
/// ```
/// use churnlens_core::{EntityRangeIndex, LineRange};
/// use churnlens_report::matcher::touched_entities;
///
/// let index: EntityRangeIndex = [("Foo#bar", LineRange::new(5, 8))].into_iter().collect();
/// assert_eq!(touched_entities(&[LineRange::single(7)], &index), vec!["Foo#bar"]);
/// assert!(touched_entities(&[LineRange::new(20, 30)], &index).is_empty());
/// ```
pub fn touched_entities(changed: &[LineRange], index: &EntityRangeIndex) -> Vec<String> {
    if changed.is_empty() {
        return Vec::new();
    }

    index
        .iter()
        .filter(|(_, ranges)| {
            ranges
                .iter()
                .any(|range| changed.iter().any(|c| range.overlaps(c)))
        })
        .map(|(name, _)| name.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(entries: &[(&str, u32, u32)]) -> EntityRangeIndex {
        entries
            .iter()
            .map(|&(name, start, end)| (name, LineRange::new(start, end)))
            .collect()
    }

    #[test]
    fn single_line_inside_method() {
        let idx = index(&[("Foo#bar", 5, 8)]);
        assert_eq!(touched_entities(&[LineRange::new(7, 7)], &idx), vec!["Foo#bar"]);
    }

    #[test]
    fn boundaries_are_inclusive() {
        let idx = index(&[("Foo", 10, 20)]);
        assert_eq!(touched_entities(&[LineRange::new(1, 10)], &idx), vec!["Foo"]);
        assert_eq!(touched_entities(&[LineRange::new(20, 25)], &idx), vec!["Foo"]);
        assert!(touched_entities(&[LineRange::new(21, 25)], &idx).is_empty());
        assert!(touched_entities(&[LineRange::new(1, 9)], &idx).is_empty());
    }

    #[test]
    fn enclosing_change_touches_inner_entity() {
        let idx = index(&[("Foo#bar", 5, 8)]);
        assert_eq!(touched_entities(&[LineRange::new(1, 100)], &idx), vec!["Foo#bar"]);
    }

    #[test]
    fn any_range_of_a_reopened_class_counts() {
        let idx = index(&[("Foo", 1, 9), ("Foo", 40, 52), ("Bar", 11, 30)]);
        assert_eq!(touched_entities(&[LineRange::new(45, 45)], &idx), vec!["Foo"]);
    }

    #[test]
    fn results_follow_index_order_without_duplicates() {
        let idx = index(&[("A#one", 1, 5), ("A#two", 6, 10), ("#three", 20, 30)]);
        let changed = [
            LineRange::new(25, 26),
            LineRange::new(2, 3),
            LineRange::new(4, 4),
            LineRange::new(27, 27),
        ];
        assert_eq!(touched_entities(&changed, &idx), vec!["A#one", "#three"]);
    }

    #[test]
    fn matching_is_idempotent() {
        let idx = index(&[("A", 1, 5), ("B", 6, 10), ("C", 11, 15)]);
        let changed = [LineRange::new(3, 7), LineRange::new(14, 14)];
        let first = touched_entities(&changed, &idx);
        let second = touched_entities(&changed, &idx);
        assert_eq!(first, second);
        assert_eq!(first, vec!["A", "B", "C"]);
    }

    #[test]
    fn nothing_changed_or_nothing_indexed() {
        let idx = index(&[("Foo", 1, 10)]);
        assert!(touched_entities(&[], &idx).is_empty());
        assert!(touched_entities(&[LineRange::new(1, 10)], &EntityRangeIndex::default()).is_empty());
    }
}
