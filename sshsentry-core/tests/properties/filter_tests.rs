//! Property tests for the live filter set

use proptest::prelude::*;
use sshsentry_core::FilterSet;

proptest! {
    /// Property: the delivered subsequence equals exactly the lines
    /// matching at least one filter (case-insensitive substring), in
    /// original order, when the set is non-empty; all lines when empty.
    #[test]
    fn delivered_subsequence_matches_filter_semantics(
        filters in proptest::collection::vec("[a-zA-Z0-9]{1,6}", 0..4),
        lines in proptest::collection::vec("[ -~]{0,40}", 0..50),
    ) {
        let set = FilterSet::from_filters(filters.clone());
        let delivered: Vec<&String> = lines.iter().filter(|l| set.matches(l)).collect();

        let expected: Vec<&String> = if filters.is_empty() {
            lines.iter().collect()
        } else {
            lines
                .iter()
                .filter(|line| {
                    let lower = line.to_lowercase();
                    filters.iter().any(|f| lower.contains(&f.to_lowercase()))
                })
                .collect()
        };

        prop_assert_eq!(delivered, expected);
    }

    /// Property: an empty set admits every line
    #[test]
    fn empty_set_admits_everything(line in "[ -~]{0,80}") {
        prop_assert!(FilterSet::new().matches(&line));
    }

    /// Property: matching ignores case on both sides
    #[test]
    fn matching_is_case_insensitive(
        filter in "[a-zA-Z]{1,8}",
        prefix in "[ -~]{0,10}",
        suffix in "[ -~]{0,10}",
    ) {
        let set = FilterSet::from_filters(vec![filter.to_lowercase()]);
        let line = format!("{prefix}{}{suffix}", filter.to_uppercase());
        prop_assert!(set.matches(&line));
    }

    /// Property: replacing the set preserves insertion order and
    /// duplicates of the new filters
    #[test]
    fn replace_preserves_order_and_duplicates(
        first in proptest::collection::vec("[a-z]{1,5}", 0..5),
        second in proptest::collection::vec("[a-z]{1,5}", 0..5),
    ) {
        let mut set = FilterSet::from_filters(first);
        set.replace(second.clone());
        prop_assert_eq!(set.filters(), second.as_slice());
    }

    /// Property: a line equal to one of the filters always matches
    #[test]
    fn filter_matches_itself(
        filters in proptest::collection::vec("[a-zA-Z0-9]{1,10}", 1..5),
        index in 0usize..5,
    ) {
        let set = FilterSet::from_filters(filters.clone());
        let chosen = &filters[index % filters.len()];
        prop_assert!(set.matches(chosen));
    }
}
