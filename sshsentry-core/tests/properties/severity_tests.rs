//! Property tests for severity classification

use proptest::prelude::*;
use sshsentry_core::Severity;

/// Reference implementation of the fixed priority order
fn reference_classify(line: &str) -> Severity {
    let lower = line.to_lowercase();
    if lower.contains("error") || lower.contains("critical") {
        Severity::Error
    } else if lower.contains("warning") {
        Severity::Warning
    } else if lower.contains("info") {
        Severity::Info
    } else {
        Severity::Unclassified
    }
}

proptest! {
    /// Property: classification is deterministic
    #[test]
    fn classification_is_deterministic(line in "[ -~]{0,80}") {
        prop_assert_eq!(Severity::classify(&line), Severity::classify(&line));
    }

    /// Property: classification follows the fixed priority order for
    /// arbitrary input
    #[test]
    fn classification_matches_priority_order(line in "[ -~]{0,80}") {
        prop_assert_eq!(Severity::classify(&line), reference_classify(&line));
    }

    /// Property: a line containing both "error" and "warning" is always
    /// an Error, regardless of position
    #[test]
    fn error_always_beats_warning(
        prefix in "[a-z ]{0,10}",
        middle in "[a-z ]{0,10}",
        suffix in "[a-z ]{0,10}",
        error_first in any::<bool>(),
    ) {
        let line = if error_first {
            format!("{prefix}error{middle}warning{suffix}")
        } else {
            format!("{prefix}warning{middle}error{suffix}")
        };
        prop_assert_eq!(Severity::classify(&line), Severity::Error);
    }

    /// Property: casing never changes the category
    #[test]
    fn classification_ignores_case(line in "[ -~]{0,80}") {
        prop_assert_eq!(
            Severity::classify(&line),
            Severity::classify(&line.to_uppercase())
        );
    }
}
