//! Severity classification for log lines

use serde::Serialize;

/// Visual category attached to a delivered log line.
///
/// Classification is a case-insensitive substring check in fixed priority
/// order; the first matching category wins, so a line containing both
/// "error" and "warning" is an [`Severity::Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    /// Line contains "error" or "critical"
    Error,
    /// Line contains "warning"
    Warning,
    /// Line contains "info"
    Info,
    /// None of the keywords matched
    Unclassified,
}

impl Severity {
    /// Classifies a raw line
    #[must_use]
    pub fn classify(line: &str) -> Self {
        let lower = line.to_lowercase();
        if lower.contains("error") || lower.contains("critical") {
            Self::Error
        } else if lower.contains("warning") {
            Self::Warning
        } else if lower.contains("info") {
            Self::Info
        } else {
            Self::Unclassified
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
            Self::Unclassified => write!(f, "unclassified"),
        }
    }
}
