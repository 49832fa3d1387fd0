//! Live text filters for the log stream
//!
//! A filter set is an ordered list of strings; order carries no matching
//! priority (any match admits the line) but is preserved for display and
//! removal in the frontend. Duplicates are allowed.

/// An ordered set of case-insensitive substring filters
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    /// Filters as entered, order preserved
    filters: Vec<String>,
    /// Lowercased copies for matching
    lowered: Vec<String>,
}

impl FilterSet {
    /// Creates an empty set (matches everything)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set from the given filters
    #[must_use]
    pub fn from_filters(filters: Vec<String>) -> Self {
        let mut set = Self::new();
        set.replace(filters);
        set
    }

    /// Replaces the whole set, keeping the new insertion order
    pub fn replace(&mut self, filters: Vec<String>) {
        self.lowered = filters.iter().map(|f| f.to_lowercase()).collect();
        self.filters = filters;
    }

    /// Returns `true` iff the set is empty or at least one filter matches
    /// `line` as a case-insensitive substring
    #[must_use]
    pub fn matches(&self, line: &str) -> bool {
        if self.lowered.is_empty() {
            return true;
        }
        let lower = line.to_lowercase();
        self.lowered.iter().any(|f| lower.contains(f.as_str()))
    }

    /// The filters in insertion order
    #[must_use]
    pub fn filters(&self) -> &[String] {
        &self.filters
    }

    /// Returns `true` when no filters are active
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}
