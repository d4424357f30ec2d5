//! Label filters

use crate::config::Filter;
use crate::labels::LabelSet;

impl Filter {
    /// Whether `labels` pass this filter. A missing label never passes.
    #[must_use]
    pub fn matches(&self, labels: &LabelSet) -> bool {
        labels
            .get(&self.label)
            .is_some_and(|value| self.regex.is_match(value) != self.negate)
    }
}

/// Whether `labels` pass every filter. An empty list always matches.
#[must_use]
pub fn matches(filters: &[Filter], labels: &LabelSet) -> bool {
    filters.iter().all(|f| f.matches(labels))
}
