//! Search configuration.

use amudai_common::{Result, error::Error};

/// Default number of documents returned by [`Searcher::top_docs`](crate::search::Searcher::top_docs).
pub const DEFAULT_TOP_DOCS_LIMIT: usize = 10;

/// Default cap on the intervals recorded per document by
/// [`Searcher::collect_matches`](crate::search::Searcher::collect_matches).
pub const DEFAULT_MAX_COLLECTED_INTERVALS: usize = 1024;

/// Options of a [`Searcher`](crate::search::Searcher).
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Maximum number of documents returned by `top_docs`.
    pub limit: usize,
    /// Maximum number of intervals (leaf and composite) recorded when
    /// collecting the matches of one document.
    pub max_collected_intervals: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_TOP_DOCS_LIMIT,
            max_collected_intervals: DEFAULT_MAX_COLLECTED_INTERVALS,
        }
    }
}

impl SearchOptions {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_max_collected_intervals(mut self, max_collected_intervals: usize) -> Self {
        self.max_collected_intervals = max_collected_intervals;
        self
    }

    /// Validates the options and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(Error::invalid_arg("limit", "must be greater than 0"));
        }
        if self.max_collected_intervals == 0 {
            return Err(Error::invalid_arg(
                "max_collected_intervals",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_are_valid() {
        assert!(SearchOptions::default().validate().is_ok());
        assert!(SearchOptions::default().with_limit(0).validate().is_err());
        assert!(
            SearchOptions::default()
                .with_max_collected_intervals(0)
                .validate()
                .is_err()
        );
    }
}
