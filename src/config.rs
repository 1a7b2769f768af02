//! Pyramid configuration.
//!
//! A configuration fixes the geometric sequence of block widths and the
//! category list. It is validated once, up front, so that the streaming
//! code never has to deal with a degenerate level set.

use crate::error::{Result, SummaryError};
use rustc_hash::FxHashSet;

/// Label that designates the catch-all category by default.
pub const DEFAULT_OTHER_CATEGORY: &str = "_other_";

/// Configuration for building summary pyramids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PyramidConfig {
    /// Width of the finest level
    pub block_size_start: u64,
    /// Multiplier between consecutive levels (must be > 1)
    pub block_size_incr_factor: u64,
    /// Largest permitted width (inclusive)
    pub block_size_max: u64,
    /// Category labels, in output order
    pub categories: Vec<String>,
    /// Label of the catch-all bucket for unmatched values
    pub other_category: Option<String>,
}

impl PyramidConfig {
    pub fn new(block_size_start: u64, block_size_incr_factor: u64, block_size_max: u64) -> Self {
        Self {
            block_size_start,
            block_size_incr_factor,
            block_size_max,
            categories: Vec::new(),
            other_category: Some(DEFAULT_OTHER_CATEGORY.to_string()),
        }
    }

    /// Set the category labels (builder pattern).
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    /// Set categories from a `;`-separated list, e.g. `"A;B;_other_"`.
    pub fn with_category_list(self, list: &str) -> Self {
        self.with_categories(list.split(';'))
    }

    /// Set or clear the catch-all label (builder pattern).
    pub fn with_other_category(mut self, other: Option<String>) -> Self {
        self.other_category = other;
        self
    }

    /// Check the configuration, rejecting anything that would produce an
    /// unbounded or empty level set.
    pub fn validate(&self) -> Result<()> {
        if self.block_size_start == 0 {
            return Err(SummaryError::InvalidConfig(
                "block size start must be greater than 0".to_string(),
            ));
        }
        if self.block_size_incr_factor <= 1 {
            return Err(SummaryError::InvalidConfig(format!(
                "block size increment factor must be greater than 1, got {}",
                self.block_size_incr_factor
            )));
        }
        if self.block_size_max < self.block_size_start {
            return Err(SummaryError::InvalidConfig(format!(
                "block size max ({}) is smaller than block size start ({})",
                self.block_size_max, self.block_size_start
            )));
        }
        if self.categories.is_empty() {
            return Err(SummaryError::InvalidConfig(
                "at least one category is required".to_string(),
            ));
        }

        let mut seen = FxHashSet::default();
        for category in &self.categories {
            if category.is_empty() {
                return Err(SummaryError::InvalidConfig(
                    "category labels must not be empty".to_string(),
                ));
            }
            if !seen.insert(category.as_str()) {
                return Err(SummaryError::InvalidConfig(format!(
                    "duplicate category '{}'",
                    category
                )));
            }
        }

        Ok(())
    }

    /// Block widths of all levels, finest first.
    ///
    /// `start, start*factor, start*factor^2, ...` for as long as the value
    /// stays `<= max`. Call [`validate`](Self::validate) first; an invalid
    /// factor yields only the first width here instead of looping.
    pub fn level_widths(&self) -> Vec<u64> {
        let mut widths = Vec::new();
        let mut width = self.block_size_start;
        while width > 0 && width <= self.block_size_max {
            widths.push(width);
            if self.block_size_incr_factor <= 1 {
                break;
            }
            width = match width.checked_mul(self.block_size_incr_factor) {
                Some(next) => next,
                None => break,
            };
        }
        widths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(start: u64, factor: u64, max: u64) -> PyramidConfig {
        PyramidConfig::new(start, factor, max).with_categories(["A", "B"])
    }

    #[test]
    fn test_level_widths_geometric() {
        let cfg = config(10, 2, 40);
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.level_widths(), vec![10, 20, 40]);
    }

    #[test]
    fn test_level_widths_max_not_reached_exactly() {
        let cfg = config(20, 2, 50_000);
        let widths = cfg.level_widths();
        assert_eq!(widths.first(), Some(&20));
        assert_eq!(widths.last(), Some(&40_960));
        assert_eq!(widths.len(), 12);
    }

    #[test]
    fn test_single_level() {
        let cfg = config(10, 3, 10);
        assert_eq!(cfg.level_widths(), vec![10]);
    }

    #[test]
    fn test_reject_factor_one() {
        let err = config(10, 1, 40).validate().unwrap_err();
        assert!(matches!(err, SummaryError::InvalidConfig(_)));
        // Never loops, even when not validated
        assert_eq!(config(10, 1, 40).level_widths(), vec![10]);
    }

    #[test]
    fn test_reject_zero_start_and_small_max() {
        assert!(config(0, 2, 40).validate().is_err());
        assert!(config(50, 2, 40).validate().is_err());
    }

    #[test]
    fn test_reject_bad_categories() {
        let cfg = PyramidConfig::new(10, 2, 40);
        assert!(cfg.validate().is_err());

        let cfg = PyramidConfig::new(10, 2, 40).with_category_list("A;B;A");
        assert!(cfg.validate().unwrap_err().to_string().contains("duplicate"));

        let cfg = PyramidConfig::new(10, 2, 40).with_category_list("A;;B");
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_category_list() {
        let cfg = PyramidConfig::new(10, 2, 40).with_category_list("A;B;_other_");
        assert_eq!(cfg.categories, vec!["A", "B", "_other_"]);
        assert_eq!(cfg.other_category.as_deref(), Some(DEFAULT_OTHER_CATEGORY));
    }

    #[test]
    fn test_width_overflow_terminates() {
        let cfg = config(u64::MAX / 2, 4, u64::MAX);
        assert_eq!(cfg.level_widths(), vec![u64::MAX / 2]);
    }
}
