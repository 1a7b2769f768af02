//! Category label to count-vector index mapping.

use crate::config::PyramidConfig;
use rustc_hash::FxHashMap;

/// Static mapping from category label to a dense index.
///
/// Index order is the order in which labels were configured, which is
/// also the order of counts inside every encoded block. An optional
/// catch-all index receives values that match no label.
#[derive(Debug, Clone)]
pub struct CategoryCatalog {
    labels: Vec<String>,
    index: FxHashMap<String, usize>,
    other_index: Option<usize>,
}

impl CategoryCatalog {
    /// Build a catalog from labels. `other` names the catch-all label; it
    /// only takes effect if it is one of `labels`.
    pub fn new<I, S>(labels: I, other: Option<&str>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        let mut index = FxHashMap::default();
        for (i, label) in labels.iter().enumerate() {
            index.entry(label.clone()).or_insert(i);
        }
        let other_index = other.and_then(|o| index.get(o).copied());

        Self {
            labels,
            index,
            other_index,
        }
    }

    pub fn from_config(config: &PyramidConfig) -> Self {
        Self::new(config.categories.iter().cloned(), config.other_category.as_deref())
    }

    /// Resolve a raw value: exact match, else the catch-all, else `None`.
    #[inline]
    pub fn resolve(&self, value: &str) -> Option<usize> {
        self.index.get(value).copied().or(self.other_index)
    }

    /// Number of categories (length of every count vector).
    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn other_index(&self) -> Option<usize> {
        self.other_index
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}
