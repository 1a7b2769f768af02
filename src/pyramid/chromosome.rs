//! Per-chromosome pyramid of zoom levels.

use super::level::ScaleLevel;
use crate::catalog::CategoryCatalog;
use crate::config::PyramidConfig;
use crate::encoder::BlockEncoder;
use crate::error::{Result, SummaryError};
use crate::sink::{BlockSink, SinkFactory};

/// Immutable description of the levels every chromosome gets.
///
/// Each chromosome run instantiates its own pyramid from the template, so
/// no mutable state is carried over between chromosomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelTemplate {
    widths: Vec<u64>,
    category_count: usize,
}

impl LevelTemplate {
    /// Build a template from strictly increasing, non-zero widths.
    pub fn new(widths: Vec<u64>, category_count: usize) -> Result<Self> {
        if widths.is_empty() {
            return Err(SummaryError::InvalidConfig(
                "at least one zoom level is required".to_string(),
            ));
        }
        if widths[0] == 0 || widths.windows(2).any(|w| w[0] >= w[1]) {
            return Err(SummaryError::InvalidConfig(format!(
                "block widths must be positive and strictly increasing: {:?}",
                widths
            )));
        }
        Ok(Self {
            widths,
            category_count,
        })
    }

    /// Validate `config` and derive its level template.
    pub fn from_config(config: &PyramidConfig) -> Result<Self> {
        config.validate()?;
        Self::new(config.level_widths(), config.categories.len())
    }

    pub fn widths(&self) -> &[u64] {
        &self.widths
    }

    pub fn category_count(&self) -> usize {
        self.category_count
    }

    /// Open one sink per level and return a fresh pyramid for `chrom`.
    pub fn instantiate<F: SinkFactory>(
        &self,
        chrom: &str,
        factory: &F,
    ) -> Result<ChromosomePyramid<F::Sink>> {
        let mut levels = Vec::with_capacity(self.widths.len());
        for &width in &self.widths {
            let sink = factory.open(chrom, width)?;
            levels.push(ScaleLevel::new(width, self.category_count, sink));
        }
        Ok(ChromosomePyramid {
            chrom: chrom.to_string(),
            last_position: None,
            levels,
            records: 0,
            unresolved: 0,
        })
    }
}

/// Zoom-level state of one chromosome while its records stream in.
pub struct ChromosomePyramid<S: BlockSink> {
    chrom: String,
    /// `None` until the first record
    last_position: Option<u64>,
    levels: Vec<ScaleLevel<S>>,
    records: u64,
    unresolved: u64,
}

/// Totals reported by a finalized pyramid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PyramidSummary {
    pub chrom: String,
    pub records: u64,
    pub unresolved: u64,
    /// Blocks written per level, finest first
    pub blocks: Vec<u64>,
}

impl<S: BlockSink> ChromosomePyramid<S> {
    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    pub fn last_position(&self) -> Option<u64> {
        self.last_position
    }

    pub fn levels(&self) -> &[ScaleLevel<S>] {
        &self.levels
    }

    pub fn records(&self) -> u64 {
        self.records
    }

    /// Add one record. Positions must be strictly increasing.
    ///
    /// Values that resolve to no category are not counted anywhere; they
    /// are tallied in the unresolved counter only.
    pub fn add<E: BlockEncoder + ?Sized>(
        &mut self,
        position: u64,
        value: &str,
        catalog: &CategoryCatalog,
        encoder: &E,
    ) -> Result<()> {
        if let Some(last) = self.last_position {
            if position <= last {
                return Err(SummaryError::OutOfOrderPosition {
                    chrom: self.chrom.clone(),
                    position,
                    last,
                });
            }
        }

        // All levels advance before any counts, so a failed close leaves
        // the record uncounted everywhere.
        for level in &mut self.levels {
            level.advance_to(position, encoder)?;
        }

        let category = catalog.resolve(value);
        for level in &mut self.levels {
            level.increment(category);
        }

        if category.is_none() {
            self.unresolved += 1;
        }
        self.records += 1;
        self.last_position = Some(position);
        Ok(())
    }

    /// Write the trailing block of every level and close all sinks.
    ///
    /// Every level is finalized even if an earlier one fails; the first
    /// error is returned.
    pub fn finalize<E: BlockEncoder + ?Sized>(self, encoder: &E) -> Result<PyramidSummary> {
        let mut blocks = Vec::with_capacity(self.levels.len());
        let mut first_err = None;

        for level in self.levels {
            match level.finalize(encoder) {
                Ok(n) => blocks.push(n),
                Err(e) => {
                    blocks.push(0);
                    first_err.get_or_insert(e);
                }
            }
        }

        if let Some(e) = first_err {
            return Err(e);
        }

        Ok(PyramidSummary {
            chrom: self.chrom,
            records: self.records,
            unresolved: self.unresolved,
            blocks,
        })
    }
}
