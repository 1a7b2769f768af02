//! Stream controller: routes records to one pyramid per chromosome.

use super::chromosome::{ChromosomePyramid, LevelTemplate, PyramidSummary};
use crate::catalog::CategoryCatalog;
use crate::config::PyramidConfig;
use crate::encoder::BlockEncoder;
use crate::error::{Result, SummaryError};
use crate::reader::{Record, RecordReader};
use crate::sink::SinkFactory;
use rustc_hash::FxHashSet;
use std::io::Read;

/// Records between progress messages.
pub const PROGRESS_INTERVAL: u64 = 500_000;

/// Statistics from a summary build.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SummaryStats {
    pub records: u64,
    pub chromosomes: usize,
    /// Records whose value matched no category
    pub unresolved: u64,
    pub blocks_written: u64,
}

impl SummaryStats {
    pub(crate) fn absorb(&mut self, summary: &PyramidSummary) {
        self.records += summary.records;
        self.chromosomes += 1;
        self.unresolved += summary.unresolved;
        self.blocks_written += summary.blocks.iter().sum::<u64>();
    }
}

impl std::fmt::Display for SummaryStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Records: {}, Chromosomes: {}, Unresolved: {}, Blocks: {}",
            self.records, self.chromosomes, self.unresolved, self.blocks_written
        )
    }
}

/// Consumes a chromosome-grouped, position-sorted record stream in one pass.
///
/// A new pyramid is instantiated whenever the chromosome label changes; the
/// previous one is finalized first. A label may only form one contiguous
/// run. On any fatal error the active pyramid is finalized before the error
/// is returned, so all blocks written so far stay decodable.
pub struct PyramidDriver<F: SinkFactory, E: BlockEncoder> {
    template: LevelTemplate,
    catalog: CategoryCatalog,
    factory: F,
    encoder: E,
    active: Option<ChromosomePyramid<F::Sink>>,
    seen: FxHashSet<String>,
    stats: SummaryStats,
    /// Records accepted so far, including the active chromosome
    processed: u64,
    failed: bool,
}

impl<F: SinkFactory, E: BlockEncoder> PyramidDriver<F, E> {
    /// Validate `config` and create a driver writing through `factory`.
    pub fn new(config: &PyramidConfig, factory: F, encoder: E) -> Result<Self> {
        let template = LevelTemplate::from_config(config)?;
        let catalog = CategoryCatalog::from_config(config);
        Ok(Self::from_parts(template, catalog, factory, encoder))
    }

    pub fn from_parts(
        template: LevelTemplate,
        catalog: CategoryCatalog,
        factory: F,
        encoder: E,
    ) -> Self {
        log::debug!("Zoom level widths: {:?}", template.widths());
        Self {
            template,
            catalog,
            factory,
            encoder,
            active: None,
            seen: FxHashSet::default(),
            stats: SummaryStats::default(),
            processed: 0,
            failed: false,
        }
    }

    pub fn template(&self) -> &LevelTemplate {
        &self.template
    }

    pub fn catalog(&self) -> &CategoryCatalog {
        &self.catalog
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Statistics of the chromosomes finalized so far.
    pub fn stats(&self) -> &SummaryStats {
        &self.stats
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Label of the chromosome currently being summarised.
    pub fn active_chrom(&self) -> Option<&str> {
        self.active.as_ref().map(|p| p.chrom())
    }

    /// Feed one record.
    pub fn push(&mut self, chrom: &str, position: u64, value: &str) -> Result<()> {
        if self.failed {
            return Err(SummaryError::Aborted);
        }
        let result = self.route(chrom, position, value);
        if result.is_err() {
            self.failed = true;
            self.finalize_active_quietly();
        }
        result
    }

    /// Feed a parsed record.
    pub fn push_record(&mut self, record: &Record) -> Result<()> {
        self.push(&record.chrom, record.position, &record.value)
    }

    fn route(&mut self, chrom: &str, position: u64, value: &str) -> Result<()> {
        let switch = match &self.active {
            Some(p) => p.chrom() != chrom,
            None => true,
        };

        if switch {
            self.finalize_active()?;
            if !self.seen.insert(chrom.to_string()) {
                return Err(SummaryError::ChromosomeRepeat {
                    chrom: chrom.to_string(),
                });
            }
            log::info!("Start processing chromosome {}", chrom);
            self.active = Some(self.template.instantiate(chrom, &self.factory)?);
        }

        if let Some(pyramid) = self.active.as_mut() {
            pyramid.add(position, value, &self.catalog, &self.encoder)?;
        }

        self.processed += 1;
        if self.processed % PROGRESS_INTERVAL == 0 {
            log::info!("{} records processed", self.processed);
        }
        Ok(())
    }

    fn finalize_active(&mut self) -> Result<()> {
        if let Some(pyramid) = self.active.take() {
            let summary = pyramid.finalize(&self.encoder)?;
            log::info!(
                "Finished chromosome {}: {} records, blocks per level {:?}",
                summary.chrom,
                summary.records,
                summary.blocks
            );
            self.stats.absorb(&summary);
        }
        Ok(())
    }

    /// Finalize on an error path, where the original error takes precedence.
    fn finalize_active_quietly(&mut self) {
        if let Err(e) = self.finalize_active() {
            log::warn!("Failed to finalize pyramid after error: {}", e);
        }
    }

    /// Finalize the last chromosome and return the statistics.
    pub fn finish(mut self) -> Result<SummaryStats> {
        self.finalize_active()?;
        log::info!("{} records processed", self.processed);
        Ok(std::mem::take(&mut self.stats))
    }

    /// Drive the whole record stream from `reader`, then finish.
    pub fn run<R: Read>(mut self, reader: RecordReader<R>) -> Result<SummaryStats> {
        for record in reader.records() {
            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    self.finalize_active_quietly();
                    return Err(e);
                }
            };
            self.push_record(&record)?;
        }
        self.finish()
    }
}

impl<F: SinkFactory, E: BlockEncoder> Drop for PyramidDriver<F, E> {
    fn drop(&mut self) {
        if let Some(chrom) = self.active_chrom().map(str::to_string) {
            log::warn!("Driver dropped with chromosome {} still active; finalizing", chrom);
            self.finalize_active_quietly();
        }
    }
}
