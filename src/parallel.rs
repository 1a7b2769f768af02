//! Parallel summary building for input already partitioned by chromosome.
//!
//! Each chromosome owns a disjoint pyramid and disjoint sinks, so runs
//! are independent once the input is split. Only the order of positions
//! inside a run matters.

use crate::catalog::CategoryCatalog;
use crate::config::PyramidConfig;
use crate::encoder::BlockEncoder;
use crate::error::{Result, SummaryError};
use crate::pyramid::{LevelTemplate, PyramidSummary, SummaryStats};
use crate::reader::Record;
use crate::sink::SinkFactory;
use rayon::prelude::*;
use rustc_hash::FxHashSet;

/// Minimum number of runs before enabling parallelization.
pub const PARALLEL_THRESHOLD: usize = 2;

/// All records of one chromosome, ordered by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChromosomeRun {
    pub chrom: String,
    pub entries: Vec<(u64, String)>,
}

impl ChromosomeRun {
    pub fn new(chrom: impl Into<String>) -> Self {
        Self {
            chrom: chrom.into(),
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, position: u64, value: impl Into<String>) {
        self.entries.push((position, value.into()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Split a chromosome-grouped record sequence into runs.
///
/// Fails with `ChromosomeRepeat` if a chromosome appears in more than
/// one contiguous group.
pub fn partition_by_chromosome<I>(records: I) -> Result<Vec<ChromosomeRun>>
where
    I: IntoIterator<Item = Result<Record>>,
{
    let mut runs: Vec<ChromosomeRun> = Vec::new();
    let mut seen: FxHashSet<String> = FxHashSet::default();

    for record in records {
        let record = record?;
        let same = runs
            .last()
            .map(|run| run.chrom == record.chrom)
            .unwrap_or(false);
        if !same {
            if !seen.insert(record.chrom.clone()) {
                return Err(SummaryError::ChromosomeRepeat { chrom: record.chrom });
            }
            runs.push(ChromosomeRun::new(record.chrom.clone()));
        }
        if let Some(run) = runs.last_mut() {
            run.push(record.position, record.value);
        }
    }

    Ok(runs)
}

fn summarise_run<F: SinkFactory, E: BlockEncoder>(
    run: &ChromosomeRun,
    template: &LevelTemplate,
    catalog: &CategoryCatalog,
    factory: &F,
    encoder: &E,
) -> Result<PyramidSummary> {
    log::info!("Start processing chromosome {}", run.chrom);
    let mut pyramid = template.instantiate(&run.chrom, factory)?;
    for (position, value) in &run.entries {
        if let Err(e) = pyramid.add(*position, value, catalog, encoder) {
            if let Err(fe) = pyramid.finalize(encoder) {
                log::warn!("Failed to finalize pyramid after error: {}", fe);
            }
            return Err(e);
        }
    }
    pyramid.finalize(encoder)
}

/// Build the pyramids of all `runs`, one rayon task per chromosome.
///
/// Runs are validated for duplicate labels before any sink is opened. The
/// first error (in run order) is returned; other runs still complete.
pub fn build_partitioned<F, E>(
    config: &PyramidConfig,
    runs: &[ChromosomeRun],
    factory: &F,
    encoder: &E,
) -> Result<SummaryStats>
where
    F: SinkFactory,
    E: BlockEncoder,
{
    let template = LevelTemplate::from_config(config)?;
    let catalog = CategoryCatalog::from_config(config);

    let mut seen = FxHashSet::default();
    for run in runs {
        if !seen.insert(run.chrom.as_str()) {
            return Err(SummaryError::ChromosomeRepeat {
                chrom: run.chrom.clone(),
            });
        }
    }

    let results: Vec<Result<PyramidSummary>> = if runs.len() >= PARALLEL_THRESHOLD {
        runs.par_iter()
            .map(|run| summarise_run(run, &template, &catalog, factory, encoder))
            .collect()
    } else {
        runs.iter()
            .map(|run| summarise_run(run, &template, &catalog, factory, encoder))
            .collect()
    };

    let mut stats = SummaryStats::default();
    for result in results {
        stats.absorb(&result?);
    }
    Ok(stats)
}
