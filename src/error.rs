//! Error type shared by the summary pipeline.

use std::io;
use thiserror::Error;

/// Errors that can occur while building or reading summaries.
#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A position did not strictly exceed the previous position on its chromosome.
    #[error("Positions must be strictly increasing: {position} follows {last} on {chrom}")]
    OutOfOrderPosition {
        chrom: String,
        position: u64,
        last: u64,
    },

    /// A chromosome label reappeared after its run was closed.
    #[error("Chromosome '{chrom}' was seen earlier (chromosomes must be contiguous)")]
    ChromosomeRepeat { chrom: String },

    #[error("Encoder failure: {0}")]
    Encoder(String),

    #[error("Summary build aborted by an earlier error")]
    Aborted,
}

pub type Result<T> = std::result::Result<T, SummaryError>;

impl SummaryError {
    /// True for violations of the sorted-input contract.
    pub fn is_ordering_violation(&self) -> bool {
        matches!(
            self,
            SummaryError::OutOfOrderPosition { .. } | SummaryError::ChromosomeRepeat { .. }
        )
    }
}
