//! catzoom: multi-category density summaries for genome browsers
//!
//! Turns a chromosome-grouped, position-sorted stream of categorical
//! records into a pyramid of fixed-width count blocks per chromosome, one
//! summary file per (chromosome, block width).
//!
//! # Features
//!
//! - **Single pass**: O(levels × categories) memory, any input size
//! - **Fixed cadence**: block `i` of a level always covers
//!   `[i * width, (i + 1) * width)`, empty blocks included
//! - **Pluggable encoders**: `MultiCatCount` base-64 blocks or raw counts
//! - **Parallel builds** for input already partitioned by chromosome
//!
//! # Example
//!
//! ```rust,no_run
//! use catzoom::prelude::*;
//!
//! let config = PyramidConfig::new(20, 2, 50_000).with_category_list("A;B;_other_");
//! let encoder = MultiCatCountEncoder::new(config.categories.len(), 4);
//! let factory = DirectorySinkFactory::new("Summaries");
//!
//! let driver = PyramidDriver::new(&config, factory, encoder).unwrap();
//! let stats = driver.run(RecordReader::from_path("data.txt").unwrap()).unwrap();
//! println!("{}", stats);
//! ```

pub mod buffers;
pub mod catalog;
pub mod config;
pub mod encoder;
pub mod error;
pub mod manifest;
pub mod output;
pub mod parallel;
pub mod pyramid;
pub mod reader;
pub mod sink;

// Re-export commonly used types
pub use catalog::CategoryCatalog;
pub use config::PyramidConfig;
pub use error::{Result, SummaryError};
pub use pyramid::{ChromosomePyramid, LevelTemplate, PyramidDriver, ScaleLevel, SummaryStats};
pub use reader::{Record, RecordReader};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::catalog::CategoryCatalog;
    pub use crate::config::PyramidConfig;
    pub use crate::encoder::{BlockDecoder, BlockEncoder, MultiCatCountEncoder, RawCountEncoder};
    pub use crate::error::{Result, SummaryError};
    pub use crate::parallel::{build_partitioned, partition_by_chromosome, ChromosomeRun};
    pub use crate::pyramid::{LevelTemplate, PyramidDriver, SummaryStats};
    pub use crate::reader::{Record, RecordReader};
    pub use crate::sink::{BlockSink, DirectorySinkFactory, MemorySinkFactory, SinkFactory};
}
