//! Zoom-level pyramids over sorted categorical records.
//!
//! - [`ScaleLevel`]: one block width, its running counts and its sink
//! - [`ChromosomePyramid`]: every level of one chromosome
//! - [`PyramidDriver`]: routes a chromosome-grouped stream to pyramids
//!
//! Memory is O(levels × categories) regardless of input size.

pub mod chromosome;
pub mod driver;
pub mod level;

pub use chromosome::{ChromosomePyramid, LevelTemplate, PyramidSummary};
pub use driver::{PyramidDriver, SummaryStats, PROGRESS_INTERVAL};
pub use level::ScaleLevel;
