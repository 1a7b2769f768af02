//! Buffer size constants for streaming I/O.
//!
//! Summary files are written through one buffered writer per
//! (chromosome, level) pair, so the per-sink buffer is kept small.

/// Default input buffer size (256 KB).
/// Good balance for reading sorted record files.
pub const DEFAULT_INPUT_BUFFER: usize = 256 * 1024;

/// Low-memory input buffer size (64 KB).
pub const LOW_MEMORY_INPUT_BUFFER: usize = 64 * 1024;

/// Default buffer per summary sink (64 KB).
/// A pyramid holds one of these per level.
pub const DEFAULT_SINK_BUFFER: usize = 64 * 1024;

/// Low-memory buffer per summary sink (8 KB).
pub const LOW_MEMORY_SINK_BUFFER: usize = 8 * 1024;

/// Default output buffer for decoded text output (2 MB).
pub const DEFAULT_OUTPUT_BUFFER: usize = 2 * 1024 * 1024;

/// Default line buffer capacity (1 KB).
pub const DEFAULT_LINE_BUFFER: usize = 1024;

/// Returns the appropriate input buffer size based on low_memory flag.
#[inline]
pub const fn input_buffer_size(low_memory: bool) -> usize {
    if low_memory {
        LOW_MEMORY_INPUT_BUFFER
    } else {
        DEFAULT_INPUT_BUFFER
    }
}

/// Returns the appropriate per-sink buffer size based on low_memory flag.
#[inline]
pub const fn sink_buffer_size(low_memory: bool) -> usize {
    if low_memory {
        LOW_MEMORY_SINK_BUFFER
    } else {
        DEFAULT_SINK_BUFFER
    }
}
