//! One zoom level: fixed-width blocks of category counts.

use crate::encoder::BlockEncoder;
use crate::error::Result;
use crate::sink::BlockSink;

/// Aggregation state for a single block width.
///
/// Block `i` covers `[i * block_width, (i + 1) * block_width)`. The level
/// always holds the counts of the block ending at `block_end`; every
/// earlier block has already been written to the sink.
pub struct ScaleLevel<S: BlockSink> {
    block_width: u64,
    block_end: u64,
    counts: Vec<u64>,
    sink: S,
    blocks_written: u64,
    /// Reused encode buffer
    scratch: Vec<u8>,
}

impl<S: BlockSink> ScaleLevel<S> {
    pub fn new(block_width: u64, category_count: usize, sink: S) -> Self {
        debug_assert!(block_width > 0);
        Self {
            block_width,
            block_end: block_width,
            counts: vec![0; category_count],
            sink,
            blocks_written: 0,
            scratch: Vec::new(),
        }
    }

    #[inline]
    pub fn block_width(&self) -> u64 {
        self.block_width
    }

    /// Exclusive end of the block in progress.
    #[inline]
    pub fn block_end(&self) -> u64 {
        self.block_end
    }

    /// Counts of the block in progress.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn blocks_written(&self) -> u64 {
        self.blocks_written
    }

    /// Emit the current block and start the next one.
    pub fn close<E: BlockEncoder + ?Sized>(&mut self, encoder: &E) -> Result<()> {
        self.emit(encoder)?;
        self.block_end += self.block_width;
        self.counts.iter_mut().for_each(|c| *c = 0);
        Ok(())
    }

    /// Close every block that ends at or before `position`.
    ///
    /// Blocks without data are still written (all zero) so that block
    /// indices in the sink stay contiguous. Returns the number closed.
    #[inline]
    pub fn advance_to<E: BlockEncoder + ?Sized>(
        &mut self,
        position: u64,
        encoder: &E,
    ) -> Result<u64> {
        let mut closed = 0;
        while position >= self.block_end {
            self.close(encoder)?;
            closed += 1;
        }
        Ok(closed)
    }

    #[inline]
    pub fn increment(&mut self, category: Option<usize>) {
        if let Some(i) = category {
            self.counts[i] += 1;
        }
    }

    /// Emit the last (possibly partial) block and close the sink.
    ///
    /// The sink is closed even if the last block cannot be emitted, so the
    /// blocks written before it are kept. The emit error wins over a close
    /// error.
    pub fn finalize<E: BlockEncoder + ?Sized>(mut self, encoder: &E) -> Result<u64> {
        let emitted = self.emit(encoder);
        let closed = self.sink.close();
        emitted?;
        closed?;
        Ok(self.blocks_written)
    }

    fn emit<E: BlockEncoder + ?Sized>(&mut self, encoder: &E) -> Result<()> {
        self.scratch.clear();
        encoder.encode_into(&self.counts, &mut self.scratch)?;
        self.sink.write_block(&self.scratch)?;
        self.blocks_written += 1;
        Ok(())
    }
}
