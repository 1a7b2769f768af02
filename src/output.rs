//! Reading summary files back and printing them as count tables.
//!
//! Uses itoa for integer formatting to avoid allocation in the hot path.

use crate::buffers::DEFAULT_OUTPUT_BUFFER;
use crate::encoder::BlockDecoder;
use crate::error::{Result, SummaryError};
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Decode every block of a summary file.
///
/// The file must be a whole number of `block_len`-byte blocks.
pub fn read_summary_file<P, D>(path: P, block_len: usize, decoder: &D) -> Result<Vec<Vec<u64>>>
where
    P: AsRef<Path>,
    D: BlockDecoder + ?Sized,
{
    let file = File::open(path.as_ref())?;
    if file.metadata()?.len() == 0 {
        return Ok(Vec::new());
    }
    let mmap = unsafe { Mmap::map(&file)? };
    decode_blocks(&mmap, block_len, decoder)
}

/// Decode a buffer of concatenated fixed-size blocks.
pub fn decode_blocks<D: BlockDecoder + ?Sized>(
    data: &[u8],
    block_len: usize,
    decoder: &D,
) -> Result<Vec<Vec<u64>>> {
    if block_len == 0 {
        return Err(SummaryError::Encoder("block length is 0".to_string()));
    }
    if data.len() % block_len != 0 {
        return Err(SummaryError::Encoder(format!(
            "summary of {} bytes is not a multiple of the block length {}",
            data.len(),
            block_len
        )));
    }
    data.chunks_exact(block_len)
        .map(|block| decoder.decode(block))
        .collect()
}

/// Tab-separated writer for decoded blocks: `chrom start end count...`.
pub struct CountTableWriter<W: Write> {
    writer: BufWriter<W>,
    itoa_buf: itoa::Buffer,
}

impl<W: Write> CountTableWriter<W> {
    /// Create a new writer with default 2MB buffer.
    pub fn new(output: W) -> Self {
        Self::with_capacity(DEFAULT_OUTPUT_BUFFER, output)
    }

    pub fn with_capacity(capacity: usize, output: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(capacity, output),
            itoa_buf: itoa::Buffer::new(),
        }
    }

    /// Write the header line: `#chrom start end <labels...>`.
    pub fn write_header(&mut self, labels: &[String]) -> Result<()> {
        self.writer.write_all(b"#chrom\tstart\tend")?;
        for label in labels {
            self.writer.write_all(b"\t")?;
            self.writer.write_all(label.as_bytes())?;
        }
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Write block `index` of a level of width `block_width`.
    #[inline]
    pub fn write_block(
        &mut self,
        chrom: &str,
        block_width: u64,
        index: u64,
        counts: &[u64],
    ) -> Result<()> {
        let start = index * block_width;
        self.writer.write_all(chrom.as_bytes())?;
        self.writer.write_all(b"\t")?;
        self.writer
            .write_all(self.itoa_buf.format(start).as_bytes())?;
        self.writer.write_all(b"\t")?;
        self.writer
            .write_all(self.itoa_buf.format(start + block_width).as_bytes())?;
        for &count in counts {
            self.writer.write_all(b"\t")?;
            self.writer.write_all(self.itoa_buf.format(count).as_bytes())?;
        }
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Write all blocks of one level, optionally skipping all-zero blocks.
    pub fn write_level(
        &mut self,
        chrom: &str,
        block_width: u64,
        blocks: &[Vec<u64>],
        skip_empty: bool,
    ) -> Result<usize> {
        let mut written = 0;
        for (index, counts) in blocks.iter().enumerate() {
            if skip_empty && counts.iter().all(|&c| c == 0) {
                continue;
            }
            self.write_block(chrom, block_width, index as u64, counts)?;
            written += 1;
        }
        Ok(written)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
