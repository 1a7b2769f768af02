//! Output sinks for encoded blocks.
//!
//! A sink receives the blocks of one (chromosome, block width) pair in
//! index order. Sinks are opened by a [`SinkFactory`] when a pyramid is
//! instantiated and closed when it is finalized.

use crate::buffers::DEFAULT_SINK_BUFFER;
use crate::error::Result;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Prefix of every summary file name.
pub const SUMMARY_FILE_PREFIX: &str = "Summ_";

/// Append-only destination for the encoded blocks of one level.
pub trait BlockSink {
    fn write_block(&mut self, block: &[u8]) -> Result<()>;

    /// Flush and release the sink. Called once, after the last block.
    fn close(self) -> Result<()>
    where
        Self: Sized;
}

/// Opens one sink per (chromosome, block width).
///
/// `open` takes `&self` so one factory can serve pyramids built on
/// several threads.
pub trait SinkFactory: Sync {
    type Sink: BlockSink;

    fn open(&self, chrom: &str, block_width: u64) -> Result<Self::Sink>;
}

/// File name used for the summary of `chrom` at `block_width`.
pub fn summary_file_name(chrom: &str, block_width: u64) -> String {
    format!("{}{}_{}", SUMMARY_FILE_PREFIX, chrom, block_width)
}

/// Create `dir` if needed and delete any summary files left in it.
///
/// Returns the number of files removed.
pub fn prepare_output_dir<P: AsRef<Path>>(dir: P) -> Result<usize> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if name.to_string_lossy().starts_with(SUMMARY_FILE_PREFIX) && entry.file_type()?.is_file()
        {
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    log::debug!("Removed {} old summary files from {}", removed, dir.display());
    Ok(removed)
}

/// Writes each sink to `<dir>/Summ_<chrom>_<width>`.
#[derive(Debug, Clone)]
pub struct DirectorySinkFactory {
    dir: PathBuf,
    buffer_size: usize,
}

impl DirectorySinkFactory {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            dir: dir.into(),
            buffer_size: DEFAULT_SINK_BUFFER,
        }
    }

    /// Set per-sink buffer size (builder pattern).
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the summary file for `chrom` at `block_width`.
    pub fn path_for(&self, chrom: &str, block_width: u64) -> PathBuf {
        self.dir.join(summary_file_name(chrom, block_width))
    }
}

impl SinkFactory for DirectorySinkFactory {
    type Sink = FileSink;

    fn open(&self, chrom: &str, block_width: u64) -> Result<FileSink> {
        let path = self.path_for(chrom, block_width);
        let file = File::create(&path)?;
        Ok(FileSink {
            writer: BufWriter::with_capacity(self.buffer_size, file),
            path,
        })
    }
}

/// Buffered summary file.
pub struct FileSink {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl FileSink {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BlockSink for FileSink {
    #[inline]
    fn write_block(&mut self, block: &[u8]) -> Result<()> {
        self.writer.write_all(block)?;
        Ok(())
    }

    fn close(mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

type BlockStore = BTreeMap<(String, u64), Vec<Vec<u8>>>;

/// Keeps closed sinks in memory, keyed by (chromosome, block width).
///
/// Blocks become visible once the owning pyramid is finalized.
#[derive(Debug, Clone, Default)]
pub struct MemorySinkFactory {
    store: Arc<Mutex<BlockStore>>,
}

impl MemorySinkFactory {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BlockStore> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Blocks written for `chrom` at `block_width`, in index order.
    pub fn blocks(&self, chrom: &str, block_width: u64) -> Option<Vec<Vec<u8>>> {
        self.lock().get(&(chrom.to_string(), block_width)).cloned()
    }

    /// All (chromosome, width) pairs that have been closed.
    pub fn keys(&self) -> Vec<(String, u64)> {
        self.lock().keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl SinkFactory for MemorySinkFactory {
    type Sink = MemorySink;

    fn open(&self, chrom: &str, block_width: u64) -> Result<MemorySink> {
        Ok(MemorySink {
            key: (chrom.to_string(), block_width),
            blocks: Vec::new(),
            store: Arc::clone(&self.store),
        })
    }
}

/// In-memory sink handed out by [`MemorySinkFactory`].
pub struct MemorySink {
    key: (String, u64),
    blocks: Vec<Vec<u8>>,
    store: Arc<Mutex<BlockStore>>,
}

impl BlockSink for MemorySink {
    fn write_block(&mut self, block: &[u8]) -> Result<()> {
        self.blocks.push(block.to_vec());
        Ok(())
    }

    fn close(self) -> Result<()> {
        let mut store = self
            .store
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        store.insert(self.key, self.blocks);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_file_name() {
        assert_eq!(summary_file_name("chr1", 20), "Summ_chr1_20");
    }

    #[test]
    fn test_file_sink_writes_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let factory = DirectorySinkFactory::new(dir.path()).with_buffer_size(16);

        let mut sink = factory.open("chr1", 10).unwrap();
        sink.write_block(b"AAAB").unwrap();
        sink.write_block(b"AABA").unwrap();
        let path = sink.path().to_path_buf();
        sink.close().unwrap();

        assert_eq!(path, dir.path().join("Summ_chr1_10"));
        assert_eq!(fs::read(path).unwrap(), b"AAABAABA");
    }

    #[test]
    fn test_prepare_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("Summaries");

        assert_eq!(prepare_output_dir(&out).unwrap(), 0);
        assert!(out.is_dir());

        fs::write(out.join("Summ_chr1_10"), b"old").unwrap();
        fs::write(out.join("Summ_chr2_10"), b"old").unwrap();
        fs::write(out.join("keep.txt"), b"keep").unwrap();

        assert_eq!(prepare_output_dir(&out).unwrap(), 2);
        assert!(!out.join("Summ_chr1_10").exists());
        assert!(out.join("keep.txt").exists());
    }

    #[test]
    fn test_memory_sink_visible_after_close() {
        let factory = MemorySinkFactory::new();
        let mut sink = factory.open("chrX", 100).unwrap();
        sink.write_block(&[1, 2]).unwrap();
        assert!(factory.blocks("chrX", 100).is_none());

        sink.close().unwrap();
        assert_eq!(factory.blocks("chrX", 100).unwrap(), vec![vec![1, 2]]);
        assert_eq!(factory.keys(), vec![("chrX".to_string(), 100)]);
    }
}
