//! Streaming reader for categorical position records.
//!
//! Input format: `chromosome \t position \t value`, one record per line,
//! no header. Blank lines and `#` comments are skipped; fields after the
//! third are ignored.

use crate::buffers::{DEFAULT_INPUT_BUFFER, DEFAULT_LINE_BUFFER};
use crate::error::{Result, SummaryError};
use memchr::memchr;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// One categorical observation at a chromosome position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub chrom: String,
    pub position: u64,
    pub value: String,
}

impl Record {
    pub fn new(chrom: impl Into<String>, position: u64, value: impl Into<String>) -> Self {
        Self {
            chrom: chrom.into(),
            position,
            value: value.into(),
        }
    }
}

/// Fast u64 parsing - no allocation, no error formatting.
///
/// Returns None if the input is empty, contains non-digit characters, or
/// overflows.
#[inline(always)]
pub fn parse_u64_fast(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() {
        return None;
    }
    let mut n: u64 = 0;
    for &b in bytes {
        let d = b.wrapping_sub(b'0');
        if d > 9 {
            return None;
        }
        n = n.checked_mul(10)?.checked_add(d as u64)?;
    }
    Some(n)
}

/// Split a record line into (chrom, position, value) without allocating.
#[inline]
pub fn parse_record_bytes(line: &[u8]) -> Option<(&[u8], u64, &[u8])> {
    let tab1 = memchr(b'\t', line)?;
    let chrom = &line[..tab1];

    let rest1 = &line[tab1 + 1..];
    let tab2 = memchr(b'\t', rest1)?;
    let position = parse_u64_fast(&rest1[..tab2])?;

    let rest2 = &rest1[tab2 + 1..];
    let value_len = memchr(b'\t', rest2).unwrap_or(rest2.len());

    if chrom.is_empty() {
        return None;
    }
    Some((chrom, position, &rest2[..value_len]))
}

/// Check if a line carries no record (empty or comment).
#[inline(always)]
pub fn should_skip_line(line: &[u8]) -> bool {
    line.is_empty() || line[0] == b'#'
}

/// A streaming record reader.
pub struct RecordReader<R: Read> {
    reader: BufReader<R>,
    line_number: usize,
    buffer: Vec<u8>,
}

impl RecordReader<File> {
    /// Open a record file from a path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::with_capacity(file, DEFAULT_INPUT_BUFFER))
    }
}

impl<R: Read> RecordReader<R> {
    /// Create a new reader from any readable source.
    pub fn new(reader: R) -> Self {
        Self::with_capacity(reader, DEFAULT_INPUT_BUFFER)
    }

    /// Create a reader with custom buffer capacity.
    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self {
            reader: BufReader::with_capacity(capacity, reader),
            line_number: 0,
            buffer: Vec::with_capacity(DEFAULT_LINE_BUFFER),
        }
    }

    /// Number of lines consumed so far.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Read the next record.
    pub fn read_record(&mut self) -> Result<Option<Record>> {
        loop {
            self.buffer.clear();
            let bytes_read = self.reader.read_until(b'\n', &mut self.buffer)?;
            if bytes_read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let mut end = self.buffer.len();
            while end > 0 && (self.buffer[end - 1] == b'\n' || self.buffer[end - 1] == b'\r') {
                end -= 1;
            }
            let line = &self.buffer[..end];

            if should_skip_line(line) {
                continue;
            }

            return self.parse_line(line).map(Some);
        }
    }

    fn parse_line(&self, line: &[u8]) -> Result<Record> {
        let (chrom, position, value) = parse_record_bytes(line).ok_or_else(|| {
            SummaryError::Parse {
                line: self.line_number,
                message: format!(
                    "Expected 'chromosome<TAB>position<TAB>value', got '{}'",
                    String::from_utf8_lossy(line)
                ),
            }
        })?;

        Ok(Record {
            chrom: self.utf8(chrom, "chromosome")?,
            position,
            value: self.utf8(value, "value")?,
        })
    }

    fn utf8(&self, bytes: &[u8], field_name: &str) -> Result<String> {
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| SummaryError::Parse {
                line: self.line_number,
                message: format!("Invalid UTF-8 in {} field", field_name),
            })
    }

    /// Get an iterator over all records.
    pub fn records(self) -> RecordIter<R> {
        RecordIter { reader: self }
    }
}

/// Iterator over records.
pub struct RecordIter<R: Read> {
    reader: RecordReader<R>,
}

impl<R: Read> Iterator for RecordIter<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read_record().transpose()
    }
}

/// Parse records from a string (useful for testing).
pub fn parse_records(content: &str) -> Result<Vec<Record>> {
    RecordReader::new(content.as_bytes()).records().collect()
}
