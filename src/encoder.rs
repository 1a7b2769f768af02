//! Block encoders: count vector <-> fixed-size byte block.
//!
//! Every encoder produces the same number of bytes for every block of a
//! given configuration, so consumers can seek to block `i` at offset
//! `i * block_len()`.

use crate::error::{Result, SummaryError};

/// Alphabet of the base-64 digits used by [`MultiCatCountEncoder`].
const B64_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Default number of base-64 digits per category count.
pub const DEFAULT_ENCODER_LEN: usize = 4;

/// Turns a count vector into a fixed-size block.
pub trait BlockEncoder: Send + Sync {
    /// Encode `counts`, appending exactly `block_len()` bytes to `out`.
    fn encode_into(&self, counts: &[u64], out: &mut Vec<u8>) -> Result<()>;

    /// Size in bytes of one encoded block.
    fn block_len(&self) -> usize;

    fn encode(&self, counts: &[u64]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.block_len());
        self.encode_into(counts, &mut out)?;
        Ok(out)
    }
}

/// Reads a block written by the matching encoder back into counts.
pub trait BlockDecoder {
    fn decode(&self, block: &[u8]) -> Result<Vec<u64>>;
}

/// The `MultiCatCount` scheme: each count as `encoder_len` base-64 digits,
/// most significant digit first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiCatCountEncoder {
    cat_count: usize,
    encoder_len: usize,
}

impl MultiCatCountEncoder {
    pub fn new(cat_count: usize, encoder_len: usize) -> Self {
        Self {
            cat_count,
            encoder_len,
        }
    }

    pub fn cat_count(&self) -> usize {
        self.cat_count
    }

    pub fn encoder_len(&self) -> usize {
        self.encoder_len
    }

    /// Largest count representable in `encoder_len` digits.
    pub fn max_count(&self) -> u64 {
        if self.encoder_len >= 11 {
            u64::MAX
        } else {
            (1u64 << (6 * self.encoder_len as u32)) - 1
        }
    }

    fn decode_digits(digits: &[u8]) -> Result<u64> {
        let mut value = 0u64;
        for &b in digits {
            let v = Self::digit_value(b).ok_or_else(|| {
                SummaryError::Encoder(format!("invalid base-64 digit '{}'", b as char))
            })?;
            value = (value << 6) | v;
        }
        Ok(value)
    }

    #[inline]
    fn digit_value(b: u8) -> Option<u64> {
        let v = match b {
            b'A'..=b'Z' => b - b'A',
            b'a'..=b'z' => b - b'a' + 26,
            b'0'..=b'9' => b - b'0' + 52,
            b'+' => 62,
            b'/' => 63,
            _ => return None,
        };
        Some(v as u64)
    }
}

impl BlockEncoder for MultiCatCountEncoder {
    fn encode_into(&self, counts: &[u64], out: &mut Vec<u8>) -> Result<()> {
        if self.encoder_len == 0 {
            return Err(SummaryError::Encoder("encoder length is 0".to_string()));
        }
        if counts.len() != self.cat_count {
            return Err(SummaryError::Encoder(format!(
                "expected {} category counts, got {}",
                self.cat_count,
                counts.len()
            )));
        }
        let max = self.max_count();
        for &count in counts {
            if count > max {
                return Err(SummaryError::Encoder(format!(
                    "count {} does not fit in {} base-64 digits",
                    count, self.encoder_len
                )));
            }
            for digit in (0..self.encoder_len).rev() {
                let shift = 6 * digit as u32;
                let v = if shift >= 64 { 0 } else { (count >> shift) & 0x3f };
                out.push(B64_ALPHABET[v as usize]);
            }
        }
        Ok(())
    }

    fn block_len(&self) -> usize {
        self.cat_count * self.encoder_len
    }
}

impl BlockDecoder for MultiCatCountEncoder {
    fn decode(&self, block: &[u8]) -> Result<Vec<u64>> {
        if self.encoder_len == 0 {
            return Err(SummaryError::Encoder("encoder length is 0".to_string()));
        }
        if block.len() != self.block_len() {
            return Err(SummaryError::Encoder(format!(
                "block of {} bytes, expected {}",
                block.len(),
                self.block_len()
            )));
        }
        block
            .chunks_exact(self.encoder_len)
            .map(Self::decode_digits)
            .collect()
    }
}

/// Little-endian `u32` per category. Lossless for counts below 2^32 and
/// convenient for binary consumers and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawCountEncoder {
    cat_count: usize,
}

impl RawCountEncoder {
    pub fn new(cat_count: usize) -> Self {
        Self { cat_count }
    }
}

impl BlockEncoder for RawCountEncoder {
    fn encode_into(&self, counts: &[u64], out: &mut Vec<u8>) -> Result<()> {
        if counts.len() != self.cat_count {
            return Err(SummaryError::Encoder(format!(
                "expected {} category counts, got {}",
                self.cat_count,
                counts.len()
            )));
        }
        for &count in counts {
            let v = u32::try_from(count).map_err(|_| {
                SummaryError::Encoder(format!("count {} exceeds u32 range", count))
            })?;
            out.extend_from_slice(&v.to_le_bytes());
        }
        Ok(())
    }

    fn block_len(&self) -> usize {
        self.cat_count * 4
    }
}

impl BlockDecoder for RawCountEncoder {
    fn decode(&self, block: &[u8]) -> Result<Vec<u64>> {
        if block.len() != self.block_len() {
            return Err(SummaryError::Encoder(format!(
                "block of {} bytes, expected {}",
                block.len(),
                self.block_len()
            )));
        }
        Ok(block
            .chunks_exact(4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as u64)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multicat_known_values() {
        let enc = MultiCatCountEncoder::new(3, 4);
        assert_eq!(enc.block_len(), 12);
        let bytes = enc.encode(&[0, 1, 64]).unwrap();
        assert_eq!(&bytes, b"AAAAAAABAABA");
    }

    #[test]
    fn test_multicat_max_count() {
        let enc = MultiCatCountEncoder::new(1, 4);
        assert_eq!(enc.max_count(), 16_777_215);
        assert_eq!(enc.encode(&[16_777_215]).unwrap(), b"////");
        let err = enc.encode(&[16_777_216]).unwrap_err();
        assert!(matches!(err, SummaryError::Encoder(_)));
    }

    #[test]
    fn test_multicat_decode() {
        let enc = MultiCatCountEncoder::new(2, 3);
        let bytes = enc.encode(&[4095, 77]).unwrap();
        assert_eq!(bytes.len(), 6);
        assert_eq!(enc.decode(&bytes).unwrap(), vec![4095, 77]);
        assert!(enc.decode(b"AA*AAA").is_err());
        assert!(enc.decode(b"AAA").is_err());
    }

    #[test]
    fn test_zero_encoder_len_rejected() {
        let enc = MultiCatCountEncoder::new(2, 0);
        let mut out = Vec::new();
        let err = enc.encode_into(&[0, 0], &mut out).unwrap_err();
        assert!(matches!(err, SummaryError::Encoder(_)));
        assert!(out.is_empty());
        assert!(enc.decode(b"").is_err());
    }

    #[test]
    fn test_wrong_vector_length() {
        let enc = MultiCatCountEncoder::new(2, 4);
        assert!(enc.encode(&[1, 2, 3]).is_err());
        let raw = RawCountEncoder::new(2);
        assert!(raw.encode(&[1]).is_err());
    }

    #[test]
    fn test_raw_encoder() {
        let raw = RawCountEncoder::new(2);
        let bytes = raw.encode(&[1, 258]).unwrap();
        assert_eq!(bytes, vec![1, 0, 0, 0, 2, 1, 0, 0]);
        assert_eq!(raw.decode(&bytes).unwrap(), vec![1, 258]);
        assert!(raw.encode(&[0, u64::from(u32::MAX) + 1]).is_err());
    }

    #[test]
    fn test_fixed_width_independent_of_values() {
        let enc = MultiCatCountEncoder::new(4, 4);
        let a = enc.encode(&[0, 0, 0, 0]).unwrap();
        let b = enc.encode(&[9, 100_000, 3, 1]).unwrap();
        assert_eq!(a.len(), b.len());
        assert_eq!(a, enc.encode(&[0, 0, 0, 0]).unwrap());
    }
}
