//! Linear byte-sequence search over a backing store.
//!
//! Searching reads the store directly in bounded chunks rather than through the window cache,
//! so a scan never churns the cached window. Consecutive chunks overlap by
//! `pattern.len() - 1` bytes, which keeps matches that straddle a chunk boundary visible.

use log::trace;

use super::Backend;
use crate::Result;

/// Payload size of a single scan read, excluding the overlap carried between reads.
pub const SCAN_CHUNK_LEN: usize = 64 * 1024;

/// Decode a hex string such as `"FFFF00"` into the byte pattern it describes.
///
/// # Errors
/// Returns [`crate::Error::MalformedPattern`] for empty, odd-length or non-hex input.
///
/// # Examples
///
/// ```rust
/// use chunkio::file::decode_hex_pattern;
///
/// assert_eq!(decode_hex_pattern("09fF")?, vec![0x09, 0xFF]);
/// assert!(decode_hex_pattern("ABC").is_err());
/// # Ok::<(), chunkio::Error>(())
/// ```
pub fn decode_hex_pattern(pattern: &str) -> Result<Vec<u8>> {
    let bytes = hex::decode(pattern)
        .map_err(|e| malformed_pattern_error!("invalid hex pattern '{}': {}", pattern, e))?;

    if bytes.is_empty() {
        return Err(malformed_pattern_error!("{}", "the pattern is empty"));
    }

    Ok(bytes)
}

/// Position of the first occurrence of `pattern` in `haystack`.
#[must_use]
pub fn find_in_slice(haystack: &[u8], pattern: &[u8]) -> Option<usize> {
    if pattern.is_empty() || pattern.len() > haystack.len() {
        return None;
    }

    haystack
        .windows(pattern.len())
        .position(|candidate| candidate == pattern)
}

/// Scan `[from, len)` of `backend` for the first occurrence of `pattern`.
///
/// Candidate positions run from `from` up to and including `len - pattern.len()`. Each read
/// covers at most `chunk_len + pattern.len() - 1` bytes, and never more than `len - from`.
///
/// # Errors
/// Returns [`crate::Error::MalformedPattern`] for an empty pattern or `chunk_len == 0`, and any
/// error reported by the backend.
pub fn find_in_backend(
    backend: &mut dyn Backend,
    from: u64,
    len: u64,
    pattern: &[u8],
    chunk_len: usize,
) -> Result<Option<u64>> {
    if pattern.is_empty() {
        return Err(malformed_pattern_error!("{}", "the pattern is empty"));
    }
    if chunk_len == 0 {
        return Err(crate::Error::InvalidArgument(
            "scan chunk length must be greater than zero".to_string(),
        ));
    }

    let remaining = len.saturating_sub(from);
    if (pattern.len() as u64) > remaining {
        return Ok(None);
    }

    // never hold more than the searched range, however large the requested chunk
    let chunk_len = chunk_len.min(usize::try_from(remaining).unwrap_or(usize::MAX));
    let overlap = pattern.len() as u64 - 1;
    let buf_len = chunk_len.saturating_add(pattern.len() - 1);
    let mut buf = vec![0_u8; buf_len];
    let mut position = from;

    while position
        .checked_add(pattern.len() as u64)
        .is_some_and(|end| end <= len)
    {
        let count = (buf.len() as u64).min(len - position);
        let chunk = &mut buf[..count as usize];
        backend.read_at(position, chunk)?;
        trace!("scanning {:#x}+{:#x}", position, count);

        if let Some(found) = find_in_slice(chunk, pattern) {
            return Ok(Some(position + found as u64));
        }

        if position + count == len {
            break;
        }
        position += count - overlap;
    }

    Ok(None)
}
