//! Conversion between global offsets and window coordinates.
//!
//! A [`Layout`] splits a backing store of `len` bytes into consecutive chunks of the nominal
//! window length. Chunk `i` starts at `i * nominal`; the final chunk may be shorter. All
//! conversions are bounds checked against the store length so that a coordinate pointing past
//! the end of the data is rejected before any I/O takes place.

use crate::Result;

/// Chunk geometry of a backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Nominal window length, never zero
    nominal: u64,
    /// Total length of the backing store
    len: u64,
}

impl Layout {
    /// Create a layout for a store of `len` bytes cut into chunks of `nominal` bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidArgument`] if `nominal` is zero.
    pub fn new(nominal: u64, len: u64) -> Result<Layout> {
        if nominal == 0 {
            return Err(crate::Error::InvalidArgument(
                "window length must be greater than zero".to_string(),
            ));
        }
        Ok(Layout { nominal, len })
    }

    /// The nominal window length.
    #[must_use]
    pub fn nominal(&self) -> u64 {
        self.nominal
    }

    /// The length of the backing store this layout describes.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Returns `true` if the backing store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of chunks needed to cover the store; an empty store still has one empty chunk.
    #[must_use]
    pub fn chunk_count(&self) -> u64 {
        self.len.div_ceil(self.nominal).max(1)
    }

    /// Index of the chunk containing `offset`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `offset` is beyond the store length.
    pub fn chunk_index(&self, offset: u64) -> Result<u64> {
        self.check(offset)?;
        Ok(offset / self.nominal)
    }

    /// Offset of `offset` relative to the start of its chunk.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `offset` is beyond the store length.
    pub fn local_offset(&self, offset: u64) -> Result<u64> {
        self.check(offset)?;
        Ok(offset % self.nominal)
    }

    /// Global offset at which chunk `index` begins.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the chunk starts beyond the store length.
    pub fn chunk_start(&self, index: u64) -> Result<u64> {
        let Some(start) = index.checked_mul(self.nominal) else {
            return Err(out_of_bounds_error!("chunk {} overflows", index));
        };
        self.check(start)?;
        Ok(start)
    }

    /// Length of chunk `index`, accounting for the truncated tail chunk.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the chunk starts beyond the store length.
    pub fn chunk_len(&self, index: u64) -> Result<u64> {
        let start = self.chunk_start(index)?;
        Ok(self.nominal.min(self.len - start))
    }

    /// Validate that `[offset, offset + len)` lies inside the store.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the range ends past the store length.
    pub fn check_range(&self, offset: u64, len: u64) -> Result<u64> {
        match offset.checked_add(len) {
            Some(end) if end <= self.len => Ok(end),
            _ => Err(out_of_bounds_error!(
                "range {:#x}+{:#x} exceeds length {:#x}",
                offset,
                len,
                self.len
            )),
        }
    }

    fn check(&self, offset: u64) -> Result<()> {
        if offset > self.len {
            return Err(out_of_bounds_error!(
                "offset {:#x} exceeds length {:#x}",
                offset,
                self.len
            ));
        }
        Ok(())
    }
}
