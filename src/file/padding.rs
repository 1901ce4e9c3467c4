//! Filler emitted after padded writes.
//!
//! With padding enabled, every write on the padded path is followed by
//! `alignment - (written % alignment)` copies of the fill byte. The filler length is never zero:
//! a write whose length is already a multiple of the alignment still receives a full block of
//! `alignment` filler bytes.

use crate::Result;

/// Padding configuration of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Padding {
    alignment: u64,
    fill: u8,
}

impl Padding {
    /// Create a padding configuration.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidArgument`] if `alignment` is zero.
    pub fn new(alignment: u64, fill: u8) -> Result<Padding> {
        if alignment == 0 {
            return Err(crate::Error::InvalidArgument(
                "padding alignment must be greater than zero".to_string(),
            ));
        }
        Ok(Padding { alignment, fill })
    }

    /// The alignment length.
    #[must_use]
    pub fn alignment(&self) -> u64 {
        self.alignment
    }

    /// The byte used as filler.
    #[must_use]
    pub fn fill(&self) -> u8 {
        self.fill
    }

    /// Number of filler bytes following a write of `written` bytes.
    #[must_use]
    pub fn pad_len(&self, written: u64) -> u64 {
        pad_len(written, self.alignment)
    }
}

/// Filler length after `written` bytes for the given non-zero `alignment`.
///
/// The result is always in `1..=alignment`.
///
/// # Examples
///
/// ```rust
/// use chunkio::file::pad_len;
///
/// assert_eq!(pad_len(15, 20), 5);
/// assert_eq!(pad_len(21, 20), 19);
/// assert_eq!(pad_len(20, 20), 20);
/// ```
#[must_use]
pub fn pad_len(written: u64, alignment: u64) -> u64 {
    alignment - (written % alignment)
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case(15, 20, 5)]
    #[case(21, 20, 19)]
    #[case(20, 20, 20)]
    #[case(0, 20, 20)]
    #[case(1, 16, 15)]
    #[case(7, 1, 1)]
    fn pad_lengths(#[case] written: u64, #[case] alignment: u64, #[case] expected: u64) {
        assert_eq!(pad_len(written, alignment), expected);
    }

    #[test]
    fn pad_never_zero() {
        for alignment in 1..=32 {
            for written in 0..=128 {
                let pad = pad_len(written, alignment);
                assert!((1..=alignment).contains(&pad));
                assert_eq!((written + pad) % alignment, 0);
            }
        }
    }

    #[test]
    fn zero_alignment_rejected() {
        assert!(matches!(
            Padding::new(0, 0xFF),
            Err(crate::Error::InvalidArgument(_))
        ));
        let padding = Padding::new(16, 0xFF).unwrap();
        assert_eq!(padding.pad_len(1), 15);
        assert_eq!(padding.fill(), 0xFF);
    }
}
