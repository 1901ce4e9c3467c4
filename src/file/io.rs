//! Byte order aware encoding and decoding of fixed-width values.
//!
//! This module is the numeric codec consumed by [`crate::Stream`]: it turns a value into its
//! raw bytes for a given [`ByteOrder`] and back again. The stream itself never interprets
//! bytes; it only moves them between the backing store and this layer.
//!
//! # Key Components
//!
//! - [`ByteOrder`] - Little- or big-endian layout of multi-byte values
//! - [`Primitive`] - Trait implemented by every type the stream can read or write
//! - [`U24`] / [`I24`] - Range-checked 24-bit integers
//! - [`decode`] / [`encode`] - Slice based helpers with bounds checking
//!
//! ## Supported Types
//! - **Unsigned integers**: `u8`, `u16`, [`U24`], `u32`, `u64`
//! - **Signed integers**: `i8`, `i16`, [`I24`], `i32`, `i64`
//! - **Floating point**: `f32`, `f64`
//!
//! # Examples
//!
//! ```rust
//! use chunkio::{decode, encode, ByteOrder, U24};
//!
//! let bytes = encode(0x0102_u16, ByteOrder::Big);
//! assert_eq!(bytes, [0x01, 0x02]);
//!
//! let value: U24 = decode(&[0x03, 0x02, 0x01], ByteOrder::Little)?;
//! assert_eq!(value.get(), 0x01_02_03);
//! # Ok::<(), chunkio::Error>(())
//! ```

use std::fmt;

use crate::Result;

/// Determines the byte-order of multi-byte values.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Default)]
pub enum ByteOrder {
    /// The least significant byte is stored at the lowest address.
    #[default]
    Little,
    /// The most significant byte is stored at the lowest address.
    Big,
}

impl ByteOrder {
    /// The byte order of the current target.
    #[must_use]
    pub fn native() -> ByteOrder {
        if cfg!(target_endian = "little") {
            ByteOrder::Little
        } else {
            ByteOrder::Big
        }
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteOrder::Little => write!(f, "little-endian"),
            ByteOrder::Big => write!(f, "big-endian"),
        }
    }
}

/// Trait for values that can be moved through a [`crate::Stream`] as raw bytes.
///
/// Each implementation defines a `Bytes` associated type that represents the fixed-size
/// byte array required for that particular type (e.g., `[u8; 4]` for `u32`). Decoding fails
/// only when the bytes do not describe a value of the type, which can happen for the 24-bit
/// types whose wire width is smaller than their storage.
pub trait Primitive: Sized + Copy {
    /// Byte array holding the encoded value.
    type Bytes: AsRef<[u8]> + for<'a> TryFrom<&'a [u8]>;

    /// Number of bytes the encoded value occupies.
    const WIDTH: usize;

    /// Decode a value from `bytes` laid out in `order`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the value is not representable.
    fn from_bytes(bytes: Self::Bytes, order: ByteOrder) -> Result<Self>;

    /// Encode the value into bytes laid out in `order`.
    fn to_bytes(self, order: ByteOrder) -> Self::Bytes;
}

macro_rules! impl_primitive {
    ($($num:ty),* $(,)?) => {
        $(
            impl Primitive for $num {
                type Bytes = [u8; std::mem::size_of::<$num>()];

                const WIDTH: usize = std::mem::size_of::<$num>();

                fn from_bytes(bytes: Self::Bytes, order: ByteOrder) -> Result<Self> {
                    Ok(match order {
                        ByteOrder::Little => <$num>::from_le_bytes(bytes),
                        ByteOrder::Big => <$num>::from_be_bytes(bytes),
                    })
                }

                fn to_bytes(self, order: ByteOrder) -> Self::Bytes {
                    match order {
                        ByteOrder::Little => self.to_le_bytes(),
                        ByteOrder::Big => self.to_be_bytes(),
                    }
                }
            }
        )*
    };
}

impl_primitive!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

/// An unsigned 24-bit integer.
///
/// # Examples
///
/// ```rust
/// use chunkio::U24;
///
/// assert_eq!(U24::new(0xFF_FFFF)?.get(), 0xFF_FFFF);
/// assert!(U24::new(0x100_0000).is_err());
/// # Ok::<(), chunkio::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct U24(u32);

impl U24 {
    /// Largest representable value.
    pub const MAX: u32 = 0x00FF_FFFF;

    /// Create a new value, rejecting anything above [`U24::MAX`].
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `value` does not fit into 24 bits.
    pub fn new(value: u32) -> Result<U24> {
        if value > Self::MAX {
            return Err(out_of_bounds_error!(
                "{:#x} does not fit into an unsigned 24-bit integer",
                value
            ));
        }
        Ok(U24(value))
    }

    /// The value widened to `u32`.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for U24 {
    type Error = crate::Error;

    fn try_from(value: u32) -> Result<Self> {
        U24::new(value)
    }
}

impl From<U24> for u32 {
    fn from(value: U24) -> Self {
        value.0
    }
}

impl Primitive for U24 {
    type Bytes = [u8; 3];

    const WIDTH: usize = 3;

    fn from_bytes(bytes: Self::Bytes, order: ByteOrder) -> Result<Self> {
        let [a, b, c] = bytes;
        let wide = match order {
            ByteOrder::Little => u32::from_le_bytes([a, b, c, 0]),
            ByteOrder::Big => u32::from_be_bytes([0, a, b, c]),
        };
        U24::new(wide)
    }

    fn to_bytes(self, order: ByteOrder) -> Self::Bytes {
        match order {
            ByteOrder::Little => {
                let [a, b, c, _] = self.0.to_le_bytes();
                [a, b, c]
            }
            ByteOrder::Big => {
                let [_, a, b, c] = self.0.to_be_bytes();
                [a, b, c]
            }
        }
    }
}

/// A signed 24-bit integer in two's complement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct I24(i32);

impl I24 {
    /// Smallest representable value.
    pub const MIN: i32 = -0x0080_0000;
    /// Largest representable value.
    pub const MAX: i32 = 0x007F_FFFF;

    /// Create a new value, rejecting anything outside [`I24::MIN`]..=[`I24::MAX`].
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `value` does not fit into 24 bits.
    pub fn new(value: i32) -> Result<I24> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(out_of_bounds_error!(
                "{} does not fit into a signed 24-bit integer",
                value
            ));
        }
        Ok(I24(value))
    }

    /// The value widened to `i32`.
    #[must_use]
    pub fn get(self) -> i32 {
        self.0
    }
}

impl TryFrom<i32> for I24 {
    type Error = crate::Error;

    fn try_from(value: i32) -> Result<Self> {
        I24::new(value)
    }
}

impl From<I24> for i32 {
    fn from(value: I24) -> Self {
        value.0
    }
}

impl Primitive for I24 {
    type Bytes = [u8; 3];

    const WIDTH: usize = 3;

    fn from_bytes(bytes: Self::Bytes, order: ByteOrder) -> Result<Self> {
        let raw = U24::from_bytes(bytes, order)?.get();
        // sign-extend bit 23
        let value = ((raw << 8) as i32) >> 8;
        I24::new(value)
    }

    fn to_bytes(self, order: ByteOrder) -> Self::Bytes {
        U24((self.0 as u32) & U24::MAX).to_bytes(order)
    }
}

/// Decode a `T` from the start of `data`.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if `data` holds fewer than `T::WIDTH` bytes or the
/// value is not representable.
pub fn decode<T: Primitive>(data: &[u8], order: ByteOrder) -> Result<T> {
    if data.len() < T::WIDTH {
        return Err(out_of_bounds_error!(
            "{} bytes are too few for a {}-byte value",
            data.len(),
            T::WIDTH
        ));
    }

    let Ok(bytes) = T::Bytes::try_from(&data[..T::WIDTH]) else {
        return Err(out_of_bounds_error!("width mismatch for {}-byte value", T::WIDTH));
    };

    T::from_bytes(bytes, order)
}

/// Encode `value` into a byte vector laid out in `order`.
#[must_use]
pub fn encode<T: Primitive>(value: T, order: ByteOrder) -> Vec<u8> {
    value.to_bytes(order).as_ref().to_vec()
}
