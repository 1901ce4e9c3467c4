//! Backing stores, window cache and the stream built on top of them.
//!
//! This module contains everything between a caller asking for "a big-endian `u32` at the
//! current offset" and the bytes on disk or in memory.
//!
//! # Architecture
//!
//! - [`Backend`] - Trait abstracting the backing store (positioned reads and writes)
//! - [`Memory`] / [`Physical`] / [`Mapped`] - In-memory, on-disk and memory-mapped stores
//! - [`Layout`] - Global offset to (chunk index, chunk-local offset) conversion
//! - [`WindowCache`] - Holder of the single materialized [`Window`]
//! - [`Padding`] - Filler emitted after padded writes
//! - [`Stream`] - The public session tying these together
//!
//! # Examples
//!
//! ```rust
//! use chunkio::prelude::*;
//!
//! let mut stream = Stream::new();
//! stream.open(
//!     Source::Memory(vec![0; 64]),
//!     StreamOptions::new(AccessMode::ReadWrite)
//!         .with_byte_order(ByteOrder::Big)
//!         .with_window(16),
//! )?;
//!
//! stream.write(0xCAFE_u16)?;
//! stream.set_offset(0)?;
//! assert_eq!(stream.read::<u16>()?, 0xCAFE);
//! # Ok::<(), chunkio::Error>(())
//! ```

pub mod io;

mod mapped;
mod memory;
mod padding;
mod physical;
mod position;
mod search;
mod stream;
mod window;

use std::{fmt, path::PathBuf};

use crate::Result;

pub use mapped::Mapped;
pub use memory::Memory;
pub use padding::{pad_len, Padding};
pub use physical::Physical;
pub use position::Layout;
pub use search::{decode_hex_pattern, find_in_backend, find_in_slice, SCAN_CHUNK_LEN};
pub use stream::{Readable, Stream, StreamOptions, Writable};
pub use window::{next_state, Window, WindowCache, WindowState};

/// Backend trait for stream data sources.
///
/// This trait abstracts over where the bytes of a [`Stream`] live, allowing in-memory and
/// on-disk representations behind the same positioned read/write interface. Implementations
/// take `&mut self` so that handle management (opening and dropping file descriptors) can be
/// done per call.
pub trait Backend: fmt::Debug + Send {
    /// Returns the total length of the store in bytes.
    ///
    /// # Errors
    /// Returns an error if the length cannot be determined.
    fn len(&mut self) -> Result<u64>;

    /// Fill `buf` with the bytes starting at `offset`.
    ///
    /// # Errors
    /// Returns an error if `[offset, offset + buf.len())` is not fully inside the store.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()>;

    /// Write `data` starting at `offset`, extending the store if it runs past the end.
    ///
    /// # Errors
    /// Returns an error if the store is read-only, `offset` is past the end, or I/O fails.
    fn write_at(&mut self, offset: u64, data: &[u8]) -> Result<()>;

    /// Returns `true` if [`Backend::write_at`] can succeed.
    fn is_writable(&self) -> bool;

    /// Keep (or stop keeping) an underlying handle open between calls.
    ///
    /// Stores without a handle ignore this.
    fn set_keep_open(&mut self, _keep_open: bool) {}

    /// Create an independent backend over the same source.
    ///
    /// # Errors
    /// Returns an error if the source cannot be reopened.
    fn try_clone(&self) -> Result<Box<dyn Backend>>;

    /// Consume the backend and return its complete contents.
    ///
    /// # Errors
    /// Returns an error if the contents cannot be read.
    fn into_data(self: Box<Self>) -> Result<Vec<u8>>;
}

/// Where a [`Stream`] reads its bytes from.
#[derive(Debug, Clone)]
pub enum Source {
    /// A file accessed with positioned reads and writes.
    Path(PathBuf),
    /// A read-only memory-mapped file.
    Mapped(PathBuf),
    /// An owned in-memory buffer.
    Memory(Vec<u8>),
}

impl Source {
    /// Open a backend for this source.
    ///
    /// # Errors
    /// Returns [`crate::Error::ModeViolation`] if `mode` permits writes the backend cannot
    /// perform, or any error reported while opening it.
    fn open(self, mode: AccessMode, keep_open: bool) -> Result<Box<dyn Backend>> {
        let backend: Box<dyn Backend> = match self {
            Source::Path(path) => Box::new(Physical::new(path, mode.can_write(), keep_open)?),
            Source::Mapped(path) => Box::new(Mapped::new(path)?),
            Source::Memory(data) => Box::new(Memory::new(data)),
        };

        if mode.can_write() && !backend.is_writable() {
            return Err(crate::Error::ModeViolation {
                mode,
                operation: "opening a read-only source",
            });
        }

        Ok(backend)
    }
}

/// Access mode of an open [`Stream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AccessMode {
    /// Reads only.
    #[default]
    Read,
    /// Writes only.
    Write,
    /// Reads and writes.
    ReadWrite,
}

impl AccessMode {
    /// Returns `true` if reads are permitted.
    #[must_use]
    pub fn can_read(self) -> bool {
        matches!(self, AccessMode::Read | AccessMode::ReadWrite)
    }

    /// Returns `true` if writes are permitted.
    #[must_use]
    pub fn can_write(self) -> bool {
        matches!(self, AccessMode::Write | AccessMode::ReadWrite)
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessMode::Read => write!(f, "read-only"),
            AccessMode::Write => write!(f, "write-only"),
            AccessMode::ReadWrite => write!(f, "read-write"),
        }
    }
}
