// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
//#![deny(unsafe_code)]
// - 'file/mapped.rs' uses mmap to map a file into memory

//! # chunkio
//!
//! Random-access, byte-order aware reading and writing of large files and buffers through a
//! bounded window.
//!
//! A [`Stream`] keeps a cursor over a backing store (a file, a memory-mapped file or an owned
//! buffer) and decodes and encodes fixed-width integers and floats at that cursor in little- or
//! big-endian order. With windowing enabled, only one chunk of the store is held in memory at a
//! time; the window follows the cursor and is reloaded whenever an access leaves it.
//!
//! ## Features
//!
//! - **Bounded memory** - At most one window of the store is materialized at any time
//! - **Typed access** - `u8` through `u64`, signed variants, `f32`/`f64` and 24-bit integers
//! - **Both byte orders** - Switchable per stream, even while open
//! - **Padding** - Optional fill bytes after every write, aligning output to a block length
//! - **Search** - Byte and hex pattern search without disturbing the cursor or the window
//! - **Access modes** - Read-only, write-only and read-write streams, enforced on every call
//!
//! ## Quick Start
//!
//! ```rust
//! use chunkio::prelude::*;
//!
//! let mut stream = Stream::new();
//! stream.open(
//!     Source::Memory(vec![0x00, 0x00, 0xFF, 0xFF, 0x2A, 0x00]),
//!     StreamOptions::new(AccessMode::Read).with_window(4),
//! )?;
//!
//! assert_eq!(stream.search_hex("FFFF")?, Some(2));
//!
//! stream.set_offset(4)?;
//! assert_eq!(stream.read::<u16>()?, 42);
//! # Ok::<(), chunkio::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`] with the crate's [`Error`] type. A failing
//! operation never leaves a stream half-updated: its offset and window stay as they were.

#[macro_use]
pub(crate) mod error;

/// Backing stores, the window cache and the [`Stream`] session.
///
/// Most users only need [`Stream`], [`StreamOptions`] and [`Source`], which are re-exported at
/// the crate root. The building blocks are public for callers that want to drive a
/// [`file::WindowCache`] or [`file::Backend`] directly.
pub mod file;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use chunkio::prelude::*;
///
/// let mut stream = Stream::new();
/// stream.open(Source::Memory(Vec::new()), StreamOptions::new(AccessMode::Write))?;
/// stream.write(U24::new(0x010203)?)?;
/// assert_eq!(stream.len()?, 3);
/// # Ok::<(), chunkio::Error>(())
/// ```
pub mod prelude;

/// `chunkio` Result type.
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `chunkio` Error type.
pub use error::Error;

pub use file::{
    io::{decode, encode, ByteOrder, Primitive, I24, U24},
    AccessMode, Readable, Source, Stream, StreamOptions, Writable,
};
