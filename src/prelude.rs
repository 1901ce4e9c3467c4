//! # chunkio Prelude
//!
//! Import this module to get the stream, its options and the [`Readable`]/[`Writable`] traits
//! that carry the read and write operations.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all chunkio operations
pub use crate::Error;

/// The result type used throughout chunkio
pub use crate::Result;

// ================================================================================================
// Stream Session
// ================================================================================================

/// The stream, its configuration and the source it is opened on
pub use crate::file::{AccessMode, Source, Stream, StreamOptions};

/// Reading and writing operations
pub use crate::file::{Readable, Writable};

// ================================================================================================
// Value Encoding
// ================================================================================================

/// Byte order and the fixed-width value types
pub use crate::file::io::{ByteOrder, Primitive, I24, U24};
