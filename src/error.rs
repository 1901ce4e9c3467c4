use thiserror::Error;

use crate::file::AccessMode;

macro_rules! out_of_bounds_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::OutOfBounds {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::OutOfBounds {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! malformed_pattern_error {
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::MalformedPattern(format!($fmt, $($arg)*))
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Every failure is reported synchronously at the point of violation; nothing is retried
/// internally. An operation that fails leaves the stream's offset and window exactly as they
/// were before the call.
///
/// # Error Categories
///
/// ## Lifecycle Errors
/// - [`Error::NotOpen`] - The stream is closed
/// - [`Error::AlreadyOpen`] - `open` was called on an open stream
///
/// ## Access Errors
/// - [`Error::OutOfBounds`] - Offset or length outside `0..=len`, or a value outside its range
/// - [`Error::ModeViolation`] - Read on a write-only stream or write on a read-only stream
/// - [`Error::MalformedPattern`] - Empty, odd-length or non-hex search pattern
/// - [`Error::InvalidArgument`] - Zero window length or zero padding alignment
///
/// ## I/O Errors
/// - [`Error::FileError`] - Failure reported by the backing store
///
/// # Examples
///
/// ```rust
/// use chunkio::{Error, Source, Stream, StreamOptions};
///
/// let mut stream = Stream::new();
/// assert!(matches!(stream.offset(), Err(Error::NotOpen)));
///
/// stream.open(Source::Memory(vec![0; 4]), StreamOptions::default())?;
/// match stream.set_offset(8) {
///     Err(Error::OutOfBounds { message, .. }) => println!("rejected: {}", message),
///     other => panic!("unexpected {:?}", other),
/// }
/// # Ok::<(), chunkio::Error>(())
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// An operation was attempted on a closed stream.
    #[error("The stream is not open")]
    NotOpen,

    /// `open` was called on a stream that is already open.
    #[error("The stream is already open")]
    AlreadyOpen,

    /// An offset or length violates `0 <= x <= len`, or a value does not fit its type.
    ///
    /// The error includes the source location where the violation was detected.
    ///
    /// # Fields
    ///
    /// * `message` - Description of the violated bound
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Out of bounds - {file}:{line}: {message}")]
    OutOfBounds {
        /// The message to be printed for the OutOfBounds error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// The requested operation is not permitted by the stream's access mode.
    #[error("{operation} is not permitted on a {mode} stream")]
    ModeViolation {
        /// Access mode the stream was opened with
        mode: AccessMode,
        /// The rejected operation
        operation: &'static str,
    },

    /// A search pattern could not be used.
    #[error("Malformed search pattern - {0}")]
    MalformedPattern(String),

    /// A configuration value was rejected.
    #[error("Invalid argument - {0}")]
    InvalidArgument(String),

    /// File I/O error.
    ///
    /// Wraps errors reported by the backing store, such as a missing file, permission issues
    /// or a short read.
    #[error("{0}")]
    FileError(#[from] std::io::Error),
}
