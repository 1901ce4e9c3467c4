//! The public stream session.
//!
//! A [`Stream`] combines a [`Backend`], the position [`Layout`] and the [`WindowCache`] with an
//! open/closed lifecycle, an [`AccessMode`], a [`ByteOrder`] and the behavioural flags described
//! by [`StreamOptions`].
//!
//! # Lifecycle
//!
//! A stream is created closed. [`Stream::open`] attaches a [`Source`], positions the cursor and,
//! if windowing is requested, materializes the first window. [`Stream::close`] drops all of it
//! again; closing twice is harmless and a closed stream can be opened again. Every accessor and
//! operation on a closed stream fails with [`crate::Error::NotOpen`].
//!
//! # Capabilities
//!
//! Reading operations live on the [`Readable`] trait and writing operations on [`Writable`].
//! Both are implemented by [`Stream`] and gated at runtime by the access mode: a write on a
//! read-only stream or a read on a write-only stream fails with
//! [`crate::Error::ModeViolation`] before any other validation.
//!
//! # Failure Atomicity
//!
//! Operations compute every new window and the new cursor position before committing any of
//! them, so a failing call leaves the offset and the window exactly as they were.

use log::{debug, trace};

use super::{
    find_in_backend, find_in_slice,
    io::{decode, encode, ByteOrder, Primitive},
    AccessMode, Backend, Padding, Source, WindowCache, SCAN_CHUNK_LEN,
};
use crate::{Error, Result};

/// Configuration applied by [`Stream::open`].
///
/// # Examples
///
/// ```rust
/// use chunkio::{AccessMode, ByteOrder, StreamOptions};
///
/// let options = StreamOptions::new(AccessMode::ReadWrite)
///     .with_byte_order(ByteOrder::Big)
///     .with_start_offset(4)
///     .with_window(0x1000)
///     .with_padding(16, 0xFF)
///     .with_stay_open(true);
///
/// assert_eq!(options.window, Some(0x1000));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamOptions {
    /// Permitted operations
    pub mode: AccessMode,
    /// Initial cursor position
    pub start_offset: u64,
    /// Byte order of typed reads and writes
    pub byte_order: ByteOrder,
    /// Nominal window length; `None` reads the backing store directly on every access
    pub window: Option<u64>,
    /// Padding as `(alignment, fill byte)`
    pub padding: Option<(u64, u8)>,
    /// Keep the backing file handle open between calls
    pub stay_open: bool,
    /// Reads, writes and seeks leave the cursor where it is
    pub stay_on_offset: bool,
}

impl StreamOptions {
    /// Default options with the given access mode.
    #[must_use]
    pub fn new(mode: AccessMode) -> StreamOptions {
        StreamOptions {
            mode,
            ..StreamOptions::default()
        }
    }

    /// Start at `offset` instead of 0.
    #[must_use]
    pub fn with_start_offset(mut self, offset: u64) -> StreamOptions {
        self.start_offset = offset;
        self
    }

    /// Use `order` for typed values.
    #[must_use]
    pub fn with_byte_order(mut self, order: ByteOrder) -> StreamOptions {
        self.byte_order = order;
        self
    }

    /// Enable windowing with a nominal window of `len` bytes.
    #[must_use]
    pub fn with_window(mut self, len: u64) -> StreamOptions {
        self.window = Some(len);
        self
    }

    /// Pad every padded write to a multiple of `alignment` with `fill`.
    #[must_use]
    pub fn with_padding(mut self, alignment: u64, fill: u8) -> StreamOptions {
        self.padding = Some((alignment, fill));
        self
    }

    /// Keep the backing file handle open between calls.
    #[must_use]
    pub fn with_stay_open(mut self, stay_open: bool) -> StreamOptions {
        self.stay_open = stay_open;
        self
    }

    /// Freeze the cursor.
    #[must_use]
    pub fn with_stay_on_offset(mut self, stay_on_offset: bool) -> StreamOptions {
        self.stay_on_offset = stay_on_offset;
        self
    }
}

/// State of an open stream.
#[derive(Debug)]
struct OpenStream {
    backend: Box<dyn Backend>,
    mode: AccessMode,
    byte_order: ByteOrder,
    offset: u64,
    len: u64,
    cache: Option<WindowCache>,
    padding: Option<Padding>,
    stay_open: bool,
    stay_on_offset: bool,
}

impl OpenStream {
    fn require_read(&self, operation: &'static str) -> Result<()> {
        if !self.mode.can_read() {
            return Err(Error::ModeViolation {
                mode: self.mode,
                operation,
            });
        }
        Ok(())
    }

    fn require_write(&self, operation: &'static str) -> Result<()> {
        if !self.mode.can_write() {
            return Err(Error::ModeViolation {
                mode: self.mode,
                operation,
            });
        }
        Ok(())
    }

    /// Build a cache over the current store, with a window covering the cursor.
    fn build_cache(&mut self, nominal: u64) -> Result<WindowCache> {
        let mut cache = WindowCache::new(nominal, self.len)?;
        if let Some(window) = cache.stage(self.backend.as_mut(), self.offset, 0)? {
            cache.install(window);
        }
        Ok(cache)
    }

    /// Move the cursor, reloading the window first if it does not cover `offset`.
    fn move_to(&mut self, offset: u64) -> Result<()> {
        if offset > self.len {
            return Err(out_of_bounds_error!(
                "offset {:#x} exceeds length {:#x}",
                offset,
                self.len
            ));
        }

        if let Some(cache) = self.cache.as_mut() {
            if let Some(window) = cache.stage(self.backend.as_mut(), offset, 0)? {
                cache.install(window);
            }
        }

        self.offset = offset;
        Ok(())
    }

    /// Read `len` bytes at the cursor, advancing it unless `advance` is false.
    fn read_at_cursor(&mut self, len: u64, advance: bool) -> Result<Vec<u8>> {
        let offset = self.offset;
        let end = match offset.checked_add(len) {
            Some(end) if end <= self.len => end,
            _ => {
                return Err(out_of_bounds_error!(
                    "read of {:#x} bytes at {:#x} exceeds length {:#x}",
                    len,
                    offset,
                    self.len
                ))
            }
        };
        let next = if advance { end } else { offset };

        let Some(cache) = self.cache.as_mut() else {
            let size = usize::try_from(len)
                .map_err(|_| out_of_bounds_error!("read of {:#x} bytes does not fit", len))?;
            let mut bytes = vec![0_u8; size];
            trace!("direct read {:#x}+{:#x}", offset, len);
            self.backend.read_at(offset, &mut bytes)?;
            self.offset = next;
            return Ok(bytes);
        };

        let staged = cache.stage(self.backend.as_mut(), offset, len)?;
        let Some(serving) = staged.as_ref().or(cache.window()) else {
            return Err(out_of_bounds_error!("no window covers {:#x}", offset));
        };
        let bytes = serving.slice(offset, len)?.to_vec();
        let serving_state = serving.state();

        let follow = cache.stage_from(serving_state, self.backend.as_mut(), next, 0)?;
        if let Some(window) = follow.or(staged) {
            cache.install(window);
        }

        self.offset = next;
        Ok(bytes)
    }

    /// Write `bytes` at `at` without touching the cursor.
    fn write_raw(&mut self, at: u64, bytes: &[u8]) -> Result<u64> {
        let end = match at.checked_add(bytes.len() as u64) {
            Some(end) if at <= self.len => end,
            _ => {
                return Err(out_of_bounds_error!(
                    "write of {:#x} bytes at {:#x} outside length {:#x}",
                    bytes.len(),
                    at,
                    self.len
                ))
            }
        };

        self.backend.write_at(at, bytes)?;

        let new_len = self.len.max(end);
        if let Some(cache) = self.cache.as_mut() {
            cache.record_write(at, bytes, new_len)?;
        }
        self.len = new_len;

        Ok(end)
    }

    /// Write `bytes` at the cursor, followed by filler when `padded` and padding is enabled.
    fn write_at_cursor(&mut self, bytes: &[u8], padded: bool) -> Result<()> {
        let filler = match self.padding {
            Some(padding) if padded => {
                let count = usize::try_from(padding.pad_len(bytes.len() as u64))
                    .map_err(|_| out_of_bounds_error!("padding does not fit into memory"))?;
                Some(vec![padding.fill(); count])
            }
            _ => None,
        };

        let mut end = self.write_raw(self.offset, bytes)?;
        if let Some(filler) = filler {
            trace!("padding {:#x} with {:#x} bytes", end, filler.len());
            end = self.write_raw(end, &filler)?;
        }

        if self.stay_on_offset {
            return Ok(());
        }
        self.move_to(end)
    }

    fn chunk_scan_len(&self) -> usize {
        self.cache
            .as_ref()
            .and_then(|cache| usize::try_from(cache.layout().nominal()).ok())
            .unwrap_or(SCAN_CHUNK_LEN)
    }
}

/// A byte-order aware, optionally windowed cursor over a file or buffer.
///
/// # Examples
///
/// ```rust
/// use chunkio::prelude::*;
///
/// let mut stream = Stream::new();
/// stream.open(
///     Source::Memory(Vec::new()),
///     StreamOptions::new(AccessMode::ReadWrite).with_padding(16, 0xFF),
/// )?;
///
/// stream.write(0x43_u8)?;
/// assert_eq!(stream.offset()?, 16);
///
/// stream.set_offset(0)?;
/// assert_eq!(stream.read_bytes(3)?, vec![0x43, 0xFF, 0xFF]);
///
/// stream.close();
/// assert!(!stream.is_open());
/// # Ok::<(), chunkio::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct Stream {
    inner: Option<OpenStream>,
}

impl Stream {
    /// Create a closed stream.
    #[must_use]
    pub fn new() -> Stream {
        Stream { inner: None }
    }

    /// Open `source` with the given options.
    ///
    /// # Errors
    /// - [`crate::Error::AlreadyOpen`] if the stream is open
    /// - [`crate::Error::ModeViolation`] if `source` cannot support the access mode
    /// - [`crate::Error::OutOfBounds`] if the start offset is past the end of the source
    /// - [`crate::Error::InvalidArgument`] for a zero window length or padding alignment
    /// - [`crate::Error::FileError`] if the source cannot be opened
    pub fn open(&mut self, source: Source, options: StreamOptions) -> Result<()> {
        if self.inner.is_some() {
            return Err(Error::AlreadyOpen);
        }

        let padding = options
            .padding
            .map(|(alignment, fill)| Padding::new(alignment, fill))
            .transpose()?;

        let mut backend = source.open(options.mode, options.stay_open)?;
        let len = backend.len()?;
        if options.start_offset > len {
            return Err(out_of_bounds_error!(
                "start offset {:#x} exceeds length {:#x}",
                options.start_offset,
                len
            ));
        }

        let mut state = OpenStream {
            backend,
            mode: options.mode,
            byte_order: options.byte_order,
            offset: options.start_offset,
            len,
            cache: None,
            padding,
            stay_open: options.stay_open,
            stay_on_offset: options.stay_on_offset,
        };
        if let Some(nominal) = options.window {
            state.cache = Some(state.build_cache(nominal)?);
        }

        debug!(
            "opened {} stream of {:#x} bytes at {:#x} (window: {:?})",
            state.mode, state.len, state.offset, options.window
        );
        self.inner = Some(state);
        Ok(())
    }

    /// Close the stream, releasing the window and the backing store.
    ///
    /// Closing a closed stream does nothing.
    pub fn close(&mut self) {
        if let Some(state) = self.inner.take() {
            debug!("closed {} stream at {:#x}", state.mode, state.offset);
        }
    }

    /// Returns `true` if the stream is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    fn state(&self) -> Result<&OpenStream> {
        self.inner.as_ref().ok_or(Error::NotOpen)
    }

    fn state_mut(&mut self) -> Result<&mut OpenStream> {
        self.inner.as_mut().ok_or(Error::NotOpen)
    }

    /// The current cursor position.
    ///
    /// # Errors
    /// Returns [`crate::Error::NotOpen`] if the stream is closed.
    pub fn offset(&self) -> Result<u64> {
        Ok(self.state()?.offset)
    }

    /// The length of the backing store.
    ///
    /// # Errors
    /// Returns [`crate::Error::NotOpen`] if the stream is closed.
    pub fn len(&self) -> Result<u64> {
        Ok(self.state()?.len)
    }

    /// Returns `true` if the backing store is empty.
    ///
    /// # Errors
    /// Returns [`crate::Error::NotOpen`] if the stream is closed.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.state()?.len == 0)
    }

    /// Bytes between the cursor and the end of the store.
    ///
    /// # Errors
    /// Returns [`crate::Error::NotOpen`] if the stream is closed.
    pub fn remaining(&self) -> Result<u64> {
        let state = self.state()?;
        Ok(state.len - state.offset)
    }

    /// The access mode the stream was opened with.
    ///
    /// # Errors
    /// Returns [`crate::Error::NotOpen`] if the stream is closed.
    pub fn mode(&self) -> Result<AccessMode> {
        Ok(self.state()?.mode)
    }

    /// The byte order of typed reads and writes.
    ///
    /// # Errors
    /// Returns [`crate::Error::NotOpen`] if the stream is closed.
    pub fn byte_order(&self) -> Result<ByteOrder> {
        Ok(self.state()?.byte_order)
    }

    /// Change the byte order of subsequent typed reads and writes.
    ///
    /// # Errors
    /// Returns [`crate::Error::NotOpen`] if the stream is closed.
    pub fn set_byte_order(&mut self, order: ByteOrder) -> Result<()> {
        self.state_mut()?.byte_order = order;
        Ok(())
    }

    /// The nominal window length, or `None` when windowing is disabled.
    ///
    /// # Errors
    /// Returns [`crate::Error::NotOpen`] if the stream is closed.
    pub fn window_len(&self) -> Result<Option<u64>> {
        Ok(self
            .state()?
            .cache
            .as_ref()
            .map(|cache| cache.layout().nominal()))
    }

    /// Index of the chunk containing the cursor; always 0 without windowing.
    ///
    /// # Errors
    /// Returns [`crate::Error::NotOpen`] if the stream is closed.
    pub fn chunk_index(&self) -> Result<u64> {
        let state = self.state()?;
        match state.cache.as_ref() {
            Some(cache) => cache.layout().chunk_index(state.offset),
            None => Ok(0),
        }
    }

    /// Cursor position relative to the start of its chunk; the global offset without windowing.
    ///
    /// # Errors
    /// Returns [`crate::Error::NotOpen`] if the stream is closed.
    pub fn chunk_offset(&self) -> Result<u64> {
        let state = self.state()?;
        match state.cache.as_ref() {
            Some(cache) => cache.layout().local_offset(state.offset),
            None => Ok(state.offset),
        }
    }

    /// Number of chunks covering the store; 1 without windowing.
    ///
    /// # Errors
    /// Returns [`crate::Error::NotOpen`] if the stream is closed.
    pub fn chunk_count(&self) -> Result<u64> {
        let state = self.state()?;
        Ok(state
            .cache
            .as_ref()
            .map_or(1, |cache| cache.layout().chunk_count()))
    }

    /// Move the cursor to `offset`.
    ///
    /// With stay-on-offset enabled this succeeds without moving the cursor.
    ///
    /// # Errors
    /// - [`crate::Error::NotOpen`] if the stream is closed
    /// - [`crate::Error::OutOfBounds`] if `offset` is past the end of the store
    /// - [`crate::Error::FileError`] if the window covering `offset` cannot be loaded
    pub fn set_offset(&mut self, offset: u64) -> Result<()> {
        let state = self.state_mut()?;
        if state.stay_on_offset {
            return Ok(());
        }
        state.move_to(offset)
    }

    /// Move the cursor forward by `len` bytes.
    ///
    /// # Errors
    /// Same as [`Stream::set_offset`].
    pub fn skip(&mut self, len: u64) -> Result<()> {
        let target = self.offset()?.checked_add(len).ok_or_else(|| {
            out_of_bounds_error!("skipping {:#x} bytes overflows", len)
        })?;
        self.set_offset(target)
    }

    /// Enable windowing with a nominal window of `len` bytes, replacing any previous window.
    ///
    /// # Errors
    /// - [`crate::Error::NotOpen`] if the stream is closed
    /// - [`crate::Error::InvalidArgument`] if `len` is zero
    /// - [`crate::Error::FileError`] if the first window cannot be loaded
    pub fn enable_windowing(&mut self, len: u64) -> Result<()> {
        let state = self.state_mut()?;
        let cache = state.build_cache(len)?;
        debug!("windowing enabled with {:#x}-byte windows", len);
        state.cache = Some(cache);
        Ok(())
    }

    /// Disable windowing and drop the current window.
    ///
    /// # Errors
    /// Returns [`crate::Error::NotOpen`] if the stream is closed.
    pub fn disable_windowing(&mut self) -> Result<()> {
        let state = self.state_mut()?;
        if state.cache.take().is_some() {
            debug!("windowing disabled");
        }
        Ok(())
    }

    /// Pad every subsequent padded write to a multiple of `alignment` with `fill`.
    ///
    /// # Errors
    /// - [`crate::Error::NotOpen`] if the stream is closed
    /// - [`crate::Error::InvalidArgument`] if `alignment` is zero
    pub fn enable_padding(&mut self, alignment: u64, fill: u8) -> Result<()> {
        let state = self.state_mut()?;
        state.padding = Some(Padding::new(alignment, fill)?);
        Ok(())
    }

    /// Stop padding writes.
    ///
    /// # Errors
    /// Returns [`crate::Error::NotOpen`] if the stream is closed.
    pub fn disable_padding(&mut self) -> Result<()> {
        self.state_mut()?.padding = None;
        Ok(())
    }

    /// Freeze or release the cursor.
    ///
    /// # Errors
    /// Returns [`crate::Error::NotOpen`] if the stream is closed.
    pub fn set_stay_on_offset(&mut self, stay_on_offset: bool) -> Result<()> {
        self.state_mut()?.stay_on_offset = stay_on_offset;
        Ok(())
    }

    /// Keep the backing file handle open between calls, or open it per access.
    ///
    /// # Errors
    /// Returns [`crate::Error::NotOpen`] if the stream is closed.
    pub fn set_stay_open(&mut self, stay_open: bool) -> Result<()> {
        let state = self.state_mut()?;
        state.stay_open = stay_open;
        state.backend.set_keep_open(stay_open);
        Ok(())
    }

    /// Search for `pattern` in the window of chunk `chunk_index`, starting at the window-local
    /// `chunk_offset`.
    ///
    /// Returns the window-local offset of the first match. The cursor and the cached window are
    /// left untouched. Without windowing the whole store is chunk 0 and is scanned in bounded
    /// reads rather than loaded at once.
    ///
    /// # Errors
    /// - [`crate::Error::NotOpen`] if the stream is closed
    /// - [`crate::Error::ModeViolation`] on a write-only stream
    /// - [`crate::Error::MalformedPattern`] for an empty pattern
    /// - [`crate::Error::OutOfBounds`] for a chunk or chunk offset past the end
    pub fn search_in_chunk(
        &mut self,
        pattern: &[u8],
        chunk_index: u64,
        chunk_offset: u64,
    ) -> Result<Option<u64>> {
        let state = self.state_mut()?;
        state.require_read("searching")?;
        if pattern.is_empty() {
            return Err(malformed_pattern_error!("{}", "the pattern is empty"));
        }

        let loaded;
        let window = match state.cache.as_ref() {
            Some(cache) => {
                let start = cache.layout().chunk_start(chunk_index)?;
                let len = cache.layout().chunk_len(chunk_index)?;
                match cache.window() {
                    Some(current) if current.start() == start && current.len() == len => current,
                    _ => {
                        loaded = cache.load_chunk(state.backend.as_mut(), chunk_index)?;
                        &loaded
                    }
                }
            }
            None => {
                if chunk_index != 0 {
                    return Err(out_of_bounds_error!(
                        "chunk {} does not exist without windowing",
                        chunk_index
                    ));
                }
                if chunk_offset > state.len {
                    return Err(out_of_bounds_error!(
                        "chunk offset {:#x} exceeds chunk of {:#x} bytes",
                        chunk_offset,
                        state.len
                    ));
                }

                // the whole store is chunk 0, so global and window-local offsets coincide
                return find_in_backend(
                    state.backend.as_mut(),
                    chunk_offset,
                    state.len,
                    pattern,
                    SCAN_CHUNK_LEN,
                );
            }
        };

        let local = usize::try_from(chunk_offset)
            .ok()
            .filter(|&local| local as u64 <= window.len())
            .ok_or_else(|| {
                out_of_bounds_error!(
                    "chunk offset {:#x} exceeds chunk of {:#x} bytes",
                    chunk_offset,
                    window.len()
                )
            })?;

        Ok(find_in_slice(&window.data()[local..], pattern).map(|found| (local + found) as u64))
    }

    /// Create an independent stream over the same source.
    ///
    /// The clone starts at the same offset with the same mode, byte order and options, but owns
    /// its own cursor, window and backing handle. In-memory sources are copied.
    ///
    /// # Errors
    /// - [`crate::Error::NotOpen`] if the stream is closed
    /// - [`crate::Error::FileError`] if the source cannot be reopened
    pub fn try_clone(&self) -> Result<Stream> {
        let state = self.state()?;

        let mut clone = OpenStream {
            backend: state.backend.try_clone()?,
            mode: state.mode,
            byte_order: state.byte_order,
            offset: state.offset,
            len: state.len,
            cache: None,
            padding: state.padding,
            stay_open: state.stay_open,
            stay_on_offset: state.stay_on_offset,
        };
        if let Some(cache) = state.cache.as_ref() {
            clone.cache = Some(clone.build_cache(cache.layout().nominal())?);
        }

        Ok(Stream { inner: Some(clone) })
    }

    /// Consume the stream and return the complete contents of its backing store.
    ///
    /// # Errors
    /// - [`crate::Error::NotOpen`] if the stream is closed
    /// - [`crate::Error::FileError`] if the contents cannot be read
    pub fn into_data(self) -> Result<Vec<u8>> {
        let state = self.inner.ok_or(Error::NotOpen)?;
        state.backend.into_data()
    }
}

/// Reading side of a [`Stream`].
pub trait Readable {
    /// Read `len` bytes at the cursor and advance past them.
    ///
    /// # Errors
    /// Returns [`crate::Error::ModeViolation`] on write-only streams and
    /// [`crate::Error::OutOfBounds`] if fewer than `len` bytes remain.
    fn read_bytes(&mut self, len: u64) -> Result<Vec<u8>>;

    /// Read `len` bytes at the cursor without advancing.
    ///
    /// # Errors
    /// Same as [`Readable::read_bytes`].
    fn peek_bytes(&mut self, len: u64) -> Result<Vec<u8>>;

    /// Read a `T` at the cursor and advance past it.
    ///
    /// # Errors
    /// Same as [`Readable::read_bytes`], plus [`crate::Error::OutOfBounds`] if the bytes do not
    /// describe a `T`.
    fn read<T: Primitive>(&mut self) -> Result<T>;

    /// Read a `T` at the cursor without advancing.
    ///
    /// # Errors
    /// Same as [`Readable::read`].
    fn peek<T: Primitive>(&mut self) -> Result<T>;

    /// Offset of the first occurrence of `pattern` at or after the cursor.
    ///
    /// The cursor and the cached window are unchanged afterwards, whatever the outcome.
    ///
    /// # Errors
    /// Returns [`crate::Error::MalformedPattern`] for an empty pattern.
    fn search_bytes(&mut self, pattern: &[u8]) -> Result<Option<u64>>;

    /// Like [`Readable::search_bytes`] with the pattern given as a hex string.
    ///
    /// # Errors
    /// Returns [`crate::Error::MalformedPattern`] for odd-length or non-hex input.
    fn search_hex(&mut self, pattern: &str) -> Result<Option<u64>>;
}

/// Writing side of a [`Stream`].
pub trait Writable {
    /// Write `bytes` at the cursor, followed by padding if enabled, and advance past both.
    ///
    /// # Errors
    /// Returns [`crate::Error::ModeViolation`] on read-only streams.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()>;

    /// Write `bytes` at the cursor without padding.
    ///
    /// # Errors
    /// Same as [`Writable::write_bytes`].
    fn write_bytes_unpadded(&mut self, bytes: &[u8]) -> Result<()>;

    /// Write `value` at the cursor, followed by padding if enabled.
    ///
    /// # Errors
    /// Same as [`Writable::write_bytes`].
    fn write<T: Primitive>(&mut self, value: T) -> Result<()>;

    /// Write `len` copies of `byte`, followed by padding if enabled.
    ///
    /// # Errors
    /// Same as [`Writable::write_bytes`].
    fn fill(&mut self, byte: u8, len: u64) -> Result<()>;

    /// Write `len` copies of `byte` without padding.
    ///
    /// # Errors
    /// Same as [`Writable::write_bytes`].
    fn fill_without_padding(&mut self, byte: u8, len: u64) -> Result<()>;
}

impl Readable for Stream {
    fn read_bytes(&mut self, len: u64) -> Result<Vec<u8>> {
        let state = self.state_mut()?;
        state.require_read("reading")?;
        let advance = !state.stay_on_offset;
        state.read_at_cursor(len, advance)
    }

    fn peek_bytes(&mut self, len: u64) -> Result<Vec<u8>> {
        let state = self.state_mut()?;
        state.require_read("reading")?;
        state.read_at_cursor(len, false)
    }

    fn read<T: Primitive>(&mut self) -> Result<T> {
        let state = self.state_mut()?;
        state.require_read("reading")?;
        let order = state.byte_order;

        // decode before committing so an unrepresentable value leaves the cursor in place
        let bytes = state.read_at_cursor(T::WIDTH as u64, false)?;
        let value = decode(&bytes, order)?;
        if !state.stay_on_offset {
            state.move_to(state.offset + T::WIDTH as u64)?;
        }
        Ok(value)
    }

    fn peek<T: Primitive>(&mut self) -> Result<T> {
        let state = self.state_mut()?;
        state.require_read("reading")?;
        let bytes = state.read_at_cursor(T::WIDTH as u64, false)?;
        decode(&bytes, state.byte_order)
    }

    fn search_bytes(&mut self, pattern: &[u8]) -> Result<Option<u64>> {
        let state = self.state_mut()?;
        state.require_read("searching")?;

        let chunk_len = state.chunk_scan_len();
        let found = find_in_backend(
            state.backend.as_mut(),
            state.offset,
            state.len,
            pattern,
            chunk_len,
        )?;
        debug!(
            "search for {} bytes from {:#x}: {:?}",
            pattern.len(),
            state.offset,
            found
        );
        Ok(found)
    }

    fn search_hex(&mut self, pattern: &str) -> Result<Option<u64>> {
        self.state()?.require_read("searching")?;
        let bytes = super::decode_hex_pattern(pattern)?;
        self.search_bytes(&bytes)
    }
}

impl Writable for Stream {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let state = self.state_mut()?;
        state.require_write("writing")?;
        state.write_at_cursor(bytes, true)
    }

    fn write_bytes_unpadded(&mut self, bytes: &[u8]) -> Result<()> {
        let state = self.state_mut()?;
        state.require_write("writing")?;
        state.write_at_cursor(bytes, false)
    }

    fn write<T: Primitive>(&mut self, value: T) -> Result<()> {
        let state = self.state_mut()?;
        state.require_write("writing")?;
        let bytes = encode(value, state.byte_order);
        state.write_at_cursor(&bytes, true)
    }

    fn fill(&mut self, byte: u8, len: u64) -> Result<()> {
        let state = self.state_mut()?;
        state.require_write("filling")?;
        let bytes = filler(byte, len)?;
        state.write_at_cursor(&bytes, true)
    }

    fn fill_without_padding(&mut self, byte: u8, len: u64) -> Result<()> {
        let state = self.state_mut()?;
        state.require_write("filling")?;
        let bytes = filler(byte, len)?;
        state.write_at_cursor(&bytes, false)
    }
}

fn filler(byte: u8, len: u64) -> Result<Vec<u8>> {
    let len = usize::try_from(len)
        .map_err(|_| out_of_bounds_error!("fill of {:#x} bytes does not fit", len))?;
    Ok(vec![byte; len])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::io::{I24, U24};

    fn sequence(len: usize) -> Vec<u8> {
        (0..len).map(|i| i as u8).collect()
    }

    fn open(data: Vec<u8>, options: StreamOptions) -> Stream {
        let mut stream = Stream::new();
        stream.open(Source::Memory(data), options).unwrap();
        stream
    }

    #[test]
    fn lifecycle() {
        let mut stream = Stream::new();
        assert!(matches!(stream.offset(), Err(Error::NotOpen)));
        assert!(matches!(stream.len(), Err(Error::NotOpen)));
        assert!(matches!(stream.chunk_index(), Err(Error::NotOpen)));

        stream
            .open(Source::Memory(sequence(8)), StreamOptions::default())
            .unwrap();
        assert!(matches!(
            stream.open(Source::Memory(vec![]), StreamOptions::default()),
            Err(Error::AlreadyOpen)
        ));

        stream.close();
        stream.close();
        assert!(matches!(stream.read_bytes(1), Err(Error::NotOpen)));

        stream
            .open(
                Source::Memory(sequence(8)),
                StreamOptions::default().with_start_offset(3),
            )
            .unwrap();
        assert_eq!(stream.offset().unwrap(), 3);
        assert_eq!(stream.remaining().unwrap(), 5);
    }

    #[test]
    fn start_offset_past_end() {
        let mut stream = Stream::new();
        let result = stream.open(
            Source::Memory(sequence(4)),
            StreamOptions::default().with_start_offset(5),
        );
        assert!(matches!(result, Err(Error::OutOfBounds { .. })));
        assert!(!stream.is_open());
    }

    #[test]
    fn mode_gating_precedes_bounds() {
        let mut reader = open(sequence(4), StreamOptions::new(AccessMode::Read));
        reader.set_offset(4).unwrap();
        assert!(matches!(
            reader.write_bytes(&[0; 8]),
            Err(Error::ModeViolation {
                mode: AccessMode::Read,
                ..
            })
        ));

        let mut writer = open(sequence(4), StreamOptions::new(AccessMode::Write));
        assert!(matches!(
            writer.read_bytes(100),
            Err(Error::ModeViolation { .. })
        ));
        assert!(matches!(
            writer.search_hex("zz"),
            Err(Error::ModeViolation { .. })
        ));
    }

    #[test]
    fn typed_round_trip() {
        let mut stream = open(
            Vec::new(),
            StreamOptions::new(AccessMode::ReadWrite).with_byte_order(ByteOrder::Big),
        );

        stream.write(-5_i8).unwrap();
        stream.write(0xBEEF_u16).unwrap();
        stream.write(U24::new(0x12_3456).unwrap()).unwrap();
        stream.write(I24::new(-42).unwrap()).unwrap();
        stream.write(0xDEAD_BEEF_u32).unwrap();
        stream.write(-1_i64).unwrap();
        stream.write(2.5_f64).unwrap();
        assert_eq!(stream.offset().unwrap(), 1 + 2 + 3 + 3 + 4 + 8 + 8);

        stream.set_offset(0).unwrap();
        assert_eq!(stream.read::<i8>().unwrap(), -5);
        assert_eq!(stream.read::<u16>().unwrap(), 0xBEEF);
        assert_eq!(stream.read::<U24>().unwrap().get(), 0x12_3456);
        assert_eq!(stream.read::<I24>().unwrap().get(), -42);
        assert_eq!(stream.read::<u32>().unwrap(), 0xDEAD_BEEF);
        assert_eq!(stream.read::<i64>().unwrap(), -1);
        assert_eq!(stream.read::<f64>().unwrap(), 2.5);
        assert_eq!(stream.remaining().unwrap(), 0);
    }

    #[test]
    fn failed_read_leaves_state() {
        let mut stream = open(sequence(0x20), StreamOptions::default().with_window(0x10));
        stream.set_offset(0x1E).unwrap();
        let before = stream.inner.as_ref().unwrap().cache.clone().unwrap();

        assert!(matches!(
            stream.read::<u32>(),
            Err(Error::OutOfBounds { .. })
        ));
        assert_eq!(stream.offset().unwrap(), 0x1E);
        assert_eq!(
            stream.inner.as_ref().unwrap().cache.as_ref().unwrap().state(),
            before.state()
        );
    }

    #[test]
    fn window_follows_cursor() {
        let mut stream = open(sequence(0x67), StreamOptions::default().with_window(0x10));
        assert_eq!(stream.chunk_count().unwrap(), 7);

        stream.set_offset(0x0E).unwrap();
        assert_eq!(stream.read::<u32>().unwrap(), 0x1110_0F0E);
        assert_eq!(stream.offset().unwrap(), 0x12);
        assert_eq!(stream.chunk_index().unwrap(), 1);
        assert_eq!(stream.chunk_offset().unwrap(), 2);

        let cache = stream.inner.as_ref().unwrap().cache.as_ref().unwrap();
        let window = cache.window().unwrap();
        assert!(window.start() <= 0x12 && 0x12 < window.start() + window.len());

        stream.set_offset(0x67).unwrap();
        assert_eq!(stream.chunk_index().unwrap(), 6);
        assert_eq!(stream.remaining().unwrap(), 0);
    }

    #[test]
    fn stay_on_offset_freezes_cursor() {
        let mut stream = open(
            sequence(8),
            StreamOptions::new(AccessMode::ReadWrite).with_stay_on_offset(true),
        );

        assert_eq!(stream.read::<u8>().unwrap(), 0);
        assert_eq!(stream.read::<u8>().unwrap(), 0);
        stream.set_offset(4).unwrap();
        stream.skip(2).unwrap();
        assert_eq!(stream.offset().unwrap(), 0);

        stream.write(0xAA_u8).unwrap();
        assert_eq!(stream.offset().unwrap(), 0);
        assert_eq!(stream.peek::<u8>().unwrap(), 0xAA);

        stream.set_stay_on_offset(false).unwrap();
        stream.skip(2).unwrap();
        assert_eq!(stream.offset().unwrap(), 2);
    }

    #[test]
    fn peek_does_not_advance() {
        let mut stream = open(sequence(8), StreamOptions::default().with_window(4));
        assert_eq!(stream.peek::<u16>().unwrap(), 0x0100);
        assert_eq!(stream.peek_bytes(6).unwrap(), sequence(6));
        assert_eq!(stream.offset().unwrap(), 0);
    }

    #[test]
    fn writes_are_visible_through_window() {
        let mut stream = open(
            sequence(0x20),
            StreamOptions::new(AccessMode::ReadWrite).with_window(0x10),
        );

        stream.set_offset(0x04).unwrap();
        stream.write_bytes(&[0xAA, 0xBB]).unwrap();
        stream.set_offset(0x04).unwrap();
        assert_eq!(stream.read_bytes(3).unwrap(), vec![0xAA, 0xBB, 0x06]);
    }

    #[test]
    fn writes_extend_the_store() {
        let mut stream = open(
            sequence(4),
            StreamOptions::new(AccessMode::ReadWrite).with_window(4),
        );

        stream.set_offset(4).unwrap();
        stream.write(0x0807_0605_u32).unwrap();
        assert_eq!(stream.len().unwrap(), 8);
        assert_eq!(stream.offset().unwrap(), 8);

        stream.set_offset(2).unwrap();
        assert_eq!(stream.read_bytes(4).unwrap(), vec![2, 3, 5, 6]);
        assert_eq!(stream.into_data().unwrap(), vec![0, 1, 2, 3, 5, 6, 7, 8]);
    }

    #[test]
    fn padding_and_fill() {
        let mut stream = open(Vec::new(), StreamOptions::new(AccessMode::Write));
        stream.enable_padding(4, 0xEE).unwrap();

        stream.fill(0x11, 4).unwrap();
        assert_eq!(stream.offset().unwrap(), 8);

        stream.fill_without_padding(0x22, 2).unwrap();
        stream.write_bytes_unpadded(&[0x33]).unwrap();
        assert_eq!(stream.offset().unwrap(), 11);

        stream.disable_padding().unwrap();
        stream.write(0x44_u8).unwrap();

        assert_eq!(
            stream.into_data().unwrap(),
            vec![0x11, 0x11, 0x11, 0x11, 0xEE, 0xEE, 0xEE, 0xEE, 0x22, 0x22, 0x33, 0x44]
        );
    }

    #[test]
    fn invalid_configuration() {
        let mut stream = open(sequence(4), StreamOptions::default());
        assert!(matches!(
            stream.enable_windowing(0),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            stream.enable_padding(0, 0),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(stream.window_len().unwrap(), None);
    }

    #[test]
    fn toggling_windowing() {
        let mut stream = open(sequence(0x30), StreamOptions::default());
        assert_eq!(stream.chunk_index().unwrap(), 0);

        stream.set_offset(0x21).unwrap();
        assert_eq!(stream.chunk_offset().unwrap(), 0x21);

        stream.enable_windowing(0x10).unwrap();
        assert_eq!(stream.window_len().unwrap(), Some(0x10));
        assert_eq!(stream.chunk_index().unwrap(), 2);
        assert_eq!(stream.chunk_offset().unwrap(), 1);

        stream.disable_windowing().unwrap();
        assert_eq!(stream.window_len().unwrap(), None);
        assert_eq!(stream.read::<u8>().unwrap(), 0x21);
    }

    #[test]
    fn search_in_chunk_is_local() {
        let mut data = vec![0_u8; 0x30];
        data[0x14] = 0xAB;
        data[0x15] = 0xCD;
        let mut stream = open(data, StreamOptions::default().with_window(0x10));
        stream.set_offset(0x02).unwrap();

        assert_eq!(stream.search_in_chunk(&[0xAB, 0xCD], 1, 0).unwrap(), Some(4));
        assert_eq!(stream.search_in_chunk(&[0xAB, 0xCD], 1, 5).unwrap(), None);
        assert_eq!(stream.search_in_chunk(&[0xAB, 0xCD], 0, 0).unwrap(), None);
        assert_eq!(stream.offset().unwrap(), 0x02);

        assert!(matches!(
            stream.search_in_chunk(&[0xAB], 4, 0),
            Err(Error::OutOfBounds { .. })
        ));
        assert!(matches!(
            stream.search_in_chunk(&[0xAB], 1, 0x11),
            Err(Error::OutOfBounds { .. })
        ));
        assert!(matches!(
            stream.search_in_chunk(&[], 1, 0),
            Err(Error::MalformedPattern(_))
        ));
    }

    #[test]
    fn search_in_chunk_without_windowing() {
        let mut stream = open(vec![0, 0, 7, 7], StreamOptions::default());
        assert_eq!(stream.search_in_chunk(&[7, 7], 0, 0).unwrap(), Some(2));
        assert_eq!(stream.search_in_chunk(&[7, 7], 0, 3).unwrap(), None);
        assert_eq!(stream.search_in_chunk(&[7], 0, 4).unwrap(), None);
        assert!(stream.search_in_chunk(&[7], 1, 0).is_err());
        assert!(matches!(
            stream.search_in_chunk(&[7], 0, 5),
            Err(Error::OutOfBounds { .. })
        ));
    }

    #[test]
    fn search_with_window_larger_than_store() {
        for window in [u64::MAX, 1 << 46] {
            let mut stream = open(vec![0, 1, 2, 3], StreamOptions::default().with_window(window));
            assert_eq!(stream.read::<u16>().unwrap(), 0x0100);

            assert_eq!(stream.search_bytes(&[2, 3]).unwrap(), Some(2));
            assert_eq!(stream.search_hex("0001").unwrap(), None);
            assert_eq!(stream.search_in_chunk(&[1, 2], 0, 0).unwrap(), Some(1));
            assert_eq!(stream.offset().unwrap(), 2);
        }
    }

    #[test]
    fn clone_is_independent() {
        let stream = open(
            sequence(0x20),
            StreamOptions::default()
                .with_start_offset(4)
                .with_window(8)
                .with_byte_order(ByteOrder::Big),
        );

        let mut clone = stream.try_clone().unwrap();
        assert_eq!(clone.offset().unwrap(), 4);
        assert_eq!(clone.byte_order().unwrap(), ByteOrder::Big);
        assert_eq!(clone.window_len().unwrap(), Some(8));

        clone.skip(10).unwrap();
        assert_eq!(stream.offset().unwrap(), 4);
        assert!(matches!(Stream::new().try_clone(), Err(Error::NotOpen)));
    }
}
