//! The single-window cache sitting between a [`crate::Stream`] and its backing store.
//!
//! At most one [`Window`] is materialized per stream. Whether a request can be served from it
//! or needs a reload is decided by the pure function [`next_state`], which maps the current
//! [`WindowState`] and a requested byte range to the next state and a reload flag:
//!
//! - A request fully inside the current window is served from it.
//! - Otherwise the window is reloaded at the start of the chunk containing the request.
//! - A request larger than the nominal length, or one crossing into the next chunk, widens that
//!   single load so that it reaches the end of the request; the next load is nominal again.
//! - A window reaching past the end of the store is truncated to the store length.
//!
//! Reloading always re-reads the whole window; there is no incremental fetch.

use log::debug;

use super::{position::Layout, Backend};
use crate::Result;

/// The materialization state of a window cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowState {
    /// Nothing has been loaded yet.
    #[default]
    Empty,
    /// Bytes `[start, start + len)` are materialized.
    Valid {
        /// Global offset of the first byte
        start: u64,
        /// Number of materialized bytes
        len: u64,
    },
}

impl WindowState {
    /// Returns `true` if `[offset, end)` can be served without a reload.
    ///
    /// A zero-length request exactly at the window end is covered only when that position is
    /// also the end of the store; any other boundary position belongs to the next chunk.
    #[must_use]
    pub fn covers(&self, offset: u64, end: u64, store_len: u64) -> bool {
        match *self {
            WindowState::Empty => false,
            WindowState::Valid { start, len } => {
                let window_end = start + len;
                start <= offset
                    && end <= window_end
                    && (offset < window_end || offset == store_len)
            }
        }
    }
}

/// Decide which window serves `[offset, offset + len)` and whether it must be loaded.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the range ends beyond the store; no I/O happens in
/// that case.
///
/// # Examples
///
/// ```rust
/// use chunkio::file::{next_state, Layout, WindowState};
///
/// let layout = Layout::new(0x10, 0x67)?;
///
/// // a read straddling the first chunk boundary widens the load
/// let (state, reload) = next_state(WindowState::Empty, 0x0E, 4, &layout)?;
/// assert!(reload);
/// assert_eq!(state, WindowState::Valid { start: 0, len: 0x12 });
///
/// // the tail window is truncated
/// let (state, _) = next_state(state, 0x62, 1, &layout)?;
/// assert_eq!(state, WindowState::Valid { start: 0x60, len: 7 });
/// # Ok::<(), chunkio::Error>(())
/// ```
pub fn next_state(
    current: WindowState,
    offset: u64,
    len: u64,
    layout: &Layout,
) -> Result<(WindowState, bool)> {
    let end = layout.check_range(offset, len)?;
    if current.covers(offset, end, layout.len()) {
        return Ok((current, false));
    }

    let start = layout.chunk_start(layout.chunk_index(offset)?)?;
    let window_end = start
        .saturating_add(layout.nominal())
        .max(end)
        .min(layout.len());

    Ok((
        WindowState::Valid {
            start,
            len: window_end - start,
        },
        true,
    ))
}

/// A materialized range of the backing store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    /// Global offset of `data[0]`
    start: u64,
    /// The window contents
    data: Vec<u8>,
}

impl Window {
    /// Read `len` bytes at `start` from `backend` into a fresh window.
    ///
    /// # Errors
    /// Returns any error reported by the backend.
    pub fn load(backend: &mut dyn Backend, start: u64, len: u64) -> Result<Window> {
        let size = usize::try_from(len)
            .map_err(|_| out_of_bounds_error!("window of {:#x} bytes does not fit", len))?;
        let mut data = vec![0_u8; size];
        backend.read_at(start, &mut data)?;

        Ok(Window { start, data })
    }

    /// Global offset of the first byte.
    #[must_use]
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Number of materialized bytes.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    /// Returns `true` if the window holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The window contents.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The state describing this window.
    #[must_use]
    pub fn state(&self) -> WindowState {
        WindowState::Valid {
            start: self.start,
            len: self.len(),
        }
    }

    /// Borrow the bytes `[offset, offset + len)` given in global coordinates.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the range is not inside the window.
    pub fn slice(&self, offset: u64, len: u64) -> Result<&[u8]> {
        let local = offset
            .checked_sub(self.start)
            .and_then(|local| usize::try_from(local).ok());
        let size = usize::try_from(len).ok();

        match (local, size) {
            (Some(local), Some(size))
                if local
                    .checked_add(size)
                    .is_some_and(|end| end <= self.data.len()) =>
            {
                Ok(&self.data[local..local + size])
            }
            _ => Err(out_of_bounds_error!(
                "range {:#x}+{:#x} is outside window {:#x}+{:#x}",
                offset,
                len,
                self.start,
                self.len()
            )),
        }
    }

    /// Copy the part of a write at `offset` that overlaps this window into it.
    pub fn patch(&mut self, offset: u64, bytes: &[u8]) {
        let window_end = self.start + self.len();
        let write_end = offset + bytes.len() as u64;
        let from = offset.max(self.start);
        let to = write_end.min(window_end);
        if from >= to {
            return;
        }

        let local = (from - self.start) as usize;
        let source = (from - offset) as usize;
        let count = (to - from) as usize;
        self.data[local..local + count].copy_from_slice(&bytes[source..source + count]);
    }
}

/// Holder of the single window of a stream and the layout it is computed from.
#[derive(Debug, Clone)]
pub struct WindowCache {
    layout: Layout,
    window: Option<Window>,
}

impl WindowCache {
    /// Create an empty cache with the given nominal window length over a store of `len` bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidArgument`] if `nominal` is zero.
    pub fn new(nominal: u64, len: u64) -> Result<WindowCache> {
        Ok(WindowCache {
            layout: Layout::new(nominal, len)?,
            window: None,
        })
    }

    /// The chunk geometry.
    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// The state of the cached window.
    #[must_use]
    pub fn state(&self) -> WindowState {
        self.window
            .as_ref()
            .map_or(WindowState::Empty, Window::state)
    }

    /// The currently materialized window, if any.
    #[must_use]
    pub fn window(&self) -> Option<&Window> {
        self.window.as_ref()
    }

    /// Compute the window serving `[offset, offset + len)`.
    ///
    /// Returns `None` if the current window already covers the range, or the freshly loaded
    /// replacement otherwise. The cache itself is left untouched; the caller decides when to
    /// [`WindowCache::install`] the new window, so a later failure in the same operation does
    /// not leave a half-applied state behind.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] before any I/O if the range ends past the store,
    /// or any error reported by the backend while loading.
    pub fn stage(&self, backend: &mut dyn Backend, offset: u64, len: u64) -> Result<Option<Window>> {
        self.stage_from(self.state(), backend, offset, len)
    }

    /// Like [`WindowCache::stage`], but as if the cache currently held a window in `current`.
    ///
    /// Used to plan the window for the cursor position following an operation whose own window
    /// has not been installed yet.
    ///
    /// # Errors
    /// Same as [`WindowCache::stage`].
    pub fn stage_from(
        &self,
        current: WindowState,
        backend: &mut dyn Backend,
        offset: u64,
        len: u64,
    ) -> Result<Option<Window>> {
        let (state, reload) = next_state(current, offset, len, &self.layout)?;
        if !reload {
            return Ok(None);
        }

        let WindowState::Valid { start, len: window_len } = state else {
            return Ok(None);
        };

        if window_len > self.layout.nominal() {
            debug!(
                "loading oversized window {:#x}+{:#x} (nominal {:#x})",
                start,
                window_len,
                self.layout.nominal()
            );
        } else {
            debug!("loading window {:#x}+{:#x}", start, window_len);
        }

        Window::load(backend, start, window_len).map(Some)
    }

    /// Replace the cached window.
    pub fn install(&mut self, window: Window) {
        self.window = Some(window);
    }

    /// Load chunk `index` as a standalone window without touching the cache.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the chunk starts past the store, or any error
    /// reported by the backend.
    pub fn load_chunk(&self, backend: &mut dyn Backend, index: u64) -> Result<Window> {
        let start = self.layout.chunk_start(index)?;
        let len = self.layout.chunk_len(index)?;
        Window::load(backend, start, len)
    }

    /// Reflect a write of `bytes` at `offset` that grew the store to `new_len`.
    ///
    /// # Errors
    /// Never fails for a layout that was valid before; the nominal length is unchanged.
    pub fn record_write(&mut self, offset: u64, bytes: &[u8], new_len: u64) -> Result<()> {
        self.layout = Layout::new(self.layout.nominal(), new_len)?;
        if let Some(window) = self.window.as_mut() {
            window.patch(offset, bytes);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::Memory;

    use rstest::rstest;

    fn store(len: usize) -> Memory {
        Memory::new((0..len).map(|i| i as u8).collect())
    }

    #[rstest]
    #[case(0x00, 4, 0x00, 0x10)]
    #[case(0x0E, 4, 0x00, 0x12)]
    #[case(0x10, 1, 0x10, 0x10)]
    #[case(0x05, 0x30, 0x00, 0x35)]
    #[case(0x62, 4, 0x60, 0x07)]
    #[case(0x67, 0, 0x60, 0x07)]
    fn transitions_from_empty(
        #[case] offset: u64,
        #[case] len: u64,
        #[case] start: u64,
        #[case] window_len: u64,
    ) {
        let layout = Layout::new(0x10, 0x67).unwrap();
        let (state, reload) = next_state(WindowState::Empty, offset, len, &layout).unwrap();

        assert!(reload);
        assert_eq!(
            state,
            WindowState::Valid {
                start,
                len: window_len
            }
        );
    }

    #[test]
    fn covered_requests_do_not_reload() {
        let layout = Layout::new(0x10, 0x67).unwrap();
        let current = WindowState::Valid {
            start: 0x10,
            len: 0x10,
        };

        let (state, reload) = next_state(current, 0x1C, 4, &layout).unwrap();
        assert!(!reload);
        assert_eq!(state, current);

        // next chunk boundary belongs to the next window
        let (_, reload) = next_state(current, 0x20, 0, &layout).unwrap();
        assert!(reload);
    }

    #[test]
    fn end_of_store_is_covered_by_tail_window() {
        let layout = Layout::new(0x10, 0x67).unwrap();
        let tail = WindowState::Valid {
            start: 0x60,
            len: 0x07,
        };

        let (_, reload) = next_state(tail, 0x67, 0, &layout).unwrap();
        assert!(!reload);
    }

    #[test]
    fn oversized_load_does_not_stick() {
        let layout = Layout::new(0x10, 0x67).unwrap();
        let (wide, _) = next_state(WindowState::Empty, 0x00, 0x40, &layout).unwrap();
        assert_eq!(wide, WindowState::Valid { start: 0, len: 0x40 });

        let (next, reload) = next_state(wide, 0x40, 1, &layout).unwrap();
        assert!(reload);
        assert_eq!(next, WindowState::Valid { start: 0x40, len: 0x10 });
    }

    #[test]
    fn beyond_store_fails_before_io() {
        let layout = Layout::new(0x10, 0x67).unwrap();
        let result = next_state(WindowState::Empty, 0x66, 2, &layout);
        assert!(matches!(result, Err(crate::Error::OutOfBounds { .. })));
    }

    #[test]
    fn stage_and_install() {
        let mut backend = store(0x67);
        let mut cache = WindowCache::new(0x10, 0x67).unwrap();

        let window = cache.stage(&mut backend, 0x0E, 4).unwrap().unwrap();
        assert_eq!(window.slice(0x0E, 4).unwrap(), &[0x0E, 0x0F, 0x10, 0x11]);
        assert_eq!(cache.state(), WindowState::Empty);

        cache.install(window);
        assert!(cache.stage(&mut backend, 0x00, 2).unwrap().is_none());
    }

    #[test]
    fn patch_overlapping_write() {
        let mut backend = store(0x20);
        let mut window = Window::load(&mut backend, 0x10, 0x10).unwrap();

        window.patch(0x0E, &[0xAA, 0xBB, 0xCC, 0xDD]);
        assert_eq!(window.slice(0x10, 3).unwrap(), &[0xCC, 0xDD, 0x12]);

        window.patch(0x1F, &[0xEE, 0xFF]);
        assert_eq!(window.slice(0x1F, 1).unwrap(), &[0xEE]);

        // disjoint write leaves window untouched
        window.patch(0x00, &[0x99]);
        assert_eq!(window.slice(0x10, 1).unwrap(), &[0xCC]);
    }

    #[test]
    fn slice_outside_window() {
        let mut backend = store(0x20);
        let window = Window::load(&mut backend, 0x10, 0x08).unwrap();

        assert!(window.slice(0x0F, 1).is_err());
        assert!(window.slice(0x17, 2).is_err());
        assert!(window.slice(0x18, 0).is_ok());
    }

    #[test]
    fn load_chunk_keeps_cache() {
        let mut backend = store(0x67);
        let cache = WindowCache::new(0x10, 0x67).unwrap();

        let chunk = cache.load_chunk(&mut backend, 6).unwrap();
        assert_eq!(chunk.start(), 0x60);
        assert_eq!(chunk.len(), 7);
        assert!(cache.window().is_none());

        assert!(cache.load_chunk(&mut backend, 7).is_err());
    }
}
