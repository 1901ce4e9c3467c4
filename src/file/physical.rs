//! Physical file backend with positioned I/O.
//!
//! This module provides the [`crate::file::physical::Physical`] backend that implements the
//! [`crate::file::Backend`] trait for files on disk. Every access is a positioned read or write
//! at an absolute offset (`pread`/`pwrite` style through `positioned-io`), so no OS-level cursor
//! is shared between calls and only the requested bytes are ever brought into memory.
//!
//! # Handle Lifetime
//!
//! The backend either keeps its file handle open across calls ("stay open") or opens and drops
//! it around every single access. The latter trades one `open`/`close` pair per access for never
//! holding a descriptor between operations. The choice can be changed at any time through
//! [`crate::file::Backend::set_keep_open`].
//!
//! # Usage Examples
//!
//! ```rust,ignore
//! use chunkio::file::{Backend, Physical};
//!
//! let mut physical = Physical::new("capture.bin", false, true)?;
//! let mut magic = [0_u8; 4];
//! physical.read_at(0, &mut magic)?;
//! # Ok::<(), chunkio::Error>(())
//! ```

use super::Backend;
use crate::Result;

use log::trace;
use positioned_io::{ReadAt as _, Size as _, WriteAt as _};
use std::{
    fs::{self, OpenOptions},
    io,
    path::{Path, PathBuf},
};

/// A backing store reading and writing a file on disk at absolute offsets.
#[derive(Debug)]
pub struct Physical {
    /// Location of the file
    path: PathBuf,
    /// Whether the file is opened for writing
    writable: bool,
    /// Whether `handle` survives between calls
    keep_open: bool,
    /// The cached handle, only populated while `keep_open` is set
    handle: Option<fs::File>,
}

impl Physical {
    /// Create a new physical file backend.
    ///
    /// The file is opened once up front so that a missing or unreadable file is reported here
    /// rather than on the first access. The file is never created; existence is the caller's
    /// concern.
    ///
    /// # Arguments
    /// * `path` - Path to the file on disk
    /// * `writable` - Open the file for writing as well as reading
    /// * `keep_open` - Keep the handle open between calls
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened.
    pub fn new(path: impl AsRef<Path>, writable: bool, keep_open: bool) -> Result<Physical> {
        let mut physical = Physical {
            path: path.as_ref().to_path_buf(),
            writable,
            keep_open,
            handle: None,
        };

        let file = physical.open_handle()?;
        if keep_open {
            physical.handle = Some(file);
        }

        Ok(physical)
    }

    fn open_handle(&self) -> io::Result<fs::File> {
        trace!("opening {} (writable: {})", self.path.display(), self.writable);
        OpenOptions::new()
            .read(true)
            .write(self.writable)
            .open(&self.path)
    }

    /// Run `op` against the file handle, opening it first and dropping it afterwards unless the
    /// backend is configured to keep it open.
    fn with_handle<T>(&mut self, op: impl FnOnce(&mut fs::File) -> io::Result<T>) -> Result<T> {
        if let Some(file) = self.handle.as_mut() {
            return Ok(op(file)?);
        }

        let mut file = self.open_handle()?;
        let result = op(&mut file);
        if self.keep_open {
            self.handle = Some(file);
        }
        Ok(result?)
    }
}

impl Backend for Physical {
    fn len(&mut self) -> Result<u64> {
        let path = self.path.clone();
        self.with_handle(|file| {
            file.size()?.ok_or_else(|| {
                io::Error::other(format!("cannot determine size of {}", path.display()))
            })
        })
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        if offset.checked_add(buf.len() as u64).is_none() {
            return Err(out_of_bounds_error!("range at {:#x} overflows", offset));
        }

        self.with_handle(|file| file.read_exact_at(offset, buf))
    }

    fn write_at(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        if !self.writable {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{} was opened read-only", self.path.display()),
            )
            .into());
        }

        self.with_handle(|file| {
            file.write_all_at(offset, data)?;
            file.flush()
        })
    }

    fn is_writable(&self) -> bool {
        self.writable
    }

    fn set_keep_open(&mut self, keep_open: bool) {
        self.keep_open = keep_open;
        if !keep_open {
            self.handle = None;
        }
    }

    fn try_clone(&self) -> Result<Box<dyn Backend>> {
        Ok(Box::new(Physical::new(
            &self.path,
            self.writable,
            self.keep_open,
        )?))
    }

    fn into_data(mut self: Box<Self>) -> Result<Vec<u8>> {
        let len = usize::try_from(self.len()?)
            .map_err(|_| out_of_bounds_error!("{} does not fit into memory", self.path.display()))?;
        let mut data = vec![0_u8; len];
        self.read_at(0, &mut data)?;
        Ok(data)
    }
}
