//! Read-only memory-mapped file backend.
//!
//! [`Mapped`] maps a file into the process's virtual address space and serves reads straight
//! out of the mapping, leaving paging to the operating system. The mapping is immutable, so a
//! mapped backend only backs [`crate::AccessMode::Read`] streams and clones of it share the
//! same mapping.

use super::Backend;
use crate::Result;

use memmap2::Mmap;
use std::{fs, io, path::Path, sync::Arc};

/// A read-only backend over a memory-mapped file.
#[derive(Debug, Clone)]
pub struct Mapped {
    /// Memory-mapped file data
    data: Arc<Mmap>,
}

impl Mapped {
    /// Create a new mapped backend by memory-mapping the file at `path`.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or mapped.
    pub fn new(path: impl AsRef<Path>) -> Result<Mapped> {
        let file = fs::File::open(path)?;
        let mmap = unsafe { Mmap::map(&file) }?;

        Ok(Mapped {
            data: Arc::new(mmap),
        })
    }
}

impl Backend for Mapped {
    fn len(&mut self) -> Result<u64> {
        Ok(self.data.len() as u64)
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let start = usize::try_from(offset)
            .map_err(|_| out_of_bounds_error!("offset {:#x} exceeds the address space", offset))?;
        let Some(end) = start.checked_add(buf.len()) else {
            return Err(out_of_bounds_error!("range at {:#x} overflows", offset));
        };

        if end > self.data.len() {
            return Err(out_of_bounds_error!(
                "read of {} bytes at {:#x} exceeds mapping of {:#x} bytes",
                buf.len(),
                offset,
                self.data.len()
            ));
        }

        buf.copy_from_slice(&self.data[start..end]);
        Ok(())
    }

    fn write_at(&mut self, _offset: u64, _data: &[u8]) -> Result<()> {
        Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "memory-mapped backends are read-only",
        )
        .into())
    }

    fn is_writable(&self) -> bool {
        false
    }

    fn try_clone(&self) -> Result<Box<dyn Backend>> {
        Ok(Box::new(self.clone()))
    }

    fn into_data(self: Box<Self>) -> Result<Vec<u8>> {
        Ok(self.data.as_ref().to_vec())
    }
}
