use super::Backend;
use crate::Result;

/// Backing store held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct Memory {
    data: Vec<u8>,
}

impl Memory {
    /// Create a new memory backend
    ///
    /// ## Arguments
    /// * 'data' - The data buffer to consume
    pub fn new(data: Vec<u8>) -> Memory {
        Memory { data }
    }

    fn range(&self, offset: u64, len: usize) -> Result<(usize, usize)> {
        let start = usize::try_from(offset)
            .map_err(|_| out_of_bounds_error!("offset {:#x} exceeds the address space", offset))?;
        let Some(end) = start.checked_add(len) else {
            return Err(out_of_bounds_error!("range at {:#x} overflows", offset));
        };
        Ok((start, end))
    }
}

impl Backend for Memory {
    fn len(&mut self) -> Result<u64> {
        Ok(self.data.len() as u64)
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let (start, end) = self.range(offset, buf.len())?;
        if end > self.data.len() {
            return Err(out_of_bounds_error!(
                "read of {} bytes at {:#x} exceeds buffer of {:#x} bytes",
                buf.len(),
                offset,
                self.data.len()
            ));
        }

        buf.copy_from_slice(&self.data[start..end]);
        Ok(())
    }

    fn write_at(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        let (start, end) = self.range(offset, data.len())?;
        if start > self.data.len() {
            return Err(out_of_bounds_error!(
                "write at {:#x} would leave a gap after {:#x}",
                offset,
                self.data.len()
            ));
        }

        if end > self.data.len() {
            self.data.resize(end, 0);
        }

        self.data[start..end].copy_from_slice(data);
        Ok(())
    }

    fn is_writable(&self) -> bool {
        true
    }

    fn try_clone(&self) -> Result<Box<dyn Backend>> {
        Ok(Box::new(self.clone()))
    }

    fn into_data(self: Box<Self>) -> Result<Vec<u8>> {
        Ok(self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error::OutOfBounds;

    #[test]
    fn memory() {
        let mut data = vec![0xCC_u8; 1048];
        data[10..15].copy_from_slice(&[0xBB; 5]);

        let mut memory = Memory::new(data);

        assert_eq!(memory.len().unwrap(), 1048);

        let mut buf = [0_u8; 5];
        memory.read_at(10, &mut buf).unwrap();
        assert_eq!(buf, [0xBB, 0xBB, 0xBB, 0xBB, 0xBB]);

        let mut big = vec![0_u8; 2048];
        if memory.read_at(0, &mut big).is_ok() {
            panic!("This should not work!")
        }
    }

    #[test]
    fn test_memory_empty_buffer() {
        let mut memory = Memory::new(vec![]);

        assert_eq!(memory.len().unwrap(), 0);

        let mut one = [0_u8; 1];
        assert!(memory.read_at(0, &mut one).is_err());
        let mut none: [u8; 0] = [];
        assert!(memory.read_at(0, &mut none).is_ok());
    }

    #[test]
    fn test_memory_offset_overflow() {
        let mut memory = Memory::new(vec![0x00; 100]);
        let mut buf = [0_u8; 2];

        let result = memory.read_at(u64::MAX, &mut buf);
        assert!(matches!(result.unwrap_err(), OutOfBounds { .. }));

        let result = memory.read_at(99, &mut buf);
        assert!(matches!(result.unwrap_err(), OutOfBounds { .. }));
    }

    #[test]
    fn test_memory_write_extends() {
        let mut memory = Memory::new(vec![0x01, 0x02]);

        memory.write_at(1, &[0xAA, 0xBB, 0xCC]).unwrap();
        assert_eq!(memory.len().unwrap(), 4);

        memory.write_at(4, &[0xDD]).unwrap();
        let data = Box::new(memory).into_data().unwrap();
        assert_eq!(data, vec![0x01, 0xAA, 0xBB, 0xCC, 0xDD]);
    }

    #[test]
    fn test_memory_write_gap_rejected() {
        let mut memory = Memory::new(vec![0x00; 4]);
        let result = memory.write_at(5, &[0x01]);
        assert!(matches!(result.unwrap_err(), OutOfBounds { .. }));
        assert_eq!(memory.len().unwrap(), 4);
    }

    #[test]
    fn test_memory_clone_is_independent() {
        let mut memory = Memory::new(vec![0x00; 4]);
        let mut copy = memory.try_clone().unwrap();

        copy.write_at(0, &[0xFF]).unwrap();

        let mut buf = [0xAA_u8; 1];
        memory.read_at(0, &mut buf).unwrap();
        assert_eq!(buf, [0x00]);
    }
}
