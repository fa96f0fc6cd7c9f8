use std::{ops::Range, sync::RwLock};

use crate::soc::device::{Device, DeviceError, DeviceResult};

/// Plain read/write register storage. Used for unit register banks, the
/// chip-common block, and (preloaded) the enumeration ROM.
pub struct RegisterBlock {
    name: String,
    bytes: RwLock<Vec<u8>>,
}

impl RegisterBlock {
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            bytes: RwLock::new(vec![0_u8; size]),
        }
    }

    /// Builds a block of `size` bytes whose leading words are `words`.
    pub fn with_words(name: impl Into<String>, size: usize, words: &[u32]) -> Self {
        let block = Self::new(name, size.max(words.len() * 4));
        {
            let mut bytes = block.bytes.write().unwrap();
            for (idx, word) in words.iter().enumerate() {
                bytes[idx * 4..idx * 4 + 4].copy_from_slice(&word.to_le_bytes());
            }
        }
        block
    }

    pub fn size(&self) -> u64 {
        self.bytes.read().unwrap().len() as u64
    }

    /// Direct word peek for test inspection; bypasses the bus.
    pub fn word(&self, offset: u64) -> u32 {
        self.read_u32(offset).unwrap_or(u32::MAX)
    }

    pub fn set_word(&self, offset: u64, value: u32) {
        // Out-of-range pokes are a test authoring mistake; keep the block untouched.
        let _ = self.write_u32(offset, value);
    }
}

impl Device for RegisterBlock {
    fn name(&self) -> &str {
        &self.name
    }

    fn span(&self) -> Range<u64> {
        0..self.size()
    }

    fn read(&self, offset: u64, buf: &mut [u8]) -> DeviceResult<()> {
        let len = buf.len() as u64;
        let data = self.bytes.read().unwrap();
        if offset + len > data.len() as u64 {
            return Err(DeviceError::OutOfRange {
                offset,
                len,
                capacity: data.len() as u64,
            });
        }
        let start = offset as usize;
        let end = start + buf.len();
        buf.copy_from_slice(&data[start..end]);
        Ok(())
    }

    fn write(&self, offset: u64, data_in: &[u8]) -> DeviceResult<()> {
        let len = data_in.len() as u64;
        let mut data = self.bytes.write().unwrap();
        if offset + len > data.len() as u64 {
            return Err(DeviceError::OutOfRange {
                offset,
                len,
                capacity: data.len() as u64,
            });
        }
        let start = offset as usize;
        let end = start + data_in.len();
        data[start..end].copy_from_slice(data_in);
        Ok(())
    }
}
