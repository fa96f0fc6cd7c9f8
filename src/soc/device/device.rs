//! Defines the `Device` trait used by the simulated backplane. Devices expose
//! their register span and byte-level read/write hooks; little-endian 32-bit
//! register helpers are layered on top so bus code only ever deals in words
//! and translates failures into `BusError::DeviceFault`.
use std::ops::Range;

use super::error::DeviceResult;

pub trait Device: Send + Sync {
    fn name(&self) -> &str;
    fn span(&self) -> Range<u64>;

    /// Read a contiguous slice of bytes from the device at `byte_offset` into `out`.
    fn read(&self, byte_offset: u64, out: &mut [u8]) -> DeviceResult<()>;

    /// Write a contiguous slice of bytes to the device at `byte_offset` from `data`.
    fn write(&self, byte_offset: u64, data: &[u8]) -> DeviceResult<()>;

    fn read_u32(&self, byte_offset: u64) -> DeviceResult<u32> {
        let mut buf = [0u8; 4];
        self.read(byte_offset, &mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    fn write_u32(&self, byte_offset: u64, value: u32) -> DeviceResult<()> {
        self.write(byte_offset, &value.to_le_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soc::device::DeviceError;

    #[derive(Default)]
    struct FaultyDevice;

    impl Device for FaultyDevice {
        fn name(&self) -> &str {
            "faulty"
        }

        fn span(&self) -> Range<u64> {
            0..4
        }

        fn read(&self, _byte_offset: u64, _out: &mut [u8]) -> DeviceResult<()> {
            Err(DeviceError::Unsupported("read"))
        }

        fn write(&self, _byte_offset: u64, _data: &[u8]) -> DeviceResult<()> {
            Err(DeviceError::Unsupported("write"))
        }
    }

    #[test]
    fn word_helpers_are_little_endian() {
        let block = crate::soc::device::RegisterBlock::new("regs", 8);
        block.write_u32(0, 0x1122_3344).expect("write");
        let mut raw = [0u8; 4];
        block.read(0, &mut raw).expect("read");
        assert_eq!(raw, [0x44, 0x33, 0x22, 0x11]);
        assert_eq!(block.read_u32(0).expect("read word"), 0x1122_3344);
    }

    #[test]
    fn word_helpers_propagate_device_errors() {
        let dev = FaultyDevice;
        assert!(
            dev.read_u32(0).is_err(),
            "read_u32 should surface backend errors"
        );
        assert!(
            dev.write_u32(0, 1).is_err(),
            "write_u32 should surface backend errors"
        );
    }
}
