use std::{error::Error, fmt};

pub type DeviceResult<T> = Result<T, DeviceError>;

#[derive(Debug)]
pub enum DeviceError {
    OutOfRange { offset: u64, len: u64, capacity: u64 },
    Unaligned { offset: u64, len: u64 },
    Unsupported(&'static str),
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::OutOfRange { offset, len, capacity } => {
                write!(
                    f,
                    "device access offset 0x{offset:08X} len {len} exceeds capacity 0x{capacity:08X}"
                )
            }
            DeviceError::Unaligned { offset, len } => {
                write!(f, "register access at 0x{offset:08X} len {len} is not a 32-bit word")
            }
            DeviceError::Unsupported(msg) => write!(f, "device operation unsupported: {msg}"),
        }
    }
}

impl Error for DeviceError {}
