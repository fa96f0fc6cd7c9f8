use std::{error::Error, fmt};

use crate::soc::device::DeviceError;

pub type BusResult<T> = Result<T, BusError>;

#[derive(Debug)]
pub enum BusError {
    NotMapped { address: u64 },
    Overlap { address: u64, details: String },
    EmptySpan { device: String },
    DeviceFault { device: String, source: DeviceError },
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusError::NotMapped { address } => write!(f, "address 0x{address:08X} is not mapped"),
            BusError::Overlap { address, details } => write!(
                f,
                "address 0x{address:08X} overlaps existing mapping ({details})"
            ),
            BusError::EmptySpan { device } => {
                write!(f, "device '{device}' reported an empty span")
            }
            BusError::DeviceFault { device, .. } => write!(f, "device '{device}' reported a fault"),
        }
    }
}

impl Error for BusError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BusError::DeviceFault { source, .. } => Some(source),
            _ => None,
        }
    }
}
