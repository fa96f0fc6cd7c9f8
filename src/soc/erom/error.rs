use std::{error::Error, fmt};

pub type EromResult<T> = Result<T, EromError>;

/// A descriptor stream that violates the expected structure. Any of these
/// aborts the scan and leaves the topology empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EromError {
    MissingSecondHalf { offset: usize, found: u32 },
    MissingMasterPort { unit: usize, port: u8, found: u32 },
    MissingSlaveDescriptor { unit: usize, id: u16 },
    InvalidSlaveDescriptor { unit: usize, id: u16, addr: u32, size: u32 },
    EmptySlavePort { unit: usize, id: u16, port: u8 },
    MissingWrapper { unit: usize, id: u16, index: u8 },
    WrapperSize { unit: usize, id: u16, addr: u32, size: u32 },
    BridgeOverflow { addr: u32 },
    TooManyUnits { limit: usize },
    EscapeBound { offset: usize },
    Exhausted { offset: usize },
}

impl fmt::Display for EromError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EromError::MissingSecondHalf { offset, found } => write!(
                f,
                "component at 0x{offset:03X} lacks its second half (found 0x{found:08X})"
            ),
            EromError::MissingMasterPort { unit, port, found } => write!(
                f,
                "unit {unit}: master port {port} descriptor missing (found 0x{found:08X})"
            ),
            EromError::MissingSlaveDescriptor { unit, id } => {
                write!(f, "unit {unit} (0x{id:03X}) has neither slave nor bridge descriptor")
            }
            EromError::InvalidSlaveDescriptor {
                unit,
                id,
                addr,
                size,
            } => write!(
                f,
                "unit {unit} (0x{id:03X}) slave port 0 at 0x{addr:08X} size 0x{size:X} is invalid"
            ),
            EromError::EmptySlavePort { unit, id, port } => {
                write!(f, "unit {unit} (0x{id:03X}) slave port {port} has no address descriptors")
            }
            EromError::MissingWrapper { unit, id, index } => {
                write!(f, "unit {unit} (0x{id:03X}) wrapper {index} descriptor missing")
            }
            EromError::WrapperSize {
                unit,
                id,
                addr,
                size,
            } => write!(
                f,
                "unit {unit} (0x{id:03X}) wrapper at 0x{addr:08X} has size 0x{size:X}"
            ),
            EromError::BridgeOverflow { addr } => {
                write!(f, "bridge wrapper 0x{addr:08X} exceeds the bridge table")
            }
            EromError::TooManyUnits { limit } => write!(f, "more than {limit} units discovered"),
            EromError::EscapeBound { offset } => {
                write!(f, "no end marker found before offset 0x{offset:X}")
            }
            EromError::Exhausted { offset } => {
                write!(f, "enumeration ROM window exhausted at offset 0x{offset:X}")
            }
        }
    }
}

impl Error for EromError {}
