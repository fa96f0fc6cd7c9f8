use std::{error::Error, fmt};

use crate::soc::erom::EromError;
use crate::soc::host::HostError;

pub type BackplaneResult<T> = Result<T, BackplaneError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackplaneError {
    UnitOutOfRange { index: usize, count: usize },
    OffsetOutOfRange { offset: u32 },
    ValueOutsideMask { mask: u32, value: u32 },
    NoFocus,
    /// The focused unit has no wrapper in the selected slot.
    NoWrapper { unit: usize },
    /// No window mechanism exists for this slice on this window generation.
    UnsupportedSlice { slice: u8 },
    UnsupportedTransport(&'static str),
    /// The interrupt guard passed in belongs to a different host.
    ForeignGuard,
    Erom(EromError),
    Host(HostError),
}

impl fmt::Display for BackplaneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackplaneError::UnitOutOfRange { index, count } => {
                write!(f, "unit {index} out of range ({count} units discovered)")
            }
            BackplaneError::OffsetOutOfRange { offset } => {
                write!(f, "register offset 0x{offset:X} lies outside the unit window")
            }
            BackplaneError::ValueOutsideMask { mask, value } => {
                write!(f, "value 0x{value:08X} sets bits outside mask 0x{mask:08X}")
            }
            BackplaneError::NoFocus => write!(f, "no unit is selected"),
            BackplaneError::NoWrapper { unit } => {
                write!(f, "unit {unit} has no wrapper in the selected slot")
            }
            BackplaneError::UnsupportedSlice { slice } => {
                write!(f, "BAR0 window not supported for slice {slice}")
            }
            BackplaneError::UnsupportedTransport(op) => {
                write!(f, "{op} is not available on this transport")
            }
            BackplaneError::ForeignGuard => {
                write!(f, "interrupt guard does not belong to this backplane's host")
            }
            BackplaneError::Erom(err) => write!(f, "malformed enumeration ROM: {err}"),
            BackplaneError::Host(err) => write!(f, "host error: {err}"),
        }
    }
}

impl Error for BackplaneError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BackplaneError::Erom(err) => Some(err),
            BackplaneError::Host(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EromError> for BackplaneError {
    fn from(err: EromError) -> Self {
        BackplaneError::Erom(err)
    }
}

impl From<HostError> for BackplaneError {
    fn from(err: HostError) -> Self {
        BackplaneError::Host(err)
    }
}
