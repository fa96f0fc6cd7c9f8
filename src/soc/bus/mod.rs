pub mod error;
pub mod range;
pub mod softbus;

pub use error::{BusError, BusResult};
pub use range::BusRange;
pub use softbus::{DeviceBus, DeviceRef};
