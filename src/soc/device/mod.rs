#[path = "device.rs"]
mod device_trait;
pub mod error;
pub mod ram;
pub mod wrapper;

pub use device_trait::Device;
pub use error::{DeviceError, DeviceResult};
pub use ram::RegisterBlock;
pub use wrapper::WrapperModel;
