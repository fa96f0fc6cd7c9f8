//! The registry a scan produces: discovered units, their address spaces and
//! wrapper windows, the wrapper inventory and the bridge list.
pub mod ids;
pub mod inventory;
pub mod table;

pub use inventory::{WrapperInfo, WrapperRole};
pub use table::{AddressSpace, TopologyTable, UnitInfo};

pub const MAX_UNITS: usize = 64;
pub const MAX_WRAPPERS: usize = 128;
pub const MAX_BRIDGES: usize = 4;
