//! Host bus transports. Each one knows how to make a unit's register block
//! and wrapper reachable from the host, and which registers can be reached
//! without moving the focus at all.
use std::sync::Arc;

use crate::soc::host::{Host, HostAddr, MappedWindow};
use crate::soc::topology::{TopologyTable, UnitInfo};

use super::config::{AttachConfig, BusKind};
use super::error::{BackplaneError, BackplaneResult};
use super::timeout::WrapperStatus;

mod direct;
mod serial;
mod windowed;

pub use direct::DirectTransport;
pub use serial::SerialTransport;
pub use windowed::WindowedTransport;

/// Which of a unit's (up to three) wrappers the focus points at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WrapperSlot {
    #[default]
    Primary,
    Secondary,
    Tertiary,
}

impl WrapperSlot {
    pub const ALL: [WrapperSlot; 3] = [
        WrapperSlot::Primary,
        WrapperSlot::Secondary,
        WrapperSlot::Tertiary,
    ];

    pub fn index(self) -> usize {
        match self {
            WrapperSlot::Primary => 0,
            WrapperSlot::Secondary => 1,
            WrapperSlot::Tertiary => 2,
        }
    }
}

/// The currently addressable unit and the host addresses of its register
/// block and selected wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Focus {
    pub unit: usize,
    pub slot: WrapperSlot,
    pub regs: HostAddr,
    pub wrapper: Option<HostAddr>,
}

/// A temporarily reachable physical window. Whatever was done to make it
/// reachable (a mapping, a window register) is undone on drop.
pub struct Window {
    addr: HostAddr,
    _mapping: Option<MappedWindow>,
    _restore: Option<ConfigRestore>,
}

impl Window {
    pub(crate) fn borrowed(addr: HostAddr) -> Self {
        Self {
            addr,
            _mapping: None,
            _restore: None,
        }
    }

    pub(crate) fn mapped(mapping: MappedWindow) -> Self {
        Self {
            addr: mapping.addr(),
            _mapping: Some(mapping),
            _restore: None,
        }
    }

    pub(crate) fn restoring(addr: HostAddr, host: Arc<dyn Host>, reg: u32, value: u32) -> Self {
        Self {
            addr,
            _mapping: None,
            _restore: Some(ConfigRestore { host, reg, value }),
        }
    }

    #[inline(always)]
    pub fn addr(&self) -> HostAddr {
        self.addr
    }
}

struct ConfigRestore {
    host: Arc<dyn Host>,
    reg: u32,
    value: u32,
}

impl Drop for ConfigRestore {
    fn drop(&mut self) {
        self.host.config_write(self.reg, 4, self.value);
    }
}

pub trait Transport: Send {
    fn kind(&self) -> BusKind;

    /// Makes `size` bytes at physical `phys` readable. Used at scan time for
    /// chip-common and the enumeration ROM, before any focus exists.
    fn open_window(&mut self, phys: u32, size: usize) -> BackplaneResult<Window>;

    /// Moves the focus to `unit`, exposing the wrapper in `slot`.
    fn select(
        &mut self,
        table: &TopologyTable,
        unit: usize,
        slot: WrapperSlot,
    ) -> BackplaneResult<Focus>;

    /// Host address of `offset` inside `unit` when it is reachable without a
    /// focus change.
    fn fast_path(
        &mut self,
        table: &TopologyTable,
        unit: usize,
        offset: u32,
    ) -> BackplaneResult<Option<HostAddr>>;

    /// Makes an arbitrary wrapper reachable for the timeout monitor. Failure
    /// is reported as the status bit describing it.
    fn open_wrapper(&mut self, addr: u32) -> Result<Window, WrapperStatus>;

    /// Records the unit owning the host window (windowed transport only).
    fn set_bus_core(&mut self, _index: Option<usize>) {}

    /// Forgets every cached mapping, e.g. before a rescan.
    fn reset(&mut self);
}

pub fn for_config(host: Arc<dyn Host>, config: &AttachConfig) -> Box<dyn Transport> {
    match (config.bus(), config.bar0()) {
        (BusKind::Windowed, Some(bar0)) => Box::new(WindowedTransport::new(host, bar0, config)),
        (BusKind::Serial, _) => Box::new(SerialTransport),
        _ => Box::new(DirectTransport::new(host)),
    }
}

fn unit_info(table: &TopologyTable, unit: usize) -> BackplaneResult<&UnitInfo> {
    table.unit(unit).ok_or(BackplaneError::UnitOutOfRange {
        index: unit,
        count: table.len(),
    })
}
