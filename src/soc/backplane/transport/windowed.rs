use std::sync::Arc;

use tracing::{error, trace};

use crate::soc::backplane::config::{AttachConfig, BusKind, WindowGeneration};
use crate::soc::backplane::error::{BackplaneError, BackplaneResult};
use crate::soc::backplane::regs::{CORE_SIZE, pci};
use crate::soc::backplane::timeout::WrapperStatus;
use crate::soc::host::{Host, HostAddr};
use crate::soc::topology::{TopologyTable, ids};

use super::{Focus, Transport, Window, WrapperSlot, unit_info};

/// PCI-style BAR0 aperture. Slice 0 moves the primary window pair through
/// configuration space; slice 1 uses the Gen2 second-core pair; slice 2 is
/// steered by registers inside the bus core itself.
pub struct WindowedTransport {
    host: Arc<dyn Host>,
    bar0: HostAddr,
    slice: u8,
    generation: WindowGeneration,
    fast_window: bool,
    bus_core: Option<usize>,
}

impl WindowedTransport {
    pub fn new(host: Arc<dyn Host>, bar0: HostAddr, config: &AttachConfig) -> Self {
        Self {
            host,
            bar0,
            slice: config.slice(),
            generation: config.generation(),
            fast_window: config.fast_window(),
            bus_core: None,
        }
    }

    fn wrapper_window_reg(&self) -> u32 {
        match self.generation {
            WindowGeneration::Gen2 => pci::PCIE2_BAR0_WIN2,
            WindowGeneration::Gen1 => pci::BAR0_WIN2,
        }
    }

    /// Configuration write followed by a read-back so the window has moved
    /// before anything is accessed through it.
    fn point(&self, reg: u32, addr: u32) {
        self.host.config_write(reg, 4, addr);
        let _ = self.host.config_read(reg, 4);
    }

    fn require_gen2(&self) -> BackplaneResult<()> {
        if self.generation != WindowGeneration::Gen2 {
            error!(slice = self.slice, "window generation does not support this slice");
            return Err(BackplaneError::UnsupportedSlice { slice: self.slice });
        }
        Ok(())
    }

    fn bus_core_reg(&self, offset: u32) -> HostAddr {
        let window = if self.fast_window {
            pci::BAR0_16KB_PCIREGS_OFFSET
        } else if offset >= pci::SBCONFIG_OFFSET {
            pci::BAR0_PCISBR_OFFSET
        } else {
            pci::BAR0_PCIREGS_OFFSET
        };
        self.bar0 + window + offset as usize
    }
}

impl Transport for WindowedTransport {
    fn kind(&self) -> BusKind {
        BusKind::Windowed
    }

    fn open_window(&mut self, phys: u32, _size: usize) -> BackplaneResult<Window> {
        self.point(pci::BAR0_WIN, phys);
        Ok(Window::borrowed(self.bar0))
    }

    fn select(
        &mut self,
        table: &TopologyTable,
        unit: usize,
        slot: WrapperSlot,
    ) -> BackplaneResult<Focus> {
        let info = unit_info(table, unit)?;
        let addr = info.base();
        let wrap = info.wrapper(slot.index()).unwrap_or(0);

        let regs = match self.slice {
            0 => {
                self.point(pci::BAR0_WIN, addr);
                self.point(self.wrapper_window_reg(), wrap);
                self.bar0
            }
            1 => {
                self.require_gen2()?;
                self.point(pci::PCIE2_BAR0_CORE2_WIN, addr);
                self.point(pci::PCIE2_BAR0_CORE2_WIN2, wrap);
                self.bar0 + pci::BAR0_SEC_WIN_OFFSET
            }
            2 => {
                self.require_gen2()?;
                if self.bus_core.is_none() {
                    error!("tertiary slice needs a discovered bus core");
                    return Err(BackplaneError::UnsupportedSlice { slice: 2 });
                }
                for (reg, value) in [
                    (pci::PCIE_TER_BAR0_WIN, addr),
                    (pci::PCIE_TER_BAR0_WRAPPER, wrap),
                ] {
                    let at = self.bus_core_reg(reg);
                    self.host.write32(at, value);
                    let _ = self.host.read32(at);
                }
                self.bar0 + pci::BAR0_TER_WIN_OFFSET
            }
            slice => {
                error!(slice, "no BAR0 window for slice");
                return Err(BackplaneError::UnsupportedSlice { slice });
            }
        };
        trace!(unit, slice = self.slice, "window at 0x{addr:08X} wrapper 0x{wrap:08X}");

        Ok(Focus {
            unit,
            slot,
            regs,
            wrapper: (wrap != 0).then_some(regs + CORE_SIZE as usize),
        })
    }

    fn fast_path(
        &mut self,
        table: &TopologyTable,
        unit: usize,
        offset: u32,
    ) -> BackplaneResult<Option<HostAddr>> {
        let info = unit_info(table, unit)?;
        if info.id == ids::CC_CORE_ID && self.fast_window {
            return Ok(Some(
                self.bar0 + pci::BAR0_16KB_CCREGS_OFFSET + offset as usize,
            ));
        }
        if self.bus_core == Some(unit) {
            return Ok(Some(self.bus_core_reg(offset)));
        }
        Ok(None)
    }

    fn open_wrapper(&mut self, addr: u32) -> Result<Window, WrapperStatus> {
        let reg = self.wrapper_window_reg();
        let saved = self.host.config_read(reg, 4);
        if saved == pci::INVALID {
            return Err(WrapperStatus::PCI_RD_ERR);
        }
        self.point(reg, addr);
        Ok(Window::restoring(
            self.bar0 + pci::BAR0_WIN2_OFFSET,
            self.host.clone(),
            reg,
            saved,
        ))
    }

    fn set_bus_core(&mut self, index: Option<usize>) {
        self.bus_core = index;
    }

    fn reset(&mut self) {
        self.bus_core = None;
    }
}
