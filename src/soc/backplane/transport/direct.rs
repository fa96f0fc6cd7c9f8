use std::sync::Arc;

use tracing::debug;

use crate::soc::backplane::config::BusKind;
use crate::soc::backplane::error::BackplaneResult;
use crate::soc::backplane::regs::CORE_SIZE;
use crate::soc::backplane::timeout::WrapperStatus;
use crate::soc::host::{Host, HostAddr, MappedWindow};
use crate::soc::topology::{TopologyTable, UnitInfo, ids};

use super::{Focus, Transport, Window, WrapperSlot, unit_info};

/// Lazily created mappings of one unit. Dropping the slot unmaps them.
#[derive(Default)]
struct UnitMaps {
    regs: Option<MappedWindow>,
    wrappers: [Option<MappedWindow>; 3],
}

/// Memory-mapped backplane. Every unit can be reached at any time once its
/// windows are mapped, so the fast path always applies.
pub struct DirectTransport {
    host: Arc<dyn Host>,
    maps: Vec<UnitMaps>,
}

impl DirectTransport {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self {
            host,
            maps: Vec::new(),
        }
    }

    fn slot(&mut self, unit: usize) -> &mut UnitMaps {
        if self.maps.len() <= unit {
            self.maps.resize_with(unit + 1, UnitMaps::default);
        }
        &mut self.maps[unit]
    }

    fn regs(&mut self, unit: usize, info: &UnitInfo) -> BackplaneResult<HostAddr> {
        let host = self.host.clone();
        let maps = self.slot(unit);
        if let Some(window) = &maps.regs {
            return Ok(window.addr());
        }
        let window = MappedWindow::map(&host, info.base() as u64, map_size(info))?;
        debug!(unit, "mapped registers of 0x{:03X} at {window:?}", info.id);
        let addr = window.addr();
        maps.regs = Some(window);
        Ok(addr)
    }
}

/// One unit spans several banks and needs a larger window.
fn map_size(info: &UnitInfo) -> usize {
    if info.id == ids::NS_CCB_CORE_ID {
        15 * CORE_SIZE as usize
    } else {
        CORE_SIZE as usize
    }
}

impl Transport for DirectTransport {
    fn kind(&self) -> BusKind {
        BusKind::Direct
    }

    fn open_window(&mut self, phys: u32, size: usize) -> BackplaneResult<Window> {
        let mapping = MappedWindow::map(&self.host, phys as u64, size)?;
        Ok(Window::mapped(mapping))
    }

    fn select(
        &mut self,
        table: &TopologyTable,
        unit: usize,
        slot: WrapperSlot,
    ) -> BackplaneResult<Focus> {
        let info = unit_info(table, unit)?;
        let regs = self.regs(unit, info)?;

        let host = self.host.clone();
        let maps = self.slot(unit);
        for (idx, wrapper) in info.wrappers.iter().enumerate() {
            let Some(addr) = *wrapper else { continue };
            if maps.wrappers[idx].is_none() {
                maps.wrappers[idx] = Some(MappedWindow::map(&host, addr as u64, CORE_SIZE as usize)?);
            }
        }
        let wrapper = maps.wrappers[slot.index()].as_ref().map(MappedWindow::addr);

        Ok(Focus {
            unit,
            slot,
            regs,
            wrapper,
        })
    }

    fn fast_path(
        &mut self,
        table: &TopologyTable,
        unit: usize,
        offset: u32,
    ) -> BackplaneResult<Option<HostAddr>> {
        let info = unit_info(table, unit)?;
        Ok(Some(self.regs(unit, info)? + offset as usize))
    }

    fn open_wrapper(&mut self, addr: u32) -> Result<Window, WrapperStatus> {
        MappedWindow::map(&self.host, addr as u64, CORE_SIZE as usize)
            .map(Window::mapped)
            .map_err(|_| WrapperStatus::SET_CORE_FAIL)
    }

    fn reset(&mut self) {
        self.maps.clear();
    }
}
