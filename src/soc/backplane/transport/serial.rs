use crate::soc::backplane::config::BusKind;
use crate::soc::backplane::error::BackplaneResult;
use crate::soc::backplane::timeout::WrapperStatus;
use crate::soc::host::HostAddr;
use crate::soc::topology::TopologyTable;

use super::{Focus, Transport, Window, WrapperSlot, unit_info};

/// SDIO/SPI: the bus takes backplane addresses directly, so focus is just
/// address arithmetic. There is no fast path because the host layer
/// multiplexes its own window behind `read32`/`write32`.
#[derive(Debug, Default)]
pub struct SerialTransport;

impl Transport for SerialTransport {
    fn kind(&self) -> BusKind {
        BusKind::Serial
    }

    fn open_window(&mut self, phys: u32, _size: usize) -> BackplaneResult<Window> {
        Ok(Window::borrowed(phys as HostAddr))
    }

    fn select(
        &mut self,
        table: &TopologyTable,
        unit: usize,
        slot: WrapperSlot,
    ) -> BackplaneResult<Focus> {
        let info = unit_info(table, unit)?;
        Ok(Focus {
            unit,
            slot,
            regs: info.base() as HostAddr,
            wrapper: info.wrapper(slot.index()).map(|addr| addr as HostAddr),
        })
    }

    fn fast_path(
        &mut self,
        _table: &TopologyTable,
        _unit: usize,
        _offset: u32,
    ) -> BackplaneResult<Option<HostAddr>> {
        Ok(None)
    }

    fn open_wrapper(&mut self, addr: u32) -> Result<Window, WrapperStatus> {
        Ok(Window::borrowed(addr as HostAddr))
    }

    fn reset(&mut self) {}
}
