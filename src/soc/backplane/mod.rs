//! The interconnect core: attach-time enumeration, the single core focus,
//! register access, reset sequencing and the timeout monitor.
//!
//! [`Backplane`] owns everything that would otherwise be global state: the
//! topology table, the focus and the transport's mapping cache. Operations
//! that move the focus either take an [`IrqGuard`] from the caller or create
//! one for the duration of the switch.
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::soc::erom::{self, EROM_LIMIT, EromCursor, HostWords};
use crate::soc::host::{Host, HostAddr, IrqGuard};
use crate::soc::topology::{AddressSpace, TopologyTable, UnitInfo, ids};

pub mod access;
pub mod config;
pub mod error;
pub mod regs;
pub mod reset;
pub mod timeout;
pub mod transport;
pub mod wrapper;

pub use config::{AttachConfig, AttachConfigBuilder, BusKind, ConfigError, WindowGeneration};
pub use error::{BackplaneError, BackplaneResult};
pub use reset::ResetOutcome;
pub use timeout::{ErrorLog, WrapperStatus};
pub use transport::{Focus, Transport, WrapperSlot};

/// The unit that owns the host window on a windowed bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusCore {
    pub index: usize,
    pub id: u16,
    pub rev: u8,
}

pub struct Backplane {
    host: Arc<dyn Host>,
    config: AttachConfig,
    transport: Box<dyn Transport>,
    table: TopologyTable,
    focus: Option<Focus>,
    bus_core: Option<BusCore>,
}

impl Backplane {
    /// Binds to the host. Nothing is discovered until [`scan`](Self::scan).
    pub fn attach(host: Arc<dyn Host>, config: AttachConfig) -> Self {
        let transport = transport::for_config(host.clone(), &config);
        Self {
            host,
            config,
            transport,
            table: TopologyTable::default(),
            focus: None,
            bus_core: None,
        }
    }

    pub fn config(&self) -> &AttachConfig {
        &self.config
    }

    pub fn host(&self) -> &Arc<dyn Host> {
        &self.host
    }

    pub fn table(&self) -> &TopologyTable {
        &self.table
    }

    pub fn unit_count(&self) -> usize {
        self.table.len()
    }

    pub fn bus_core(&self) -> Option<BusCore> {
        self.bus_core
    }

    /// Primary and secondary out-of-band router addresses.
    pub fn oob_routers(&self) -> (Option<u32>, Option<u32>) {
        (self.table.oob_router, self.table.oob_router_secondary)
    }

    /// (Re)discovers the topology. On any malformed descriptor the table is
    /// left empty and zero is returned.
    pub fn scan(&mut self) -> usize {
        self.focus = None;
        self.bus_core = None;
        self.transport.reset();
        self.table = match self.read_topology() {
            Ok(table) => table,
            Err(err) => {
                error!("backplane scan failed: {err}");
                TopologyTable::default()
            }
        };

        if self.config.bus() == BusKind::Windowed {
            self.bus_core = self
                .table
                .units
                .iter()
                .position(|u| ids::is_bus_core(u.id))
                .map(|index| BusCore {
                    index,
                    id: self.table.units[index].id,
                    rev: self.table.units[index].rev,
                });
            if let Some(core) = self.bus_core {
                debug!(index = core.index, "bus core 0x{:03X} rev {}", core.id, core.rev);
            }
        }
        self.transport
            .set_bus_core(self.bus_core.map(|core| core.index));

        info!(units = self.table.len(), bus = ?self.config.bus(), "backplane attached");
        self.table.len()
    }

    fn read_topology(&mut self) -> BackplaneResult<TopologyTable> {
        let erom_base = {
            let cc = self
                .transport
                .open_window(self.config.enum_base(), regs::CORE_SIZE as usize)?;
            self.host.read32(cc.addr() + regs::CC_EROM_PTR as usize)
        };
        debug!("enumeration ROM at 0x{erom_base:08X}");

        let rom = self
            .transport
            .open_window(erom_base, regs::CORE_SIZE as usize)?;
        let mut cursor = EromCursor::new(HostWords::new(&*self.host, rom.addr()), EROM_LIMIT / 4);
        Ok(erom::scan(&mut cursor)?)
    }

    /// Masks interrupts until the returned guard is dropped.
    pub fn mask_interrupts(&self) -> IrqGuard {
        IrqGuard::new(self.host.clone())
    }

    pub fn focus(&self) -> Option<Focus> {
        self.focus
    }

    /// Moves the focus to `unit` and returns the host address of its register
    /// block. The guard proves interrupts are masked; a guard taken on another
    /// host is rejected with [`BackplaneError::ForeignGuard`].
    pub fn select(
        &mut self,
        guard: &IrqGuard,
        unit: usize,
        slot: WrapperSlot,
    ) -> BackplaneResult<HostAddr> {
        if !guard.masks(&self.host) {
            return Err(BackplaneError::ForeignGuard);
        }
        self.select_unmasked(unit, slot)
    }

    /// [`select`](Self::select) for callers already running with interrupts
    /// off, such as an interrupt handler. The caller must keep interrupts off
    /// until it is done with the focus.
    pub fn select_unmasked(&mut self, unit: usize, slot: WrapperSlot) -> BackplaneResult<HostAddr> {
        debug_assert!(
            !self.host.interrupts_enabled(),
            "focus changed with interrupts enabled"
        );
        let focus = self.transport.select(&self.table, unit, slot)?;
        self.focus = Some(focus);
        Ok(focus.regs)
    }

    pub(crate) fn focused(&self) -> BackplaneResult<Focus> {
        self.focus.ok_or(BackplaneError::NoFocus)
    }

    pub(crate) fn focused_wrapper(&self) -> BackplaneResult<HostAddr> {
        let focus = self.focused()?;
        focus
            .wrapper
            .ok_or(BackplaneError::NoWrapper { unit: focus.unit })
    }

    fn focused_unit(&self) -> BackplaneResult<&UnitInfo> {
        let focus = self.focused()?;
        self.unit(focus.unit)
    }

    pub(crate) fn unit(&self, index: usize) -> BackplaneResult<&UnitInfo> {
        self.table.unit(index).ok_or(BackplaneError::UnitOutOfRange {
            index,
            count: self.table.len(),
        })
    }

    pub fn core_index(&self) -> Option<usize> {
        self.focus.map(|f| f.unit)
    }

    pub fn core_id(&self) -> BackplaneResult<u16> {
        Ok(self.focused_unit()?.id)
    }

    pub fn core_vendor(&self) -> BackplaneResult<u16> {
        Ok(self.focused_unit()?.mfg)
    }

    pub fn core_rev(&self) -> BackplaneResult<u8> {
        Ok(self.focused_unit()?.rev)
    }

    pub fn slave_port_count(&self, unit: usize) -> BackplaneResult<u8> {
        Ok(self.unit(unit)?.slave_ports)
    }

    /// Base and size of descriptor `index` on slave `port` of the focused unit.
    pub fn address_space(&self, port: u8, index: u8) -> BackplaneResult<Option<(u64, u64)>> {
        Ok(self
            .focused_unit()?
            .space(port, index)
            .map(|s| (s.base(), s.size())))
    }

    pub fn address_space_size(&self, port: u8, index: u8) -> BackplaneResult<Option<u64>> {
        Ok(self.address_space(port, index)?.map(|(_, size)| size))
    }

    /// Number of slave address descriptors recorded for the focused unit.
    pub fn address_space_count(&self) -> BackplaneResult<usize> {
        Ok(self.focused_unit()?.spaces.len())
    }

    /// The `n`th descriptor on slave ports other than port 0, in ROM order.
    pub fn address_space_x(&self, n: usize) -> BackplaneResult<Option<AddressSpace>> {
        Ok(self
            .focused_unit()?
            .spaces
            .iter()
            .filter(|s| s.port >= 1)
            .nth(n)
            .copied())
    }
}
