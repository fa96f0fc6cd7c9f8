//! Simulated platform used to exercise the backplane core without hardware.
//!
//! `SimHost` routes every host access onto a [`DeviceBus`] holding the
//! backplane's physical map. Direct and serial transports see the bus
//! identity-mapped; a windowed transport sees a BAR0 aperture whose windows are
//! steered by configuration writes (and, for the tertiary slice, by bus core
//! registers), just like the PCIe endpoint does. Delays advance a virtual
//! clock, and a pending interrupt can be queued to fire on a later access while
//! interrupts are enabled.
use std::sync::{
    Mutex, RwLock,
    atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering},
};

use ahash::AHashMap;
use tracing::trace;

use crate::soc::backplane::regs::pci;
use crate::soc::bus::{BusResult, DeviceBus, DeviceRef};

use super::{Host, HostAddr, HostError, HostResult, IrqState};

type IrqHandler = Box<dyn FnOnce(&SimHost) + Send>;

struct PendingIrq {
    countdown: u32,
    handler: IrqHandler,
}

/// Geometry of the emulated BAR0 aperture.
#[derive(Debug, Clone, Copy)]
pub struct WindowLayout {
    /// Host address at which BAR0 starts.
    pub bar0: HostAddr,
    /// Wrapper window programmed through the Gen2 register set.
    pub gen2: bool,
    /// Physical base of chip-common, exposed at the fixed fast offset.
    pub chipcommon: u64,
    /// Physical base of the bus core's registers, exposed at the fixed fast offset.
    pub bus_core: u64,
}

const BAR0_SIZE: usize = 0xB000;

pub struct SimHost {
    bus: RwLock<DeviceBus>,
    window: Option<WindowLayout>,
    config: Mutex<AHashMap<u32, u32>>,
    mappings: Mutex<AHashMap<HostAddr, usize>>,
    map_calls: AtomicU32,
    fail_maps: AtomicBool,
    irq_enabled: AtomicBool,
    in_handler: AtomicBool,
    pending: Mutex<Option<PendingIrq>>,
    elapsed_us: AtomicU64,
}

impl Default for SimHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SimHost {
    pub fn new() -> Self {
        Self {
            bus: RwLock::new(DeviceBus::new()),
            window: None,
            config: Mutex::new(AHashMap::new()),
            mappings: Mutex::new(AHashMap::new()),
            map_calls: AtomicU32::new(0),
            fail_maps: AtomicBool::new(false),
            irq_enabled: AtomicBool::new(true),
            in_handler: AtomicBool::new(false),
            pending: Mutex::new(None),
            elapsed_us: AtomicU64::new(0),
        }
    }

    pub fn with_window(layout: WindowLayout) -> Self {
        Self {
            window: Some(layout),
            ..Self::new()
        }
    }

    pub fn map_device(&self, device: DeviceRef, address: u64) -> BusResult<()> {
        self.bus.write().unwrap().map_device(device, address)
    }

    /// Removes the device mapped at `address`. Later reads return all ones.
    pub fn unmap_device(&self, address: u64) -> BusResult<()> {
        self.bus.write().unwrap().unmap(address)
    }

    /// Backplane-side read, bypassing any host window.
    pub fn read_phys(&self, address: u64) -> u32 {
        self.bus
            .read()
            .unwrap()
            .read_u32(address)
            .unwrap_or(u32::MAX)
    }

    pub fn write_phys(&self, address: u64, value: u32) {
        if let Err(err) = self.bus.read().unwrap().write_u32(address, value) {
            trace!("dropped backplane write 0x{address:08X}: {err}");
        }
    }

    /// Queues an interrupt that fires on the next host access made while
    /// interrupts are enabled.
    pub fn raise_interrupt(&self, handler: impl FnOnce(&SimHost) + Send + 'static) {
        self.raise_interrupt_after(0, handler);
    }

    /// Like [`raise_interrupt`](Self::raise_interrupt) but lets `accesses`
    /// unmasked accesses complete first.
    pub fn raise_interrupt_after(
        &self,
        accesses: u32,
        handler: impl FnOnce(&SimHost) + Send + 'static,
    ) {
        *self.pending.lock().unwrap() = Some(PendingIrq {
            countdown: accesses,
            handler: Box::new(handler),
        });
    }

    pub fn interrupt_pending(&self) -> bool {
        self.pending.lock().unwrap().is_some()
    }

    pub fn elapsed_us(&self) -> u64 {
        self.elapsed_us.load(Ordering::SeqCst)
    }

    pub fn map_calls(&self) -> u32 {
        self.map_calls.load(Ordering::SeqCst)
    }

    pub fn live_mappings(&self) -> usize {
        self.mappings.lock().unwrap().len()
    }

    /// Makes every subsequent `map` call fail.
    pub fn fail_maps(&self, fail: bool) {
        self.fail_maps.store(fail, Ordering::SeqCst);
    }

    pub fn config_value(&self, reg: u32) -> u32 {
        self.config.lock().unwrap().get(&reg).copied().unwrap_or(0)
    }

    fn service_interrupt(&self) {
        if !self.irq_enabled.load(Ordering::SeqCst) || self.in_handler.load(Ordering::SeqCst) {
            return;
        }
        let pending = {
            let mut slot = self.pending.lock().unwrap();
            match slot.as_mut() {
                Some(irq) if irq.countdown > 0 => {
                    irq.countdown -= 1;
                    None
                }
                Some(_) => slot.take(),
                None => None,
            }
        };
        if let Some(irq) = pending {
            self.in_handler.store(true, Ordering::SeqCst);
            self.irq_enabled.store(false, Ordering::SeqCst);
            (irq.handler)(self);
            self.irq_enabled.store(true, Ordering::SeqCst);
            self.in_handler.store(false, Ordering::SeqCst);
        }
    }

    fn translate(&self, addr: HostAddr) -> Option<u64> {
        let Some(layout) = self.window else {
            return Some(addr as u64);
        };
        if addr < layout.bar0 || addr >= layout.bar0 + BAR0_SIZE {
            return Some(addr as u64);
        }
        let offset = addr - layout.bar0;
        let within = (offset & 0xFFF) as u64;
        let base = match offset & !0xFFF {
            0x0000 => self.config_value(pci::BAR0_WIN) as u64,
            0x1000 if layout.gen2 => self.config_value(pci::PCIE2_BAR0_WIN2) as u64,
            0x1000 => self.config_value(pci::BAR0_WIN2) as u64,
            0x2000 => layout.bus_core,
            0x3000 => layout.chipcommon,
            0x4000 => self.config_value(pci::PCIE2_BAR0_CORE2_WIN) as u64,
            0x5000 => self.config_value(pci::PCIE2_BAR0_CORE2_WIN2) as u64,
            0x9000 => self.read_phys(layout.bus_core + pci::PCIE_TER_BAR0_WIN as u64) as u64,
            0xA000 => {
                self.read_phys(layout.bus_core + pci::PCIE_TER_BAR0_WRAPPER as u64) as u64
            }
            _ => return None,
        };
        Some(base + within)
    }
}

impl Host for SimHost {
    fn map(&self, phys: u64, size: usize) -> HostResult<HostAddr> {
        self.map_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_maps.load(Ordering::SeqCst) {
            return Err(HostError::MapFailed { phys, size });
        }
        let addr = phys as HostAddr;
        self.mappings.lock().unwrap().insert(addr, size);
        Ok(addr)
    }

    fn unmap(&self, addr: HostAddr, _size: usize) {
        self.mappings.lock().unwrap().remove(&addr);
    }

    fn read32(&self, addr: HostAddr) -> u32 {
        self.service_interrupt();
        match self.translate(addr) {
            Some(phys) => self.read_phys(phys),
            None => u32::MAX,
        }
    }

    fn write32(&self, addr: HostAddr, value: u32) {
        self.service_interrupt();
        match self.translate(addr) {
            Some(phys) => self.write_phys(phys, value),
            None => trace!("dropped write to unwindowed host address 0x{addr:X}"),
        }
    }

    fn config_read(&self, reg: u32, _width: usize) -> u32 {
        self.service_interrupt();
        self.config_value(reg)
    }

    fn config_write(&self, reg: u32, _width: usize, value: u32) {
        self.service_interrupt();
        self.config.lock().unwrap().insert(reg, value);
    }

    fn delay_us(&self, us: u32) {
        self.elapsed_us.fetch_add(us as u64, Ordering::SeqCst);
    }

    fn interrupts_off(&self) -> IrqState {
        let previous = self.irq_enabled.swap(false, Ordering::SeqCst);
        IrqState::new(previous as u64)
    }

    fn interrupts_restore(&self, state: IrqState) {
        let enable = state.raw() != 0;
        self.irq_enabled.store(enable, Ordering::SeqCst);
        if enable {
            self.service_interrupt();
        }
    }

    fn interrupts_enabled(&self) -> bool {
        self.irq_enabled.load(Ordering::SeqCst)
    }
}
