//! Platform collaborators consumed by the backplane core: memory mapping,
//! ordered 32-bit register access, windowed-bus configuration space, delays
//! and the interrupt mask. Everything above this module talks to hardware
//! exclusively through [`Host`].
use std::{error::Error, fmt, sync::Arc};

pub mod sim;

pub use sim::{SimHost, WindowLayout};

/// Address in the host's view: a mapped virtual address for the direct
/// transport, an offset into the BAR window for the windowed transport, or the
/// raw backplane address for the serial transport.
pub type HostAddr = usize;

/// Polling granularity used by every bounded busy-wait.
pub const POLL_INTERVAL_US: u32 = 10;

pub type HostResult<T> = Result<T, HostError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    MapFailed { phys: u64, size: usize },
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::MapFailed { phys, size } => {
                write!(f, "failed to map 0x{size:X} bytes at 0x{phys:08X}")
            }
        }
    }
}

impl Error for HostError {}

/// Saved interrupt state returned by [`Host::interrupts_off`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrqState(u64);

impl IrqState {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

pub trait Host: Send + Sync {
    fn map(&self, phys: u64, size: usize) -> HostResult<HostAddr>;
    fn unmap(&self, addr: HostAddr, size: usize);

    /// Reads are never reordered past dependent accesses.
    fn read32(&self, addr: HostAddr) -> u32;
    fn write32(&self, addr: HostAddr, value: u32);

    fn config_read(&self, reg: u32, width: usize) -> u32;
    fn config_write(&self, reg: u32, width: usize, value: u32);

    fn delay_us(&self, us: u32);

    fn interrupts_off(&self) -> IrqState;
    fn interrupts_restore(&self, state: IrqState);
    fn interrupts_enabled(&self) -> bool;
}

/// Interrupts stay masked for as long as the guard lives. Focus-changing
/// operations take `&IrqGuard` as proof that nothing can re-enter the driver.
pub struct IrqGuard {
    host: Arc<dyn Host>,
    state: IrqState,
}

impl IrqGuard {
    pub fn new(host: Arc<dyn Host>) -> Self {
        let state = host.interrupts_off();
        Self { host, state }
    }

    /// Whether this guard masks interrupts on `host` rather than on some
    /// other host.
    pub fn masks(&self, host: &Arc<dyn Host>) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.host), Arc::as_ptr(host))
    }
}

impl Drop for IrqGuard {
    fn drop(&mut self) {
        self.host.interrupts_restore(self.state);
    }
}

/// A live host mapping of a physical range; unmapped when dropped.
pub struct MappedWindow {
    host: Arc<dyn Host>,
    addr: HostAddr,
    size: usize,
}

impl MappedWindow {
    pub fn map(host: &Arc<dyn Host>, phys: u64, size: usize) -> HostResult<Self> {
        let addr = host.map(phys, size)?;
        Ok(Self {
            host: host.clone(),
            addr,
            size,
        })
    }

    #[inline(always)]
    pub fn addr(&self) -> HostAddr {
        self.addr
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

impl fmt::Debug for MappedWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedWindow")
            .field("addr", &format_args!("{:#x}", self.addr))
            .field("size", &self.size)
            .finish()
    }
}

impl Drop for MappedWindow {
    fn drop(&mut self) {
        self.host.unmap(self.addr, self.size);
    }
}

/// Polls `busy` every [`POLL_INTERVAL_US`] until it reports false or
/// `timeout_us` has elapsed. Returns `true` when the condition cleared.
pub fn spin_wait(host: &dyn Host, timeout_us: u32, mut busy: impl FnMut() -> bool) -> bool {
    let mut waited = 0;
    loop {
        if !busy() {
            return true;
        }
        if waited >= timeout_us {
            return false;
        }
        host.delay_us(POLL_INTERVAL_US);
        waited += POLL_INTERVAL_US;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spin_wait_is_bounded() {
        let host = SimHost::new();
        let mut polls = 0;
        let cleared = spin_wait(&host, 300, || {
            polls += 1;
            true
        });
        assert!(!cleared, "condition never clears");
        assert_eq!(polls, 31, "300us at 10us granularity plus the final check");
        assert_eq!(host.elapsed_us(), 300);
    }

    #[test]
    fn spin_wait_returns_as_soon_as_condition_clears() {
        let host = SimHost::new();
        let mut remaining = 3;
        let cleared = spin_wait(&host, 300, || {
            remaining -= 1;
            remaining > 0
        });
        assert!(cleared);
        assert_eq!(host.elapsed_us(), 20);
    }

    #[test]
    fn irq_guard_masks_and_restores() {
        let sim = Arc::new(SimHost::new());
        let host: Arc<dyn Host> = sim.clone();
        assert!(host.interrupts_enabled());
        {
            let _guard = IrqGuard::new(host.clone());
            assert!(!host.interrupts_enabled(), "guard should mask interrupts");
            {
                let _nested = IrqGuard::new(host.clone());
            }
            assert!(
                !host.interrupts_enabled(),
                "nested guard must restore the masked state, not enable"
            );
        }
        assert!(host.interrupts_enabled(), "dropping the guard restores interrupts");
    }

    #[test]
    fn mapped_window_unmaps_on_drop() {
        let sim = Arc::new(SimHost::new());
        let host: Arc<dyn Host> = sim.clone();
        {
            let window = MappedWindow::map(&host, 0x1800_0000, 0x1000).expect("map");
            assert_eq!(window.size(), 0x1000);
            assert_eq!(sim.live_mappings(), 1);
        }
        assert_eq!(sim.live_mappings(), 0, "drop should unmap");
    }
}
