//! Reset and quiescence sequencing on the focused unit's wrapper(s).
use tracing::{error, warn};

use crate::soc::host::{Host, HostAddr, IrqGuard, spin_wait};

use super::Backplane;
use super::error::BackplaneResult;
use super::regs::{IoControl, RESET, wrapper as dmp};
use super::transport::WrapperSlot;

/// Bound for ordinary quiescence waits.
pub const SHORT_WAIT_US: u32 = 300;
/// Second, best-effort wait before forcing a unit into reset.
pub const LONG_WAIT_US: u32 = 10_000;
/// How many times reset release is attempted before giving up.
pub const RESET_RELEASE_ATTEMPTS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    Released,
    /// At least one reset domain still reports reset asserted.
    StillInReset,
}

impl Backplane {
    /// Puts the focused unit into reset with `bits` held in I/O control. Does
    /// nothing when the unit is already in reset.
    pub fn disable(&mut self, bits: u32) -> BackplaneResult<()> {
        let wrap = self.focused_wrapper()?;
        let host = &*self.host;
        if host.read32(wrap + dmp::RESETCTRL as usize) & RESET != 0 {
            return Ok(());
        }

        if !wait_quiescent(host, wrap, SHORT_WAIT_US)
            && !wait_quiescent(host, wrap, LONG_WAIT_US)
        {
            warn!(
                "wrapper 0x{wrap:X} resetstatus 0x{:X} on disable; forcing reset",
                host.read32(wrap + dmp::RESETSTATUS as usize)
            );
        }

        write_sync(host, wrap + dmp::RESETCTRL as usize, RESET);
        host.delay_us(1);
        write_sync(host, wrap + dmp::IOCTRL as usize, bits);
        host.delay_us(10);
        Ok(())
    }

    /// Takes the focused unit through reset: `bits` stay set afterwards,
    /// `resetbits` only while reset is asserted. Units with a secondary or
    /// tertiary wrapper have those reset domains cycled first; the focus ends
    /// on the primary wrapper.
    pub fn reset(&mut self, bits: u32, resetbits: u32) -> BackplaneResult<ResetOutcome> {
        let focus = self.focused()?;
        let extra: Vec<WrapperSlot> = [WrapperSlot::Tertiary, WrapperSlot::Secondary]
            .into_iter()
            .filter(|slot| {
                self.table
                    .unit(focus.unit)
                    .and_then(|u| u.wrapper(slot.index()))
                    .is_some()
            })
            .collect();

        let mut released = true;
        {
            let _guard = IrqGuard::new(self.host.clone());
            for slot in extra {
                self.select_unmasked(focus.unit, slot)?;
                released &= reset_domain(&*self.host, self.focused_wrapper()?, bits, resetbits);
            }
            if focus.slot != WrapperSlot::Primary || self.focus != Some(focus) {
                self.select_unmasked(focus.unit, WrapperSlot::Primary)?;
            }
        }
        released &= reset_domain(&*self.host, self.focused_wrapper()?, bits, resetbits);

        if released {
            Ok(ResetOutcome::Released)
        } else {
            error!(unit = focus.unit, "failed to take unit out of reset");
            Ok(ResetOutcome::StillInReset)
        }
    }

    /// Sets or clears force-gated-clock on the focused wrapper and, when the
    /// unit has one, its secondary wrapper.
    pub fn force_clocks(&mut self, on: bool) -> BackplaneResult<()> {
        let focus = self.focused()?;
        let wrap = self.focused_wrapper()?;
        let secondary = self.unit(focus.unit)?.wrapper(WrapperSlot::Secondary.index());
        let fgc = IoControl::FORCE_GATED_CLOCK.bits();
        let toggle = |host: &dyn Host, base: HostAddr| {
            let reg = base + dmp::IOCTRL as usize;
            let ioctrl = host.read32(reg);
            write_sync(host, reg, if on { ioctrl | fgc } else { ioctrl & !fgc });
        };

        let host = self.host.clone();
        wait_quiescent(&*host, wrap, SHORT_WAIT_US);
        toggle(&*host, wrap);
        if let Some(addr) = secondary {
            let _guard = IrqGuard::new(host.clone());
            match self.transport.open_wrapper(addr) {
                Ok(window) => toggle(&*host, window.addr()),
                Err(status) => warn!(?status, "secondary wrapper 0x{addr:08X} unreachable"),
            }
        }
        wait_quiescent(&*host, wrap, SHORT_WAIT_US);
        Ok(())
    }
}

fn wait_quiescent(host: &dyn Host, wrap: HostAddr, timeout_us: u32) -> bool {
    spin_wait(host, timeout_us, || {
        host.read32(wrap + dmp::RESETSTATUS as usize) != 0
    })
}

/// Write followed by a read-back of the same register.
fn write_sync(host: &dyn Host, addr: HostAddr, value: u32) {
    host.write32(addr, value);
    let _ = host.read32(addr);
}

/// One full reset cycle on one wrapper. Returns whether reset was released.
fn reset_domain(host: &dyn Host, wrap: HostAddr, bits: u32, resetbits: u32) -> bool {
    let resetctrl = wrap + dmp::RESETCTRL as usize;
    let ioctrl = wrap + dmp::IOCTRL as usize;
    let clocks = IoControl::FORCE_GATED_CLOCK | IoControl::CLOCK_EN;

    if !wait_quiescent(host, wrap, SHORT_WAIT_US) {
        warn!("wrapper 0x{wrap:X} busy before reset");
    }
    write_sync(host, resetctrl, RESET);
    host.delay_us(10);
    wait_quiescent(host, wrap, SHORT_WAIT_US);

    write_sync(host, ioctrl, bits | resetbits | clocks.bits());
    if !wait_quiescent(host, wrap, SHORT_WAIT_US) {
        warn!("wrapper 0x{wrap:X} busy with reset asserted");
    }

    let mut released = false;
    for _ in 0..RESET_RELEASE_ATTEMPTS {
        if host.read32(resetctrl) == 0 {
            released = true;
            break;
        }
        if !wait_quiescent(host, wrap, SHORT_WAIT_US) {
            warn!("wrapper 0x{wrap:X} busy before reset release");
        }
        write_sync(host, resetctrl, 0);
        wait_quiescent(host, wrap, SHORT_WAIT_US);
    }
    released = released || host.read32(resetctrl) == 0;

    write_sync(host, ioctrl, bits | IoControl::CLOCK_EN.bits());
    host.delay_us(1);
    released
}
