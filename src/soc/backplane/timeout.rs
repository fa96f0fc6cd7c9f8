//! Backplane timeout monitor: programs the error-log control of every slave
//! wrapper and collects (and clears) whatever the wrappers have latched.
use bitflags::bitflags;
use tracing::{debug, warn};

use crate::soc::host::{Host, HostAddr, IrqGuard, spin_wait};
use crate::soc::topology::{WrapperRole, ids};

use super::Backplane;
use super::regs::{RESET, WRAPPER_TIMEOUT_CONFIG, errlog, wrapper as dmp};
use super::transport::Transport;

bitflags! {
    /// Conditions collected while clearing wrapper error logs. Empty means
    /// nothing was latched.
    #[derive(Debug, Default, PartialEq, Eq, Copy, Clone)]
    pub struct WrapperStatus: u32 {
        const TIMEOUT = 1 << 0;
        const SLAVE_ERR = 1 << 1;
        const DECODE_ERR = 1 << 2;
        /// The host window register could not be read.
        const PCI_RD_ERR = 1 << 3;
        /// The wrapper's error status read back as all ones.
        const WRAP_RD_ERR = 1 << 4;
        /// The wrapper could not be made reachable.
        const SET_CORE_FAIL = 1 << 5;
    }
}

/// Chip-common revision whose ADB bridge descriptors carry the wrong
/// wrapper role.
const ADB_ROLE_QUIRK_CC_REV: u8 = 70;

/// Error-log record latched by a wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorLog {
    pub status: u32,
    pub addr_lo: u32,
    pub addr_hi: u32,
    pub id: u32,
    pub flags: u32,
}

impl Backplane {
    /// Programs timeout detection on every slave wrapper, or only on those of
    /// component `unit_id` when given.
    pub fn enable_timeouts(&mut self, enable: bool, exponent: u32, unit_id: Option<u16>) {
        if self.table.inventory.is_empty() {
            debug!("no wrappers recorded; timeout monitor left alone");
            return;
        }
        let ctrl = ((enable as u32) << errlog::TIMEOUT_ENABLE_SHIFT)
            | ((exponent << errlog::TIMEOUT_EXP_SHIFT) & errlog::TIMEOUT_EXP_MASK);

        let bus_wrapper = self
            .table
            .inventory
            .iter()
            .find(|w| w.id == ids::PCIE2_CORE_ID)
            .map_or(0, |w| w.addr);
        let quirk = self.table.chipcommon_rev() == Some(ADB_ROLE_QUIRK_CC_REV)
            && unit_id.is_none_or(|id| id == ids::ADB_BRIDGE_ID);

        let _guard = IrqGuard::new(self.host.clone());
        for idx in 0..self.table.inventory.len() {
            let entry = self.table.inventory[idx];
            let role = if quirk && entry.id == ids::ADB_BRIDGE_ID {
                let corrected = self.live_role(entry.addr).unwrap_or(entry.role);
                self.table.inventory[idx].role = corrected;
                corrected
            } else {
                entry.role
            };

            if role != WrapperRole::Slave
                || (entry.id == ids::ADB_BRIDGE_ID
                    && entry.addr & 0xFFFF_0000 != bus_wrapper & 0xFFFF_0000)
            {
                debug!(
                    "skip timeout enable for 0x{:03X}/0x{:03X} at 0x{:08X}",
                    entry.mfg, entry.id, entry.addr
                );
                continue;
            }
            if unit_id.is_some_and(|id| id != entry.id) {
                continue;
            }

            match self.transport.open_wrapper(entry.addr) {
                Ok(window) => {
                    let reg = window.addr() + dmp::ERRLOGCTRL as usize;
                    self.host.write32(reg, ctrl);
                    debug!(
                        "timeout control 0x{:08X} on 0x{:03X} at 0x{:08X}",
                        self.host.read32(reg),
                        entry.id,
                        entry.addr
                    );
                }
                Err(status) => warn!(?status, "wrapper 0x{:08X} unreachable", entry.addr),
            }
        }
    }

    /// Role a wrapper actually plays, from its live configuration register.
    fn live_role(&mut self, addr: u32) -> Option<WrapperRole> {
        let window = self.transport.open_wrapper(addr).ok()?;
        let config = self.host.read32(window.addr() + dmp::CONFIG as usize);
        Some(if config & WRAPPER_TIMEOUT_CONFIG != 0 {
            WrapperRole::Slave
        } else {
            WrapperRole::Master
        })
    }

    /// Checks every slave wrapper, clears what it latched and resets the
    /// bridge behind any that timed out.
    pub fn clear_timeouts(&mut self) -> WrapperStatus {
        let wrappers: Vec<(u16, u32)> = self
            .table
            .inventory
            .iter()
            .filter(|w| w.is_slave())
            .map(|w| (w.id, w.addr))
            .collect();
        self.clear_wrappers(&wrappers)
    }

    /// Like [`clear_timeouts`](Self::clear_timeouts) but only looks at the
    /// recorded APB bridge wrappers.
    pub fn clear_bridge_timeouts(&mut self) -> WrapperStatus {
        let wrappers: Vec<(u16, u32)> = self
            .table
            .bridges
            .iter()
            .map(|&addr| (ids::APB_BRIDGE_ID, addr))
            .collect();
        self.clear_wrappers(&wrappers)
    }

    fn clear_wrappers(&mut self, wrappers: &[(u16, u32)]) -> WrapperStatus {
        let _guard = IrqGuard::new(self.host.clone());
        let mut status = WrapperStatus::empty();
        for &(id, addr) in wrappers {
            status |= clear_wrapper(&*self.host, self.transport.as_mut(), id, addr);
        }
        status
    }
}

fn clear_wrapper(host: &dyn Host, transport: &mut dyn Transport, id: u16, addr: u32) -> WrapperStatus {
    let window = match transport.open_wrapper(addr) {
        Ok(window) => window,
        Err(status) => {
            warn!(?status, "cannot reach wrapper 0x{addr:08X} of 0x{id:03X}");
            return status;
        }
    };
    let base = window.addr();

    let status = host.read32(base + dmp::ERRLOGSTATUS as usize);
    if status == u32::MAX {
        warn!("wrapper 0x{addr:08X} of 0x{id:03X} error status unreadable");
        return WrapperStatus::WRAP_RD_ERR;
    }
    if status & errlog::STATUS_ERROR_MASK == 0 {
        return WrapperStatus::empty();
    }

    let log = read_log(host, base, status);
    let result = match status & errlog::STATUS_ERROR_MASK {
        errlog::STATUS_TIMEOUT => {
            reset_bridge(host, base);
            WrapperStatus::TIMEOUT
        }
        errlog::STATUS_SLAVE_ERR => WrapperStatus::SLAVE_ERR,
        _ => WrapperStatus::DECODE_ERR,
    };
    warn!(
        ?result,
        "wrapper 0x{addr:08X} of 0x{id:03X}: addr 0x{:08X}_{:08X} id 0x{:X} flags 0x{:X}",
        log.addr_hi,
        log.addr_lo,
        log.id,
        log.flags
    );

    host.write32(base + dmp::ERRLOGDONE as usize, errlog::DONE_MASK);
    let cleared = spin_wait(host, super::reset::LONG_WAIT_US, || {
        host.read32(base + dmp::ERRLOGSTATUS as usize) & errlog::STATUS_ERROR_MASK != 0
    });
    if !cleared {
        warn!("wrapper 0x{addr:08X} error log did not clear");
    }
    result
}

fn read_log(host: &dyn Host, base: HostAddr, status: u32) -> ErrorLog {
    ErrorLog {
        status,
        addr_lo: host.read32(base + dmp::ERRLOGADDRLO as usize),
        addr_hi: host.read32(base + dmp::ERRLOGADDRHI as usize),
        id: host.read32(base + dmp::ERRLOGID as usize),
        flags: host.read32(base + dmp::ERRLOGFLAGS as usize),
    }
}

/// Pulses reset on the wrapper to unwedge the bridge behind it.
fn reset_bridge(host: &dyn Host, base: HostAddr) {
    let ctrl = base + dmp::RESETCTRL as usize;
    host.write32(ctrl, host.read32(ctrl) | RESET);
    let _ = host.read32(ctrl);
    host.write32(ctrl, host.read32(ctrl) & !RESET);
    let _ = host.read32(ctrl);
}
