//! Register access on any unit, with or without a focus switch.
use tracing::trace;

use crate::soc::host::{Host, HostAddr, IrqGuard};

use super::config::BusKind;
use super::error::{BackplaneError, BackplaneResult};
use super::regs::CORE_SIZE;
use super::transport::WrapperSlot;
use super::Backplane;

/// Masked read-modify-write. Both zero means a plain read.
pub(crate) fn modify(host: &dyn Host, addr: HostAddr, mask: u32, value: u32) -> u32 {
    if mask != 0 || value != 0 {
        let w = (host.read32(addr) & !mask) | value;
        host.write32(addr, w);
    }
    host.read32(addr)
}

pub(crate) fn check_mask(mask: u32, value: u32) -> BackplaneResult<()> {
    if value & !mask != 0 {
        return Err(BackplaneError::ValueOutsideMask { mask, value });
    }
    Ok(())
}

fn check_offset(offset: u32) -> BackplaneResult<()> {
    if offset >= CORE_SIZE {
        return Err(BackplaneError::OffsetOutOfRange { offset });
    }
    Ok(())
}

impl Backplane {
    /// Read-modify-write of `offset` in `unit`, returning the value read back
    /// afterwards. Goes straight to the register when the transport can reach
    /// it; otherwise switches focus with interrupts masked and restores the
    /// previous focus before returning.
    pub fn read_modify_write(
        &mut self,
        unit: usize,
        offset: u32,
        mask: u32,
        value: u32,
    ) -> BackplaneResult<u32> {
        self.check_access(unit, offset, mask, value)?;
        if let Some(addr) = self.transport.fast_path(&self.table, unit, offset)? {
            return Ok(modify(&*self.host, addr, mask, value));
        }
        self.with_focus(unit, |host, regs| {
            modify(host, regs + offset as usize, mask, value)
        })
    }

    /// Like [`read_modify_write`](Self::read_modify_write) without the
    /// read-back. Returns the value written, or zero when nothing was.
    pub fn write_only(
        &mut self,
        unit: usize,
        offset: u32,
        mask: u32,
        value: u32,
    ) -> BackplaneResult<u32> {
        self.check_access(unit, offset, mask, value)?;
        let op = |host: &dyn Host, addr: HostAddr| {
            if mask == 0 && value == 0 {
                return 0;
            }
            let w = (host.read32(addr) & !mask) | value;
            host.write32(addr, w);
            w
        };
        if let Some(addr) = self.transport.fast_path(&self.table, unit, offset)? {
            return Ok(op(&*self.host, addr));
        }
        self.with_focus(unit, |host, regs| op(host, regs + offset as usize))
    }

    /// Back-to-back `(mask, value)` writes to one register with a single
    /// read-back at the end. A full mask writes the value without reading
    /// first. Only the direct transport can do this without a focus switch.
    pub fn write_array(
        &mut self,
        unit: usize,
        offset: u32,
        ops: &[(u32, u32)],
    ) -> BackplaneResult<u32> {
        if self.transport.kind() != BusKind::Direct {
            return Err(BackplaneError::UnsupportedTransport("batched register writes"));
        }
        self.unit(unit)?;
        check_offset(offset)?;
        for &(mask, value) in ops {
            check_mask(mask, value)?;
        }
        let addr = self
            .transport
            .fast_path(&self.table, unit, offset)?
            .ok_or(BackplaneError::UnsupportedTransport("batched register writes"))?;

        let host = &*self.host;
        for &(mask, value) in ops {
            if mask == 0 && value == 0 {
                continue;
            }
            let w = if mask != u32::MAX {
                (host.read32(addr) & !mask) | value
            } else {
                value
            };
            host.write32(addr, w);
        }
        Ok(host.read32(addr))
    }

    /// Host address of `offset` in `unit` if it can be used directly: either
    /// through the fast path or because `unit` already holds the focus.
    pub fn register_address(&mut self, unit: usize, offset: u32) -> BackplaneResult<Option<HostAddr>> {
        self.unit(unit)?;
        check_offset(offset)?;
        if let Some(addr) = self.transport.fast_path(&self.table, unit, offset)? {
            return Ok(Some(addr));
        }
        Ok(self
            .focus
            .filter(|f| f.unit == unit)
            .map(|f| f.regs + offset as usize))
    }

    /// Read-modify-write in the focused unit. No focus change happens here, so
    /// the caller is responsible for keeping the focus stable.
    pub fn focused_reg(&mut self, offset: u32, mask: u32, value: u32) -> BackplaneResult<u32> {
        check_offset(offset)?;
        check_mask(mask, value)?;
        let focus = self.focused()?;
        Ok(modify(&*self.host, focus.regs + offset as usize, mask, value))
    }

    fn check_access(&self, unit: usize, offset: u32, mask: u32, value: u32) -> BackplaneResult<()> {
        self.unit(unit)?;
        check_offset(offset)?;
        check_mask(mask, value)
    }

    /// Switch, operate, restore; all with interrupts masked.
    fn with_focus<T>(
        &mut self,
        unit: usize,
        op: impl FnOnce(&dyn Host, HostAddr) -> T,
    ) -> BackplaneResult<T> {
        let _guard = IrqGuard::new(self.host.clone());
        let previous = self.focus;
        let regs = self.select_unmasked(unit, WrapperSlot::Primary)?;
        let result = op(&*self.host, regs);

        match previous {
            Some(prev) if prev.unit != unit || prev.slot != WrapperSlot::Primary => {
                self.select_unmasked(prev.unit, prev.slot)?;
            }
            Some(_) => {}
            None => self.focus = None,
        }
        trace!(unit, "slow-path register access");
        Ok(result)
    }
}
