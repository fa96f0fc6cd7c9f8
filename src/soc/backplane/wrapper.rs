//! Wrapper register helpers for the focused unit.
use super::Backplane;
use super::access::{check_mask, modify};
use super::error::{BackplaneError, BackplaneResult};
use super::regs::{
    CORE_SIZE, IOSTATUS_CORE_BITS, IoControl, OOBSEL_1_SHIFT, OOBSEL_MASK, RESET, wrapper as dmp,
};

impl Backplane {
    /// Read-modify-write of an arbitrary register in the focused wrapper.
    pub fn wrapper_reg(&mut self, offset: u32, mask: u32, value: u32) -> BackplaneResult<u32> {
        if offset >= CORE_SIZE {
            return Err(BackplaneError::OffsetOutOfRange { offset });
        }
        let wrap = self.focused_wrapper()?;
        Ok(modify(&*self.host, wrap + offset as usize, mask, value))
    }

    /// I/O-control flags of the focused unit.
    pub fn core_flags(&mut self, mask: u32, value: u32) -> BackplaneResult<u32> {
        check_mask(mask, value)?;
        self.wrapper_reg(dmp::IOCTRL, mask, value)
    }

    /// [`core_flags`](Self::core_flags) without the trailing read.
    pub fn core_flags_wo(&mut self, mask: u32, value: u32) -> BackplaneResult<()> {
        check_mask(mask, value)?;
        let reg = self.focused_wrapper()? + dmp::IOCTRL as usize;
        if mask != 0 || value != 0 {
            let w = (self.host.read32(reg) & !mask) | value;
            self.host.write32(reg, w);
        }
        Ok(())
    }

    /// I/O-status flags; only the unit-specific low bits may be modified.
    pub fn core_sflags(&mut self, mask: u32, value: u32) -> BackplaneResult<u32> {
        check_mask(mask, value)?;
        check_mask(IOSTATUS_CORE_BITS, mask)?;
        self.wrapper_reg(dmp::IOSTATUS, mask, value)
    }

    /// Clock enabled, clock not forced, reset released.
    pub fn is_core_up(&self) -> BackplaneResult<bool> {
        let wrap = self.focused_wrapper()?;
        let ioctrl = IoControl::from_bits_truncate(self.host.read32(wrap + dmp::IOCTRL as usize));
        let resetctrl = self.host.read32(wrap + dmp::RESETCTRL as usize);
        Ok(ioctrl & (IoControl::FORCE_GATED_CLOCK | IoControl::CLOCK_EN) == IoControl::CLOCK_EN
            && resetctrl & RESET == 0)
    }

    /// Backplane interrupt flag number routed out of the focused unit.
    pub fn flag(&self) -> BackplaneResult<u32> {
        let wrap = self.focused_wrapper()?;
        Ok(self.host.read32(wrap + dmp::OOBSELOUTA30 as usize) & OOBSEL_MASK)
    }

    pub fn flag_alt(&self) -> BackplaneResult<u32> {
        let wrap = self.focused_wrapper()?;
        Ok((self.host.read32(wrap + dmp::OOBSELOUTA30 as usize) >> OOBSEL_1_SHIFT) & OOBSEL_MASK)
    }
}
