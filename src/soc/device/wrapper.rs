//! Behavioural model of a unit's control wrapper (the DMP block). Plain
//! registers are stored verbatim; the reset and error-log registers carry
//! just enough side effects to exercise quiescence polling, bounded reset
//! release and timeout clearing.
use std::{
    ops::Range,
    sync::{
        RwLock,
        atomic::{AtomicBool, AtomicU32, Ordering},
    },
};

use crate::soc::backplane::regs::{self, wrapper as dmp};
use crate::soc::device::{Device, DeviceError, DeviceResult};

const WORDS: usize = (regs::CORE_SIZE / 4) as usize;

pub struct WrapperModel {
    name: String,
    words: RwLock<Vec<u32>>,
    reset_status: AtomicU32,
    hold_reset: AtomicBool,
    reset_asserts: AtomicU32,
    release_attempts: AtomicU32,
    errlog_clears: AtomicU32,
    reset_readbacks: AtomicU32,
    /// Offset plus one of the register written by the previous access, zero
    /// when the previous access was a read.
    last_write: AtomicU32,
}

impl WrapperModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            words: RwLock::new(vec![0; WORDS]),
            reset_status: AtomicU32::new(0),
            hold_reset: AtomicBool::new(false),
            reset_asserts: AtomicU32::new(0),
            release_attempts: AtomicU32::new(0),
            errlog_clears: AtomicU32::new(0),
            reset_readbacks: AtomicU32::new(0),
            last_write: AtomicU32::new(0),
        }
    }

    /// Value reported by the reset-status register; non-zero means
    /// transactions are still in flight.
    pub fn set_reset_status(&self, value: u32) {
        self.reset_status.store(value, Ordering::SeqCst);
    }

    /// While held, writes that would release reset are ignored.
    pub fn hold_in_reset(&self, hold: bool) {
        self.hold_reset.store(hold, Ordering::SeqCst);
    }

    /// Latches an error-log record as the hardware would after a failed transaction.
    pub fn raise_error(&self, status: u32, addr_lo: u32, addr_hi: u32, id: u32, flags: u32) {
        let mut words = self.words.write().unwrap();
        words[word(dmp::ERRLOGSTATUS)] = status;
        words[word(dmp::ERRLOGADDRLO)] = addr_lo;
        words[word(dmp::ERRLOGADDRHI)] = addr_hi;
        words[word(dmp::ERRLOGID)] = id;
        words[word(dmp::ERRLOGFLAGS)] = flags;
    }

    pub fn reg(&self, offset: u32) -> u32 {
        self.load(offset)
    }

    pub fn set_reg(&self, offset: u32, value: u32) {
        self.words.write().unwrap()[word(offset)] = value;
    }

    pub fn reset_asserts(&self) -> u32 {
        self.reset_asserts.load(Ordering::SeqCst)
    }

    pub fn release_attempts(&self) -> u32 {
        self.release_attempts.load(Ordering::SeqCst)
    }

    pub fn errlog_clears(&self) -> u32 {
        self.errlog_clears.load(Ordering::SeqCst)
    }

    /// Reset-control reads that immediately followed a write to it.
    pub fn reset_readbacks(&self) -> u32 {
        self.reset_readbacks.load(Ordering::SeqCst)
    }

    fn load(&self, offset: u32) -> u32 {
        match offset {
            dmp::RESETSTATUS => self.reset_status.load(Ordering::SeqCst),
            _ => self.words.read().unwrap()[word(offset)],
        }
    }

    fn store(&self, offset: u32, value: u32) {
        match offset {
            dmp::RESETSTATUS => {}
            dmp::RESETCTRL => {
                if value & regs::RESET != 0 {
                    self.reset_asserts.fetch_add(1, Ordering::SeqCst);
                } else {
                    self.release_attempts.fetch_add(1, Ordering::SeqCst);
                    if self.hold_reset.load(Ordering::SeqCst) {
                        return;
                    }
                }
                self.words.write().unwrap()[word(offset)] = value;
            }
            dmp::ERRLOGDONE => {
                if value & regs::errlog::DONE_MASK != 0 {
                    self.errlog_clears.fetch_add(1, Ordering::SeqCst);
                    let mut words = self.words.write().unwrap();
                    words[word(dmp::ERRLOGSTATUS)] = 0;
                    words[word(dmp::ERRLOGDONE)] = 0;
                }
            }
            _ => self.words.write().unwrap()[word(offset)] = value,
        }
    }
}

#[inline(always)]
fn word(offset: u32) -> usize {
    (offset / 4) as usize
}

impl Device for WrapperModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn span(&self) -> Range<u64> {
        0..regs::CORE_SIZE as u64
    }

    fn read(&self, byte_offset: u64, out: &mut [u8]) -> DeviceResult<()> {
        check_word_access(byte_offset, out.len())?;
        let previous = self.last_write.swap(0, Ordering::SeqCst);
        if byte_offset as u32 == dmp::RESETCTRL && previous == dmp::RESETCTRL + 1 {
            self.reset_readbacks.fetch_add(1, Ordering::SeqCst);
        }
        out.copy_from_slice(&self.load(byte_offset as u32).to_le_bytes());
        Ok(())
    }

    fn write(&self, byte_offset: u64, data: &[u8]) -> DeviceResult<()> {
        check_word_access(byte_offset, data.len())?;
        let mut raw = [0u8; 4];
        raw.copy_from_slice(data);
        self.store(byte_offset as u32, u32::from_le_bytes(raw));
        self.last_write.store(byte_offset as u32 + 1, Ordering::SeqCst);
        Ok(())
    }
}

fn check_word_access(offset: u64, len: usize) -> DeviceResult<()> {
    if len != 4 || offset % 4 != 0 {
        return Err(DeviceError::Unaligned {
            offset,
            len: len as u64,
        });
    }
    if offset >= regs::CORE_SIZE as u64 {
        return Err(DeviceError::OutOfRange {
            offset,
            len: len as u64,
            capacity: regs::CORE_SIZE as u64,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_reset_ignores_release_but_counts_it() {
        let model = WrapperModel::new("wrap");
        model.write_u32(dmp::RESETCTRL as u64, regs::RESET).expect("assert");
        model.hold_in_reset(true);
        model.write_u32(dmp::RESETCTRL as u64, 0).expect("release");
        assert_eq!(model.reg(dmp::RESETCTRL), regs::RESET, "reset should stay asserted");
        assert_eq!(model.reset_asserts(), 1);
        assert_eq!(model.release_attempts(), 1);
    }

    #[test]
    fn readback_counts_only_an_immediate_read() {
        let model = WrapperModel::new("wrap");
        model.write_u32(dmp::RESETCTRL as u64, 0).expect("write");
        model.read_u32(dmp::RESETSTATUS as u64).expect("status");
        model.read_u32(dmp::RESETCTRL as u64).expect("late read");
        assert_eq!(model.reset_readbacks(), 0);

        model.write_u32(dmp::RESETCTRL as u64, 0).expect("write");
        model.read_u32(dmp::RESETCTRL as u64).expect("read back");
        assert_eq!(model.reset_readbacks(), 1);
    }

    #[test]
    fn errlog_done_clears_latched_status() {
        let model = WrapperModel::new("wrap");
        model.raise_error(regs::errlog::STATUS_TIMEOUT, 0x1800_0000, 0, 3, 0);
        assert_eq!(
            model.read_u32(dmp::ERRLOGSTATUS as u64).expect("status"),
            regs::errlog::STATUS_TIMEOUT
        );
        model
            .write_u32(dmp::ERRLOGDONE as u64, regs::errlog::DONE_MASK)
            .expect("clear");
        assert_eq!(model.reg(dmp::ERRLOGSTATUS), 0, "status should be cleared");
        assert_eq!(model.errlog_clears(), 1);
    }

    #[test]
    fn reset_status_is_read_only() {
        let model = WrapperModel::new("wrap");
        model.set_reset_status(0x5);
        model.write_u32(dmp::RESETSTATUS as u64, 0).expect("write");
        assert_eq!(model.reg(dmp::RESETSTATUS), 0x5);
        assert!(model.read_u32(0x802).is_err(), "unaligned access should fail");
    }
}
