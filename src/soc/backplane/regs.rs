//! Register layout shared by every transport: the wrapper (DMP) block, the
//! chip-common enumeration pointer, and the PCI BAR0 window registers.
use bitflags::bitflags;

/// Size of one register window: a unit's primary block or one wrapper.
pub const CORE_SIZE: u32 = 0x1000;

/// Reset-control bit in the wrapper's reset-control register.
pub const RESET: u32 = 0x1;

/// Offset of the enumeration ROM pointer inside chip-common.
pub const CC_EROM_PTR: u32 = 0xFC;

/// Wrapper register offsets.
pub mod wrapper {
    pub const OOBSELOUTA30: u32 = 0x100;
    pub const IOCTRL: u32 = 0x408;
    pub const IOSTATUS: u32 = 0x500;
    pub const RESETCTRL: u32 = 0x800;
    pub const RESETSTATUS: u32 = 0x804;
    pub const ERRLOGCTRL: u32 = 0x900;
    pub const ERRLOGDONE: u32 = 0x904;
    pub const ERRLOGSTATUS: u32 = 0x908;
    pub const ERRLOGADDRLO: u32 = 0x90C;
    pub const ERRLOGADDRHI: u32 = 0x910;
    pub const ERRLOGID: u32 = 0x914;
    pub const ERRLOGFLAGS: u32 = 0x91C;
    pub const CONFIG: u32 = 0xE00;
}

bitflags! {
    /// Generic I/O-control bits; everything above bit 1 is unit specific.
    #[derive(Debug, Default, PartialEq, Eq, Copy, Clone)]
    pub struct IoControl: u32 {
        const CLOCK_EN  = 0x1;
        const FORCE_GATED_CLOCK = 0x2;
    }
}

/// Bits of the I/O-status register a caller may modify.
pub const IOSTATUS_CORE_BITS: u32 = 0x0FFF;

pub const OOBSEL_MASK: u32 = 0x1F;
pub const OOBSEL_1_SHIFT: u32 = 8;

/// Wrapper configuration value identifying a wrapper that logs timeouts.
pub const WRAPPER_TIMEOUT_CONFIG: u32 = 0x4400;

pub mod errlog {
    pub const TIMEOUT_ENABLE_SHIFT: u32 = 9;
    pub const TIMEOUT_EXP_SHIFT: u32 = 4;
    pub const TIMEOUT_EXP_MASK: u32 = 0x1F0;

    pub const STATUS_SLAVE_ERR: u32 = 0x1;
    pub const STATUS_TIMEOUT: u32 = 0x2;
    pub const STATUS_DECODE: u32 = 0x3;
    pub const STATUS_ERROR_MASK: u32 = 0x3;

    pub const DONE_MASK: u32 = 0x3;
}

/// PCI configuration-space registers and BAR0 layout for the windowed transport.
pub mod pci {
    pub const BAR0_WIN: u32 = 0x80;
    pub const BAR0_WIN2: u32 = 0xAC;
    pub const PCIE2_BAR0_WIN2: u32 = 0x70;
    pub const PCIE2_BAR0_CORE2_WIN: u32 = 0x74;
    pub const PCIE2_BAR0_CORE2_WIN2: u32 = 0x78;

    /// Offset of the wrapper window inside BAR0.
    pub const BAR0_WIN2_OFFSET: usize = 0x1000;
    pub const BAR0_16KB_PCIREGS_OFFSET: usize = 0x2000;
    pub const BAR0_16KB_CCREGS_OFFSET: usize = 0x3000;
    pub const BAR0_PCIREGS_OFFSET: usize = 0x1800;
    pub const BAR0_PCISBR_OFFSET: usize = 0x1000;
    pub const SBCONFIG_OFFSET: u32 = 0xF00;

    pub const BAR0_SEC_WIN_OFFSET: usize = 0x4000;
    pub const BAR0_CORE2_WIN2_OFFSET: usize = 0x5000;
    pub const BAR0_TER_WIN_OFFSET: usize = 0x9000;
    pub const BAR0_TER_WRAP_OFFSET: usize = 0xA000;

    /// Bus core registers steering the tertiary-slice window pair.
    pub const PCIE_TER_BAR0_WIN: u32 = 0xC50;
    pub const PCIE_TER_BAR0_WRAPPER: u32 = 0xC54;

    /// Value returned by configuration reads that did not complete.
    pub const INVALID: u32 = 0xFFFF_FFFF;
}
