//! Bit layout of enumeration ROM entries and their typed decoding.

/// Raw field layout of a 32-bit descriptor word.
pub mod layout {
    pub const VALID: u32 = 0x1;
    pub const TAG: u32 = 0xE;
    pub const TAG1: u32 = 0x6;
    pub const TAG_CI: u32 = 0x0;
    pub const TAG_MP: u32 = 0x2;
    pub const TAG_ADDR: u32 = 0x4;
    pub const TAG_END: u32 = 0xE;

    /// The one word that terminates the stream.
    pub const END_MARKER: u32 = TAG_END | VALID;

    pub const CIA_MFG_MASK: u32 = 0xFFF0_0000;
    pub const CIA_MFG_SHIFT: u32 = 20;
    pub const CIA_CID_MASK: u32 = 0x000F_FF00;
    pub const CIA_CID_SHIFT: u32 = 8;
    pub const CIA_CLASS_MASK: u32 = 0x0000_00F0;
    pub const CIA_CLASS_SHIFT: u32 = 4;

    pub const CIB_REV_MASK: u32 = 0xFF00_0000;
    pub const CIB_REV_SHIFT: u32 = 24;
    pub const CIB_NSW_MASK: u32 = 0x00F8_0000;
    pub const CIB_NSW_SHIFT: u32 = 19;
    pub const CIB_NMW_MASK: u32 = 0x0007_C000;
    pub const CIB_NMW_SHIFT: u32 = 14;
    pub const CIB_NSP_MASK: u32 = 0x0000_3E00;
    pub const CIB_NSP_SHIFT: u32 = 9;
    pub const CIB_NMP_MASK: u32 = 0x0000_01F0;
    pub const CIB_NMP_SHIFT: u32 = 4;

    pub const MPD_MUI_MASK: u32 = 0x0000_FF00;
    pub const MPD_MUI_SHIFT: u32 = 8;
    pub const MPD_MP_MASK: u32 = 0x0000_00F0;
    pub const MPD_MP_SHIFT: u32 = 4;

    pub const AD_ADDR_MASK: u32 = 0xFFFF_F000;
    pub const AD_SP_MASK: u32 = 0x0000_0F00;
    pub const AD_SP_SHIFT: u32 = 8;
    pub const AD_ST_MASK: u32 = 0x0000_00C0;
    pub const AD_SZ_MASK: u32 = 0x0000_0030;
    pub const AD_SZ_SHIFT: u32 = 4;
    pub const AD_SZ_SZD: u32 = 0x0000_0030;
    pub const AD_AG32: u32 = 0x0000_0008;
    pub const AD_SZ_BASE: u32 = 0x0000_1000;

    pub const SD_SZ_MASK: u32 = 0xFFFF_F000;
    pub const SD_SG32: u32 = 0x0000_0008;
}

use layout::*;

/// Mask/match pair handed to the entry reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryFilter {
    pub mask: u32,
    pub value: u32,
}

impl EntryFilter {
    /// Take the very next word, whatever it is.
    pub const ANY: Self = Self { mask: 0, value: 0 };
    pub const VALID: Self = Self {
        mask: VALID,
        value: VALID,
    };
    pub const COMPONENT: Self = Self {
        mask: TAG,
        value: TAG_CI,
    };

    #[inline(always)]
    pub fn matches(self, raw: u32) -> bool {
        raw & self.mask == self.value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    Slave,
    Bridge,
    SlaveWrapper,
    MasterWrapper,
}

impl AddressKind {
    pub const fn bits(self) -> u32 {
        match self {
            AddressKind::Slave => 0x00,
            AddressKind::Bridge => 0x40,
            AddressKind::SlaveWrapper => 0x80,
            AddressKind::MasterWrapper => 0xC0,
        }
    }

    fn from_bits(bits: u32) -> Self {
        match bits & AD_ST_MASK {
            0x00 => AddressKind::Slave,
            0x40 => AddressKind::Bridge,
            0x80 => AddressKind::SlaveWrapper,
            _ => AddressKind::MasterWrapper,
        }
    }
}

/// How an address descriptor encodes its size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeCode {
    /// `AD_SZ_BASE << exponent`.
    Exponent(u32),
    /// Size follows in a separate size descriptor.
    Descriptor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressEntry {
    pub raw: u32,
    pub port: u32,
    pub kind: AddressKind,
    pub size: SizeCode,
    pub wide: bool,
    pub addr_low: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasterPortEntry {
    pub port: u32,
    pub id: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    Invalid(u32),
    End,
    Component(u32),
    MasterPort(MasterPortEntry),
    Address(AddressEntry),
    Unknown(u32),
}

impl Entry {
    pub fn decode(raw: u32) -> Self {
        if raw & VALID == 0 {
            return Entry::Invalid(raw);
        }
        if raw == END_MARKER {
            return Entry::End;
        }
        match raw & TAG {
            TAG_CI => Entry::Component(raw),
            TAG_MP => Entry::MasterPort(MasterPortEntry {
                port: (raw & MPD_MP_MASK) >> MPD_MP_SHIFT,
                id: (raw & MPD_MUI_MASK) >> MPD_MUI_SHIFT,
            }),
            _ if raw & TAG1 == TAG_ADDR => {
                let sz = raw & AD_SZ_MASK;
                Entry::Address(AddressEntry {
                    raw,
                    port: (raw & AD_SP_MASK) >> AD_SP_SHIFT,
                    kind: AddressKind::from_bits(raw),
                    size: if sz == AD_SZ_SZD {
                        SizeCode::Descriptor
                    } else {
                        SizeCode::Exponent(sz >> AD_SZ_SHIFT)
                    },
                    wide: raw & AD_AG32 != 0,
                    addr_low: raw & AD_ADDR_MASK,
                })
            }
            _ => Entry::Unknown(raw),
        }
    }
}

/// Both halves of a component identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentDescriptor {
    pub cia: u32,
    pub cib: u32,
    pub mfg: u16,
    pub id: u16,
    pub class: u8,
    pub rev: u8,
    pub master_ports: u8,
    pub slave_ports: u8,
    pub master_wrappers: u8,
    pub slave_wrappers: u8,
}

impl ComponentDescriptor {
    pub fn from_pair(cia: u32, cib: u32) -> Self {
        Self {
            cia,
            cib,
            mfg: ((cia & CIA_MFG_MASK) >> CIA_MFG_SHIFT) as u16,
            id: ((cia & CIA_CID_MASK) >> CIA_CID_SHIFT) as u16,
            class: ((cia & CIA_CLASS_MASK) >> CIA_CLASS_SHIFT) as u8,
            rev: ((cib & CIB_REV_MASK) >> CIB_REV_SHIFT) as u8,
            slave_wrappers: ((cib & CIB_NSW_MASK) >> CIB_NSW_SHIFT) as u8,
            master_wrappers: ((cib & CIB_NMW_MASK) >> CIB_NMW_SHIFT) as u8,
            slave_ports: ((cib & CIB_NSP_MASK) >> CIB_NSP_SHIFT) as u8,
            master_ports: ((cib & CIB_NMP_MASK) >> CIB_NMP_SHIFT) as u8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_dispatches_on_tag() {
        assert_eq!(Entry::decode(0x0000_0000), Entry::Invalid(0));
        assert_eq!(Entry::decode(END_MARKER), Entry::End);
        assert_eq!(Entry::decode(0x4BF8_0001), Entry::Component(0x4BF8_0001));
        assert_eq!(
            Entry::decode(0x0000_0213),
            Entry::MasterPort(MasterPortEntry { port: 1, id: 2 })
        );
        assert_eq!(Entry::decode(0x0000_0009), Entry::Unknown(0x9));
    }

    #[test]
    fn address_entry_fields() {
        let raw = 0x1800_0000 | (1 << AD_SP_SHIFT) | 0x80 | 0x10 | VALID | TAG_ADDR;
        let Entry::Address(entry) = Entry::decode(raw) else {
            panic!("expected address entry");
        };
        assert_eq!(entry.port, 1);
        assert_eq!(entry.kind, AddressKind::SlaveWrapper);
        assert_eq!(entry.size, SizeCode::Exponent(1));
        assert!(!entry.wide);
        assert_eq!(entry.addr_low, 0x1800_0000);

        let wide = 0x2000_0000 | AD_SZ_SZD | AD_AG32 | VALID | TAG_ADDR;
        let Entry::Address(entry) = Entry::decode(wide) else {
            panic!("expected address entry");
        };
        assert!(entry.wide, "AG32 flags a 64-bit descriptor");
        assert_eq!(entry.size, SizeCode::Descriptor);
    }

    #[test]
    fn component_pair_decodes_counts() {
        // mfg 0x4BF, id 0x800, rev 0x2B, nsw 1, nmw 0, nsp 1, nmp 0
        let cia = (0x4BF << CIA_MFG_SHIFT) | (0x800 << CIA_CID_SHIFT) | VALID;
        let cib = (0x2B << CIB_REV_SHIFT) | (1 << CIB_NSW_SHIFT) | (1 << CIB_NSP_SHIFT) | VALID;
        let desc = ComponentDescriptor::from_pair(cia, cib);
        assert_eq!(desc.mfg, 0x4BF);
        assert_eq!(desc.id, 0x800);
        assert_eq!(desc.rev, 0x2B);
        assert_eq!(
            (desc.master_ports, desc.slave_ports, desc.master_wrappers, desc.slave_wrappers),
            (0, 1, 0, 1)
        );
    }
}
