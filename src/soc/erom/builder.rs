//! Synthesizes descriptor streams for tests and simulated platforms.
use super::entry::{AddressKind, layout::*};

const SZ_EXPONENTS: [u64; 3] = [0x1000, 0x2000, 0x4000];

/// Fluent writer for enumeration ROM words. Each method appends the entries a
/// real ROM would carry for that item, in the order the scanner expects.
#[derive(Debug, Clone, Default)]
pub struct EromBuilder {
    words: Vec<u32>,
}

impl EromBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Both halves of a component identifier.
    #[allow(clippy::too_many_arguments)]
    pub fn component(
        mut self,
        mfg: u16,
        id: u16,
        rev: u8,
        master_ports: u8,
        slave_ports: u8,
        master_wrappers: u8,
        slave_wrappers: u8,
    ) -> Self {
        let cia = ((mfg as u32) << CIA_MFG_SHIFT) & CIA_MFG_MASK
            | ((id as u32) << CIA_CID_SHIFT) & CIA_CID_MASK
            | TAG_CI
            | VALID;
        let cib = ((rev as u32) << CIB_REV_SHIFT)
            | ((slave_wrappers as u32) << CIB_NSW_SHIFT) & CIB_NSW_MASK
            | ((master_wrappers as u32) << CIB_NMW_SHIFT) & CIB_NMW_MASK
            | ((slave_ports as u32) << CIB_NSP_SHIFT) & CIB_NSP_MASK
            | ((master_ports as u32) << CIB_NMP_SHIFT) & CIB_NMP_MASK
            | TAG_CI
            | VALID;
        self.words.push(cia);
        self.words.push(cib);
        self
    }

    pub fn master_port(mut self, port: u8, id: u8) -> Self {
        self.words.push(
            ((id as u32) << MPD_MUI_SHIFT) | ((port as u32) << MPD_MP_SHIFT) | TAG_MP | VALID,
        );
        self
    }

    /// Address descriptor, choosing the exponent encoding when the size allows
    /// it and the size-descriptor form otherwise.
    pub fn address(mut self, port: u8, kind: AddressKind, addr: u64, size: u64) -> Self {
        let addr_high = (addr >> 32) as u32;
        let mut asd = (addr as u32 & AD_ADDR_MASK)
            | (((port as u32) << AD_SP_SHIFT) & AD_SP_MASK)
            | kind.bits()
            | TAG_ADDR
            | VALID;
        if addr_high != 0 {
            asd |= AD_AG32;
        }
        let exponent = SZ_EXPONENTS.iter().position(|&s| s == size);
        match exponent {
            Some(exp) => asd |= (exp as u32) << AD_SZ_SHIFT,
            None => asd |= AD_SZ_SZD,
        }

        self.words.push(asd);
        if addr_high != 0 {
            self.words.push(addr_high);
        }
        if exponent.is_none() {
            let size_high = (size >> 32) as u32;
            let mut szd = size as u32 & SD_SZ_MASK;
            if size_high != 0 {
                szd |= SD_SG32;
            }
            self.words.push(szd);
            if size_high != 0 {
                self.words.push(size_high);
            }
        }
        self
    }

    pub fn slave(self, port: u8, addr: u64, size: u64) -> Self {
        self.address(port, AddressKind::Slave, addr, size)
    }

    pub fn bridge(self, port: u8, addr: u64, size: u64) -> Self {
        self.address(port, AddressKind::Bridge, addr, size)
    }

    pub fn master_wrapper(self, index: u8, addr: u32) -> Self {
        self.address(index, AddressKind::MasterWrapper, addr as u64, 0x1000)
    }

    pub fn slave_wrapper(self, port: u8, addr: u32) -> Self {
        self.address(port, AddressKind::SlaveWrapper, addr as u64, 0x1000)
    }

    pub fn raw(mut self, word: u32) -> Self {
        self.words.push(word);
        self
    }

    /// A word without the valid bit; the reader steps over it.
    pub fn invalid(self) -> Self {
        self.raw(0)
    }

    pub fn end(self) -> Self {
        self.raw(END_MARKER)
    }

    pub fn build(self) -> Vec<u32> {
        self.words
    }

    /// Little-endian byte image, as the ROM appears in memory.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }
}
