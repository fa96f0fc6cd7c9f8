use smallvec::SmallVec;

use super::MAX_BRIDGES;
use super::ids::CC_CORE_ID;
use super::inventory::WrapperInfo;

/// One slave address descriptor of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressSpace {
    pub port: u8,
    pub index: u8,
    pub base_low: u32,
    pub base_high: u32,
    pub size_low: u32,
    pub size_high: u32,
}

impl AddressSpace {
    pub fn base(&self) -> u64 {
        ((self.base_high as u64) << 32) | self.base_low as u64
    }

    pub fn size(&self) -> u64 {
        ((self.size_high as u64) << 32) | self.size_low as u64
    }
}

/// A discovered unit. Wrapper slots are filled in encounter order: master
/// wrappers when the unit has any, slave wrappers otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitInfo {
    pub cia: u32,
    pub cib: u32,
    pub mfg: u16,
    pub id: u16,
    pub rev: u8,
    pub master_ports: u8,
    pub slave_ports: u8,
    pub master_wrappers: u8,
    pub slave_wrappers: u8,
    pub wrappers: [Option<u32>; 3],
    pub spaces: SmallVec<[AddressSpace; 4]>,
}

impl UnitInfo {
    pub fn space(&self, port: u8, index: u8) -> Option<&AddressSpace> {
        self.spaces
            .iter()
            .find(|s| s.port == port && s.index == index)
    }

    /// Primary register block: slave port 0, descriptor 0.
    pub fn base(&self) -> u32 {
        self.space(0, 0).map_or(0, |s| s.base_low)
    }

    pub fn size(&self) -> u32 {
        self.space(0, 0).map_or(0, |s| s.size_low)
    }

    /// Extra register space on port 0 for units needing more than one window.
    pub fn secondary(&self) -> Option<&AddressSpace> {
        self.space(0, 1)
    }

    pub fn port1(&self) -> Option<&AddressSpace> {
        self.space(1, 0)
    }

    pub fn wrapper(&self, slot: usize) -> Option<u32> {
        self.wrappers.get(slot).copied().flatten()
    }
}

/// Everything a scan discovers. Built once and only read afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopologyTable {
    pub units: Vec<UnitInfo>,
    pub inventory: Vec<WrapperInfo>,
    /// APB bridge slave wrappers, checked by the fast timeout clear.
    pub bridges: SmallVec<[u32; MAX_BRIDGES]>,
    pub oob_router: Option<u32>,
    pub oob_router_secondary: Option<u32>,
}

impl TopologyTable {
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn unit(&self, index: usize) -> Option<&UnitInfo> {
        self.units.get(index)
    }

    /// Index of the first unit with component id `id`.
    pub fn find(&self, id: u16) -> Option<usize> {
        self.units.iter().position(|u| u.id == id)
    }

    pub fn chipcommon_rev(&self) -> Option<u8> {
        self.find(CC_CORE_ID).map(|idx| self.units[idx].rev)
    }

    /// A second distinct router address goes to the secondary slot.
    pub fn note_oob_router(&mut self, addr: u32) {
        match self.oob_router {
            Some(primary) if primary != addr => self.oob_router_secondary = Some(addr),
            _ => self.oob_router = Some(addr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space(port: u8, index: u8, base: u32) -> AddressSpace {
        AddressSpace {
            port,
            index,
            base_low: base,
            base_high: 0,
            size_low: 0x1000,
            size_high: 0,
        }
    }

    #[test]
    fn unit_address_helpers() {
        let unit = UnitInfo {
            cia: 0,
            cib: 0,
            mfg: 0x4BF,
            id: 0x812,
            rev: 1,
            master_ports: 1,
            slave_ports: 2,
            master_wrappers: 1,
            slave_wrappers: 0,
            wrappers: [Some(0x1810_1000), None, None],
            spaces: SmallVec::from_slice(&[
                space(0, 0, 0x1800_1000),
                space(0, 1, 0x1800_9000),
                space(1, 0, 0x2000_0000),
            ]),
        };
        assert_eq!(unit.base(), 0x1800_1000);
        assert_eq!(unit.secondary().map(|s| s.base_low), Some(0x1800_9000));
        assert_eq!(unit.port1().map(|s| s.base()), Some(0x2000_0000));
        assert_eq!(unit.wrapper(0), Some(0x1810_1000));
        assert_eq!(unit.wrapper(1), None);
        assert_eq!(unit.wrapper(7), None);
    }

    #[test]
    fn oob_router_records_two_distinct_addresses() {
        let mut table = TopologyTable::default();
        table.note_oob_router(0x1810_8000);
        table.note_oob_router(0x1810_8000);
        assert_eq!(table.oob_router_secondary, None, "same address is not a second router");
        table.note_oob_router(0x1820_8000);
        assert_eq!(table.oob_router, Some(0x1810_8000));
        assert_eq!(table.oob_router_secondary, Some(0x1820_8000));
    }
}
