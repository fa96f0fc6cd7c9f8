//! Manufacturer and component identifiers the core treats specially.

pub const MFG_ARM: u16 = 0x43B;
pub const MFG_BRCM: u16 = 0x4BF;

pub const CC_CORE_ID: u16 = 0x800;
pub const PCI_CORE_ID: u16 = 0x804;
pub const PCIE_CORE_ID: u16 = 0x820;
pub const PMU_CORE_ID: u16 = 0x827;
pub const PCIE2_CORE_ID: u16 = 0x83C;
pub const GCI_CORE_ID: u16 = 0x840;
pub const SR_CORE_ID: u16 = 0x841;
pub const HUB_CORE_ID: u16 = 0x84B;
pub const SPMI_SLAVE_CORE_ID: u16 = 0x855;
pub const HND_OOBR_CORE_ID: u16 = 0x85C;
pub const NS_CCB_CORE_ID: u16 = 0x508;
pub const CCI400_CORE_ID: u16 = 0x420;

pub const OOB_ROUTER_CORE_ID: u16 = 0x367;
pub const APB_BRIDGE_ID: u16 = 0x135;
pub const ADB_BRIDGE_ID: u16 = 0x031;
/// Default slave placeholder the interconnect inserts for unmapped space.
pub const DEF_AI_COMP: u16 = 0xFFF;

/// Infrastructure components recorded as units even without wrappers.
pub const WRAPPERLESS_UNITS: [u16; 8] = [
    NS_CCB_CORE_ID,
    PMU_CORE_ID,
    GCI_CORE_ID,
    SR_CORE_ID,
    HUB_CORE_ID,
    HND_OOBR_CORE_ID,
    CCI400_CORE_ID,
    SPMI_SLAVE_CORE_ID,
];

/// Bus cores that own the host-side window on PCI-style transports.
pub fn is_bus_core(id: u16) -> bool {
    matches!(id, PCI_CORE_ID | PCIE_CORE_ID | PCIE2_CORE_ID)
}
