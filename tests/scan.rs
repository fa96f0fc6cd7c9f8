mod common;

use backplane::soc::backplane::{BackplaneError, WindowGeneration, WrapperSlot};
use backplane::soc::erom::EromBuilder;
use backplane::soc::topology::ids::{self, CC_CORE_ID, MFG_BRCM};
use backplane::soc::topology::WrapperRole;
use common::*;
use hex_literal::hex;

#[test]
fn direct_scan_discovers_units_bridges_and_router() {
    let chip = Chip::direct();
    let bp = chip.attach_direct();

    assert_eq!(bp.unit_count(), 3, "bridges and the router are not units");
    let table = bp.table();
    let found: Vec<u16> = table.units.iter().map(|u| u.id).collect();
    assert_eq!(found, vec![ids::CC_CORE_ID, D11_ID, ids::PCIE2_CORE_ID]);
    assert_eq!(table.units[D11].wrappers, [Some(D11_WRAP), Some(D11_WRAP2), None]);
    assert_eq!(table.units[CC].wrappers, [Some(CC_WRAP), None, None]);
    assert_eq!(table.bridges.as_slice(), &[APB_WRAP]);
    assert_eq!(bp.oob_routers(), (Some(OOB_ROUTER), None));
    assert_eq!(bp.bus_core(), None, "only windowed buses have a bus core");

    let slaves: Vec<u32> = table
        .inventory
        .iter()
        .filter(|w| w.role == WrapperRole::Slave)
        .map(|w| w.addr)
        .collect();
    assert_eq!(
        slaves,
        vec![CC_WRAP, D11_SLAVE_WRAP, PCIE_SLAVE_WRAP, APB_WRAP, ADB_WRAP]
    );
    assert_eq!(table.inventory.len(), 8);
}

#[test]
fn windowed_scan_reads_through_bar0_and_finds_bus_core() {
    let chip = Chip::windowed(true);
    let bp = chip.attach_windowed(WindowGeneration::Gen2, 0, true);

    assert_eq!(bp.unit_count(), 3);
    let core = bp.bus_core().expect("bus core");
    assert_eq!(core.index, PCIE);
    assert_eq!(core.id, ids::PCIE2_CORE_ID);
    assert_eq!(core.rev, 0x11);

    let direct = Chip::direct().attach_direct();
    assert_eq!(bp.table(), direct.table(), "transport must not change the topology");
}

#[test]
fn rescan_yields_the_same_table_and_drops_the_focus() {
    let chip = Chip::direct();
    let mut bp = chip.attach_direct();
    let first = bp.table().clone();
    {
        let guard = bp.mask_interrupts();
        bp.select(&guard, D11, WrapperSlot::Primary).expect("select");
    }
    assert_eq!(bp.core_index(), Some(D11));

    assert_eq!(bp.scan(), 3);
    assert_eq!(bp.table(), &first);
    assert_eq!(bp.focus(), None);
    assert_eq!(bp.core_id(), Err(BackplaneError::NoFocus));
}

#[test]
fn malformed_rom_leaves_no_partial_table() {
    let mut words = erom(0x2B).build();
    // Second half of the radio's identifier.
    words[6] = 0;
    let chip = Chip::with_rom(&words);
    let bp = chip.attach_direct();
    assert_eq!(bp.unit_count(), 0);
    assert!(bp.table().inventory.is_empty());
    assert!(bp.table().bridges.is_empty());
}

#[test]
fn unit_missing_its_slave_descriptor_discards_the_scan() {
    let words = EromBuilder::new()
        .component(MFG_BRCM, CC_CORE_ID, 0x2B, 1, 1, 0, 1)
        .master_port(0, 0)
        .slave(0, CC_BASE as u64, 0x1000)
        .slave_wrapper(0, CC_WRAP)
        .component(MFG_BRCM, D11_ID, 0x30, 1, 1, 1, 0)
        .master_port(0, 1)
        .master_wrapper(0, D11_WRAP)
        .end()
        .build();
    let chip = Chip::with_rom(&words);
    let mut bp = chip.attach_direct();
    assert_eq!(bp.unit_count(), 0);
    assert!(bp.table().inventory.is_empty(), "chip-common's wrapper is discarded too");
    assert_eq!(bp.scan(), 0);
}

#[test]
fn rom_without_end_marker_is_rejected() {
    let mut words = erom(0x2B).build();
    words.pop();
    let chip = Chip::with_rom(&words);
    let mut bp = chip.attach_direct();
    assert_eq!(bp.unit_count(), 0, "scan must stop at the ROM limit and discard everything");
    assert_eq!(bp.scan(), 0);
}

#[test]
fn byte_image_of_single_chipcommon() {
    let image = hex!(
        "01 00 f8 4b" "11 02 08 2b" "03 00 00 00"
        "05 00 00 18" "85 00 10 18" "0f 00 00 00"
    );
    let words: Vec<u32> = image
        .chunks_exact(4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    let chip = Chip::with_rom(&words);
    let bp = chip.attach_direct();

    assert_eq!(bp.unit_count(), 1);
    let cc = &bp.table().units[0];
    assert_eq!((cc.mfg, cc.id, cc.rev), (ids::MFG_BRCM, ids::CC_CORE_ID, 0x2B));
    assert_eq!(cc.base(), CC_BASE);
    assert_eq!(cc.wrapper(0), Some(CC_WRAP));
    assert_eq!(bp.table().chipcommon_rev(), Some(0x2B));
}

#[test]
fn focused_unit_queries() {
    let chip = Chip::direct();
    let mut bp = chip.attach_direct();
    let guard = bp.mask_interrupts();
    bp.select(&guard, D11, WrapperSlot::Primary).expect("select");

    assert_eq!(bp.core_id(), Ok(D11_ID));
    assert_eq!(bp.core_vendor(), Ok(ids::MFG_BRCM));
    assert_eq!(bp.core_rev(), Ok(0x30));
    assert_eq!(bp.slave_port_count(D11), Ok(2));
    assert_eq!(bp.address_space(0, 0), Ok(Some((D11_BASE as u64, 0x1000))));
    assert_eq!(bp.address_space(0, 1), Ok(Some((D11_SECOND as u64, 0x2000))));
    assert_eq!(bp.address_space_size(1, 0), Ok(Some(0x40_0000)));
    assert_eq!(bp.address_space(2, 0), Ok(None));
    assert_eq!(bp.address_space_count(), Ok(3));

    let port1 = bp.address_space_x(0).expect("query").expect("port 1 space");
    assert_eq!((port1.port, port1.base()), (1, D11_PORT1));
    assert_eq!(bp.address_space_x(1), Ok(None));
    assert_eq!(
        bp.slave_port_count(9),
        Err(BackplaneError::UnitOutOfRange { index: 9, count: 3 })
    );
}
