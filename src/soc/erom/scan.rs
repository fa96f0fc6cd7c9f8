//! Walks the descriptor stream and builds the topology table.
use smallvec::SmallVec;
use tracing::{debug, error, info, trace};

use crate::soc::backplane::regs::CORE_SIZE;
use crate::soc::topology::{
    AddressSpace, MAX_BRIDGES, MAX_UNITS, MAX_WRAPPERS, TopologyTable, UnitInfo, WrapperInfo,
    WrapperRole, ids,
};

use super::cursor::{CursorFault, EromCursor, WordSource};
use super::descriptor::{AddressDescriptor, read_address};
use super::entry::{AddressKind, ComponentDescriptor, Entry, EntryFilter, layout};
use super::error::{EromError, EromResult};

/// Decodes the whole stream. Any malformed component fails the scan as a
/// whole; no partially built table is ever returned.
pub fn scan<S: WordSource>(cursor: &mut EromCursor<S>) -> EromResult<TopologyTable> {
    let mut table = TopologyTable::default();
    let result = scan_into(cursor, &mut table);
    let result = match (result, cursor.fault()) {
        (_, Some(CursorFault::EscapeBound { offset })) => Err(EromError::EscapeBound { offset }),
        (_, Some(CursorFault::Exhausted { offset })) => Err(EromError::Exhausted { offset }),
        (result, None) => result,
    };
    match result {
        Ok(()) => {
            info!(
                units = table.len(),
                wrappers = table.inventory.len(),
                bridges = table.bridges.len(),
                "enumeration complete"
            );
            Ok(table)
        }
        Err(err) => {
            error!("enumeration failed: {err}");
            Err(err)
        }
    }
}

fn scan_into<S: WordSource>(
    cursor: &mut EromCursor<S>,
    table: &mut TopologyTable,
) -> EromResult<()> {
    loop {
        let cia = cursor.read_entry(EntryFilter::COMPONENT);
        if cia == layout::END_MARKER {
            return Ok(());
        }
        let offset = cursor.offset() - 4;
        let cib = cursor.read_entry(EntryFilter::ANY);
        if !matches!(Entry::decode(cib), Entry::Component(_)) || cursor.fault().is_some() {
            return Err(EromError::MissingSecondHalf { offset, found: cib });
        }

        let desc = ComponentDescriptor::from_pair(cia, cib);
        debug!(
            "component 0x{:03X}/0x{:03X} rev {} at 0x{offset:03X}: nmp {} nsp {} nmw {} nsw {}",
            desc.mfg,
            desc.id,
            desc.rev,
            desc.master_ports,
            desc.slave_ports,
            desc.master_wrappers,
            desc.slave_wrappers
        );

        if (desc.slave_ports == 0 && desc.slave_wrappers == 0)
            || (desc.mfg == ids::MFG_ARM && desc.id == ids::DEF_AI_COMP)
        {
            continue;
        }

        if desc.master_wrappers as u32 + desc.slave_wrappers as u32 == 0 {
            if desc.id == ids::OOB_ROUTER_CORE_ID
                && let Some(asd) = read_address(cursor, 0, 0, AddressKind::Slave)
            {
                table.note_oob_router(asd.addr_low);
            }
            if !ids::WRAPPERLESS_UNITS.contains(&desc.id) {
                continue;
            }
        }

        if let Some(unit) = read_unit(cursor, table, &desc)? {
            if table.units.len() >= MAX_UNITS {
                return Err(EromError::TooManyUnits { limit: MAX_UNITS });
            }
            table.units.push(unit);
        }
    }
}

/// Consumes one component's ports and wrappers. Returns `None` for bridges
/// and for components without slave ports; their wrappers still land in the
/// inventory.
fn read_unit<S: WordSource>(
    cursor: &mut EromCursor<S>,
    table: &mut TopologyTable,
    desc: &ComponentDescriptor,
) -> EromResult<Option<UnitInfo>> {
    let unit = table.units.len();
    let id = desc.id;

    for port in 0..desc.master_ports {
        let raw = cursor.read_entry(EntryFilter::VALID);
        match Entry::decode(raw) {
            Entry::MasterPort(mp) => trace!("  master port {port}: mp {} id {}", mp.port, mp.id),
            _ => {
                return Err(EromError::MissingMasterPort {
                    unit,
                    port,
                    found: raw,
                });
            }
        }
    }

    let mut spaces: SmallVec<[AddressSpace; 4]> = SmallVec::new();
    let mut is_bridge = false;
    match read_address(cursor, 0, 0, AddressKind::Slave) {
        Some(asd) => {
            if asd.addr_low == 0 || asd.size_low == 0 {
                return Err(EromError::InvalidSlaveDescriptor {
                    unit,
                    id,
                    addr: asd.addr_low,
                    size: asd.size_low,
                });
            }
            spaces.push(space(0, 0, &asd));
        }
        None => {
            while read_address(cursor, 0, 0, AddressKind::Bridge).is_some() {
                is_bridge = true;
            }
            if !is_bridge && desc.slave_ports > 0 {
                return Err(EromError::MissingSlaveDescriptor { unit, id });
            }
        }
    }

    let mut index = 1u8;
    while let Some(asd) = read_address(cursor, 0, index, AddressKind::Slave) {
        spaces.push(space(0, index, &asd));
        index = index.wrapping_add(1);
    }

    for port in 1..desc.slave_ports {
        let mut index = 0u8;
        while let Some(asd) = read_address(cursor, port, index, AddressKind::Slave) {
            spaces.push(space(port, index, &asd));
            index = index.wrapping_add(1);
        }
        if index == 0 {
            return Err(EromError::EmptySlavePort { unit, id, port });
        }
    }

    let mut wrappers = [None; 3];
    for index in 0..desc.master_wrappers {
        let addr = read_wrapper(cursor, unit, id, index, index, AddressKind::MasterWrapper)?;
        if let Some(slot) = wrappers.get_mut(index as usize) {
            *slot = Some(addr);
        }
        push_wrapper(table, desc, WrapperRole::Master, addr);
    }

    let first_port = if desc.slave_ports > 1 { 1 } else { 0 };
    for index in 0..desc.slave_wrappers {
        let addr = read_wrapper(
            cursor,
            unit,
            id,
            index,
            first_port + index,
            AddressKind::SlaveWrapper,
        )?;
        if desc.mfg == ids::MFG_ARM && desc.id == ids::APB_BRIDGE_ID {
            if table.bridges.len() >= MAX_BRIDGES {
                return Err(EromError::BridgeOverflow { addr });
            }
            table.bridges.push(addr);
        }
        if desc.mfg == ids::MFG_ARM && desc.id == ids::ADB_BRIDGE_ID {
            is_bridge = true;
        }
        if desc.master_wrappers == 0
            && let Some(slot) = wrappers.get_mut(index as usize)
        {
            *slot = Some(addr);
        }
        push_wrapper(table, desc, WrapperRole::Slave, addr);
    }

    if is_bridge || desc.slave_ports == 0 {
        trace!("  component 0x{id:03X} is not an addressable unit");
        return Ok(None);
    }

    Ok(Some(UnitInfo {
        cia: desc.cia,
        cib: desc.cib,
        mfg: desc.mfg,
        id,
        rev: desc.rev,
        master_ports: desc.master_ports,
        slave_ports: desc.slave_ports,
        master_wrappers: desc.master_wrappers,
        slave_wrappers: desc.slave_wrappers,
        wrappers,
        spaces,
    }))
}

fn read_wrapper<S: WordSource>(
    cursor: &mut EromCursor<S>,
    unit: usize,
    id: u16,
    index: u8,
    port: u8,
    kind: AddressKind,
) -> EromResult<u32> {
    let asd = read_address(cursor, port, 0, kind)
        .ok_or(EromError::MissingWrapper { unit, id, index })?;
    if asd.size_high != 0 || asd.size_low != CORE_SIZE {
        return Err(EromError::WrapperSize {
            unit,
            id,
            addr: asd.addr_low,
            size: asd.size_low,
        });
    }
    Ok(asd.addr_low)
}

fn push_wrapper(table: &mut TopologyTable, desc: &ComponentDescriptor, role: WrapperRole, addr: u32) {
    if table.inventory.len() >= MAX_WRAPPERS {
        return;
    }
    trace!("  {role:?} wrapper 0x{addr:08X}");
    table.inventory.push(WrapperInfo {
        mfg: desc.mfg,
        id: desc.id,
        rev: desc.rev,
        role,
        addr,
    });
}

fn space(port: u8, index: u8, asd: &AddressDescriptor) -> AddressSpace {
    AddressSpace {
        port,
        index,
        base_low: asd.addr_low,
        base_high: asd.addr_high,
        size_low: asd.size_low,
        size_high: asd.size_high,
    }
}
