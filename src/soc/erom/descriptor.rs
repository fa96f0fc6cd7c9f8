//! Address/size descriptor reader.
use tracing::trace;

use super::cursor::{EromCursor, WordSource};
use super::entry::{AddressKind, Entry, EntryFilter, SizeCode, layout};

/// One decoded address descriptor: base and size, both split into 32-bit
/// halves. `raw` is the matched address entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressDescriptor {
    pub raw: u32,
    pub addr_low: u32,
    pub addr_high: u32,
    pub size_low: u32,
    pub size_high: u32,
}

impl AddressDescriptor {
    pub fn base(&self) -> u64 {
        ((self.addr_high as u64) << 32) | self.addr_low as u64
    }

    pub fn size(&self) -> u64 {
        ((self.size_high as u64) << 32) | self.size_low as u64
    }
}

/// Probes for the address descriptor of (`port`, `kind`). When the next valid
/// entry is something else the cursor is rewound onto it and `None` is
/// returned, so the caller can try again with a different selector.
///
/// `index` is only used for tracing; descriptors of a port are consumed in
/// order.
pub fn read_address<S: WordSource>(
    cursor: &mut EromCursor<S>,
    port: u8,
    index: u8,
    kind: AddressKind,
) -> Option<AddressDescriptor> {
    let raw = cursor.read_entry(EntryFilter::VALID);
    let entry = match Entry::decode(raw) {
        Entry::Address(entry) if entry.port == port as u32 && entry.kind == kind => entry,
        _ => {
            cursor.unread();
            return None;
        }
    };

    let addr_high = if entry.wide {
        cursor.read_entry(EntryFilter::ANY)
    } else {
        0
    };

    let (size_low, size_high) = match entry.size {
        SizeCode::Exponent(exp) => (layout::AD_SZ_BASE << exp, 0),
        SizeCode::Descriptor => {
            let szd = cursor.read_entry(EntryFilter::ANY);
            let high = if szd & layout::SD_SG32 != 0 {
                cursor.read_entry(EntryFilter::ANY)
            } else {
                0
            };
            (szd & layout::SD_SZ_MASK, high)
        }
    };

    trace!(
        port,
        index,
        ?kind,
        "address 0x{addr_high:08X}_{:08X} size 0x{size_high:08X}_{size_low:08X}",
        entry.addr_low
    );

    Some(AddressDescriptor {
        raw,
        addr_low: entry.addr_low,
        addr_high,
        size_low,
        size_high,
    })
}
