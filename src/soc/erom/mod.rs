//! Enumeration ROM decoding: the entry reader, the address/size descriptor
//! reader and the scanner that turns the descriptor stream into a
//! [`TopologyTable`](crate::soc::topology::TopologyTable).
pub mod builder;
pub mod cursor;
pub mod descriptor;
pub mod entry;
pub mod error;
pub mod scan;

pub use builder::EromBuilder;
pub use cursor::{CursorFault, EromCursor, HostWords, WordSource};
pub use descriptor::{AddressDescriptor, read_address};
pub use entry::{AddressEntry, AddressKind, ComponentDescriptor, Entry, EntryFilter, SizeCode};
pub use error::{EromError, EromResult};
pub use scan::scan;

/// Bytes of non-matching entries the reader will step over before giving up
/// on ever finding the end marker.
pub const ESCAPE_BOUND: usize = 4096;

/// Bytes of the ROM window that may hold descriptors; the remap registers
/// start right after.
pub const EROM_LIMIT: usize = 0xE00;
