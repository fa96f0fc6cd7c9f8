//! Cursor over the raw descriptor words. The cursor owns its position for
//! the duration of a scan, applies the mask/match filter of the entry reader,
//! and keeps one entry of history so a lookahead can be pushed back.
use tracing::{error, trace};

use crate::soc::host::{Host, HostAddr};

use super::ESCAPE_BOUND;
use super::entry::{
    EntryFilter,
    layout::{END_MARKER, VALID},
};

pub trait WordSource {
    fn word(&self, index: usize) -> u32;
}

impl WordSource for [u32] {
    fn word(&self, index: usize) -> u32 {
        self.get(index).copied().unwrap_or(0)
    }
}

impl WordSource for Vec<u32> {
    fn word(&self, index: usize) -> u32 {
        self.as_slice().word(index)
    }
}

impl<S: WordSource + ?Sized> WordSource for &S {
    fn word(&self, index: usize) -> u32 {
        (**self).word(index)
    }
}

/// ROM words fetched through the host register primitives.
pub struct HostWords<'a> {
    host: &'a dyn Host,
    base: HostAddr,
}

impl<'a> HostWords<'a> {
    pub fn new(host: &'a dyn Host, base: HostAddr) -> Self {
        Self { host, base }
    }
}

impl WordSource for HostWords<'_> {
    fn word(&self, index: usize) -> u32 {
        self.host.read32(self.base + index * 4)
    }
}

/// Why the reader handed back a synthetic end marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorFault {
    /// Too many non-matching entries without seeing the end marker.
    EscapeBound { offset: usize },
    /// The cursor ran off the end of the ROM window.
    Exhausted { offset: usize },
}

pub struct EromCursor<S> {
    source: S,
    pos: usize,
    limit: usize,
    last: Option<usize>,
    fault: Option<CursorFault>,
}

impl<S: WordSource> EromCursor<S> {
    /// `limit_words` bounds how far the cursor may read.
    pub fn new(source: S, limit_words: usize) -> Self {
        Self {
            source,
            pos: 0,
            limit: limit_words,
            last: None,
            fault: None,
        }
    }

    #[inline(always)]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Byte offset of the cursor inside the ROM.
    #[inline(always)]
    pub fn offset(&self) -> usize {
        self.pos * 4
    }

    pub fn fault(&self) -> Option<CursorFault> {
        self.fault
    }

    /// Returns the next word accepted by `filter`.
    ///
    /// Words without the valid bit are skipped. The end marker is always
    /// returned, whatever the filter. With a zero mask the very next word is
    /// returned unconditionally. When the escape bound trips or the window
    /// runs out, the end marker is returned and the fault is recorded.
    pub fn read_entry(&mut self, filter: EntryFilter) -> u32 {
        let mut invalid = 0usize;
        let mut skipped = 0usize;
        let mut scanned = 0usize;
        loop {
            if self.pos >= self.limit {
                self.last = None;
                error!(offset = self.offset(), "enumeration ROM window exhausted");
                self.fault = Some(CursorFault::Exhausted {
                    offset: self.offset(),
                });
                return END_MARKER;
            }
            let at = self.pos;
            let raw = self.source.word(at);
            self.pos += 1;
            self.last = Some(at);

            if filter.mask == 0 {
                return raw;
            }
            if raw & VALID == 0 {
                invalid += 1;
                continue;
            }
            if raw == END_MARKER || filter.matches(raw) {
                if invalid + skipped > 0 {
                    trace!(invalid, skipped, "entry 0x{raw:08X} after skipped entries");
                }
                return raw;
            }

            scanned += 4;
            if scanned >= ESCAPE_BOUND {
                self.last = None;
                error!(offset = self.offset(), "failed to find end of enumeration ROM marker");
                self.fault = Some(CursorFault::EscapeBound {
                    offset: self.offset(),
                });
                return END_MARKER;
            }
            skipped += 1;
        }
    }

    /// Pushes the most recently returned word back. Only one level of history
    /// is kept; a second call without an intervening read does nothing, and a
    /// synthetic end marker cannot be pushed back.
    pub fn unread(&mut self) {
        if let Some(at) = self.last.take() {
            self.pos = at;
        }
    }
}
