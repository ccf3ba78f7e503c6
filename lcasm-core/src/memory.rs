use std::collections::HashMap;
use std::fmt;
use std::ops::Range;

use rangemap::RangeMap;

use crate::error::{AddressError, Result};

pub const WORD_BYTES: u32 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment {
    pub name: &'static str,
    pub writable: bool,
}

impl Segment {
    pub const TEXT: Segment = Segment {
        name: "text",
        writable: false,
    };
    pub const DATA: Segment = Segment {
        name: "data",
        writable: true,
    };
}

/// Sparse word-addressable memory split into mapped segments.
///
/// Unwritten words inside a mapped segment read as zero. Every access must be
/// word-aligned and fall inside a segment; stores additionally require a
/// writable segment.
#[derive(Clone)]
pub struct Memory {
    segments: RangeMap<u32, Segment>,
    words: HashMap<u32, i32>,
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for (range, segment) in self.segments.iter() {
            list.entry(&format_args!(
                "{} 0x{:08X}..0x{:08X}",
                segment.name, range.start, range.end
            ));
        }
        list.finish()?;
        write!(f, " ({} words in use)", self.words.len())
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory {
    /// Memory with nothing mapped; every access fails until segments are added.
    pub fn new() -> Self {
        Self {
            segments: RangeMap::new(),
            words: HashMap::new(),
        }
    }

    pub fn with_segments(segments: impl IntoIterator<Item = (Range<u32>, Segment)>) -> Self {
        let mut memory = Self::new();
        for (range, segment) in segments {
            memory.map(range, segment);
        }
        memory
    }

    pub fn map(&mut self, range: Range<u32>, segment: Segment) {
        tracing::debug!(
            "mapping {} segment 0x{:08X} - 0x{:08X}",
            segment.name,
            range.start,
            range.end
        );
        self.segments.insert(range, segment);
    }

    pub fn segment_at(&self, address: u32) -> Option<&Segment> {
        self.segments.get(&address)
    }

    fn check(&self, address: u32) -> Result<&Segment> {
        if address % WORD_BYTES != 0 {
            return Err(AddressError::Unaligned(address));
        }
        self.segment_at(address)
            .ok_or(AddressError::Unmapped(address))
    }

    pub fn read_word(&self, address: u32) -> Result<i32> {
        self.check(address)?;
        Ok(self.words.get(&address).copied().unwrap_or(0))
    }

    pub fn write_word(&mut self, address: u32, value: i32) -> Result<()> {
        if !self.check(address)?.writable {
            return Err(AddressError::ReadOnly(address));
        }
        self.store(address, value);
        Ok(())
    }

    /// Writes a word regardless of segment writability. Used by loaders to
    /// place a program into the text segment.
    pub fn load_word(&mut self, address: u32, value: i32) -> Result<()> {
        self.check(address)?;
        self.store(address, value);
        Ok(())
    }

    fn store(&mut self, address: u32, value: i32) {
        if value == 0 {
            self.words.remove(&address);
        } else {
            self.words.insert(address, value);
        }
    }

    pub fn clear(&mut self) {
        self.words.clear();
    }
}
