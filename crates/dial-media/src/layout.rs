//! Word/block units and the fixed block layout of a DIAL-MS system image.
//!
//! A word is a 12-bit value stored in a little-endian 16-bit container. A block is 256 words.
//! All offsets below are octal, matching the system's own documentation.

pub const BYTES_PER_WORD: usize = 2;
pub const WORDS_PER_BLOCK: usize = 0o400;
pub const BYTES_PER_BLOCK: usize = WORDS_PER_BLOCK * BYTES_PER_WORD;

/// Mask for the 12 significant bits of a word.
pub const WORD_MASK: u16 = 0o7777;

/// Blocks that must be present for an image to carry a complete system area.
pub const SYSTEM_AREA_BLOCKS: usize = 0o370;

/// File index, erased unless the index is preserved.
pub const INDEX_BLOCKS: std::ops::Range<usize> = 0..0o300;
/// Start of the user data / work area; runs to the end of the image.
pub const WORK_AREA_START_BLOCK: usize = 0o370;
/// Reserved scratch area between the system tables.
pub const RESERVED_BLOCKS: std::ops::Range<usize> = 0o346..0o350;

/// A named, block-aligned region of a system image.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Region {
    pub name: &'static str,
    pub start_block: usize,
    pub blocks: usize,
}

impl Region {
    pub const fn byte_offset(&self) -> usize {
        self.start_block * BYTES_PER_BLOCK
    }

    pub const fn byte_len(&self) -> usize {
        self.blocks * BYTES_PER_BLOCK
    }

    pub const fn byte_range(&self) -> std::ops::Range<usize> {
        self.byte_offset()..self.byte_offset() + self.byte_len()
    }
}

/// Resident I/O routines: controller code followed by the active handler block.
pub const IO_ROUTINES: Region = Region {
    name: "I/O routines",
    start_block: 0o322,
    blocks: 2,
};

/// Master copy of the I/O controller (first half of the routines region).
pub const IO_CONTROLLER_MASTER: Region = Region {
    name: "I/O controller master",
    start_block: 0o345,
    blocks: 1,
};

/// Master handler block holding the RK08 and DF32 handlers.
pub const IO_MASTERS_FIRST: Region = Region {
    name: "I/O masters (first)",
    start_block: 0o365,
    blocks: 1,
};

/// Master handler block holding the RF08 and LINCtape handlers.
pub const IO_MASTERS_SECOND: Region = Region {
    name: "I/O masters (second)",
    start_block: 0o366,
    blocks: 1,
};

/// Unit table word range inside the I/O routines region.
pub const UNIT_TABLE_WORDS: std::ops::Range<usize> = 0o300..0o400;

pub const fn words_to_bytes(words: usize) -> usize {
    words * BYTES_PER_WORD
}

pub const fn blocks_to_bytes(blocks: usize) -> usize {
    blocks * BYTES_PER_BLOCK
}
