use std::ops::Range;

use tracing::debug;

use crate::layout::{
    blocks_to_bytes, words_to_bytes, Region, BYTES_PER_BLOCK, INDEX_BLOCKS, IO_CONTROLLER_MASTER,
    IO_ROUTINES, RESERVED_BLOCKS, SYSTEM_AREA_BLOCKS, UNIT_TABLE_WORDS, WORK_AREA_START_BLOCK,
};
use crate::{MediaError, Result};

/// A full system image as a plain sequence of 256-word blocks.
///
/// The length is always a whole number of blocks and covers at least the system area.
#[derive(Clone, PartialEq, Eq)]
pub struct CanonicalImage {
    bytes: Vec<u8>,
}

impl std::fmt::Debug for CanonicalImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanonicalImage")
            .field("blocks", &self.block_count())
            .finish()
    }
}

impl CanonicalImage {
    /// Wraps block data, rejecting partial blocks and images without a full system area.
    pub fn from_blocks(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() % BYTES_PER_BLOCK != 0 {
            return Err(MediaError::Format("image ends with a partial block"));
        }
        if bytes.len() / BYTES_PER_BLOCK < SYSTEM_AREA_BLOCKS {
            return Err(MediaError::Format("missing system area"));
        }
        Ok(Self { bytes })
    }

    pub fn block_count(&self) -> usize {
        self.bytes.len() / BYTES_PER_BLOCK
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn region(&self, region: Region) -> &[u8] {
        &self.bytes[region.byte_range()]
    }

    pub fn region_mut(&mut self, region: Region) -> &mut [u8] {
        &mut self.bytes[region.byte_range()]
    }

    /// Replaces a whole region; `data` must be exactly the region's size.
    pub fn write_region(&mut self, region: Region, data: &[u8]) -> Result<()> {
        if data.len() != region.byte_len() {
            return Err(MediaError::Length {
                region: region.name,
                expected: region.byte_len(),
                actual: data.len(),
            });
        }
        self.region_mut(region).copy_from_slice(data);
        debug!(region = region.name, block = region.start_block, "wrote region");
        Ok(())
    }

    /// Zeroes `blocks`, clamped to the end of the image.
    pub fn erase_blocks(&mut self, blocks: Range<usize>) {
        let end = blocks.end.min(self.block_count());
        if blocks.start >= end {
            return;
        }
        self.bytes[blocks_to_bytes(blocks.start)..blocks_to_bytes(end)].fill(0);
        debug!(start = blocks.start, end, "erased blocks");
    }

    /// Clears the file index, the work area and the reserved scratch blocks.
    ///
    /// The three ranges are erased one after the other; none of them touches the I/O regions.
    pub fn erase_index_and_work_area(&mut self) {
        self.erase_blocks(INDEX_BLOCKS);
        self.erase_blocks(WORK_AREA_START_BLOCK..self.block_count());
        self.erase_blocks(RESERVED_BLOCKS);
    }

    /// Starts a fresh copy of the resident I/O routines from the controller master and the
    /// given handler masters block.
    pub fn stage_routines(&self, masters: Region) -> RoutinesStage {
        let mut bytes = [0u8; 2 * BYTES_PER_BLOCK];
        bytes[..BYTES_PER_BLOCK]
            .copy_from_slice(&self.region(IO_CONTROLLER_MASTER)[..BYTES_PER_BLOCK]);
        bytes[BYTES_PER_BLOCK..].copy_from_slice(&self.region(masters)[..BYTES_PER_BLOCK]);
        RoutinesStage { bytes }
    }

    /// Reads the resident I/O routines as they currently are in the image.
    pub fn current_routines(&self) -> RoutinesStage {
        let mut bytes = [0u8; 2 * BYTES_PER_BLOCK];
        bytes.copy_from_slice(self.region(IO_ROUTINES));
        RoutinesStage { bytes }
    }

    pub fn commit_routines(&mut self, stage: &RoutinesStage) -> Result<()> {
        self.write_region(IO_ROUTINES, &stage.bytes)
    }
}

fn unit_table_range() -> Range<usize> {
    words_to_bytes(UNIT_TABLE_WORDS.start)..words_to_bytes(UNIT_TABLE_WORDS.end)
}

/// Working copy of the two I/O routines blocks.
///
/// Components get disjoint views into it: the unit table, the handler block, or the whole
/// region for the bootstrap patch.
#[derive(Clone, PartialEq, Eq)]
pub struct RoutinesStage {
    bytes: [u8; 2 * BYTES_PER_BLOCK],
}

impl std::fmt::Debug for RoutinesStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutinesStage").finish_non_exhaustive()
    }
}

impl Default for RoutinesStage {
    fn default() -> Self {
        Self {
            bytes: [0u8; 2 * BYTES_PER_BLOCK],
        }
    }
}

impl RoutinesStage {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// The 64-word unit table.
    pub fn unit_table_mut(&mut self) -> &mut [u8] {
        &mut self.bytes[unit_table_range()]
    }

    pub fn unit_table(&self) -> &[u8] {
        &self.bytes[unit_table_range()]
    }

    /// The second block, holding the resident handler slots.
    pub fn handler_block_mut(&mut self) -> &mut [u8] {
        &mut self.bytes[BYTES_PER_BLOCK..]
    }

    pub fn handler_block(&self) -> &[u8] {
        &self.bytes[BYTES_PER_BLOCK..]
    }
}
