use std::fmt;
use std::str::FromStr;

use crate::layout::{BYTES_PER_WORD, WORDS_PER_BLOCK};
use crate::util::{read_le_u16, write_le_u16};
use crate::{MediaError, Result};

/// Size of the framing footer appended to LINCtape images.
pub const TAPE_FOOTER_LEN: usize = 6;

/// Storage media a system image can be built for.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum MediaKind {
    /// LINCtape; the only kind with its own framing footer.
    Linc,
    Rk08,
    Rk05,
    /// Serial disk, laid out like an RK08 pack.
    Sdsk,
}

/// Block geometry of a media kind.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MediaGeometry {
    pub block_count: u64,
    pub block_size_words: u64,
    pub sides: u64,
}

impl MediaGeometry {
    pub const fn size_bytes(&self) -> u64 {
        self.block_count * self.block_size_words * self.sides * BYTES_PER_WORD as u64
    }
}

impl MediaKind {
    pub const ALL: [MediaKind; 4] = [
        MediaKind::Linc,
        MediaKind::Rk08,
        MediaKind::Rk05,
        MediaKind::Sdsk,
    ];

    /// Short identifier, also used as the output file extension.
    pub const fn id(self) -> &'static str {
        match self {
            Self::Linc => "linc",
            Self::Rk08 => "rk08",
            Self::Rk05 => "rk05",
            Self::Sdsk => "sdsk",
        }
    }

    pub const fn geometry(self) -> MediaGeometry {
        match self {
            // Typical LINC formatting: 512 blocks of 256 words.
            Self::Linc => MediaGeometry {
                block_count: 512,
                block_size_words: 256,
                sides: 1,
            },
            // 831488 words per pack.
            Self::Rk08 | Self::Sdsk => MediaGeometry {
                block_count: 3248,
                block_size_words: 256,
                sides: 1,
            },
            Self::Rk05 => MediaGeometry {
                block_count: 3248,
                block_size_words: 256,
                sides: 2,
            },
        }
    }

    pub const fn is_tape(self) -> bool {
        matches!(self, Self::Linc)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for MediaKind {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.id().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| MediaError::UnknownMedia(s.to_string()))
    }
}

/// Trailing framing of a LINCtape image.
///
/// Padding counts are stored negated (two's complement) on disk.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TapeFooter {
    pub block_size_words: u16,
    pub start_pad_blocks: u16,
    pub end_pad_blocks: u16,
}

impl Default for TapeFooter {
    fn default() -> Self {
        Self {
            block_size_words: WORDS_PER_BLOCK as u16,
            start_pad_blocks: 0,
            end_pad_blocks: 0,
        }
    }
}

impl TapeFooter {
    pub fn parse(raw: &[u8; TAPE_FOOTER_LEN]) -> Result<Self> {
        let block_size_words = read_le_u16(raw, 0);
        if usize::from(block_size_words) != WORDS_PER_BLOCK {
            return Err(MediaError::Format("tape footer block size is not 256 words"));
        }
        Ok(Self {
            block_size_words,
            start_pad_blocks: read_le_u16(raw, 2).wrapping_neg(),
            end_pad_blocks: read_le_u16(raw, 4).wrapping_neg(),
        })
    }

    pub fn to_bytes(&self) -> [u8; TAPE_FOOTER_LEN] {
        let mut raw = [0u8; TAPE_FOOTER_LEN];
        write_le_u16(&mut raw, 0, self.block_size_words);
        write_le_u16(&mut raw, 2, self.start_pad_blocks.wrapping_neg());
        write_le_u16(&mut raw, 4, self.end_pad_blocks.wrapping_neg());
        raw
    }
}
