//! Decoder for the LINC/PDP-8 binary loader paper-tape format.
//!
//! A tape is a stream of frames. Leader/trailer frames are `0x80`. Data is carried in two-frame
//! records holding six bits each; bit 6 of the first frame marks an origin (address-set) record.
//! `0xFF` toggles a skip region whose contents are ignored, and frames with both high bits set
//! are field-update records, which are not supported and silently dropped.

use std::io::Read;

use tracing::debug;

use crate::layout::{words_to_bytes, BYTES_PER_WORD, WORD_MASK};
use crate::{MediaError, Result};

/// Number of words in one memory field.
pub const CORE_WORDS: usize = 0o10000;
/// Size of a flat little-endian dump of a [`CoreImage`].
pub const CORE_IMAGE_BYTES: usize = CORE_WORDS * BYTES_PER_WORD;

const LEADER: u8 = 0x80;
const SKIP_TOGGLE: u8 = 0xFF;
const FIELD_UPDATE_MASK: u8 = 0xC0;
const ORIGIN_BIT: u8 = 0x40;
const SIX_BITS: u8 = 0x3F;

/// A flat 4096-word memory field.
#[derive(Clone, PartialEq, Eq)]
pub struct CoreImage {
    words: Box<[u16; CORE_WORDS]>,
}

impl Default for CoreImage {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CoreImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let populated = self.words.iter().filter(|w| **w != 0).count();
        f.debug_struct("CoreImage")
            .field("nonzero_words", &populated)
            .finish()
    }
}

impl CoreImage {
    pub fn new() -> Self {
        Self {
            words: Box::new([0u16; CORE_WORDS]),
        }
    }

    /// Reads the word at `address` (wrapped to the field).
    pub fn word(&self, address: usize) -> u16 {
        self.words[address % CORE_WORDS]
    }

    pub fn set_word(&mut self, address: usize, value: u16) {
        self.words[address % CORE_WORDS] = value & WORD_MASK;
    }

    pub fn words(&self) -> &[u16] {
        &self.words[..]
    }

    /// Little-endian bytes for `len_words` words starting at `start_word`.
    ///
    /// The range must not run past the end of the field.
    pub fn bytes_at(&self, start_word: usize, len_words: usize) -> Result<Vec<u8>> {
        let end = start_word
            .checked_add(len_words)
            .ok_or(MediaError::OffsetOverflow)?;
        if end > CORE_WORDS {
            return Err(MediaError::Bounds {
                region: "core image",
                offset: words_to_bytes(start_word),
                len: words_to_bytes(len_words),
                capacity: CORE_IMAGE_BYTES,
            });
        }
        let mut out = Vec::with_capacity(words_to_bytes(len_words));
        for w in &self.words[start_word..end] {
            out.extend_from_slice(&w.to_le_bytes());
        }
        Ok(out)
    }

    /// Flat dump of the whole field, two bytes per word.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(CORE_IMAGE_BYTES);
        for w in self.words.iter() {
            out.extend_from_slice(&w.to_le_bytes());
        }
        out
    }
}

/// Single-byte lookahead over a tape, so the first non-leader frame can be pushed back.
struct Frames<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Frames<'a> {
    fn next(&mut self) -> Option<u8> {
        let b = *self.bytes.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }

    fn unread(&mut self) {
        self.pos -= 1;
    }
}

/// Decodes a complete loader tape held in memory.
pub fn decode_bytes(tape: &[u8]) -> Result<CoreImage> {
    let mut frames = Frames {
        bytes: tape,
        pos: 0,
    };

    loop {
        match frames.next() {
            Some(LEADER) => continue,
            Some(_) => {
                frames.unread();
                break;
            }
            None => return Err(MediaError::Format("tape ended inside leader")),
        }
    }

    let mut image = CoreImage::new();
    let mut address = 0usize;
    let mut skip = false;
    let mut data_words = 0usize;
    let mut origins = 0usize;

    loop {
        let b = frames
            .next()
            .ok_or(MediaError::Format("tape ended before trailer"))?;

        if b == SKIP_TOGGLE {
            skip = !skip;
            continue;
        }
        if skip {
            continue;
        }
        if b & FIELD_UPDATE_MASK == FIELD_UPDATE_MASK {
            continue;
        }
        if b & LEADER != 0 {
            break;
        }

        let b2 = frames
            .next()
            .ok_or(MediaError::Format("tape ended inside a record"))?;
        let value = (u16::from(b & SIX_BITS) << 6) | u16::from(b2 & SIX_BITS);
        if b & ORIGIN_BIT != 0 {
            address = usize::from(value);
            origins += 1;
        } else {
            image.words[address] = value;
            address = (address + 1) % CORE_WORDS;
            data_words += 1;
        }
    }

    debug!(
        origins,
        data_words,
        consumed = frames.pos,
        "decoded loader tape"
    );
    Ok(image)
}

/// Decodes a loader tape from a reader.
///
/// The reader is drained completely; the decoder itself stops at the trailer.
pub fn decode<R: Read>(mut reader: R) -> Result<CoreImage> {
    let mut tape = Vec::new();
    reader.read_to_end(&mut tape)?;
    decode_bytes(&tape)
}
