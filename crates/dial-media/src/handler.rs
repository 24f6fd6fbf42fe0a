//! Device handler sub-images and the two handler slots of a handler block.

use tracing::debug;

use crate::layout::words_to_bytes;
use crate::tape::{self, CoreImage, CORE_IMAGE_BYTES};
use crate::util::checked_range;
use crate::{MediaError, Result};

/// Handler length in words.
pub const HANDLER_WORDS: usize = 0o150;
pub const HANDLER_LEN: usize = words_to_bytes(HANDLER_WORDS);

/// Word offset at which a handler is assembled in its loader tape / core image.
pub const HANDLER_LOAD_WORD: usize = 0o230;

/// Handler slot inside a handler block.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum HandlerSlot {
    /// Word 0o230; holds the system (LINCtape by default) handler.
    Primary,
    /// Word 0o30; holds the handler for the target media.
    Secondary,
}

impl HandlerSlot {
    pub const fn word_offset(self) -> usize {
        match self {
            Self::Primary => 0o230,
            Self::Secondary => 0o30,
        }
    }

    pub const fn byte_range(self) -> std::ops::Range<usize> {
        let start = words_to_bytes(self.word_offset());
        start..start + HANDLER_LEN
    }
}

/// A 0o150-word handler image.
#[derive(Clone, PartialEq, Eq)]
pub struct Handler {
    bytes: [u8; HANDLER_LEN],
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handler").finish_non_exhaustive()
    }
}

impl TryFrom<&[u8]> for Handler {
    type Error = MediaError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; HANDLER_LEN] = bytes.try_into().map_err(|_| MediaError::Length {
            region: "handler",
            expected: HANDLER_LEN,
            actual: bytes.len(),
        })?;
        Ok(Self { bytes })
    }
}

impl Handler {
    /// Takes the handler window out of a decoded core image.
    pub fn from_core(core: &CoreImage) -> Self {
        let mut bytes = [0u8; HANDLER_LEN];
        for (idx, pair) in bytes.chunks_exact_mut(2).enumerate() {
            pair.copy_from_slice(&core.word(HANDLER_LOAD_WORD + idx).to_le_bytes());
        }
        Self { bytes }
    }

    /// Takes the handler window out of a flat core dump.
    ///
    /// Dumps that end before the window does are a length error.
    pub fn from_core_dump(dump: &[u8]) -> Result<Self> {
        let start = words_to_bytes(HANDLER_LOAD_WORD);
        let window = dump.get(start..start + HANDLER_LEN).ok_or(MediaError::Length {
            region: "handler",
            expected: HANDLER_LEN,
            actual: dump.len().saturating_sub(start).min(HANDLER_LEN),
        })?;
        Self::try_from(window)
    }

    /// Decodes a loader tape and takes the handler window out of it.
    pub fn from_tape(tape_bytes: &[u8]) -> Result<Self> {
        Ok(Self::from_core(&tape::decode_bytes(tape_bytes)?))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// How a handler file is encoded.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum HandlerEncoding {
    /// Binary loader tape.
    Tape,
    /// Flat 8 KiB core dump.
    CoreDump,
}

impl HandlerEncoding {
    pub fn load(self, bytes: &[u8]) -> Result<Handler> {
        match self {
            Self::Tape => Handler::from_tape(bytes),
            Self::CoreDump => {
                if bytes.len() > CORE_IMAGE_BYTES {
                    debug!(len = bytes.len(), "core dump longer than one field");
                }
                Handler::from_core_dump(bytes)
            }
        }
    }
}

/// Overwrites `slot` of a handler block with `handler_bytes`, which must be exactly one
/// handler long.
pub fn write_handler(
    handler_block: &mut [u8],
    handler_bytes: &[u8],
    slot: HandlerSlot,
) -> Result<()> {
    if handler_bytes.len() != HANDLER_LEN {
        return Err(MediaError::Length {
            region: "handler",
            expected: HANDLER_LEN,
            actual: handler_bytes.len(),
        });
    }
    let range = slot.byte_range();
    checked_range("handler block", range.start, HANDLER_LEN, handler_block.len())?;
    handler_block[range].copy_from_slice(handler_bytes);
    debug!(?slot, word = slot.word_offset(), "installed handler");
    Ok(())
}

/// Reads the handler currently installed in `slot`.
pub fn read_handler(handler_block: &[u8], slot: HandlerSlot) -> Result<Handler> {
    let range = slot.byte_range();
    checked_range("handler block", range.start, HANDLER_LEN, handler_block.len())?;
    Handler::try_from(&handler_block[range])
}

/// Installs the primary and/or secondary handler.
pub fn write_handlers(
    handler_block: &mut [u8],
    primary: Option<&Handler>,
    secondary: Option<&Handler>,
) -> Result<()> {
    if let Some(handler) = primary {
        write_handler(handler_block, handler.as_bytes(), HandlerSlot::Primary)?;
    }
    if let Some(handler) = secondary {
        write_handler(handler_block, handler.as_bytes(), HandlerSlot::Secondary)?;
    }
    Ok(())
}
