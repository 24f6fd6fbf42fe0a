//! Reboot bootstrap patch.
//!
//! The stock system re-bootstraps through LINCtape instructions. The patched build replaces
//! BOOTER and the surrounding system communication cells so a reboot goes through the system
//! device handler instead. The patched code is taken from a reference build, loaded as a core
//! image in which the resident I/O routines sit at [`ROUTINES_CORE_BASE`].

use tracing::debug;

use crate::layout::{words_to_bytes, BYTES_PER_BLOCK};
use crate::tape::CoreImage;
use crate::util::checked_range;
use crate::{MediaError, Result};

/// Core address of word 0 of the I/O routines region in the reference image.
pub const ROUTINES_CORE_BASE: usize = 0o7000;

/// One excerpt copied from the reference image into the routines region.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PatchFragment {
    pub name: &'static str,
    pub source_word: usize,
    pub dest_word: usize,
    pub len_words: usize,
}

pub const BOOTSTRAP_FRAGMENTS: [PatchFragment; 5] = [
    PatchFragment {
        name: "BOOTER",
        source_word: 0o7200,
        dest_word: 0o200,
        len_words: 0o100,
    },
    PatchFragment {
        name: "unit table tail",
        source_word: 0o7400,
        dest_word: 0o400,
        len_words: 0o30,
    },
    PatchFragment {
        name: "system communication (low)",
        source_word: 0o7600,
        dest_word: 0o600,
        len_words: 0o10,
    },
    PatchFragment {
        name: "mini-loader",
        source_word: 0o7610,
        dest_word: 0o610,
        len_words: 0o20,
    },
    PatchFragment {
        name: "system communication (high)",
        source_word: 0o7776,
        dest_word: 0o776,
        len_words: 2,
    },
];

/// Copies every bootstrap fragment from `reference` into `routines`.
///
/// `routines` must hold both routines blocks.
pub fn apply(routines: &mut [u8], reference: &CoreImage) -> Result<()> {
    if routines.len() < 2 * BYTES_PER_BLOCK {
        return Err(MediaError::Length {
            region: "I/O routines",
            expected: 2 * BYTES_PER_BLOCK,
            actual: routines.len(),
        });
    }

    for fragment in &BOOTSTRAP_FRAGMENTS {
        let data = reference.bytes_at(fragment.source_word, fragment.len_words)?;
        let start = words_to_bytes(fragment.dest_word);
        checked_range(fragment.name, start, data.len(), routines.len())?;
        routines[start..start + data.len()].copy_from_slice(&data);
        debug!(
            fragment = fragment.name,
            dest = fragment.dest_word,
            words = fragment.len_words,
            "applied bootstrap fragment"
        );
    }
    Ok(())
}
