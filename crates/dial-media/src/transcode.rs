//! Conversion between on-media image layouts and the canonical block sequence.

use tracing::debug;

use crate::layout::{blocks_to_bytes, BYTES_PER_BLOCK};
use crate::media::{MediaKind, TapeFooter, TAPE_FOOTER_LEN};
use crate::{CanonicalImage, MediaError, Result, StorageBackend};

/// Upper bound on how much of a disk-style source image is read.
pub const MAX_SOURCE_BYTES: usize = 16 * 1024 * 1024;

/// Strips media-specific framing from `input` and validates the result.
pub fn canonicalize(input: &[u8], kind: MediaKind) -> Result<CanonicalImage> {
    if kind.is_tape() {
        return canonicalize_tape(input);
    }
    let capped = &input[..input.len().min(MAX_SOURCE_BYTES)];
    if capped.len() % BYTES_PER_BLOCK != 0 {
        return Err(MediaError::Format("truncated block read"));
    }
    CanonicalImage::from_blocks(capped.to_vec())
}

fn canonicalize_tape(input: &[u8]) -> Result<CanonicalImage> {
    if input.len() < TAPE_FOOTER_LEN {
        return Err(MediaError::Format("tape image too short for footer"));
    }
    let (body, raw_footer) = input.split_at(input.len() - TAPE_FOOTER_LEN);
    let raw_footer: &[u8; TAPE_FOOTER_LEN] = raw_footer
        .try_into()
        .map_err(|_| MediaError::Format("tape footer truncated"))?;
    let footer = TapeFooter::parse(raw_footer)?;

    if body.len() % BYTES_PER_BLOCK != 0 {
        return Err(MediaError::Format("tape data is not a whole number of blocks"));
    }
    let total_blocks = body.len() / BYTES_PER_BLOCK;
    let start = usize::from(footer.start_pad_blocks);
    let end = usize::from(footer.end_pad_blocks);
    let kept = total_blocks
        .checked_sub(start)
        .and_then(|n| n.checked_sub(end))
        .ok_or(MediaError::Format("tape padding exceeds tape length"))?;

    debug!(total_blocks, start, end, "stripping tape padding");
    let data = &body[blocks_to_bytes(start)..blocks_to_bytes(start + kept)];
    CanonicalImage::from_blocks(data.to_vec())
}

/// Writes `image` in the layout of `kind`, returning the number of bytes the output holds.
///
/// The output is grown to the media size by writing a single zero byte at its last offset, so
/// file-backed outputs stay sparse. Images larger than the media are written in full. LINCtape
/// output gets a footer with zero padding.
pub fn materialize<B: StorageBackend>(
    image: &CanonicalImage,
    kind: MediaKind,
    out: &mut B,
) -> Result<u64> {
    let media_size = kind.geometry().size_bytes();
    let data = image.as_bytes();
    out.write_at(0, data)?;

    let mut len = data.len() as u64;
    if len < media_size {
        out.write_at(media_size - 1, &[0])?;
        len = media_size;
    }

    if kind.is_tape() {
        out.write_at(len, &TapeFooter::default().to_bytes())?;
        len += TAPE_FOOTER_LEN as u64;
    }
    out.flush()?;

    let written = out.len()?;
    if written < len {
        return Err(MediaError::Length {
            region: "output image",
            expected: len as usize,
            actual: written as usize,
        });
    }
    debug!(media = %kind, bytes = len, "materialized image");
    Ok(len)
}

/// Copies a system image between media kinds, optionally clearing the index and work area.
pub fn copy_media<B: StorageBackend>(
    input: &[u8],
    from: MediaKind,
    to: MediaKind,
    preserve_index: bool,
    out: &mut B,
) -> Result<u64> {
    let mut image = canonicalize(input, from)?;
    if !preserve_index {
        image.erase_index_and_work_area();
    }
    materialize(&image, to, out)
}
