//! The system unit table: three-word entries describing each logical unit.
//!
//! Entries come from comma-separated spec files with three octal fields per row. The packed
//! table ends with a `7777` terminator, and the table's last word always holds `7775`, which
//! the patched BOOTER routine relies on.

use tracing::{debug, warn};

use crate::layout::{words_to_bytes, BYTES_PER_WORD, UNIT_TABLE_WORDS};
use crate::util::write_le_u16;
use crate::{MediaError, Result};

pub const UNIT_TABLE_LEN: usize = words_to_bytes(UNIT_TABLE_WORDS.end - UNIT_TABLE_WORDS.start);
pub const ENTRY_LEN: usize = 3 * BYTES_PER_WORD;

pub const TABLE_TERMINATOR: u16 = 0o7777;
pub const REBOOT_MARKER: u16 = 0o7775;
/// Word offset of [`REBOOT_MARKER`] relative to the table start.
pub const REBOOT_MARKER_WORD: usize = 0o77;

/// One unit table entry.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct UnitEntry(pub [u16; 3]);

/// Rows parsed from one spec file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnitSpecSource {
    pub name: String,
    pub rows: Vec<UnitEntry>,
}

impl UnitSpecSource {
    /// Parses comma-separated rows of octal numbers. Blank lines are skipped; extra fields past
    /// the third are ignored.
    pub fn parse(name: impl Into<String>, text: &str) -> Result<Self> {
        let name = name.into();
        let mut rows = Vec::new();
        for (row, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            rows.push(parse_row(&name, row, line)?);
        }
        Ok(Self { name, rows })
    }
}

fn parse_row(source_name: &str, row: usize, line: &str) -> Result<UnitEntry> {
    let row_err = |reason: String| MediaError::RowFormat {
        source_name: source_name.to_string(),
        row,
        reason,
    };

    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() < 3 {
        return Err(row_err(format!("expected 3 fields, found {}", fields.len())));
    }

    let mut words = [0u16; 3];
    for (word, field) in words.iter_mut().zip(&fields) {
        *word = u16::from_str_radix(field, 8)
            .map_err(|e| row_err(format!("'{field}' is not an octal word: {e}")))?;
    }
    Ok(UnitEntry(words))
}

/// Concatenates sources in order. Empty sources are reported but allowed.
pub fn concat_sources(sources: &[UnitSpecSource]) -> Vec<UnitEntry> {
    let mut rows = Vec::new();
    for source in sources {
        if source.rows.is_empty() {
            warn!(source = %source.name, "unit spec contributed no entries");
        }
        rows.extend_from_slice(&source.rows);
    }
    rows
}

/// Packs `rows` into `table` and returns the bytes used by entries plus terminator.
///
/// `table` is normally the 64-word table region. Nothing outside it is written: an entry or
/// terminator that would cross its end is a bounds error.
pub fn build(table: &mut [u8], rows: &[UnitEntry]) -> Result<usize> {
    let overflow = |offset: usize, len: usize, capacity: usize| MediaError::Bounds {
        region: "unit table (too many unit entries)",
        offset,
        len,
        capacity,
    };

    let mut cursor = 0usize;
    for UnitEntry(words) in rows {
        if cursor + ENTRY_LEN > table.len() {
            return Err(overflow(cursor, ENTRY_LEN, table.len()));
        }
        for (idx, word) in words.iter().enumerate() {
            write_le_u16(table, cursor + idx * BYTES_PER_WORD, *word);
        }
        cursor += ENTRY_LEN;
    }

    if cursor + BYTES_PER_WORD > table.len() {
        return Err(overflow(cursor, BYTES_PER_WORD, table.len()));
    }
    write_le_u16(table, cursor, TABLE_TERMINATOR);

    let marker = words_to_bytes(REBOOT_MARKER_WORD);
    if marker + BYTES_PER_WORD > table.len() {
        return Err(overflow(marker, BYTES_PER_WORD, table.len()));
    }
    write_le_u16(table, marker, REBOOT_MARKER);

    debug!(entries = rows.len(), bytes = cursor + BYTES_PER_WORD, "built unit table");
    Ok(cursor + BYTES_PER_WORD)
}

/// Clears `table`, then packs the concatenation of `sources` into it.
pub fn rebuild(table: &mut [u8], sources: &[UnitSpecSource]) -> Result<usize> {
    let rows = concat_sources(sources);
    let mut fresh = vec![0u8; table.len()];
    let written = build(&mut fresh, &rows)?;
    table.copy_from_slice(&fresh);
    Ok(written)
}
