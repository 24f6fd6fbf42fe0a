use crate::{MediaError, Result};

/// Ensure `[offset, offset + len)` lies inside a buffer of `capacity` bytes.
pub fn checked_range(
    region: &'static str,
    offset: usize,
    len: usize,
    capacity: usize,
) -> Result<()> {
    let end = offset.checked_add(len).ok_or(MediaError::OffsetOverflow)?;
    if end > capacity {
        return Err(MediaError::Bounds {
            region,
            offset,
            len,
            capacity,
        });
    }
    Ok(())
}

pub fn read_le_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset], buf[offset + 1]])
}

pub fn write_le_u16(buf: &mut [u8], offset: usize, val: u16) {
    buf[offset..offset + 2].copy_from_slice(&val.to_le_bytes());
}
