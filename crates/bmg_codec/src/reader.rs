//! Bounds-checked little-endian primitives over a byte buffer.
//!
//! Every read takes an absolute offset and fails with
//! [`BmgError::OutOfBounds`] instead of reading past the end.

use crate::error::{BmgError, BmgResult};

/// Read a little-endian u16 at `offset`.
#[inline]
pub fn get_u16(data: &[u8], offset: usize) -> BmgResult<u16> {
    let end = offset.checked_add(2).ok_or(BmgError::OutOfBounds { offset })?;
    if end > data.len() {
        return Err(BmgError::OutOfBounds { offset });
    }
    Ok(u16::from_le_bytes([data[offset], data[offset + 1]]))
}

/// Read a little-endian u32 at `offset`.
#[inline]
pub fn get_u32(data: &[u8], offset: usize) -> BmgResult<u32> {
    let end = offset.checked_add(4).ok_or(BmgError::OutOfBounds { offset })?;
    if end > data.len() {
        return Err(BmgError::OutOfBounds { offset });
    }
    Ok(u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ]))
}

/// Overwrite four bytes at `offset` with a little-endian u32.
#[inline]
pub fn put_u32(data: &mut [u8], offset: usize, value: u32) -> BmgResult<()> {
    let end = offset.checked_add(4).ok_or(BmgError::OutOfBounds { offset })?;
    if end > data.len() {
        return Err(BmgError::OutOfBounds { offset });
    }
    data[offset..end].copy_from_slice(&value.to_le_bytes());
    Ok(())
}

/// Find the first occurrence of a four-byte ASCII section tag.
pub fn find_section(data: &[u8], tag: [u8; 4]) -> Option<usize> {
    if data.len() < 4 {
        return None;
    }
    (0..=data.len() - 4).find(|&i| data[i..i + 4] == tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian() {
        let data = [0x34, 0x12, 0x78, 0x56, 0x00, 0x01];
        assert_eq!(get_u16(&data, 0).unwrap(), 0x1234);
        assert_eq!(get_u32(&data, 0).unwrap(), 0x5678_1234);
        assert_eq!(get_u16(&data, 4).unwrap(), 0x0100);
    }

    #[test]
    fn rejects_short_reads() {
        let data = [0u8; 3];
        assert!(matches!(
            get_u32(&data, 0),
            Err(BmgError::OutOfBounds { offset: 0 })
        ));
        assert!(matches!(
            get_u16(&data, 2),
            Err(BmgError::OutOfBounds { offset: 2 })
        ));
        assert!(get_u16(&data, usize::MAX).is_err());
    }

    #[test]
    fn patches_in_place() {
        let mut data = vec![0u8; 8];
        put_u32(&mut data, 2, 0xAABB_CCDD).unwrap();
        assert_eq!(get_u32(&data, 2).unwrap(), 0xAABB_CCDD);
        assert!(put_u32(&mut data, 6, 1).is_err());
    }

    #[test]
    fn finds_first_tag_match() {
        let data = b"xxINF1yyINF1";
        assert_eq!(find_section(data, *b"INF1"), Some(2));
        assert_eq!(find_section(data, *b"DAT1"), None);
        assert_eq!(find_section(b"IN", *b"INF1"), None);
    }
}
