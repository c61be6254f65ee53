//! Synthetic containers shared by the unit tests.

use crate::parser::ENCODING_UTF16_LE;
use crate::text::encode_string;

pub fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Two 12-byte entries ("Hi" and "Yo" with a leading null), a pool with
/// one unreferenced string ("Hey"), and optionally a one-cell
/// pointer-mode index referencing that string with its flag bit set.
pub fn fixture(with_index: bool) -> Vec<u8> {
    let s0 = encode_string("Hi", false);
    let s1 = encode_string("Yo", true);
    let s2 = encode_string("Hey", false);
    let off1 = s0.len() as u32;
    let off2 = (s0.len() + s1.len()) as u32;
    // Two trailing zero bytes keep the pool 4-byte aligned.
    let pool_content_len = s0.len() + s1.len() + s2.len() + 2;

    let mut out = Vec::new();
    out.extend_from_slice(b"MESGbmg1");
    push_u32(&mut out, 0); // file size, patched below
    push_u32(&mut out, if with_index { 3 } else { 2 });
    out.push(ENCODING_UTF16_LE);
    out.extend_from_slice(&[0u8; 15]);
    assert_eq!(out.len(), 32);

    // Entry table: 4 header bytes after count/size, then two rows.
    out.extend_from_slice(b"INF1");
    push_u32(&mut out, 8 + 4 + 2 * 12);
    push_u16(&mut out, 2); // count
    push_u16(&mut out, 12); // entry size
    for (ids, offset) in [((1u16, 0u16, 0x11u16, 0x22u16), 0u32), ((2, 1, 0x33, 0x44), off1)] {
        push_u16(&mut out, ids.0);
        push_u16(&mut out, ids.1);
        push_u16(&mut out, ids.2);
        push_u16(&mut out, ids.3);
        push_u32(&mut out, offset);
    }

    out.extend_from_slice(b"DAT1");
    push_u32(&mut out, pool_content_len as u32 + 8);
    out.extend_from_slice(&s0);
    out.extend_from_slice(&s1);
    out.extend_from_slice(&s2);
    out.extend_from_slice(&[0u8; 2]);

    if with_index {
        out.extend_from_slice(b"MID1");
        // Full section length: tag, size, sub-header, one 4-byte row.
        push_u32(&mut out, 16 + 4);
        push_u16(&mut out, 1); // declared count
        push_u16(&mut out, 4); // row stride
        push_u32(&mut out, 0); // reserved
        push_u32(&mut out, off2 | 1); // pointer with flag bit
    }

    let total = out.len() as u32;
    out[8..12].copy_from_slice(&total.to_le_bytes());
    out
}
