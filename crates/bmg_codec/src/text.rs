//! UTF-16LE string codec for pool data.
//!
//! Strings are null-terminated runs of 16-bit little-endian units. An
//! optional leading null unit marks the run without changing its text;
//! it is preserved as a flag. Control codes (see [`crate::token`])
//! consume their fixed parameter words and render as bracket tokens;
//! everything else is literal UTF-16, with surrogate pairs reassembled
//! by the host string type.

use bytes::{BufMut, BytesMut};

use crate::diagnostics::Diagnostics;
use crate::token;

/// Cap on 16-bit units read from one string, so corrupt data cannot
/// send the decoder into a multi-megabyte walk.
pub const MAX_STRING_UNITS: usize = 10_000;

/// Result of decoding one pool string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecodedString {
    /// Display text, with control codes rendered as bracket tokens.
    pub text: String,
    /// Total encoded length in bytes, terminator and parameters
    /// included. Zero when `start` was out of range.
    pub byte_len: usize,
    /// Whether the run started with a leading null unit.
    pub leading_null: bool,
}

fn flush_units(out: &mut String, pending: &mut Vec<u16>) {
    if !pending.is_empty() {
        out.push_str(&String::from_utf16_lossy(pending));
        pending.clear();
    }
}

#[inline]
fn unit_at(data: &[u8], pos: usize) -> u16 {
    u16::from_le_bytes([data[pos], data[pos + 1]])
}

/// Decode a null-terminated UTF-16LE run starting at `start`.
///
/// `limit` is the absolute byte bound the decoder may not cross. An
/// out-of-range `start` yields an empty result rather than an error;
/// hitting `max_units` or running out of parameter bytes truncates
/// with a warning.
pub fn decode_string(
    data: &[u8],
    start: usize,
    limit: usize,
    max_units: usize,
    diags: &mut Diagnostics,
) -> DecodedString {
    let limit = limit.min(data.len());
    if start >= limit {
        return DecodedString::default();
    }

    let mut pos = start;
    let mut byte_len = 0usize;
    let mut leading_null = false;

    if pos + 2 <= limit && unit_at(data, pos) == 0 {
        leading_null = true;
        pos += 2;
        byte_len += 2;
    }

    let mut text = String::new();
    let mut pending: Vec<u16> = Vec::new();
    let mut unit_count = 0usize;

    while pos + 2 <= limit && unit_count < max_units {
        let code = unit_at(data, pos);
        pos += 2;
        byte_len += 2;
        unit_count += 1;

        if code == 0 {
            break;
        }

        if token::is_control(code) {
            flush_units(&mut text, &mut pending);
            let count = token::param_count(code).unwrap_or(0);
            if pos + count * 2 > limit {
                diags.warn(
                    format!("string at {start:#06x}"),
                    format!(
                        "control code {code:#04x} expects {count} parameter(s) but the buffer ended"
                    ),
                );
                break;
            }
            let mut params = Vec::with_capacity(count);
            for _ in 0..count {
                params.push(unit_at(data, pos));
                pos += 2;
                byte_len += 2;
            }
            text.push_str(&token::display_token(code, &params));
        } else {
            pending.push(code);
        }
    }

    if unit_count >= max_units {
        diags.warn(
            format!("string at {start:#06x}"),
            format!("exceeded the {max_units}-unit read cap; text truncated"),
        );
    }

    flush_units(&mut text, &mut pending);
    DecodedString {
        text,
        byte_len,
        leading_null,
    }
}

/// Encode display text back to its null-terminated UTF-16LE form.
///
/// Recognized bracket tokens emit their control code and parameter
/// words; malformed tokens stay literal text. A leading null unit is
/// prepended when requested, and a terminator is always appended.
pub fn encode_string(text: &str, leading_null: bool) -> Vec<u8> {
    let mut units: Vec<u16> = Vec::with_capacity(text.len() + 2);
    if leading_null {
        units.push(0);
    }

    fn push_literal(units: &mut Vec<u16>, chunk: &str) {
        units.extend(chunk.encode_utf16());
    }

    let mut cursor = 0usize;
    while let Some(m) = token::find_next(text, cursor) {
        push_literal(&mut units, &text[cursor..m.start]);
        units.push(m.code);
        units.extend_from_slice(&m.params);
        cursor = m.end;
    }
    push_literal(&mut units, &text[cursor..]);
    units.push(0);

    let mut out = BytesMut::with_capacity(units.len() * 2);
    for unit in units {
        out.put_u16_le(unit);
    }
    out.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn decode_all(bytes: &[u8]) -> DecodedString {
        let mut diags = Diagnostics::new();
        let decoded = decode_string(bytes, 0, bytes.len(), MAX_STRING_UNITS, &mut diags);
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
        decoded
    }

    #[test]
    fn decodes_plain_text() {
        let bytes = encode_string("Hi", false);
        assert_eq!(bytes, [b'H', 0, b'i', 0, 0, 0]);
        let decoded = decode_all(&bytes);
        assert_eq!(decoded.text, "Hi");
        assert_eq!(decoded.byte_len, 6);
        assert!(!decoded.leading_null);
    }

    #[test]
    fn preserves_leading_null() {
        let bytes = encode_string("x", true);
        assert_eq!(bytes, [0, 0, b'x', 0, 0, 0]);
        let decoded = decode_all(&bytes);
        assert_eq!(decoded.text, "x");
        assert!(decoded.leading_null);
        assert_eq!(decoded.byte_len, 6);
    }

    #[test]
    fn empty_string_with_leading_null_is_just_two_nulls() {
        let bytes = [0u8, 0, 0, 0];
        let decoded = decode_all(&bytes);
        assert_eq!(decoded.text, "");
        assert!(decoded.leading_null);
        assert_eq!(decoded.byte_len, 4);
    }

    #[test]
    fn control_code_consumes_parameters() {
        // 0x1A takes one parameter word.
        let bytes = [0x1A, 0x00, 0x03, 0x00, b'!', 0x00, 0x00, 0x00];
        let decoded = decode_all(&bytes);
        assert_eq!(decoded.text, "[1A:0003]!");
        assert_eq!(decoded.byte_len, 8);
    }

    #[test]
    fn two_parameter_token_round_trips() {
        let text = "a[FF:0001,BEEF]b";
        let bytes = encode_string(text, false);
        let decoded = decode_all(&bytes);
        assert_eq!(decoded.text, text);
    }

    #[test]
    fn newline_stays_literal() {
        let bytes = encode_string("a\nb", false);
        assert_eq!(bytes, [b'a', 0, 0x0A, 0, b'b', 0, 0, 0]);
        assert_eq!(decode_all(&bytes).text, "a\nb");
    }

    #[test]
    fn malformed_token_is_literal_text() {
        // Wrong parameter count: stays bracketed text on encode.
        let bytes = encode_string("[1A:0001,0002]", false);
        let decoded = decode_all(&bytes);
        assert_eq!(decoded.text, "[1A:0001,0002]");
    }

    #[test]
    fn gray_token_encodes_the_terminator_unit() {
        // GRAY is code zero, so everything after it is unreachable.
        let bytes = encode_string("a[GRAY]b", false);
        assert_eq!(bytes, [b'a', 0, 0, 0, b'b', 0, 0, 0]);
        let decoded = decode_all(&bytes);
        assert_eq!(decoded.text, "a");
        assert_eq!(decoded.byte_len, 4);
    }

    #[test]
    fn surrogate_pair_round_trips() {
        let text = "🎮 ok";
        let bytes = encode_string(text, false);
        // One astral code point = two units.
        assert_eq!(bytes.len(), (2 + 4) * 2);
        assert_eq!(decode_all(&bytes).text, text);
    }

    #[test]
    fn out_of_range_start_is_empty_not_an_error() {
        let mut diags = Diagnostics::new();
        let decoded = decode_string(&[1, 2, 3, 4], 8, 4, MAX_STRING_UNITS, &mut diags);
        assert_eq!(decoded, DecodedString::default());
        assert!(diags.is_empty());
    }

    #[test]
    fn unit_cap_truncates_with_warning() {
        // Unterminated run of 'a' units.
        let bytes = vec![b'a', 0].repeat(16);
        let mut diags = Diagnostics::new();
        let decoded = decode_string(&bytes, 0, bytes.len(), 8, &mut diags);
        assert_eq!(decoded.text, "aaaaaaaa");
        assert_eq!(decoded.byte_len, 16);
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn truncated_parameters_stop_the_read() {
        // 0xFF wants two parameter words; only one fits.
        let bytes = [0xFF, 0x00, 0x01, 0x00];
        let mut diags = Diagnostics::new();
        let decoded = decode_string(&bytes, 0, bytes.len(), MAX_STRING_UNITS, &mut diags);
        assert_eq!(decoded.text, "");
        assert_eq!(decoded.byte_len, 2);
        assert_eq!(diags.len(), 1);
    }

    proptest! {
        #[test]
        fn encode_decode_inverse(
            // Non-empty: a bare terminator is indistinguishable from a
            // leading null, so the empty string does not carry the flag.
            text in "[a-zA-Z0-9 .!?\n\u{00e9}\u{3042}]{1,40}",
            leading_null in any::<bool>(),
        ) {
            let bytes = encode_string(&text, leading_null);
            let mut diags = Diagnostics::new();
            let decoded =
                decode_string(&bytes, 0, bytes.len(), MAX_STRING_UNITS, &mut diags);
            prop_assert_eq!(decoded.text, text);
            prop_assert_eq!(decoded.leading_null, leading_null);
            prop_assert_eq!(decoded.byte_len, bytes.len());
        }
    }
}
