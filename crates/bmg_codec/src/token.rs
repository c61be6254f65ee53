//! Display-token grammar for in-band control codes.
//!
//! Control codes embedded in string data are rendered as bracketed
//! tokens: `[1A:0003]` for a code with parameters, `[05]` for a bare
//! code, or a named form like `[WAIT]` for a handful of well-known
//! codes. Each code has a fixed parameter count; a token whose
//! parameter list does not match is not an error, it is left in the
//! text as a literal, mirroring the decoder's leniency about truncated
//! trailing data.
//!
//! Newline (`0x000A`) is reserved: it is always a literal line break,
//! never a bracket token.

/// Longest bracket label the scanner will consider.
const MAX_LABEL_LEN: usize = 64;

/// Fixed parameter-word count for codes that take parameters.
pub fn param_count(code: u16) -> Option<usize> {
    match code {
        0x1A => Some(1),
        0xFF => Some(2),
        _ => None,
    }
}

/// Display name for well-known codes.
///
/// `GRAY` shares code `0x0000` with the string terminator: the decoder
/// can never produce `[GRAY]`, and encoding one ends the string at the
/// token, dropping whatever follows.
pub fn token_name(code: u16) -> Option<&'static str> {
    match code {
        0x06 => Some("WAIT"),
        0x07 => Some("CLEAR"),
        0x00 => Some("GRAY"),
        0x01 => Some("RED"),
        0x02 => Some("WHITE"),
        _ => None,
    }
}

fn code_for_name(name: &str) -> Option<u16> {
    match name {
        "WAIT" => Some(0x06),
        "CLEAR" => Some(0x07),
        "GRAY" => Some(0x00),
        "RED" => Some(0x01),
        "WHITE" => Some(0x02),
        _ => None,
    }
}

/// Whether a decoded 16-bit unit is treated as a control code.
///
/// Covers the parameterized codes, the named codes, and the remaining
/// C0 range, except newline, which stays literal text.
pub fn is_control(code: u16) -> bool {
    if code == 0 || code == 0x0A {
        return false;
    }
    param_count(code).is_some() || token_name(code).is_some() || code < 32
}

/// Render a control code and its parameters as a display token.
pub fn display_token(code: u16, params: &[u16]) -> String {
    let head = match token_name(code) {
        Some(name) => name.to_string(),
        None => format!("{code:02X}"),
    };
    if params.is_empty() {
        return format!("[{head}]");
    }
    let tail = params
        .iter()
        .map(|p| format!("{p:04X}"))
        .collect::<Vec<_>>()
        .join(",");
    format!("[{head}:{tail}]")
}

/// Parse a bracket label (without the brackets) back to a control code.
///
/// Returns `None` when the label is not a recognized token or its
/// parameter count does not match the code's fixed count; callers fall
/// back to treating the bracketed text as literal. Note that `GRAY`
/// parses to the terminator unit; see [`token_name`].
pub fn parse_token(label: &str) -> Option<(u16, Vec<u16>)> {
    let upper = label.to_ascii_uppercase();
    if let Some(code) = code_for_name(&upper) {
        // Named tokens carry no parameters.
        return Some((code, Vec::new()));
    }
    let mut parts = upper.splitn(2, ':');
    let head = parts.next()?;
    if head.len() != 2 || !head.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let code = u16::from_str_radix(head, 16).ok()?;
    if !is_control(code) {
        return None;
    }
    let expected = param_count(code).unwrap_or(0);
    let params = match parts.next() {
        None => Vec::new(),
        Some(tail) => {
            let mut params = Vec::new();
            for chunk in tail.split(',') {
                if chunk.len() != 4 || !chunk.bytes().all(|b| b.is_ascii_hexdigit()) {
                    return None;
                }
                params.push(u16::from_str_radix(chunk, 16).ok()?);
            }
            params
        }
    };
    if params.len() != expected {
        return None;
    }
    Some((code, params))
}

/// A recognized token found while scanning display text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TokenMatch {
    /// Byte offset of the opening bracket.
    pub start: usize,
    /// Byte offset one past the closing bracket.
    pub end: usize,
    pub code: u16,
    pub params: Vec<u16>,
}

/// Find the next recognized token at or after byte offset `from`.
///
/// Unrecognized bracketed runs are skipped and stay literal.
pub(crate) fn find_next(text: &str, mut from: usize) -> Option<TokenMatch> {
    while from < text.len() {
        let open = from + text[from..].find('[')?;
        match text[open + 1..].find(']') {
            Some(rel) if rel <= MAX_LABEL_LEN => {
                let close = open + 1 + rel;
                if let Some((code, params)) = parse_token(&text[open + 1..close]) {
                    return Some(TokenMatch {
                        start: open,
                        end: close + 1,
                        code,
                        params,
                    });
                }
                from = open + 1;
            }
            _ => from = open + 1,
        }
    }
    None
}
