//! Structural parsers: phrase unquoting, header splitting and folding, MIME
//! parameters, multipart bodies and address lists.
//!
//! Every function here is pure and byte-oriented. None of them interpret a
//! charset and none of them fail: malformed input yields fewer results or
//! defaults.

pub mod address;
pub mod header;
pub mod mime;
pub mod phrase;

/// Whitespace as understood by the RFC 822 grammars (`\s`): space, tab,
/// CR, LF, vertical tab and form feed.
pub(crate) fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | 0x0b | 0x0c)
}

pub(crate) fn trim_start(s: &[u8]) -> &[u8] {
    let start = s.iter().position(|&b| !is_space(b)).unwrap_or(s.len());
    &s[start..]
}

pub(crate) fn trim_end(s: &[u8]) -> &[u8] {
    let end = s.iter().rposition(|&b| !is_space(b)).map_or(0, |i| i + 1);
    &s[..end]
}

pub(crate) fn trim(s: &[u8]) -> &[u8] {
    trim_end(trim_start(s))
}
