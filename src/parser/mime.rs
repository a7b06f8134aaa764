//! MIME structure: parameter lists, content type/disposition/language and multipart bodies.

use memchr::memmem;

use super::phrase::unquote_phrase;
use super::{is_space, trim, trim_start};
use crate::model::content::{ContentDisposition, ContentType, ParamMap};

/// Parse `name=value` pairs separated by `;`.
///
/// Values are bare tokens or quoted-strings (unquoted). Empty segments such
/// as `;;` and a trailing `;` are skipped, and so is anything that is not a
/// `name=value` pair.
pub fn parse_parameters(text: &[u8]) -> ParamMap {
    let mut params = ParamMap::new();
    let mut pos = 0;

    while pos < text.len() {
        if is_space(text[pos]) || text[pos] == b';' {
            pos += 1;
            continue;
        }

        let name_start = pos;
        while pos < text.len() && !is_space(text[pos]) && !matches!(text[pos], b'=' | b';') {
            pos += 1;
        }
        let name = &text[name_start..pos];

        let mut eq = pos;
        while eq < text.len() && is_space(text[eq]) {
            eq += 1;
        }
        if name.is_empty() || text.get(eq) != Some(&b'=') {
            // Not a pair: resume after the stray name (or the stray `=`).
            pos = pos.max(name_start + 1);
            continue;
        }

        let mut value_start = eq + 1;
        while value_start < text.len() && is_space(text[value_start]) {
            value_start += 1;
        }

        let (value, end) = match quoted_value(text, value_start) {
            Some((quoted, end)) => (unquote_phrase(quoted), end),
            None => {
                let end = token_end(text, value_start);
                (text[value_start..end].to_vec(), end)
            }
        };
        if end > value_start {
            params.insert(name, value);
        }
        pos = end;
    }

    params
}

fn token_end(text: &[u8], start: usize) -> usize {
    text[start..]
        .iter()
        .position(|&b| is_space(b) || b == b';')
        .map_or(text.len(), |i| start + i)
}

/// A quoted-string starting at `start`, including its quotes, and the
/// offset just past it. Only accepted when it ends the value.
fn quoted_value(text: &[u8], start: usize) -> Option<(&[u8], usize)> {
    if text.get(start) != Some(&b'"') {
        return None;
    }
    let mut i = start + 1;
    while i < text.len() {
        match text[i] {
            b'\\' => i += 2,
            b'"' => {
                let end = i + 1;
                let ends_value = text.get(end).map_or(true, |&b| is_space(b) || b == b';');
                return ends_value.then_some((&text[start..end], end));
            }
            _ => i += 1,
        }
    }
    None
}

/// Split `type; params` at the first `;`.
///
/// The leading token is trimmed; it is `None` when the input has no
/// leading token at all. Parameters are parsed either way, so
/// `; filename=a.txt` gives `(None, {filename})`.
pub fn split_parameters(text: &[u8]) -> (Option<&[u8]>, ParamMap) {
    let (head, params) = match text.iter().position(|&b| b == b';') {
        Some(i) => (&text[..i], parse_parameters(&text[i + 1..])),
        None => (text, ParamMap::new()),
    };
    let head = trim(head);
    if head.is_empty() {
        (None, params)
    } else {
        (Some(head), params)
    }
}

/// Parse a `Content-Type` value, defaulting to `application/octet-stream`.
///
/// Parameters are kept even when the media type itself falls back to the
/// default.
pub fn parse_content_type(text: &[u8]) -> ContentType {
    let (media_type, parameters) = split_parameters(text);
    let Some(media_type) = media_type else {
        return ContentType::octet_stream(parameters);
    };
    let Some(slash) = media_type.iter().position(|&b| b == b'/') else {
        return ContentType::octet_stream(parameters);
    };

    let main_type = trim(&media_type[..slash]);
    let sub_type = trim(&media_type[slash + 1..]);
    if main_type.is_empty() || sub_type.is_empty() {
        return ContentType::octet_stream(parameters);
    }

    ContentType {
        main_type: main_type.to_vec(),
        sub_type: sub_type.to_vec(),
        parameters,
    }
}

/// Parse a `Content-Disposition` value.
pub fn parse_content_disposition(text: &[u8]) -> ContentDisposition {
    let (disposition_type, parameters) = split_parameters(text);
    ContentDisposition {
        disposition_type: disposition_type.map(<[u8]>::to_vec),
        parameters,
    }
}

/// Parse a comma-separated `Content-Language` value into trimmed, non-empty tags.
pub fn parse_content_language(text: &[u8]) -> Vec<&[u8]> {
    text.split(|&b| b == b',')
        .map(trim)
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Split a multipart body into its parts.
///
/// The epilogue after `--boundary--` and the preamble before the first
/// `--boundary` are discarded. A missing terminator is tolerated; a
/// missing first delimiter yields no parts. Each part loses its leading
/// whitespace and one trailing line ending.
pub fn parse_multipart_body<'a>(boundary: &[u8], body: &'a [u8]) -> Vec<&'a [u8]> {
    let mut delim = Vec::with_capacity(boundary.len() + 4);
    delim.extend_from_slice(b"--");
    delim.extend_from_slice(boundary);
    let mut term = delim.clone();
    term.extend_from_slice(b"--");

    let body = match memmem::find(body, &term) {
        Some(i) => &body[..i],
        None => body,
    };

    let mut delimiters = memmem::find_iter(body, &delim);
    let Some(first) = delimiters.next() else {
        return Vec::new();
    };
    let mut start = first + delim.len();
    if start == body.len() {
        return Vec::new();
    }

    let mut parts = Vec::new();
    for i in delimiters {
        parts.push(chomp_part(&body[start..i]));
        start = i + delim.len();
    }
    parts.push(chomp_part(&body[start..]));
    parts
}

fn chomp_part(piece: &[u8]) -> &[u8] {
    let piece = trim_start(piece);
    let piece = piece.strip_suffix(b"\n").unwrap_or(piece);
    piece.strip_suffix(b"\r").unwrap_or(piece)
}
