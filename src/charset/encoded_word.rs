//! RFC 2047 encoded-word decoding for header text.

use super::aliases::CharsetAliases;
use super::transfer::get_mime_charset_text;
use super::{Charset, ConvertOptions, Text, TextEncoding};
use crate::error::{MessageError, Result};
use crate::parser::is_space;

/// `=?charset?encoding?payload?=`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EncodedWord<'a> {
    charset: &'a [u8],
    /// `B` or `Q`, uppercased.
    encoding: u8,
    payload: &'a [u8],
}

impl EncodedWord<'_> {
    /// Charset label without an RFC 2231 `*language` suffix.
    fn charset_label(&self) -> &[u8] {
        match self.charset.iter().position(|&b| b == b'*') {
            Some(star) => &self.charset[..star],
            None => self.charset,
        }
    }

    fn decode(&self, aliases: &CharsetAliases) -> Result<Text> {
        let charset = Some(Charset::Label(self.charset_label()));
        if self.encoding == b'Q' {
            // `_` is an escaped space; spell it `=20` so trailing ones survive
            let mut payload = Vec::with_capacity(self.payload.len());
            for &b in self.payload {
                match b {
                    b'_' => payload.extend_from_slice(b"=20"),
                    _ => payload.push(b),
                }
            }
            get_mime_charset_text(&payload, charset, Some(&b"QUOTED-PRINTABLE"[..]), aliases)
        } else {
            get_mime_charset_text(self.payload, charset, Some(&b"BASE64"[..]), aliases)
        }
    }
}

/// Parse an encoded word at the start of `s`, returning it and its length.
fn encoded_word(s: &[u8]) -> Option<(EncodedWord<'_>, usize)> {
    let rest = s.strip_prefix(b"=?")?;

    let charset_len = token_len(rest);
    if charset_len == 0 || rest.get(charset_len) != Some(&b'?') {
        return None;
    }
    let charset = &rest[..charset_len];

    let rest = &rest[charset_len + 1..];
    let encoding = match rest {
        [e @ (b'B' | b'b' | b'Q' | b'q'), b'?', ..] => e.to_ascii_uppercase(),
        _ => return None,
    };

    let rest = &rest[2..];
    let payload_len = token_len(rest);
    if payload_len == 0 || !rest[payload_len..].starts_with(b"?=") {
        return None;
    }

    let word = EncodedWord {
        charset,
        encoding,
        payload: &rest[..payload_len],
    };
    let len = 2 + charset_len + 1 + 2 + payload_len + 2;
    Some((word, len))
}

fn token_len(s: &[u8]) -> usize {
    s.iter()
        .position(|&b| b == b'?' || is_space(b))
        .unwrap_or(s.len())
}

#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a [u8]),
    Word(EncodedWord<'a>),
}

/// Split header text into literal spans and encoded words. Whitespace
/// between two adjacent encoded words is dropped.
fn segments(input: &[u8]) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;

    while i < input.len() {
        let Some((word, len)) = input[i..]
            .starts_with(b"=?")
            .then(|| encoded_word(&input[i..]))
            .flatten()
        else {
            i += 1;
            continue;
        };

        if literal_start < i {
            out.push(Segment::Literal(&input[literal_start..i]));
        }
        out.push(Segment::Word(word));
        i += len;

        loop {
            let next = i + input[i..].iter().take_while(|&&b| is_space(b)).count();
            if next == i {
                break;
            }
            match encoded_word(&input[next..]) {
                Some((word, len)) => {
                    out.push(Segment::Word(word));
                    i = next + len;
                }
                None => break,
            }
        }
        literal_start = i;
    }

    if literal_start < input.len() {
        out.push(Segment::Literal(&input[literal_start..]));
    }
    out
}

/// Decoded piece of header text.
enum Piece<'a> {
    Literal(&'a [u8]),
    Decoded(Text),
}

/// Decode every RFC 2047 encoded word in `input`.
///
/// With a `target` charset, the whole result is converted to it. Without
/// one, the result takes the encoding of the first decoded word that is
/// not pure ASCII and the rest is converted to match; text with no such
/// word stays binary. Literal text outside encoded words is read as UTF-8
/// when it has to be converted.
pub fn decode_mime_encoded_words(
    input: &[u8],
    target: Option<Charset<'_>>,
    aliases: &CharsetAliases,
    options: &ConvertOptions,
) -> Result<Text> {
    let target = target.map(|charset| charset.resolve(aliases)).transpose()?;

    let pieces = segments(input)
        .into_iter()
        .map(|segment| match segment {
            Segment::Literal(bytes) => Ok(Piece::Literal(bytes)),
            Segment::Word(word) => word.decode(aliases).map(Piece::Decoded),
        })
        .collect::<Result<Vec<_>>>()?;

    let output = target.or_else(|| {
        pieces.iter().find_map(|piece| match piece {
            Piece::Decoded(text) if !text.is_ascii() => Some(text.encoding()),
            _ => None,
        })
    });

    match output.map(|encoding| encoding.output_encoding()) {
        None | Some(TextEncoding::Binary) => {
            let mut bytes = Vec::with_capacity(input.len());
            for piece in &pieces {
                match piece {
                    Piece::Literal(literal) => bytes.extend_from_slice(literal),
                    Piece::Decoded(text) => bytes.extend_from_slice(text.as_bytes()),
                }
            }
            Ok(Text::binary(bytes))
        }
        Some(encoding) => {
            let mut unicode = String::with_capacity(input.len());
            for piece in &pieces {
                match piece {
                    Piece::Literal(literal) => unicode.push_str(
                        std::str::from_utf8(literal)
                            .map_err(|_| MessageError::InvalidEncoding("UTF-8".into()))?,
                    ),
                    Piece::Decoded(text) => {
                        unicode.push_str(&text.encoding().decode_strict(text.as_bytes())?)
                    }
                }
            }
            Text::encode(&unicode, encoding, options)
        }
    }
}
