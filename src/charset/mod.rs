//! Charset handling: encodings, encoding-tagged text and conversion.
//!
//! Every [`Text`] produced by this crate carries the encoding it was
//! validated against, so converting it is always lossless on the decode
//! side. Only the encode side can fail, when the target encoding has no
//! representation for a character.

pub mod aliases;
pub mod encoded_word;
pub mod transfer;

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

use encoding_rs::{EncoderResult, Encoding, UTF_8};

use crate::error::{MessageError, Result};

/// A text encoding a byte string can be tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// Uninterpreted bytes.
    Binary,
    /// Strict 7-bit US-ASCII.
    Ascii,
    /// Any encoding known to the WHATWG registry.
    Standard(&'static Encoding),
}

impl TextEncoding {
    pub const UTF_8: TextEncoding = TextEncoding::Standard(UTF_8);

    /// Resolve a charset label through the encoding registry.
    ///
    /// Labels are matched case-insensitively with surrounding whitespace
    /// ignored. `binary` and `ascii-8bit` name [`TextEncoding::Binary`].
    pub fn for_label(label: &[u8]) -> Option<TextEncoding> {
        let label = label.trim_ascii();
        if label.eq_ignore_ascii_case(b"binary") || label.eq_ignore_ascii_case(b"ascii-8bit") {
            return Some(TextEncoding::Binary);
        }
        Encoding::for_label_no_replacement(label).map(TextEncoding::Standard)
    }

    /// Canonical name of the encoding.
    pub fn name(&self) -> &'static str {
        match self {
            TextEncoding::Binary => "BINARY",
            TextEncoding::Ascii => "US-ASCII",
            TextEncoding::Standard(encoding) => encoding.name(),
        }
    }

    /// Whether ASCII bytes mean ASCII characters in this encoding.
    pub fn is_ascii_compatible(&self) -> bool {
        match self {
            TextEncoding::Binary | TextEncoding::Ascii => true,
            TextEncoding::Standard(encoding) => encoding.is_ascii_compatible(),
        }
    }

    /// The encoding text converted into `self` is actually written in.
    ///
    /// UTF-16 can only be decoded, so conversions into it produce UTF-8.
    pub fn output_encoding(&self) -> TextEncoding {
        match self {
            TextEncoding::Standard(encoding) => TextEncoding::Standard(encoding.output_encoding()),
            other => *other,
        }
    }

    /// Check that `bytes` are well-formed in this encoding.
    pub fn validate(&self, bytes: &[u8]) -> Result<()> {
        let valid = match self {
            TextEncoding::Binary => true,
            TextEncoding::Ascii => bytes.is_ascii(),
            TextEncoding::Standard(encoding) => encoding
                .decode_without_bom_handling_and_without_replacement(bytes)
                .is_some(),
        };
        if valid {
            Ok(())
        } else {
            Err(MessageError::InvalidEncoding(self.name().to_string()))
        }
    }

    /// Decode to Unicode, substituting U+FFFD for malformed sequences.
    ///
    /// Binary bytes are read as UTF-8.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Cow<'a, str> {
        match self {
            TextEncoding::Binary | TextEncoding::Ascii => String::from_utf8_lossy(bytes),
            TextEncoding::Standard(encoding) => encoding.decode_without_bom_handling(bytes).0,
        }
    }

    /// Decode to Unicode, failing on malformed input.
    pub fn decode_strict<'a>(&self, bytes: &'a [u8]) -> Result<Cow<'a, str>> {
        let decoded = match self {
            TextEncoding::Binary => std::str::from_utf8(bytes).ok().map(Cow::Borrowed),
            TextEncoding::Ascii => bytes
                .is_ascii()
                .then(|| String::from_utf8_lossy(bytes)),
            TextEncoding::Standard(encoding) => {
                encoding.decode_without_bom_handling_and_without_replacement(bytes)
            }
        };
        decoded.ok_or_else(|| MessageError::InvalidEncoding(self.name().to_string()))
    }

    /// Encode Unicode text into this encoding's output encoding.
    pub fn encode(&self, text: &str, options: &ConvertOptions) -> Result<Vec<u8>> {
        match self.output_encoding() {
            TextEncoding::Binary => Ok(text.as_bytes().to_vec()),
            TextEncoding::Ascii => encode_ascii(text, options),
            TextEncoding::Standard(encoding) if encoding == UTF_8 => Ok(text.as_bytes().to_vec()),
            TextEncoding::Standard(encoding) => encode_with(encoding, text, options),
        }
    }
}

impl Hash for TextEncoding {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn encode_ascii(text: &str, options: &ConvertOptions) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_ascii() {
            out.push(ch as u8);
            continue;
        }
        match options.replacement.as_deref() {
            Some(replacement) if replacement.is_ascii() => out.extend_from_slice(replacement.as_bytes()),
            _ => {
                return Err(MessageError::UndefinedConversion {
                    ch,
                    encoding: TextEncoding::Ascii.name().to_string(),
                })
            }
        }
    }
    Ok(out)
}

fn encode_with(encoding: &'static Encoding, text: &str, options: &ConvertOptions) -> Result<Vec<u8>> {
    let mut encoder = encoding.new_encoder();
    let mut out = Vec::with_capacity(text.len() + 16);
    let mut src = text;

    loop {
        let needed = encoder
            .max_buffer_length_from_utf8_without_replacement(src.len())
            .unwrap_or(src.len() * 4 + 16);
        out.reserve(needed);

        let (result, read) = encoder.encode_from_utf8_to_vec_without_replacement(src, &mut out, true);
        src = &src[read..];

        match result {
            EncoderResult::InputEmpty => return Ok(out),
            EncoderResult::OutputFull => continue,
            EncoderResult::Unmappable(ch) => {
                let undefined = || MessageError::UndefinedConversion {
                    ch,
                    encoding: encoding.name().to_string(),
                };
                let replacement = options.replacement.as_deref().ok_or_else(undefined)?;
                let mut rest = replacement;
                loop {
                    let needed = encoder
                        .max_buffer_length_from_utf8_without_replacement(rest.len())
                        .unwrap_or(rest.len() * 4 + 16);
                    out.reserve(needed);
                    let (result, read) =
                        encoder.encode_from_utf8_to_vec_without_replacement(rest, &mut out, false);
                    rest = &rest[read..];
                    match result {
                        EncoderResult::InputEmpty => break,
                        EncoderResult::OutputFull => continue,
                        EncoderResult::Unmappable(_) => return Err(undefined()),
                    }
                }
            }
        }
    }
}

/// How conversions treat characters the target encoding cannot represent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Substitute for unmappable characters. `None` makes them an error.
    pub replacement: Option<String>,
}

impl ConvertOptions {
    /// Fail on unmappable characters.
    pub fn strict() -> Self {
        Self::default()
    }

    /// Replace unmappable characters with `?`.
    pub fn lossy() -> Self {
        Self::with_replacement("?")
    }

    pub fn with_replacement(replacement: impl Into<String>) -> Self {
        Self {
            replacement: Some(replacement.into()),
        }
    }
}

/// Bytes tagged with the encoding they were validated against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Text {
    bytes: Vec<u8>,
    encoding: TextEncoding,
}

impl Text {
    /// Tag `bytes` as uninterpreted binary.
    pub fn binary(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            encoding: TextEncoding::Binary,
        }
    }

    /// Tag `bytes` with `encoding` after checking they are well-formed.
    pub fn new(bytes: impl Into<Vec<u8>>, encoding: TextEncoding) -> Result<Self> {
        let bytes = bytes.into();
        encoding.validate(&bytes)?;
        Ok(Self { bytes, encoding })
    }

    /// Encode `text` into `encoding`. The result is tagged with the
    /// encoding actually written (see [`TextEncoding::output_encoding`]).
    pub fn encode(text: &str, encoding: TextEncoding, options: &ConvertOptions) -> Result<Self> {
        Ok(Self {
            bytes: encoding.encode(text, options)?,
            encoding: encoding.output_encoding(),
        })
    }

    pub(crate) fn new_unchecked(bytes: Vec<u8>, encoding: TextEncoding) -> Self {
        Self { bytes, encoding }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether every byte is ASCII. Binary text counts only if its
    /// bytes happen to be 7-bit.
    pub fn is_ascii(&self) -> bool {
        self.encoding.is_ascii_compatible() && self.bytes.is_ascii()
    }

    /// Unicode view of the text. Lossy only for binary content that is
    /// not valid UTF-8.
    pub fn to_str(&self) -> Cow<'_, str> {
        self.encoding.decode(&self.bytes)
    }

    /// Convert into `target`.
    ///
    /// Binary text is read as UTF-8 and fails with `InvalidEncoding` if it
    /// is not. Pure ASCII text is relabelled without re-encoding when the
    /// target is ASCII-compatible.
    pub fn encode_to(&self, target: TextEncoding, options: &ConvertOptions) -> Result<Text> {
        let target = target.output_encoding();
        if target == self.encoding || target == TextEncoding::Binary {
            return Ok(Text::new_unchecked(self.bytes.clone(), target));
        }
        if self.is_ascii() && target.is_ascii_compatible() {
            return Ok(Text::new_unchecked(self.bytes.clone(), target));
        }
        let unicode = self.encoding.decode_strict(&self.bytes)?;
        Text::encode(&unicode, target, options)
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_str())
    }
}

/// A charset argument: either a label to resolve or an encoding already resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset<'a> {
    Label(&'a [u8]),
    Resolved(TextEncoding),
}

impl<'a> From<&'a str> for Charset<'a> {
    fn from(label: &'a str) -> Self {
        Charset::Label(label.as_bytes())
    }
}

impl<'a> From<&'a String> for Charset<'a> {
    fn from(label: &'a String) -> Self {
        Charset::Label(label.as_bytes())
    }
}

impl<'a> From<&'a [u8]> for Charset<'a> {
    fn from(label: &'a [u8]) -> Self {
        Charset::Label(label)
    }
}

impl From<TextEncoding> for Charset<'_> {
    fn from(encoding: TextEncoding) -> Self {
        Charset::Resolved(encoding)
    }
}

impl Charset<'_> {
    /// Resolve through `aliases` first, then through the encoding registry.
    pub fn resolve(&self, aliases: &aliases::CharsetAliases) -> Result<TextEncoding> {
        match self {
            Charset::Resolved(encoding) => Ok(*encoding),
            Charset::Label(label) => aliases
                .resolve(label)
                .ok_or_else(|| MessageError::unknown_charset(label)),
        }
    }

    pub(crate) fn cache_key(&self) -> CharsetKey {
        match self {
            Charset::Label(label) => CharsetKey::Label(label.to_ascii_lowercase()),
            Charset::Resolved(encoding) => CharsetKey::Encoding(*encoding),
        }
    }
}

/// Cache key for per-charset decoded text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum CharsetKey {
    Default,
    Label(Vec<u8>),
    Encoding(TextEncoding),
}

impl CharsetKey {
    pub(crate) fn of(charset: Option<&Charset<'_>>) -> Self {
        charset.map_or(CharsetKey::Default, Charset::cache_key)
    }
}
