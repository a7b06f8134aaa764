//! Transfer decoding (base64, quoted-printable) and charset interpretation.

use std::borrow::Cow;

use base64::alphabet;
use base64::engine::general_purpose::GeneralPurpose;
use base64::engine::{DecodePaddingMode, GeneralPurposeConfig};
use base64::Engine;
use quoted_printable::ParseMode;
use tracing::warn;

use super::aliases::CharsetAliases;
use super::{Charset, Text};
use crate::error::Result;

/// Base64 engine tolerant of missing padding and non-zero trailing bits.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// A `Content-Transfer-Encoding`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    Base64,
    QuotedPrintable,
    /// `7bit`, `8bit`, `binary`, absent or unknown.
    Identity,
}

impl TransferEncoding {
    /// Case-insensitive lookup; anything unrecognised is the identity.
    pub fn from_name(name: Option<&[u8]>) -> Self {
        let Some(name) = name.map(<[u8]>::trim_ascii) else {
            return TransferEncoding::Identity;
        };
        if name.eq_ignore_ascii_case(b"base64") {
            TransferEncoding::Base64
        } else if name.eq_ignore_ascii_case(b"quoted-printable") {
            TransferEncoding::QuotedPrintable
        } else {
            TransferEncoding::Identity
        }
    }

    /// Undo this transfer encoding. Never fails: malformed input decodes
    /// as far as possible.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Cow<'a, [u8]> {
        match self {
            TransferEncoding::Base64 => Cow::Owned(decode_base64(bytes)),
            TransferEncoding::QuotedPrintable => decode_quoted_printable(bytes),
            TransferEncoding::Identity => Cow::Borrowed(bytes),
        }
    }
}

/// Decode base64 the lenient way mail readers do: bytes outside the
/// alphabet are skipped and decoding stops at the first `=`.
fn decode_base64(bytes: &[u8]) -> Vec<u8> {
    let mut clean: Vec<u8> = bytes
        .iter()
        .copied()
        .take_while(|&b| b != b'=')
        .filter(|&b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/')
        .collect();
    if clean.len() % 4 == 1 {
        clean.pop();
    }

    LENIENT_BASE64.decode(&clean).unwrap_or_else(|err| {
        warn!(error = %err, "Could not decode base64 payload");
        Vec::new()
    })
}

/// Decode quoted-printable with RFC 2045 robust handling: malformed
/// escapes pass through and bytes outside the QP alphabet are dropped.
fn decode_quoted_printable(bytes: &[u8]) -> Cow<'_, [u8]> {
    match quoted_printable::decode(bytes, ParseMode::Robust) {
        Ok(decoded) => Cow::Owned(decoded),
        Err(err) => {
            warn!(error = %err, "Could not decode quoted-printable payload");
            Cow::Borrowed(bytes)
        }
    }
}

/// Undo the named transfer encoding (`BASE64`, `QUOTED-PRINTABLE`, or identity).
pub fn decode_transfer<'a>(bytes: &'a [u8], transfer_encoding: Option<&[u8]>) -> Cow<'a, [u8]> {
    TransferEncoding::from_name(transfer_encoding).decode(bytes)
}

/// Tag bytes with a charset.
///
/// Without a charset the bytes are binary. A label is resolved through
/// `aliases` and then the registry (`UnknownCharset` if neither knows it),
/// and the bytes must be well-formed in the result (`InvalidEncoding`).
pub fn interpret_as_charset(
    bytes: Vec<u8>,
    charset: Option<Charset<'_>>,
    aliases: &CharsetAliases,
) -> Result<Text> {
    match charset {
        None => Ok(Text::binary(bytes)),
        Some(charset) => Text::new(bytes, charset.resolve(aliases)?),
    }
}

/// Transfer-decode then interpret under a charset.
pub fn get_mime_charset_text(
    bytes: &[u8],
    charset: Option<Charset<'_>>,
    transfer_encoding: Option<&[u8]>,
    aliases: &CharsetAliases,
) -> Result<Text> {
    let decoded = decode_transfer(bytes, transfer_encoding).into_owned();
    interpret_as_charset(decoded, charset, aliases)
}
