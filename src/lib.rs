//! `rfc822-model` — a lazily parsed, read-only model of RFC 822 / MIME messages.
//!
//! A [`Message`] wraps raw message bytes and exposes header fields, content
//! metadata, multipart structure, addresses and dates. Every property is
//! parsed on first access and cached. Header and body text can be decoded
//! (RFC 2047 encoded words, base64, quoted-printable) into [`Text`]: bytes
//! tagged with the charset they are known to be valid in.

pub mod charset;
pub mod config;
pub mod error;
pub mod model;
pub mod parser;

pub use charset::aliases::{default_aliases, CharsetAliases};
pub use charset::{Charset, ConvertOptions, Text, TextEncoding};
pub use error::{MessageError, Result};
pub use model::address::{Address, AddressField};
pub use model::content::{ContentDisposition, ContentType, ParamMap, Parameter};
pub use model::header::{Body, Header};
pub use model::message::Message;
