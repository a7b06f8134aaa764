//! The message model: a lazily parsed, memoizing view over raw message bytes.
//!
//! Every derived property is computed on first access and cached on the
//! instance. Caches use `OnceCell` / `RefCell`, so a `Message` can be moved
//! between threads but not shared by them; wrap it in a lock if it has to be.

use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::charset::aliases::{default_aliases, CharsetAliases};
use crate::charset::encoded_word::decode_mime_encoded_words;
use crate::charset::transfer::get_mime_charset_text;
use crate::charset::{Charset, CharsetKey, ConvertOptions, Text, TextEncoding};
use crate::error::Result;
use crate::model::address::{Address, AddressField};
use crate::model::content::{ContentDisposition, ContentType, ParamMap};
use crate::model::header::{Body, Header};
use crate::parser::address::parse_mail_address_list;
use crate::parser::header::{parse_date, split_message};
use crate::parser::mime::{
    parse_content_disposition, parse_content_language, parse_content_type, parse_multipart_body,
};

type AddressList = Option<Vec<Address>>;

/// One cache slot per address-bearing header field.
#[derive(Debug, Default)]
struct AddressSlots {
    from: OnceCell<AddressList>,
    sender: OnceCell<AddressList>,
    reply_to: OnceCell<AddressList>,
    to: OnceCell<AddressList>,
    cc: OnceCell<AddressList>,
    bcc: OnceCell<AddressList>,
}

impl AddressSlots {
    fn slot(&self, field: AddressField) -> &OnceCell<AddressList> {
        match field {
            AddressField::From => &self.from,
            AddressField::Sender => &self.sender,
            AddressField::ReplyTo => &self.reply_to,
            AddressField::To => &self.to,
            AddressField::Cc => &self.cc,
            AddressField::Bcc => &self.bcc,
        }
    }
}

type HeaderKey = (Vec<u8>, CharsetKey);

/// Decoded-text caches, keyed by requested target charset.
#[derive(Debug, Default)]
struct TextCaches {
    header: RefCell<HashMap<HeaderKey, Option<Text>>>,
    header_list: RefCell<HashMap<HeaderKey, Option<Vec<Text>>>>,
    header_text: RefCell<HashMap<CharsetKey, Text>>,
    body: RefCell<HashMap<CharsetKey, Text>>,
}

/// An RFC 822 / MIME message.
///
/// ```
/// use rfc822_model::Message;
///
/// let msg = Message::new(&b"Content-Type: text/plain; charset=utf-8\r\n\r\nHello\r\n"[..]);
/// assert!(msg.is_text());
/// assert_eq!(msg.charset(), Some(&b"utf-8"[..]));
/// assert_eq!(msg.mime_charset_body_text(None).unwrap().to_str(), "Hello\r\n");
/// ```
#[derive(Debug)]
pub struct Message {
    raw_source: Vec<u8>,
    aliases: Arc<CharsetAliases>,
    split: OnceCell<(Header, Body)>,
    content_type: OnceCell<ContentType>,
    content_disposition: OnceCell<Option<ContentDisposition>>,
    content_language: OnceCell<Option<Vec<Vec<u8>>>>,
    parts: OnceCell<Option<Vec<Message>>>,
    message: OnceCell<Option<Box<Message>>>,
    date: OnceCell<Option<DateTime<Utc>>>,
    addresses: AddressSlots,
    texts: TextCaches,
}

impl Message {
    /// Wrap raw message bytes, resolving charsets through the default alias table.
    pub fn new(raw_source: impl Into<Vec<u8>>) -> Self {
        Self::with_charset_aliases(raw_source, default_aliases())
    }

    /// Wrap raw message bytes with a caller-supplied alias table. Parts and
    /// embedded messages share the same table.
    pub fn with_charset_aliases(raw_source: impl Into<Vec<u8>>, aliases: Arc<CharsetAliases>) -> Self {
        Self {
            raw_source: raw_source.into(),
            aliases,
            split: OnceCell::new(),
            content_type: OnceCell::new(),
            content_disposition: OnceCell::new(),
            content_language: OnceCell::new(),
            parts: OnceCell::new(),
            message: OnceCell::new(),
            date: OnceCell::new(),
            addresses: AddressSlots::default(),
            texts: TextCaches::default(),
        }
    }

    pub fn raw_source(&self) -> &[u8] {
        &self.raw_source
    }

    pub fn charset_aliases(&self) -> &Arc<CharsetAliases> {
        &self.aliases
    }

    fn split(&self) -> &(Header, Body) {
        self.split.get_or_init(|| {
            let (header, body) = split_message(&self.raw_source);
            (Header::new(header.unwrap_or_default()), Body::new(body))
        })
    }

    pub fn header(&self) -> &Header {
        &self.split().0
    }

    pub fn body(&self) -> &Body {
        &self.split().1
    }

    // ─── Content type ───

    fn content_type_parsed(&self) -> &ContentType {
        self.content_type.get_or_init(|| {
            parse_content_type(self.header().get("content-type").unwrap_or_default())
        })
    }

    pub fn media_main_type(&self) -> &[u8] {
        &self.content_type_parsed().main_type
    }

    pub fn media_sub_type(&self) -> &[u8] {
        &self.content_type_parsed().sub_type
    }

    pub fn media_main_type_upcase(&self) -> Vec<u8> {
        self.media_main_type().to_ascii_uppercase()
    }

    pub fn media_sub_type_upcase(&self) -> Vec<u8> {
        self.media_sub_type().to_ascii_uppercase()
    }

    /// `main/sub` as written in the header.
    pub fn content_type(&self) -> Vec<u8> {
        self.content_type_parsed().mime_type()
    }

    pub fn content_type_upcase(&self) -> Vec<u8> {
        self.content_type().to_ascii_uppercase()
    }

    pub fn content_type_parameter(&self, name: impl AsRef<[u8]>) -> Option<&[u8]> {
        self.content_type_parsed().parameters.get(name)
    }

    pub fn content_type_parameters(&self) -> &ParamMap {
        &self.content_type_parsed().parameters
    }

    pub fn charset(&self) -> Option<&[u8]> {
        self.content_type_parameter("charset")
    }

    pub fn boundary(&self) -> Option<&[u8]> {
        self.content_type_parameter("boundary")
    }

    pub fn is_text(&self) -> bool {
        self.content_type_parsed().is_main_type("text")
    }

    pub fn is_multipart(&self) -> bool {
        self.content_type_parsed().is_main_type("multipart")
    }

    pub fn is_message(&self) -> bool {
        self.content_type_parsed().is_main_type("message")
    }

    // ─── Content disposition / language ───

    fn content_disposition_parsed(&self) -> Option<&ContentDisposition> {
        self.content_disposition
            .get_or_init(|| {
                self.header()
                    .get("content-disposition")
                    .map(parse_content_disposition)
            })
            .as_ref()
    }

    /// Disposition type, `None` when the header is absent.
    pub fn content_disposition(&self) -> Option<&[u8]> {
        self.content_disposition_parsed()?
            .disposition_type
            .as_deref()
    }

    pub fn content_disposition_upcase(&self) -> Option<Vec<u8>> {
        self.content_disposition().map(<[u8]>::to_ascii_uppercase)
    }

    pub fn content_disposition_parameter(&self, name: impl AsRef<[u8]>) -> Option<&[u8]> {
        self.content_disposition_parsed()?.parameters.get(name)
    }

    pub fn content_disposition_parameters(&self) -> Option<&ParamMap> {
        self.content_disposition_parsed().map(|cd| &cd.parameters)
    }

    /// Language tags from every `Content-Language` field, `None` when absent.
    pub fn content_language(&self) -> Option<&[Vec<u8>]> {
        self.content_language
            .get_or_init(|| {
                let values = self.header().field_value_list("content-language")?;
                Some(
                    values
                        .into_iter()
                        .flat_map(parse_content_language)
                        .map(<[u8]>::to_vec)
                        .collect(),
                )
            })
            .as_deref()
    }

    pub fn content_language_upcase(&self) -> Option<Vec<Vec<u8>>> {
        self.content_language()
            .map(|tags| tags.iter().map(|tag| tag.to_ascii_uppercase()).collect())
    }

    // ─── Structure ───

    /// Body parts of a multipart message; `None` for any other type.
    ///
    /// A multipart message without a `boundary` parameter has no parts.
    pub fn parts(&self) -> Option<&[Message]> {
        self.parts
            .get_or_init(|| {
                if !self.is_multipart() {
                    return None;
                }
                let Some(boundary) = self.boundary() else {
                    debug!("Multipart message has no boundary");
                    return Some(Vec::new());
                };
                let parts: Vec<Message> = parse_multipart_body(boundary, self.body().raw_source())
                    .into_iter()
                    .map(|part| Message::with_charset_aliases(part, Arc::clone(&self.aliases)))
                    .collect();
                debug!(count = parts.len(), "Materialized multipart parts");
                Some(parts)
            })
            .as_deref()
    }

    /// The embedded message of a `message/*` body; `None` for any other type.
    pub fn message(&self) -> Option<&Message> {
        self.message
            .get_or_init(|| {
                self.is_message().then(|| {
                    Box::new(Message::with_charset_aliases(
                        self.body().raw_source(),
                        Arc::clone(&self.aliases),
                    ))
                })
            })
            .as_deref()
    }

    // ─── Date and addresses ───

    /// The `Date` header as a timestamp, or the Unix epoch when it cannot
    /// be parsed. `None` when the header is absent.
    pub fn date(&self) -> Option<DateTime<Utc>> {
        *self.date.get_or_init(|| {
            let value = self.header().get("date")?;
            Some(parse_date(&String::from_utf8_lossy(value)).unwrap_or(DateTime::UNIX_EPOCH))
        })
    }

    /// Addresses from every occurrence of the field, flattened; `None` when absent.
    pub fn address_field(&self, field: AddressField) -> Option<&[Address]> {
        self.addresses
            .slot(field)
            .get_or_init(|| {
                let values = self.header().field_value_list(field.header_name())?;
                Some(values.into_iter().flat_map(parse_mail_address_list).collect())
            })
            .as_deref()
    }

    pub fn from(&self) -> Option<&[Address]> {
        self.address_field(AddressField::From)
    }

    pub fn sender(&self) -> Option<&[Address]> {
        self.address_field(AddressField::Sender)
    }

    pub fn reply_to(&self) -> Option<&[Address]> {
        self.address_field(AddressField::ReplyTo)
    }

    pub fn to(&self) -> Option<&[Address]> {
        self.address_field(AddressField::To)
    }

    pub fn cc(&self) -> Option<&[Address]> {
        self.address_field(AddressField::Cc)
    }

    pub fn bcc(&self) -> Option<&[Address]> {
        self.address_field(AddressField::Bcc)
    }

    // ─── Decoded text ───

    /// First value of the named field with RFC 2047 encoded words decoded.
    ///
    /// `Ok(None)` when the field is absent. Successful results are cached
    /// per field name and charset; errors are not.
    pub fn mime_decoded_header(
        &self,
        name: impl AsRef<[u8]>,
        charset: Option<Charset<'_>>,
        options: &ConvertOptions,
    ) -> Result<Option<Text>> {
        let name = name.as_ref();
        let key = (name.to_ascii_lowercase(), CharsetKey::of(charset.as_ref()));
        if let Some(cached) = self.texts.header.borrow().get(&key) {
            return Ok(cached.clone());
        }

        let decoded = self
            .header()
            .get(name)
            .map(|value| decode_mime_encoded_words(value, charset, &self.aliases, options))
            .transpose()?;
        self.texts.header.borrow_mut().insert(key, decoded.clone());
        Ok(decoded)
    }

    /// Every value of the named field, each decoded as in [`Message::mime_decoded_header`].
    pub fn mime_decoded_header_field_value_list(
        &self,
        name: impl AsRef<[u8]>,
        charset: Option<Charset<'_>>,
        options: &ConvertOptions,
    ) -> Result<Option<Vec<Text>>> {
        let name = name.as_ref();
        let key = (name.to_ascii_lowercase(), CharsetKey::of(charset.as_ref()));
        if let Some(cached) = self.texts.header_list.borrow().get(&key) {
            return Ok(cached.clone());
        }

        let decoded = self
            .header()
            .field_value_list(name)
            .map(|values| {
                values
                    .into_iter()
                    .map(|value| decode_mime_encoded_words(value, charset, &self.aliases, options))
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?;
        self.texts
            .header_list
            .borrow_mut()
            .insert(key, decoded.clone());
        Ok(decoded)
    }

    /// The whole raw header block with encoded words decoded.
    pub fn mime_decoded_header_text(
        &self,
        charset: Option<Charset<'_>>,
        options: &ConvertOptions,
    ) -> Result<Text> {
        let key = CharsetKey::of(charset.as_ref());
        if let Some(cached) = self.texts.header_text.borrow().get(&key) {
            return Ok(cached.clone());
        }

        let decoded =
            decode_mime_encoded_words(self.header().raw_source(), charset, &self.aliases, options)?;
        self.texts
            .header_text
            .borrow_mut()
            .insert(key, decoded.clone());
        Ok(decoded)
    }

    /// The transfer-decoded body interpreted under a charset.
    ///
    /// Without an explicit charset, `text/*` bodies use their `charset`
    /// parameter (binary if there is none) and every other type is binary.
    pub fn mime_charset_body_text(&self, charset: Option<Charset<'_>>) -> Result<Text> {
        let key = CharsetKey::of(charset.as_ref());
        if let Some(cached) = self.texts.body.borrow().get(&key) {
            return Ok(cached.clone());
        }

        let charset = match charset {
            Some(charset) => Some(charset),
            None if self.is_text() => self.charset().map(Charset::Label),
            None => Some(Charset::Resolved(TextEncoding::Binary)),
        };
        let text = get_mime_charset_text(
            self.body().raw_source(),
            charset,
            self.header().get("content-transfer-encoding"),
            &self.aliases,
        )?;
        self.texts.body.borrow_mut().insert(key, text.clone());
        Ok(text)
    }

    /// The transfer-decoded body as binary.
    pub fn mime_binary_body_string(&self) -> Result<Text> {
        self.mime_charset_body_text(Some(Charset::Resolved(TextEncoding::Binary)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MessageError;
    use encoding_rs::ISO_2022_JP;

    fn b(s: &str) -> Option<&[u8]> {
        Some(s.as_bytes())
    }

    fn msg(s: &str) -> Message {
        Message::new(s.as_bytes())
    }

    const SIMPLE_MAIL: &str = "To: foo@nonet.org\r\n\
        From: bar@nonet.org\r\n\
        Subject: test\r\n\
        MIME-Version: 1.0\r\n\
        Content-Type: text/plain; charset=us-ascii\r\n\
        Content-Transfer-Encoding: 7bit\r\n\
        Date: Fri, 8 Nov 2013 06:47:50 +0900 (JST)\r\n\
        \r\n\
        Hello world.\r\n";

    const MULTIPART_MAIL: &str = "To: foo@nonet.org\r\n\
        From: bar@nonet.org\r\n\
        Subject: multipart test\r\n\
        MIME-Version: 1.0\r\n\
        Date: Fri, 8 Nov 2013 19:31:03 +0900\r\n\
        Content-Type: multipart/mixed; boundary=\"1383.905529.351297\"\r\n\
        \r\n\
        --1383.905529.351297\r\n\
        Content-Type: text/plain; charset=us-ascii\r\n\
        \r\n\
        Multipart test.\r\n\
        --1383.905529.351297\r\n\
        Content-Type: application/octet-stream\r\n\
        Content-Disposition: attachment; filename=\"hello.bin\"\r\n\
        \r\n\
        Hello world.\r\n\
        --1383.905529.351297\r\n\
        Content-Type: message/rfc822\r\n\
        \r\n\
        To: bar@nonet.org\r\n\
        From: foo@nonet.org\r\n\
        Subject: inner mail\r\n\
        Content-Type: text/plain; charset=utf-8\r\n\
        \r\n\
        Inner.\r\n\
        --1383.905529.351297--\r\n";

    #[test]
    fn test_header_and_body() {
        let m = msg(SIMPLE_MAIL);
        assert_eq!(m.header().get("subject"), Some(&b"test"[..]));
        assert_eq!(m.header().get("SUBJECT"), Some(&b"test"[..]));
        assert_eq!(m.body().raw_source(), b"Hello world.\r\n");
        assert!(m.header().raw_source().ends_with(b"\r\n\r\n"));
    }

    #[test]
    fn test_no_header() {
        let m = msg("Hello world.\r\n");
        assert!(m.header().is_empty());
        assert_eq!(m.header().raw_source(), b"");
        assert_eq!(m.body().raw_source(), b"Hello world.\r\n");
        assert_eq!(m.content_type(), b"application/octet-stream");
    }

    #[test]
    fn test_content_type() {
        let m = msg(SIMPLE_MAIL);
        assert_eq!(m.media_main_type(), b"text");
        assert_eq!(m.media_sub_type(), b"plain");
        assert_eq!(m.content_type(), b"text/plain");
        assert_eq!(m.media_main_type_upcase(), b"TEXT");
        assert_eq!(m.media_sub_type_upcase(), b"PLAIN");
        assert_eq!(m.content_type_upcase(), b"TEXT/PLAIN");
        assert_eq!(m.charset(), Some(&b"us-ascii"[..]));
        assert_eq!(m.content_type_parameter("CHARSET"), Some(&b"us-ascii"[..]));
        assert_eq!(m.boundary(), None);
        assert_eq!(m.content_type_parameters().len(), 1);
        assert!(m.is_text());
        assert!(!m.is_multipart());
        assert!(!m.is_message());
    }

    #[test]
    fn test_content_disposition_and_language() {
        let m = msg(
            "Content-Type: text/plain\r\n\
             Content-Disposition: Attachment; Filename=\"a.txt\"\r\n\
             Content-Language: en, ja\r\n\
             Content-Language: fr\r\n\r\nbody",
        );
        assert_eq!(m.content_disposition(), Some(&b"Attachment"[..]));
        assert_eq!(m.content_disposition_upcase(), Some(b"ATTACHMENT".to_vec()));
        assert_eq!(m.content_disposition_parameter("filename"), Some(&b"a.txt"[..]));
        assert_eq!(m.content_disposition_parameters().map(ParamMap::len), Some(1));
        assert_eq!(
            m.content_language(),
            Some(&[b"en".to_vec(), b"ja".to_vec(), b"fr".to_vec()][..])
        );
        assert_eq!(
            m.content_language_upcase(),
            Some(vec![b"EN".to_vec(), b"JA".to_vec(), b"FR".to_vec()])
        );

        let plain = msg(SIMPLE_MAIL);
        assert_eq!(plain.content_disposition(), None);
        assert_eq!(plain.content_disposition_parameter("filename"), None);
        assert!(plain.content_disposition_parameters().is_none());
        assert_eq!(plain.content_language(), None);
    }

    #[test]
    fn test_multipart() {
        let m = msg(MULTIPART_MAIL);
        assert!(m.is_multipart());
        assert!(m.message().is_none());

        let parts = m.parts().unwrap();
        assert_eq!(parts.len(), 3);

        assert_eq!(parts[0].content_type(), b"text/plain");
        assert_eq!(parts[0].body().raw_source(), b"Multipart test.");

        assert_eq!(parts[1].content_type(), b"application/octet-stream");
        assert_eq!(parts[1].content_disposition_parameter("filename"), Some(&b"hello.bin"[..]));
        assert_eq!(parts[1].body().raw_source(), b"Hello world.");

        assert!(parts[2].is_message());
        let inner = parts[2].message().unwrap();
        assert_eq!(inner.header().get("subject"), Some(&b"inner mail"[..]));
        assert_eq!(inner.mime_charset_body_text(None).unwrap().to_str(), "Inner.");
    }

    #[test]
    fn test_parts_are_cached() {
        let m = msg(MULTIPART_MAIL);
        let first = m.parts().unwrap().as_ptr();
        let second = m.parts().unwrap().as_ptr();
        assert_eq!(first, second);
    }

    #[test]
    fn test_multipart_without_boundary() {
        let m = msg("Content-Type: multipart/mixed\r\n\r\n--x\r\nA\r\n--x--\r\n");
        assert_eq!(m.parts().map(<[Message]>::len), Some(0));

        let plain = msg(SIMPLE_MAIL);
        assert!(plain.parts().is_none());
    }

    #[test]
    fn test_children_share_aliases() {
        let mut aliases = CharsetAliases::new();
        aliases.add_alias("x-custom", TextEncoding::UTF_8);
        let m = Message::with_charset_aliases(MULTIPART_MAIL.as_bytes(), Arc::new(aliases));
        let parts = m.parts().unwrap();
        for part in parts {
            assert!(Arc::ptr_eq(part.charset_aliases(), m.charset_aliases()));
        }
        let inner = parts[2].message().unwrap();
        assert!(Arc::ptr_eq(inner.charset_aliases(), m.charset_aliases()));
    }

    #[test]
    fn test_date() {
        let m = msg(MULTIPART_MAIL);
        let date = m.date().unwrap();
        assert_eq!(date.format("%Y-%m-%d %H:%M:%S").to_string(), "2013-11-08 10:31:03");

        let bad = msg("Date: no_date\r\n\r\n");
        assert_eq!(bad.date(), Some(DateTime::UNIX_EPOCH));

        let none = msg("Subject: x\r\n\r\n");
        assert_eq!(none.date(), None);
    }

    #[test]
    fn test_address_fields() {
        let m = msg(
            "From: Foo <foo@mail.example.com>\r\n\
             Sender: foo@mail.example.com\r\n\
             Reply-To: foo@mail.example.com\r\n\
             To: alice@mail.example.com, Bob <bob@mail.example.com>\r\n\
             To: Carol <carol@mail.example.com>\r\n\
             Cc: team: dave@mail.example.com;\r\n\
             \r\nbody",
        );
        assert_eq!(
            m.from(),
            Some(&[Address::new(b("Foo"), None, b("foo"), b("mail.example.com"))][..])
        );
        assert_eq!(m.sender().map(<[Address]>::len), Some(1));
        assert_eq!(m.reply_to().map(<[Address]>::len), Some(1));
        assert_eq!(
            m.to(),
            Some(
                &[
                    Address::new(None, None, b("alice"), b("mail.example.com")),
                    Address::new(b("Bob"), None, b("bob"), b("mail.example.com")),
                    Address::new(b("Carol"), None, b("carol"), b("mail.example.com")),
                ][..]
            )
        );
        assert_eq!(
            m.cc(),
            Some(
                &[
                    Address::group_start(b"team".to_vec()),
                    Address::new(None, None, b("dave"), b("mail.example.com")),
                    Address::group_end(),
                ][..]
            )
        );
        assert_eq!(m.bcc(), None);
    }

    #[test]
    fn test_mime_decoded_header() {
        let m = msg(
            "Subject: =?ISO-2022-JP?B?GyRCJDMkcyRLJEEkTxsoQg==?=\r\n\
             X-Test: =?UTF-8?B?44GT44KT?=\r\n\
             X-Test: plain\r\n\
             \r\nbody",
        );

        let subject = m
            .mime_decoded_header("subject", None, &ConvertOptions::strict())
            .unwrap()
            .unwrap();
        assert_eq!(subject.encoding(), TextEncoding::Standard(ISO_2022_JP));
        assert_eq!(subject.to_str(), "\u{3053}\u{3093}\u{306B}\u{3061}\u{306F}");

        let utf8 = m
            .mime_decoded_header("Subject", Some(Charset::from("utf-8")), &ConvertOptions::strict())
            .unwrap()
            .unwrap();
        assert_eq!(utf8.encoding(), TextEncoding::UTF_8);
        assert_eq!(utf8.as_bytes(), "\u{3053}\u{3093}\u{306B}\u{3061}\u{306F}".as_bytes());

        let list = m
            .mime_decoded_header_field_value_list("x-test", None, &ConvertOptions::strict())
            .unwrap()
            .unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].to_str(), "\u{3053}\u{3093}");
        assert_eq!(list[1].as_bytes(), b"plain");

        assert_eq!(
            m.mime_decoded_header("x-none", None, &ConvertOptions::strict()),
            Ok(None)
        );
        assert_eq!(
            m.mime_decoded_header_field_value_list("x-none", None, &ConvertOptions::strict()),
            Ok(None)
        );
    }

    #[test]
    fn test_mime_decoded_header_text() {
        let m = msg("Subject: =?UTF-8?B?44GT44KT?=\r\nTo: foo@nonet.org\r\n\r\nbody");
        let text = m
            .mime_decoded_header_text(None, &ConvertOptions::strict())
            .unwrap();
        assert_eq!(text.to_str(), "Subject: \u{3053}\u{3093}\r\nTo: foo@nonet.org\r\n\r\n");
    }

    #[test]
    fn test_mime_decoded_header_errors_are_not_cached() {
        let m = msg("Subject: =?UTF-8?B?pLOk86TLpMGkzw==?=\r\n\r\nbody");
        for _ in 0..2 {
            let err = m
                .mime_decoded_header("subject", None, &ConvertOptions::strict())
                .unwrap_err();
            assert_eq!(err, MessageError::InvalidEncoding("UTF-8".into()));
        }
        assert_eq!(m.header().get("subject").map(<[u8]>::len), Some(28));
    }

    #[test]
    fn test_mime_charset_body_text() {
        let m = msg(
            "Content-Type: text/plain; charset=utf-8\r\n\
             Content-Transfer-Encoding: base64\r\n\
             \r\n\
             44GT44KT44Gr44Gh44GvDQo=\r\n",
        );
        let text = m.mime_charset_body_text(None).unwrap();
        assert_eq!(text.encoding(), TextEncoding::UTF_8);
        assert_eq!(text.to_str(), "\u{3053}\u{3093}\u{306B}\u{3061}\u{306F}\r\n");

        let binary = m.mime_binary_body_string().unwrap();
        assert_eq!(binary.encoding(), TextEncoding::Binary);
        assert_eq!(binary.as_bytes(), text.as_bytes());
    }

    #[test]
    fn test_mime_charset_body_text_defaults() {
        let attachment = Message::new(&b"Content-Type: application/octet-stream\r\n\r\n\xff"[..]);
        assert_eq!(
            attachment.mime_charset_body_text(None).unwrap().encoding(),
            TextEncoding::Binary
        );

        let no_charset = msg("Content-Type: text/plain\r\n\r\nHello");
        assert_eq!(
            no_charset.mime_charset_body_text(None).unwrap().encoding(),
            TextEncoding::Binary
        );

        let ascii = msg(SIMPLE_MAIL);
        assert_eq!(
            ascii.mime_charset_body_text(None).unwrap().encoding(),
            TextEncoding::Ascii
        );
    }

    #[test]
    fn test_mime_charset_body_text_errors() {
        let unknown = msg("Content-Type: text/plain; charset=x-nothing\r\n\r\nHello");
        assert_eq!(
            unknown.mime_charset_body_text(None),
            Err(MessageError::UnknownCharset("x-nothing".into()))
        );
        assert!(unknown.mime_binary_body_string().is_ok());

        let invalid = Message::new(&b"Content-Type: text/plain; charset=utf-8\r\n\r\n\xA4\xB3"[..]);
        assert_eq!(
            invalid.mime_charset_body_text(None),
            Err(MessageError::InvalidEncoding("UTF-8".into()))
        );
        let euc = invalid
            .mime_charset_body_text(Some(Charset::from("euc-jp")))
            .unwrap();
        assert_eq!(euc.to_str(), "\u{3053}");
    }

    #[test]
    fn test_idempotent_parsing() {
        let a = msg(MULTIPART_MAIL);
        let b = msg(MULTIPART_MAIL);
        assert_eq!(a.content_type(), b.content_type());
        assert_eq!(a.parts().unwrap().len(), b.parts().unwrap().len());
        assert_eq!(a.from(), b.from());
        assert_eq!(a.date(), b.date());
    }
}
