//! Integration tests for the message model against `.eml` fixtures.

use std::path::Path;
use std::sync::Arc;

use encoding_rs::{ISO_2022_JP, SHIFT_JIS, WINDOWS_1252};
use rfc822_model::charset::encoded_word::decode_mime_encoded_words;
use rfc822_model::{
    default_aliases, Address, Charset, CharsetAliases, ConvertOptions, Message, MessageError,
    TextEncoding,
};

fn fixture(name: &str) -> Message {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    Message::new(std::fs::read(path).unwrap())
}

fn b(s: &str) -> Option<&[u8]> {
    Some(s.as_bytes())
}

// ─── Test 1: Simple message headers ─────────────────────────────────

#[test]
fn test_simple_headers() {
    let msg = fixture("simple.eml");
    assert_eq!(msg.header().get("Subject"), Some(&b"Lunch on Friday"[..]));
    assert_eq!(msg.header().get("message-id"), Some(&b"<msg001@example.com>"[..]));
    assert_eq!(msg.header().len(), 9);
    assert_eq!(msg.header().keys().next(), Some(&b"return-path"[..]));
    assert_eq!(msg.content_type(), b"text/plain");
    assert_eq!(msg.charset(), Some(&b"utf-8"[..]));
    assert!(msg.parts().is_none());
    assert!(msg.message().is_none());
}

// ─── Test 2: Quoted-printable body with soft line break ─────────────

#[test]
fn test_simple_quoted_printable_body() {
    let msg = fixture("simple.eml");
    let text = msg.mime_charset_body_text(None).unwrap();
    assert_eq!(text.encoding(), TextEncoding::UTF_8);
    assert_eq!(
        text.to_str(),
        "Hi Bob,\r\n\r\nCaf\u{E9} at noon? The place on the corner.\r\n\r\n-- Alice\r\n"
    );

    let raw = msg.mime_binary_body_string().unwrap();
    assert_eq!(raw.encoding(), TextEncoding::Binary);
    assert_eq!(raw.as_bytes(), text.as_bytes());
}

// ─── Test 3: Date normalized to UTC ─────────────────────────────────

#[test]
fn test_simple_date() {
    let msg = fixture("simple.eml");
    let date = msg.date().unwrap();
    assert_eq!(date.to_rfc3339(), "2014-07-01T10:34:56+00:00");
}

// ─── Test 4: Nested multipart structure ─────────────────────────────

#[test]
fn test_multipart_structure() {
    let msg = fixture("multipart.eml");
    assert!(msg.is_multipart());
    assert_eq!(msg.boundary(), Some(&b"outer-boundary"[..]));

    let parts = msg.parts().unwrap();
    assert_eq!(parts.len(), 2);

    let alternative = &parts[0];
    assert_eq!(alternative.content_type(), b"multipart/alternative");
    let alternatives = alternative.parts().unwrap();
    assert_eq!(alternatives.len(), 2);
    assert_eq!(alternatives[0].content_type(), b"text/plain");
    assert_eq!(alternatives[1].content_type(), b"text/html");

    let attachment = &parts[1];
    assert_eq!(attachment.content_type(), b"application/pdf");
    assert_eq!(attachment.content_type_parameter("name"), Some(&b"report.pdf"[..]));
    assert_eq!(attachment.content_disposition(), Some(&b"attachment"[..]));
    assert_eq!(
        attachment.content_disposition_parameter("filename"),
        Some(&b"report.pdf"[..])
    );
}

// ─── Test 5: Part bodies decode per their own headers ───────────────

#[test]
fn test_multipart_part_bodies() {
    let msg = fixture("multipart.eml");
    let parts = msg.parts().unwrap();
    let alternatives = parts[0].parts().unwrap();

    let plain = alternatives[0].mime_charset_body_text(None).unwrap();
    assert_eq!(plain.encoding(), TextEncoding::Ascii);
    assert_eq!(plain.as_bytes(), b"Please find the report attached.");

    let html = alternatives[1].mime_charset_body_text(None).unwrap();
    assert_eq!(html.encoding(), TextEncoding::UTF_8);
    assert_eq!(html.to_str(), "<p>Rapport ci-joint.</p>");

    let pdf = parts[1].mime_charset_body_text(None).unwrap();
    assert_eq!(pdf.encoding(), TextEncoding::Binary);
    assert_eq!(pdf.as_bytes(), b"%PDF-1.4\n");
}

// ─── Test 6: Forwarded message/rfc822 ───────────────────────────────

#[test]
fn test_nested_message() {
    let msg = fixture("nested.eml");
    let parts = msg.parts().unwrap();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].body().raw_source(), b"See below.");

    let forwarded = &parts[1];
    assert!(forwarded.is_message());
    assert_eq!(forwarded.content_disposition(), Some(&b"inline"[..]));
    assert!(forwarded.parts().is_none());

    let inner = forwarded.message().unwrap();
    assert_eq!(inner.header().get("subject"), Some(&b"Original"[..]));
    assert_eq!(
        inner.from(),
        Some(&[Address::new(b("Grace"), None, b("grace"), b("example.com"))][..])
    );

    let text = inner.mime_charset_body_text(None).unwrap();
    assert_eq!(text.encoding(), TextEncoding::Standard(WINDOWS_1252));
    assert_eq!(text.to_str(), "Original text.");
}

// ─── Test 7: ISO-2022-JP encoded header and body ────────────────────

#[test]
fn test_japanese_subject() {
    let msg = fixture("japanese.eml");
    let subject = msg
        .mime_decoded_header("subject", None, &ConvertOptions::strict())
        .unwrap()
        .unwrap();
    assert_eq!(subject.encoding(), TextEncoding::Standard(ISO_2022_JP));
    assert_eq!(subject.to_str(), "\u{3053}\u{3093}\u{306B}\u{3061}\u{306F}");

    let sjis = msg
        .mime_decoded_header("subject", Some(Charset::from("Shift_JIS")), &ConvertOptions::strict())
        .unwrap()
        .unwrap();
    assert_eq!(sjis.encoding(), TextEncoding::Standard(SHIFT_JIS));
    assert_eq!(sjis.to_str(), subject.to_str());
}

#[test]
fn test_japanese_body_and_from() {
    let msg = fixture("japanese.eml");
    let body = msg.mime_charset_body_text(None).unwrap();
    assert_eq!(body.encoding(), TextEncoding::Standard(ISO_2022_JP));
    assert_eq!(
        body.to_str(),
        "\u{672C}\u{65E5}\u{306F}\u{3088}\u{308D}\u{3057}\u{304F}\u{304A}\u{9858}\u{3044}\u{3057}\u{307E}\u{3059}\u{3002}\r\n"
    );

    let from = msg.from().unwrap();
    assert_eq!(from.len(), 1);
    assert_eq!(from[0].local_part.as_deref(), Some(&b"yamada"[..]));
    let name = decode_mime_encoded_words(
        from[0].display_name.as_deref().unwrap(),
        Some(Charset::from("utf-8")),
        &default_aliases(),
        &ConvertOptions::strict(),
    )
    .unwrap();
    assert_eq!(name.to_str(), "\u{5C71}\u{7530}\u{592A}\u{90CE}");
}

#[test]
fn test_japanese_date_with_zone_comment() {
    let msg = fixture("japanese.eml");
    let date = msg.date().unwrap();
    assert_eq!(date.to_rfc3339(), "2013-11-07T21:47:50+00:00");
}

// ─── Test 8: Unmappable characters ──────────────────────────────────

#[test]
fn test_conversion_to_ascii() {
    let msg = fixture("japanese.eml");
    let err = msg
        .mime_decoded_header("subject", Some(Charset::from("us-ascii")), &ConvertOptions::strict())
        .unwrap_err();
    assert!(matches!(err, MessageError::UndefinedConversion { .. }));

    let lossy = msg
        .mime_decoded_header("subject", Some(Charset::from("us-ascii")), &ConvertOptions::lossy())
        .unwrap()
        .unwrap();
    assert_eq!(lossy.as_bytes(), b"?????");
}

// ─── Test 9: Groups, routes and comments ────────────────────────────

#[test]
fn test_groups_and_routes() {
    let msg = fixture("groups.eml");

    assert_eq!(
        msg.to(),
        Some(
            &[
                Address::group_start(b"undisclosed-recipients".to_vec()),
                Address::group_end(),
            ][..]
        )
    );

    assert_eq!(
        msg.cc(),
        Some(
            &[
                Address::group_start(b"Team".to_vec()),
                Address::new(None, None, b("alice"), b("example.com")),
                Address::new(b("Bob"), None, b("bob"), b("example.com")),
                Address::group_end(),
                Address::new(b("Smith, John"), None, b("john"), b("example.com")),
            ][..]
        )
    );

    assert_eq!(
        msg.bcc(),
        Some(
            &[Address::new(
                None,
                b("@relay.example.com"),
                b("hidden"),
                b("example.com")
            )][..]
        )
    );

    assert_eq!(
        msg.reply_to(),
        Some(&[Address::new(None, None, b("news"), b("example.com"))][..])
    );
    assert!(msg.sender().is_none());
}

#[test]
fn test_unparsable_date_is_epoch() {
    let msg = fixture("groups.eml");
    assert_eq!(msg.date().map(|d| d.timestamp()), Some(0));
}

// ─── Test 10: Custom alias table propagates to parts ────────────────

#[test]
fn test_custom_aliases() {
    let raw = b"Content-Type: multipart/mixed; boundary=b\r\n\r\n\
        --b\r\n\
        Content-Type: text/plain; charset=x-legacy\r\n\r\n\
        caf\xE9\r\n\
        --b--\r\n";

    let msg = Message::new(&raw[..]);
    let part = &msg.parts().unwrap()[0];
    assert_eq!(
        part.mime_charset_body_text(None),
        Err(MessageError::UnknownCharset("x-legacy".into()))
    );

    let mut aliases = CharsetAliases::with_defaults();
    aliases.add_alias("x-legacy", TextEncoding::Standard(WINDOWS_1252));
    let msg = Message::with_charset_aliases(&raw[..], Arc::new(aliases));
    let part = &msg.parts().unwrap()[0];
    let text = part.mime_charset_body_text(None).unwrap();
    assert_eq!(text.to_str(), "caf\u{E9}");
}
