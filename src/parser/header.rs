//! RFC 822 message splitting, header field extraction (with folding) and date parsing.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use tracing::warn;

use super::{is_space, trim, trim_start};

/// Ordered `(name, value)` pairs exactly as they appear in the header block.
pub type HeaderFieldList<'a> = Vec<(&'a [u8], &'a [u8])>;

/// Split a raw message into its header block and body.
///
/// Leading whitespace is dropped, then the message is split at the first
/// blank line (`CRLF CRLF`, `LF LF` or `CR CR`, whichever starts first).
/// The header keeps the blank-line bytes. Without a blank line the whole
/// input is the body and there is no header.
pub fn split_message(message: &[u8]) -> (Option<&[u8]>, &[u8]) {
    let message = trim_start(message);
    match find_blank_line(message) {
        Some(end) => {
            let (header, body) = message.split_at(end);
            (Some(header), body)
        }
        None => (None, message),
    }
}

/// End offset (exclusive) of the first blank-line marker.
fn find_blank_line(s: &[u8]) -> Option<usize> {
    const MARKERS: [&[u8]; 3] = [b"\r\n\r\n", b"\n\n", b"\r\r"];

    (0..s.len()).find_map(|i| {
        MARKERS
            .iter()
            .find(|marker| s[i..].starts_with(marker))
            .map(|marker| i + marker.len())
    })
}

/// Iterator over header lines. Each yielded range includes its terminator.
///
/// Lines end at `LF` (so `CRLF` too). A lone `CR` only ends a line in a
/// block that has no `LF` at all; elsewhere it is part of the value.
struct Lines<'a> {
    input: &'a [u8],
    terminator: u8,
    pos: usize,
}

impl<'a> Lines<'a> {
    fn new(input: &'a [u8]) -> Self {
        let terminator = match memchr::memchr(b'\n', input) {
            Some(_) => b'\n',
            None => b'\r',
        };
        Lines {
            input,
            terminator,
            pos: 0,
        }
    }
}

impl Iterator for Lines<'_> {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<(usize, usize)> {
        if self.pos >= self.input.len() {
            return None;
        }
        let start = self.pos;
        let end = memchr::memchr(self.terminator, &self.input[start..])
            .map_or(self.input.len(), |i| start + i + 1);
        self.pos = end;
        Some((start, end))
    }
}

/// Locate the field name at the start of a line.
///
/// Returns `(name_len, colon_index)`. The name is the shortest non-empty
/// run of non-whitespace bytes followed by optional blanks and a colon.
fn field_name(line: &[u8]) -> Option<(usize, usize)> {
    let run = line.iter().position(|&b| is_space(b)).unwrap_or(line.len());
    if run == 0 {
        return None;
    }
    if let Some(j) = line[1..run].iter().position(|&b| b == b':') {
        return Some((j + 1, j + 1));
    }
    let colon = run + line[run..]
        .iter()
        .position(|&b| !matches!(b, b' ' | b'\t' | 0x0b | 0x0c))
        .unwrap_or(line.len() - run);
    (line.get(colon) == Some(&b':')).then_some((run, colon))
}

/// Extract all header fields from a header block.
///
/// A field value continues over following lines that start with
/// whitespace. Values are trimmed at both ends, fold markers inside are
/// kept verbatim. Lines that are neither a field nor a continuation are
/// dropped.
pub fn parse_header(header: &[u8]) -> HeaderFieldList<'_> {
    struct Pending<'a> {
        name: &'a [u8],
        value_start: usize,
        value_end: usize,
    }

    let mut fields = Vec::new();
    let mut pending: Option<Pending> = None;

    for (start, end) in Lines::new(header) {
        let line = &header[start..end];
        if is_space(line[0]) {
            if let Some(p) = pending.as_mut() {
                p.value_end = end;
            }
            continue;
        }

        if let Some(p) = pending.take() {
            fields.push((p.name, trim(&header[p.value_start..p.value_end])));
        }
        if let Some((name_len, colon)) = field_name(line) {
            pending = Some(Pending {
                name: &line[..name_len],
                value_start: start + colon + 1,
                value_end: end,
            });
        }
    }

    if let Some(p) = pending {
        fields.push((p.name, trim(&header[p.value_start..p.value_end])));
    }

    fields
}

/// Parse an email date string in various common formats.
///
/// Supports RFC 2822, ISO 8601 and several broken real-world variants.
pub fn parse_date(date_str: &str) -> Option<DateTime<Utc>> {
    let trimmed = strip_trailing_comment(date_str.trim());
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    let no_dow = strip_day_of_week(trimmed);
    let candidates = [no_dow.to_string(), replace_named_tz(no_dow)];

    const FORMATS: [&str; 8] = [
        "%d %b %Y %H:%M:%S %z",
        "%d %b %Y %H:%M %z",
        "%d %b %Y %H:%M:%S",
        "%b %d %H:%M:%S %Y",
        "%Y-%m-%d %H:%M:%S %z",
        "%Y-%m-%d %H:%M:%S",
        "%d-%b-%Y %H:%M:%S %z",
        "%d-%b-%Y %H:%M:%S",
    ];

    for candidate in &candidates {
        for fmt in &FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(candidate, fmt) {
                return Some(dt.with_timezone(&Utc));
            }
            if let Ok(ndt) = NaiveDateTime::parse_from_str(candidate, fmt) {
                return Some(Utc.from_utc_datetime(&ndt));
            }
        }
    }

    if let Some(dt) = mail_parser_date(trimmed) {
        return Some(dt);
    }

    warn!(date = trimmed, "Could not parse date");
    None
}

/// Drop a trailing zone comment such as `"(JST)"`.
fn strip_trailing_comment(s: &str) -> &str {
    match (s.ends_with(')'), s.rfind('(')) {
        (true, Some(open)) => s[..open].trim_end(),
        _ => s,
    }
}

/// Last resort: let `mail-parser` try its own date grammar.
fn mail_parser_date(input: &str) -> Option<DateTime<Utc>> {
    use mail_parser::MessageParser;

    let fake_msg = format!("Date: {input}\n\n");
    let parsed = MessageParser::default().parse(fake_msg.as_bytes())?;
    let dt = parsed.date()?.to_rfc3339();
    DateTime::parse_from_rfc3339(&dt)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Strip a leading day-of-week such as `"Thu, "` or `"Thu "`.
fn strip_day_of_week(s: &str) -> &str {
    const DAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
    for day in DAYS {
        if let Some(rest) = s.strip_prefix(day) {
            let rest = rest.strip_prefix(',').unwrap_or(rest);
            if rest.starts_with(' ') {
                return rest.trim_start();
            }
        }
    }
    s
}

/// Replace a trailing timezone abbreviation with its numeric offset.
fn replace_named_tz(s: &str) -> String {
    const ZONES: [(&str, &str); 12] = [
        ("EST", "-0500"),
        ("EDT", "-0400"),
        ("CST", "-0600"),
        ("CDT", "-0500"),
        ("MST", "-0700"),
        ("MDT", "-0600"),
        ("PST", "-0800"),
        ("PDT", "-0700"),
        ("GMT", "+0000"),
        ("UTC", "+0000"),
        ("UT", "+0000"),
        ("JST", "+0900"),
    ];
    for (name, offset) in ZONES {
        if let Some(head) = s.strip_suffix(name) {
            return format!("{head}{offset}");
        }
    }
    s.to_string()
}
