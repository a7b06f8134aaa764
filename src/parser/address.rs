//! RFC 822 address-list grammar: groups, bare addr-specs and `name <route:addr>` forms.

use super::phrase::unquote_phrase;
use super::{is_space, trim, trim_end, trim_start};
use crate::model::address::Address;

/// Result of one successful production.
#[derive(Debug)]
enum Parsed {
    Group { name: Vec<u8>, members: Vec<Address> },
    Mailbox(Address),
}

/// Alternatives tried at each position, in priority order.
#[derive(Debug, Clone, Copy)]
enum Production {
    Group,
    Bare,
    Full,
}

impl Production {
    const PRIORITY: [Production; 3] = [Production::Group, Production::Bare, Production::Full];

    /// Try this production at the start of `input`. On success returns the
    /// parsed value and the number of bytes consumed (always non-zero).
    fn attempt(self, input: &[u8]) -> Option<(Parsed, usize)> {
        match self {
            Production::Group => group(input),
            Production::Bare => bare(input),
            Production::Full => full(input),
        }
    }
}

/// Parse an address list into a flat sequence of [`Address`] values.
///
/// Groups are emitted as a start marker, their members and an end marker.
/// Parsing stops at the first position where no production matches; the
/// unparsed remainder is ignored.
pub fn parse_mail_address_list(text: &[u8]) -> Vec<Address> {
    let mut addresses = Vec::new();
    let mut rest = text;

    loop {
        let input = trim_start(rest);
        let Some((parsed, consumed)) = Production::PRIORITY
            .iter()
            .find_map(|production| production.attempt(input))
        else {
            break;
        };

        match parsed {
            Parsed::Group { name, members } => {
                addresses.push(Address::group_start(name));
                addresses.extend(members);
                addresses.push(Address::group_end());
            }
            Parsed::Mailbox(address) => addresses.push(address),
        }
        rest = skip_separator(&input[consumed..]);
    }

    addresses
}

/// Optional whitespace followed by at most one comma.
fn skip_separator(s: &[u8]) -> &[u8] {
    let s = trim_start(s);
    s.strip_prefix(b",").unwrap_or(s)
}

/// Bytes allowed in a local-part or domain run.
fn is_atom_byte(b: u8) -> bool {
    !is_space(b) && !matches!(b, b'<' | b'>' | b'@' | b'"' | b',')
}

fn atom_len(s: &[u8]) -> usize {
    s.iter().position(|&b| !is_atom_byte(b)).unwrap_or(s.len())
}

fn skip_space(s: &[u8], mut i: usize) -> usize {
    while i < s.len() && is_space(s[i]) {
        i += 1;
    }
    i
}

/// Index of the first byte in `targets` that is outside quoted-strings,
/// comments and escapes (and outside `<...>` when `skip_angles` is set).
fn find_top_level(s: &[u8], targets: &[u8], skip_angles: bool) -> Option<usize> {
    let mut quoted = false;
    let mut commented = false;
    let mut angled = false;
    let mut i = 0;

    while i < s.len() {
        let b = s[i];
        if b == b'\\' {
            i += 2;
            continue;
        }
        if quoted {
            quoted = b != b'"';
        } else if commented {
            commented = b != b')';
        } else if angled {
            angled = b != b'>';
        } else if targets.contains(&b) {
            return Some(i);
        } else {
            match b {
                b'"' => quoted = true,
                b'(' => commented = true,
                b'<' if skip_angles => angled = true,
                _ => {}
            }
        }
        i += 1;
    }
    None
}

/// `local-part @ domain` starting at `i`; returns the runs and the end offset.
fn addr_spec(s: &[u8], i: usize) -> Option<(&[u8], &[u8], usize)> {
    let local_len = atom_len(&s[i..]);
    if local_len == 0 {
        return None;
    }
    let local = &s[i..i + local_len];

    let at = skip_space(s, i + local_len);
    if s.get(at) != Some(&b'@') {
        return None;
    }

    let domain_start = skip_space(s, at + 1);
    let domain_len = atom_len(&s[domain_start..]);
    if domain_len == 0 {
        return None;
    }
    let domain_end = domain_start + domain_len;
    Some((local, &s[domain_start..domain_end], domain_end))
}

/// `display-name : members ;`
fn group(s: &[u8]) -> Option<(Parsed, usize)> {
    let colon = find_top_level(s, b":<>@,;", false)?;
    if s[colon] != b':' {
        return None;
    }
    let name = trim(&s[..colon]);
    if name.is_empty() {
        return None;
    }

    let members_start = colon + 1;
    let members_len = find_top_level(&s[members_start..], b";", true)?;
    let members = parse_mail_address_list(&s[members_start..members_start + members_len]);

    let parsed = Parsed::Group {
        name: unquote_phrase(name),
        members,
    };
    Some((parsed, members_start + members_len + 1))
}

/// `local-part @ domain`
fn bare(s: &[u8]) -> Option<(Parsed, usize)> {
    let (local, domain, end) = addr_spec(s, 0)?;
    let address = Address::new(None, None, Some(local), Some(domain));
    Some((Parsed::Mailbox(address), end))
}

/// `display-name < [@route,@route:] local-part @ domain >`
fn full(s: &[u8]) -> Option<(Parsed, usize)> {
    let open = find_top_level(s, b"<", false)?;
    let display = trim(&s[..open]);
    let display_name = (!display.is_empty()).then(|| unquote_phrase(display));

    let mut i = skip_space(s, open + 1);
    let mut route = None;
    if s.get(i) == Some(&b'@') {
        let colon = i + s[i..].iter().position(|&b| b == b':' || b == b'>')?;
        if s[colon] != b':' {
            return None;
        }
        let text = trim_end(&s[i..colon]);
        if !is_route(text) {
            return None;
        }
        route = Some(text);
        i = skip_space(s, colon + 1);
    }

    let (local, domain, end) = addr_spec(s, i)?;
    let close = skip_space(s, end);
    if s.get(close) != Some(&b'>') {
        return None;
    }

    let address = Address {
        display_name,
        route: route.map(<[u8]>::to_vec),
        local_part: Some(local.to_vec()),
        domain: Some(domain.to_vec()),
    };
    Some((Parsed::Mailbox(address), close + 1))
}

/// One or more `@domain` segments separated by commas.
fn is_route(text: &[u8]) -> bool {
    text.split(|&b| b == b',').all(|segment| {
        trim(segment)
            .strip_prefix(b"@")
            .is_some_and(|rest| !rest.iter().any(|b| b"<>@\",".contains(b)))
    })
}
