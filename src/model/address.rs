//! Mailbox addresses (RFC 822 §6) and the header fields that carry them.

use std::fmt;

/// A parsed address, or a group marker.
///
/// Groups (`name: a@b, c@d;`) are flattened: an address carrying only a
/// `display_name` opens the group, an address with every field `None`
/// closes it.
///
/// # Examples
/// - `"TOKI Yoshinori <toki@freedom.ne.jp>"` → `display_name = "TOKI Yoshinori"`,
///   `local_part = "toki"`, `domain = "freedom.ne.jp"`
/// - `"<@relay.example,@mx.example:user@example.com>"` → `route = "@relay.example,@mx.example"`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Address {
    /// Unquoted display name (or group name).
    pub display_name: Option<Vec<u8>>,
    /// Source route without the trailing colon.
    pub route: Option<Vec<u8>>,
    pub local_part: Option<Vec<u8>>,
    pub domain: Option<Vec<u8>>,
}

impl Address {
    pub fn new(
        display_name: Option<&[u8]>,
        route: Option<&[u8]>,
        local_part: Option<&[u8]>,
        domain: Option<&[u8]>,
    ) -> Self {
        Self {
            display_name: display_name.map(<[u8]>::to_vec),
            route: route.map(<[u8]>::to_vec),
            local_part: local_part.map(<[u8]>::to_vec),
            domain: domain.map(<[u8]>::to_vec),
        }
    }

    /// Marker opening a group named `name`.
    pub fn group_start(name: Vec<u8>) -> Self {
        Self {
            display_name: Some(name),
            ..Self::default()
        }
    }

    /// Marker closing the innermost open group.
    pub fn group_end() -> Self {
        Self::default()
    }

    pub fn is_group_start(&self) -> bool {
        self.display_name.is_some()
            && self.route.is_none()
            && self.local_part.is_none()
            && self.domain.is_none()
    }

    pub fn is_group_end(&self) -> bool {
        *self == Self::default()
    }

    /// Alias for `display_name`.
    pub fn name(&self) -> Option<&[u8]> {
        self.display_name.as_deref()
    }

    /// Alias for `local_part`.
    pub fn mailbox(&self) -> Option<&[u8]> {
        self.local_part.as_deref()
    }

    /// Alias for `domain`.
    pub fn host(&self) -> Option<&[u8]> {
        self.domain.as_deref()
    }

    /// `local@domain` when both halves are present.
    pub fn addr_spec(&self) -> Option<Vec<u8>> {
        let local = self.local_part.as_deref()?;
        let domain = self.domain.as_deref()?;
        let mut out = Vec::with_capacity(local.len() + domain.len() + 1);
        out.extend_from_slice(local);
        out.push(b'@');
        out.extend_from_slice(domain);
        Some(out)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lossy = String::from_utf8_lossy;

        if self.is_group_end() {
            return f.write_str(";");
        }
        if self.is_group_start() {
            return write!(f, "{}:", lossy(self.display_name.as_deref().unwrap_or_default()));
        }

        let spec = self.addr_spec().unwrap_or_default();
        match (&self.display_name, &self.route) {
            (None, None) => write!(f, "{}", lossy(&spec)),
            (name, route) => {
                if let Some(name) = name {
                    write!(f, "\"{}\" ", lossy(name))?;
                }
                match route {
                    Some(route) => write!(f, "<{}:{}>", lossy(route), lossy(&spec)),
                    None => write!(f, "<{}>", lossy(&spec)),
                }
            }
        }
    }
}

/// Header fields whose values are address lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressField {
    From,
    Sender,
    ReplyTo,
    To,
    Cc,
    Bcc,
}

impl AddressField {
    pub const ALL: [AddressField; 6] = [
        AddressField::From,
        AddressField::Sender,
        AddressField::ReplyTo,
        AddressField::To,
        AddressField::Cc,
        AddressField::Bcc,
    ];

    /// Lowercase header field name.
    pub fn header_name(self) -> &'static str {
        match self {
            AddressField::From => "from",
            AddressField::Sender => "sender",
            AddressField::ReplyTo => "reply-to",
            AddressField::To => "to",
            AddressField::Cc => "cc",
            AddressField::Bcc => "bcc",
        }
    }
}

impl fmt::Display for AddressField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header_name())
    }
}
