//! Charset alias table: redirects ambiguous charset labels to specific encodings.

use std::sync::{Arc, LazyLock};

use encoding_rs::{EUC_JP, ISO_2022_JP, SHIFT_JIS};
use tracing::trace;

use super::TextEncoding;

static DEFAULT_ALIASES: LazyLock<Arc<CharsetAliases>> =
    LazyLock::new(|| Arc::new(CharsetAliases::with_defaults()));

/// Shared handle to the built-in alias table.
///
/// The table is built once and never modified; callers wanting different
/// aliases build their own [`CharsetAliases`].
pub fn default_aliases() -> Arc<CharsetAliases> {
    Arc::clone(&DEFAULT_ALIASES)
}

/// Case-insensitive mapping from charset name to encoding.
///
/// Names are stored uppercased and enumerated in insertion order.
/// `CharsetAliases::default()` is the empty table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharsetAliases {
    entries: Vec<(String, TextEncoding)>,
}

impl CharsetAliases {
    /// An empty table: every label resolves through the encoding registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in table.
    ///
    /// `US-ASCII` is pinned to strict ASCII (the registry reads it as
    /// windows-1252) and the Japanese legacy labels, including vendor
    /// names the registry does not know, are pinned to the vendor-extended
    /// registry encodings.
    pub fn with_defaults() -> Self {
        let mut aliases = Self::new();
        aliases.add_alias("us-ascii", TextEncoding::Ascii);
        aliases.add_alias("shift_jis", TextEncoding::Standard(SHIFT_JIS));
        aliases.add_alias("euc-jp", TextEncoding::Standard(EUC_JP));
        aliases.add_alias("iso-2022-jp", TextEncoding::Standard(ISO_2022_JP));
        aliases.add_alias("cp932", TextEncoding::Standard(SHIFT_JIS));
        aliases.add_alias("eucjp-ms", TextEncoding::Standard(EUC_JP));
        aliases.add_alias("cp51932", TextEncoding::Standard(EUC_JP));
        aliases.add_alias("cp50220", TextEncoding::Standard(ISO_2022_JP));
        aliases.add_alias("cp50221", TextEncoding::Standard(ISO_2022_JP));
        aliases
    }

    /// Add or replace an alias. A replaced alias keeps its position.
    pub fn add_alias(&mut self, name: &str, encoding: TextEncoding) {
        let key = name.trim().to_ascii_uppercase();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = encoding,
            None => self.entries.push((key, encoding)),
        }
    }

    /// Remove an alias, returning the encoding it pointed to.
    pub fn delete_alias(&mut self, name: impl AsRef<[u8]>) -> Option<TextEncoding> {
        let index = self.position(name.as_ref())?;
        Some(self.entries.remove(index).1)
    }

    /// The aliased encoding for `name`, if any. Registry labels are not consulted.
    pub fn get(&self, name: impl AsRef<[u8]>) -> Option<TextEncoding> {
        self.position(name.as_ref()).map(|i| self.entries[i].1)
    }

    pub fn contains_key(&self, name: impl AsRef<[u8]>) -> bool {
        self.position(name.as_ref()).is_some()
    }

    /// Resolve a charset label: the alias table first, then the registry.
    pub fn resolve(&self, label: impl AsRef<[u8]>) -> Option<TextEncoding> {
        let label = label.as_ref();
        if let Some(encoding) = self.get(label) {
            trace!(
                label = %String::from_utf8_lossy(label),
                encoding = encoding.name(),
                "Charset resolved through alias"
            );
            return Some(encoding);
        }
        TextEncoding::for_label(label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Uppercased alias names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// `(name, encoding)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, TextEncoding)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), *e))
    }

    fn position(&self, name: &[u8]) -> Option<usize> {
        let name = name.trim_ascii();
        self.entries
            .iter()
            .position(|(k, _)| k.as_bytes().eq_ignore_ascii_case(name))
    }
}
