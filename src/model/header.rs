//! Header block with case-insensitive field access, and the message body.

use std::cell::OnceCell;
use std::collections::HashMap;

use crate::parser::header::parse_header;

/// Parsed view of a header block: the fields in source order plus an
/// index from lowercase name to every value carried under that name.
#[derive(Debug)]
struct FieldTable {
    fields: Vec<(Vec<u8>, Vec<u8>)>,
    /// Lowercase names in first-seen order.
    keys: Vec<Vec<u8>>,
    index: HashMap<Vec<u8>, Vec<usize>>,
}

impl FieldTable {
    fn build(raw: &[u8]) -> Self {
        let fields: Vec<(Vec<u8>, Vec<u8>)> = parse_header(raw)
            .into_iter()
            .map(|(name, value)| (name.to_vec(), value.to_vec()))
            .collect();

        let mut keys = Vec::new();
        let mut index: HashMap<Vec<u8>, Vec<usize>> = HashMap::new();
        for (i, (name, _)) in fields.iter().enumerate() {
            let key = name.to_ascii_lowercase();
            index
                .entry(key)
                .or_insert_with_key(|key| {
                    keys.push(key.clone());
                    Vec::new()
                })
                .push(i);
        }

        Self {
            fields,
            keys,
            index,
        }
    }

    fn values(&self, name: &[u8]) -> Option<&[usize]> {
        self.index
            .get(&name.to_ascii_lowercase())
            .map(Vec::as_slice)
    }
}

/// The header block of a message.
///
/// Fields are parsed on first access. Lookups are case-insensitive.
#[derive(Debug)]
pub struct Header {
    raw_source: Vec<u8>,
    table: OnceCell<FieldTable>,
}

impl Header {
    pub fn new(raw_source: impl Into<Vec<u8>>) -> Self {
        Self {
            raw_source: raw_source.into(),
            table: OnceCell::new(),
        }
    }

    /// The header block exactly as it appeared, blank line included.
    pub fn raw_source(&self) -> &[u8] {
        &self.raw_source
    }

    fn table(&self) -> &FieldTable {
        self.table.get_or_init(|| FieldTable::build(&self.raw_source))
    }

    /// First value of the named field.
    pub fn get(&self, name: impl AsRef<[u8]>) -> Option<&[u8]> {
        let table = self.table();
        let first = *table.values(name.as_ref())?.first()?;
        Some(&table.fields[first].1)
    }

    /// First value of the named field, uppercased.
    pub fn fetch_upcase(&self, name: impl AsRef<[u8]>) -> Option<Vec<u8>> {
        self.get(name).map(<[u8]>::to_ascii_uppercase)
    }

    /// Every value of the named field, in source order.
    pub fn field_value_list(&self, name: impl AsRef<[u8]>) -> Option<Vec<&[u8]>> {
        let table = self.table();
        let indices = table.values(name.as_ref())?;
        Some(
            indices
                .iter()
                .map(|&i| table.fields[i].1.as_slice())
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.table().fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.table().fields.len()
    }

    pub fn contains_key(&self, name: impl AsRef<[u8]>) -> bool {
        self.table().values(name.as_ref()).is_some()
    }

    /// Lowercase field names in first-seen order.
    pub fn keys(&self) -> impl Iterator<Item = &[u8]> {
        self.table().keys.iter().map(Vec::as_slice)
    }

    /// `(name, value)` pairs in source order, names as written.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.table()
            .fields
            .iter()
            .map(|(name, value)| (name.as_slice(), value.as_slice()))
    }
}

/// The body of a message, uninterpreted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Body {
    raw_source: Vec<u8>,
}

impl Body {
    pub fn new(raw_source: impl Into<Vec<u8>>) -> Self {
        Self {
            raw_source: raw_source.into(),
        }
    }

    pub fn raw_source(&self) -> &[u8] {
        &self.raw_source
    }
}
