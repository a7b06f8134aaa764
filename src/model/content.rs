//! Content metadata: MIME parameters, `Content-Type` and `Content-Disposition`.

use std::fmt;

/// One MIME parameter as written in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name with its original case.
    pub name: Vec<u8>,
    /// Parameter value, already unquoted if it was a quoted-string.
    pub value: Vec<u8>,
}

/// Parameters keyed by lowercase name, iterated in first-insertion order.
///
/// Inserting a name that is already present replaces the stored parameter
/// but keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamMap {
    entries: Vec<(Vec<u8>, Parameter)>,
}

impl ParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &[u8], value: Vec<u8>) {
        let key = name.to_ascii_lowercase();
        let param = Parameter {
            name: name.to_vec(),
            value,
        };
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = param,
            None => self.entries.push((key, param)),
        }
    }

    /// Value of a parameter, looked up case-insensitively.
    pub fn get(&self, name: impl AsRef<[u8]>) -> Option<&[u8]> {
        self.get_parameter(name).map(|p| p.value.as_slice())
    }

    pub fn get_parameter(&self, name: impl AsRef<[u8]>) -> Option<&Parameter> {
        let name = name.as_ref();
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, p)| p)
    }

    pub fn contains_key(&self, name: impl AsRef<[u8]>) -> bool {
        self.get_parameter(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(lowercase name, parameter)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &Parameter)> {
        self.entries.iter().map(|(k, p)| (k.as_slice(), p))
    }
}

/// A parsed `Content-Type` header.
///
/// Main and sub type are never empty: anything unparsable falls back to
/// `application/octet-stream`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    pub main_type: Vec<u8>,
    pub sub_type: Vec<u8>,
    pub parameters: ParamMap,
}

impl ContentType {
    /// `application/octet-stream` carrying the given parameters.
    pub fn octet_stream(parameters: ParamMap) -> Self {
        Self {
            main_type: b"application".to_vec(),
            sub_type: b"octet-stream".to_vec(),
            parameters,
        }
    }

    /// `main/sub` as written in the source.
    pub fn mime_type(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.main_type.len() + self.sub_type.len() + 1);
        out.extend_from_slice(&self.main_type);
        out.push(b'/');
        out.extend_from_slice(&self.sub_type);
        out
    }

    pub fn is_main_type(&self, main_type: &str) -> bool {
        self.main_type.eq_ignore_ascii_case(main_type.as_bytes())
    }
}

impl Default for ContentType {
    fn default() -> Self {
        Self::octet_stream(ParamMap::new())
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.mime_type()))
    }
}

/// A parsed `Content-Disposition` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentDisposition {
    /// `inline`, `attachment`, ... or `None` when no leading token was present.
    pub disposition_type: Option<Vec<u8>>,
    pub parameters: ParamMap,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_map_case_insensitive() {
        let mut params = ParamMap::new();
        params.insert(b"CHARSET", b"UTF-8".to_vec());
        assert_eq!(params.get("charset"), Some(&b"UTF-8"[..]));
        assert_eq!(params.get("Charset"), Some(&b"UTF-8"[..]));
        assert_eq!(params.get_parameter("charset").unwrap().name, b"CHARSET");
        assert!(params.get("boundary").is_none());
    }

    #[test]
    fn test_param_map_overwrite_keeps_position() {
        let mut params = ParamMap::new();
        params.insert(b"a", b"1".to_vec());
        params.insert(b"b", b"2".to_vec());
        params.insert(b"A", b"3".to_vec());

        let keys: Vec<&[u8]> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![&b"a"[..], &b"b"[..]]);
        assert_eq!(params.get("a"), Some(&b"3"[..]));
        assert_eq!(params.get_parameter("a").unwrap().name, b"A");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_content_type_default() {
        let ct = ContentType::default();
        assert_eq!(ct.mime_type(), b"application/octet-stream");
        assert!(ct.parameters.is_empty());
        assert!(ct.is_main_type("APPLICATION"));
        assert_eq!(ct.to_string(), "application/octet-stream");
    }
}
