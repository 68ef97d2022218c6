use crate::grammar::{evaluate, field_pair, MessageRule};
use crate::protocol::{ParseError, PayloadSize};

/// Header fields in the order they were received.
///
/// Names and values are text. A value carrying `obs-text` bytes that are not valid UTF-8 holds
/// U+FFFD in their place, so only UTF-8 values render back to the bytes they were parsed from.
///
/// Unlike [`http::HeaderMap`], this keeps repeated fields as separate entries in their original
/// positions and keeps field names as written. Lookups compare names case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    fields: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<N: Into<String>, V: Into<String>>(&mut self, name: N, value: V) {
        self.fields.push((name.into(), value.into()));
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Value of the first field called `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, value)| value)
    }

    /// Values of every field called `name`, in order.
    pub fn get_all<'h, 'n>(&'h self, name: &'n str) -> impl Iterator<Item = &'h str> + use<'h, 'n> {
        self.iter().filter(move |(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, value)| value)
    }

    /// Body framing announced by these fields, see [`PayloadSize::from_headers`].
    pub fn payload_size(&self) -> Result<PayloadSize, ParseError> {
        PayloadSize::from_headers(self.iter())
    }

    pub fn into_vec(self) -> Vec<(String, String)> {
        self.fields
    }
}

impl From<Vec<(String, String)>> for Headers {
    fn from(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self { fields: iter.into_iter().map(|(name, value)| (name.into(), value.into())).collect() }
    }
}

impl IntoIterator for Headers {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// Decodes a header section: field-lines each ending in CRLF, then the empty line.
///
/// This is the shape [`MessageReader::read_headers`](crate::codec::MessageReader::read_headers)
/// returns.
pub fn parse_header_section(section: &[u8]) -> Result<Headers, ParseError> {
    let root = evaluate(MessageRule::FieldSection, section)?;
    Ok(root
        .search(&[MessageRule::FieldLine], Some(1))
        .into_iter()
        .filter_map(field_pair)
        .collect())
}
