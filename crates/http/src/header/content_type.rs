use std::fmt;

use crate::grammar::{evaluate, ContentTypeRule, Node, Rule};
use crate::header::unquote;
use crate::protocol::ParseError;

/// A media type with its parameters, in source order.
///
/// Parameter names keep the case they were written in and duplicates are preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    type_: String,
    subtype: String,
    parameters: Vec<(String, String)>,
}

impl MediaType {
    pub fn new<T, S>(type_: T, subtype: S, parameters: Vec<(String, String)>) -> Self
    where
        T: Into<String>,
        S: Into<String>,
    {
        Self { type_: type_.into(), subtype: subtype.into(), parameters }
    }

    #[inline]
    pub fn type_(&self) -> &str {
        &self.type_
    }

    #[inline]
    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    #[inline]
    pub fn parameters(&self) -> &[(String, String)] {
        &self.parameters
    }

    /// `type/subtype` without parameters.
    pub fn full_type(&self) -> String {
        format!("{}/{}", self.type_, self.subtype)
    }

    /// Value of the first parameter called `name`, compared case-insensitively.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, value)| value.as_str())
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.type_, self.subtype)?;
        for (name, value) in &self.parameters {
            write!(f, "; {name}={value}")?;
        }
        Ok(())
    }
}

/// Parses a `Content-Type` value.
///
/// An empty value stands for an absent header and yields `None`. Quoted parameter values lose
/// their enclosing quotes and are otherwise taken verbatim.
pub fn parse_content_type<V: AsRef<[u8]>>(value: V) -> Result<Option<MediaType>, ParseError> {
    let value = value.as_ref();
    if value.is_empty() {
        return Ok(None);
    }

    let root = evaluate(ContentTypeRule::ContentType, value)?;
    let (Some(type_), Some(subtype)) = (root.find(ContentTypeRule::Type, 2), root.find(ContentTypeRule::Subtype, 2))
    else {
        return Err(ParseError::mismatch(ContentTypeRule::MediaType.name(), 0));
    };

    let parameters = root
        .search(&[ContentTypeRule::Parameter], None)
        .into_iter()
        .filter_map(parameter_pair)
        .collect();

    Ok(Some(MediaType::new(type_.text(), subtype.text(), parameters)))
}

fn parameter_pair(parameter: &Node<'_, ContentTypeRule>) -> Option<(String, String)> {
    let name = parameter.find(ContentTypeRule::ParameterName, 1)?;
    let value = parameter.find(ContentTypeRule::ParameterValue, 1)?;

    let value = match value.find(ContentTypeRule::QuotedString, 1) {
        Some(quoted) => unquote(quoted.as_bytes()),
        None => value.text(),
    };
    Some((name.text().into_owned(), value.into_owned()))
}
