//! `Forwarded` header decoding, RFC 7239.
//!
//! [`parse_forwarded`] yields one [`ForwardedElement`] per proxy hop with the parameter values as
//! written (quoted strings lose their quotes). [`parse_forwarded_values`] additionally resolves
//! `for`/`by` through the `node` grammar and `host` through [`parse_host`].
//!
//! Parameter names are matched case-insensitively and may appear at most once per element.
//! Names other than `by`, `for`, `host` and `proto` are kept, in source order, in
//! `extensions`. Elements without any pair (`for=a, , by=b`) are skipped.

use std::net::{Ipv4Addr, Ipv6Addr};

use tracing::trace;

use crate::ensure;
use crate::grammar::{evaluate, ForwardedRule, Node, Rule};
use crate::header::host::{ipv4_address, ipv6_address, port_number};
use crate::header::{parse_host, unquote, HostValue};
use crate::protocol::ParseError;

/// One forwarded-element with raw parameter values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForwardedElement {
    pub by: Option<String>,
    pub r#for: Option<String>,
    pub host: Option<String>,
    pub proto: Option<String>,
    /// Parameters outside the registered four, names lowercased.
    pub extensions: Vec<(String, String)>,
}

/// One forwarded-element with `for`, `by` and `host` resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedForwardedElement {
    pub by: Option<ForwardedNode>,
    pub r#for: Option<ForwardedNode>,
    pub host: Option<HostValue>,
    pub proto: Option<String>,
    pub extensions: Vec<(String, String)>,
}

/// A `node` value: who sent or received the request at one hop.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ForwardedNode {
    pub identity: NodeIdentity,
    pub port: Option<NodePort>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeIdentity {
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
    /// An `obfnode`, leading underscore included.
    Obfuscated(String),
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodePort {
    Number(u16),
    /// An `obfport`, leading underscore included.
    Obfuscated(String),
}

impl TryFrom<ForwardedElement> for ParsedForwardedElement {
    type Error = ParseError;

    fn try_from(element: ForwardedElement) -> Result<Self, Self::Error> {
        Ok(Self {
            by: element.by.as_deref().map(parse_node).transpose()?,
            r#for: element.r#for.as_deref().map(parse_node).transpose()?,
            host: element.host.as_deref().map(parse_host).transpose()?,
            proto: element.proto,
            extensions: element.extensions,
        })
    }
}

/// Splits a `Forwarded` value into its elements, keeping parameter values as strings.
///
/// # Errors
///
/// - [`ParseError::GrammarMismatch`] if the value is not a `Forwarded` list
/// - [`ParseError::DuplicateParameter`] if a parameter name repeats within one element
pub fn parse_forwarded<V: AsRef<[u8]>>(value: V) -> Result<Vec<ForwardedElement>, ParseError> {
    let root = evaluate(ForwardedRule::Forwarded, value.as_ref())?;

    let mut elements = Vec::new();
    for node in root.search(&[ForwardedRule::ForwardedElement], Some(1)) {
        let pairs = node.search(&[ForwardedRule::ForwardedPair], Some(1));
        if pairs.is_empty() {
            trace!(offset = node.span().start, "skipping empty forwarded-element");
            continue;
        }
        elements.push(decode_element(&pairs)?);
    }
    Ok(elements)
}

/// Like [`parse_forwarded`], then resolves every element's `for`, `by` and `host` values.
///
/// # Errors
///
/// Those of [`parse_forwarded`], plus the errors of [`parse_node`] and [`parse_host`] for the
/// values they resolve.
pub fn parse_forwarded_values<V: AsRef<[u8]>>(value: V) -> Result<Vec<ParsedForwardedElement>, ParseError> {
    parse_forwarded(value)?.into_iter().map(ParsedForwardedElement::try_from).collect()
}

/// Parses a `node` value from a `for` or `by` parameter.
///
/// # Errors
///
/// - [`ParseError::GrammarMismatch`] if the value is not a `node`
/// - [`ParseError::MalformedAddress`] if a bracketed address is not valid IPv6 or a numeric port
///   does not fit in a `u16`
pub fn parse_node<V: AsRef<[u8]>>(value: V) -> Result<ForwardedNode, ParseError> {
    let root = evaluate(ForwardedRule::Node, value.as_ref())?;

    let Some(name) = root.find(ForwardedRule::NodeName, 1).and_then(|n| n.children().first()) else {
        return Err(ParseError::mismatch(ForwardedRule::NodeName.name(), 0));
    };

    let identity = match name.rule() {
        ForwardedRule::Ipv4Address => NodeIdentity::Ipv4(ipv4_address(&name.text())?),
        ForwardedRule::Ipv6Address => NodeIdentity::Ipv6(ipv6_address(&name.text())?),
        ForwardedRule::Unknown => NodeIdentity::Unknown,
        ForwardedRule::ObfNode => NodeIdentity::Obfuscated(name.text().into_owned()),
        rule => return Err(unexpected(name, rule)),
    };

    let port = match root.find(ForwardedRule::NodePort, 1).and_then(|n| n.children().first()) {
        None => None,
        Some(port) => match port.rule() {
            ForwardedRule::Port => Some(NodePort::Number(port_number(&port.text())?)),
            ForwardedRule::ObfPort => Some(NodePort::Obfuscated(port.text().into_owned())),
            rule => return Err(unexpected(port, rule)),
        },
    };

    Ok(ForwardedNode { identity, port })
}

fn decode_element(pairs: &[&Node<'_, ForwardedRule>]) -> Result<ForwardedElement, ParseError> {
    let mut element = ForwardedElement::default();

    for pair in pairs {
        let (Some(name), Some(value)) =
            (pair.find(ForwardedRule::ParameterName, 1), pair.find(ForwardedRule::Value, 1))
        else {
            return Err(ParseError::mismatch(ForwardedRule::ForwardedPair.name(), pair.span().start));
        };

        let name = name.text().to_ascii_lowercase();
        let value = match value.find(ForwardedRule::QuotedString, 1) {
            Some(quoted) => unquote(quoted.as_bytes()).into_owned(),
            None => value.text().into_owned(),
        };

        let slot = match name.as_str() {
            "by" => &mut element.by,
            "for" => &mut element.r#for,
            "host" => &mut element.host,
            "proto" => &mut element.proto,
            _ => {
                let repeated = element.extensions.iter().any(|(known, _)| *known == name);
                ensure!(!repeated, ParseError::duplicate_parameter(name));
                element.extensions.push((name, value));
                continue;
            }
        };
        ensure!(slot.is_none(), ParseError::duplicate_parameter(name));
        *slot = Some(value);
    }

    Ok(element)
}

fn unexpected(node: &Node<'_, ForwardedRule>, rule: ForwardedRule) -> ParseError {
    ParseError::malformed_address(node.text(), format!("unexpected `{}`", rule.name()))
}
