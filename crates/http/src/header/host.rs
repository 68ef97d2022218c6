use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::grammar::{evaluate, HostRule, Node, Rule};
use crate::protocol::ParseError;

/// The `uri-host` alternative a host value resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostAddress {
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
    /// Bracket interior of an `IPvFuture` literal, such as `v1.fe80::a+en1`.
    IpvFuture(String),
    RegName(String),
}

impl HostAddress {
    /// Renders the host the way it appears in a URI authority, IP literals in brackets.
    pub fn to_uri_host(&self) -> String {
        match self {
            HostAddress::Ipv4(addr) => addr.to_string(),
            HostAddress::Ipv6(addr) => format!("[{addr}]"),
            HostAddress::IpvFuture(literal) => format!("[{literal}]"),
            HostAddress::RegName(name) => name.clone(),
        }
    }

    /// Returns true for the alternatives that name a host rather than address one.
    #[inline]
    pub fn is_reg_name(&self) -> bool {
        matches!(self, HostAddress::RegName(_))
    }
}

impl fmt::Display for HostAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uri_host())
    }
}

/// A decoded `Host` value: `uri-host [ ":" port ]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostValue {
    pub address: HostAddress,
    /// `None` when the port is absent or empty (`example.com:`).
    pub port: Option<u16>,
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}:{port}", self.address),
            None => write!(f, "{}", self.address),
        }
    }
}

/// Parses a `Host` value, or any URI authority host with an optional port.
///
/// # Errors
///
/// - [`ParseError::GrammarMismatch`] if the value is not a `host`
/// - [`ParseError::MalformedAddress`] if a bracketed literal is not a valid IPv6 address, or the
///   port does not fit in a `u16`
pub fn parse_host<V: AsRef<[u8]>>(value: V) -> Result<HostValue, ParseError> {
    let root = evaluate(HostRule::Host, value.as_ref())?;

    let Some(uri_host) = root.find(HostRule::UriHost, 1).and_then(|n| n.children().first()) else {
        return Err(ParseError::mismatch(HostRule::UriHost.name(), 0));
    };

    let address = match uri_host.rule() {
        HostRule::Ipv4Address => HostAddress::Ipv4(ipv4_address(&uri_host.text())?),
        HostRule::RegName => HostAddress::RegName(uri_host.text().into_owned()),
        HostRule::IpLiteral => ip_literal(uri_host)?,
        rule @ (HostRule::Host
        | HostRule::UriHost
        | HostRule::Ipv6Address
        | HostRule::IpvFuture
        | HostRule::Port) => {
            return Err(ParseError::malformed_address(uri_host.text(), format!("unexpected `{}`", rule.name())));
        }
    };

    let port = match root.find(HostRule::Port, 1) {
        Some(port) if !port.as_bytes().is_empty() => Some(port_number(&port.text())?),
        _ => None,
    };

    Ok(HostValue { address, port })
}

fn ip_literal(literal: &Node<'_, HostRule>) -> Result<HostAddress, ParseError> {
    match literal.children().first() {
        Some(inner) if inner.rule() == HostRule::IpvFuture => Ok(HostAddress::IpvFuture(inner.text().into_owned())),
        Some(inner) => Ok(HostAddress::Ipv6(ipv6_address(&inner.text())?)),
        None => Err(ParseError::malformed_address(literal.text(), "empty IP literal")),
    }
}

pub(crate) fn ipv4_address(text: &str) -> Result<Ipv4Addr, ParseError> {
    text.parse().map_err(|e| ParseError::malformed_address(text, e))
}

pub(crate) fn ipv6_address(text: &str) -> Result<Ipv6Addr, ParseError> {
    text.parse().map_err(|e| ParseError::malformed_address(text, e))
}

pub(crate) fn port_number(text: &str) -> Result<u16, ParseError> {
    text.parse().map_err(|e| ParseError::malformed_address(text, format!("invalid port: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipv6_literal_with_port() {
        let host = parse_host("[::1]:8080").unwrap();
        assert_eq!(host.address, HostAddress::Ipv6(Ipv6Addr::LOCALHOST));
        assert_eq!(host.port, Some(8080));
        assert_eq!(host.to_string(), "[::1]:8080");
    }

    #[test]
    fn reg_name_without_port() {
        let host = parse_host("example.com").unwrap();
        assert_eq!(host.address, HostAddress::RegName("example.com".to_owned()));
        assert_eq!(host.port, None);
    }

    #[test]
    fn ipv4_and_future_literals() {
        let host = parse_host(b"192.0.2.1:80").unwrap();
        assert_eq!(host.address, HostAddress::Ipv4(Ipv4Addr::new(192, 0, 2, 1)));
        assert_eq!(host.port, Some(80));

        let host = parse_host("[v1.fe80::a+en1]").unwrap();
        assert_eq!(host.address, HostAddress::IpvFuture("v1.fe80::a+en1".to_owned()));
        assert_eq!(host.address.to_uri_host(), "[v1.fe80::a+en1]");
    }

    #[test]
    fn empty_port_is_absent() {
        let host = parse_host("example.com:").unwrap();
        assert_eq!(host.port, None);
        assert_eq!(parse_host("example.com:0080").unwrap().port, Some(80));
    }

    #[test]
    fn invalid_ipv6_literal_is_malformed() {
        assert!(matches!(parse_host("[not-an-address]"), Err(ParseError::MalformedAddress { .. })));
        assert!(matches!(parse_host("[::1::2]"), Err(ParseError::MalformedAddress { .. })));
    }

    #[test]
    fn port_out_of_range_is_malformed() {
        assert!(matches!(parse_host("example.com:65536"), Err(ParseError::MalformedAddress { .. })));
    }

    #[test]
    fn grammar_mismatch() {
        assert!(matches!(parse_host("exa mple"), Err(ParseError::GrammarMismatch { rule: "host", .. })));
    }
}
