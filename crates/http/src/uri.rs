//! URI decomposition.
//!
//! [`parse_uri`] splits an absolute URI into its components with [`url::Url`]. The authority
//! host goes through the same decoder as the `Host` header, so hosts come out exactly as written
//! rather than normalized. That includes `IPvFuture` literals, which `url` cannot parse itself.
//! A [`PublicSuffix`] list can split a registered name further.

use std::ops::Range;

use tracing::trace;
use url::Url;

use crate::ensure;
use crate::header::{parse_host, HostAddress, HostValue};
use crate::protocol::ParseError;

/// How a public suffix list splits a domain name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainParts {
    /// The effective TLD plus one label, `example.co.uk` for `www.example.co.uk`.
    pub registered_domain: Option<String>,
    /// Labels left of the registered domain, `www` for `www.example.co.uk`.
    pub subdomain: Option<String>,
    /// The public suffix itself, `co.uk` for `www.example.co.uk`.
    pub effective_tld: Option<String>,
}

/// A public suffix list lookup, used to decompose registered names.
pub trait PublicSuffix {
    /// Splits `domain`, or returns `None` if the list knows nothing about it.
    fn decompose(&self, domain: &str) -> Option<DomainParts>;
}

impl<F> PublicSuffix for F
where
    F: Fn(&str) -> Option<DomainParts>,
{
    fn decompose(&self, domain: &str) -> Option<DomainParts> {
        self(domain)
    }
}

/// The components of an absolute URI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedUri {
    pub scheme: String,
    /// The authority host as written, IPv6 and `IPvFuture` literals in brackets.
    pub host: Option<String>,
    pub path: String,
    pub query: Option<String>,
    pub fragment: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// The explicit port, else 80 for `http` and 443 for `https`.
    pub port: Option<u16>,

    pub registered_domain: Option<String>,
    pub subdomain: Option<String>,
    pub top_level_domain: Option<String>,
}

/// Stands in for an `IPvFuture` literal, which [`Url`] cannot parse.
const FUTURE_HOST_STAND_IN: &str = "ipvfuture.invalid";

/// Decomposes an absolute URI.
///
/// Leading and trailing spaces or controls are trimmed and tabs and line breaks are removed
/// before parsing. The three domain fields are only filled when `public_suffix` is given and the
/// host is a registered name.
///
/// # Errors
///
/// - [`ParseError::InvalidUri`] if `uri` is not an absolute URI, or names a host outside a
///   `//` authority
/// - [`ParseError::GrammarMismatch`] or [`ParseError::MalformedAddress`] if its authority host
///   is invalid
pub fn parse_uri(uri: &str, public_suffix: Option<&dyn PublicSuffix>) -> Result<ParsedUri, ParseError> {
    let uri = clean(uri);
    let authority = authority_host(&uri);
    let host = match &authority {
        Some(span) if !span.is_empty() => Some(parse_host(&uri[span.clone()])?),
        _ => None,
    };

    let url = match (&host, &authority) {
        (Some(HostValue { address: HostAddress::IpvFuture(_), .. }), Some(span)) => {
            let mut stand_in = uri.clone();
            stand_in.replace_range(span.clone(), FUTURE_HOST_STAND_IN);
            Url::parse(&stand_in)
        }
        _ => Url::parse(&uri),
    }
    .map_err(|e| ParseError::invalid_uri(format!("{uri}: {e}")))?;

    ensure!(
        host.is_some() || url.host().is_none(),
        ParseError::invalid_uri(format!("{uri}: host is not inside a \"//\" authority"))
    );

    let mut parsed = ParsedUri {
        scheme: url.scheme().to_owned(),
        path: url.path().to_owned(),
        query: url.query().map(str::to_owned),
        fragment: url.fragment().map(str::to_owned),
        username: Some(url.username()).filter(|name| !name.is_empty()).map(str::to_owned),
        password: url.password().map(str::to_owned),
        ..ParsedUri::default()
    };

    if let Some(host) = host {
        parsed.host = Some(host.address.to_uri_host());
        parsed.port = host.port;

        if let (HostAddress::RegName(name), Some(public_suffix)) = (&host.address, public_suffix)
            && let Some(parts) = public_suffix.decompose(name)
        {
            parsed.registered_domain = parts.registered_domain;
            parsed.subdomain = parts.subdomain;
            parsed.top_level_domain = parts.effective_tld;
        }
    }

    if parsed.port.is_none() {
        parsed.port = match parsed.scheme.as_str() {
            "http" => Some(80),
            "https" => Some(443),
            _ => None,
        };
    }

    trace!(?parsed, "parsed uri");
    Ok(parsed)
}

/// Applies the input cleanup [`Url::parse`] performs, so byte offsets agree with it.
fn clean(uri: &str) -> String {
    uri.trim_matches(|c: char| c <= ' ').chars().filter(|c| !matches!(c, '\t' | '\n' | '\r')).collect()
}

/// Byte range of the authority's `host [ ":" port ]`, after any user information.
///
/// `None` unless the URI has a well-formed scheme followed by `//`.
fn authority_host(uri: &str) -> Option<Range<usize>> {
    let (scheme, rest) = uri.split_once(':')?;
    let mut scheme = scheme.bytes();
    let well_formed = scheme.next().is_some_and(|b| b.is_ascii_alphabetic())
        && scheme.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.'));
    if !well_formed {
        return None;
    }

    let authority = rest.strip_prefix("//")?;
    let start = uri.len() - authority.len();
    let end = authority.find(['/', '\\', '?', '#']).map_or(uri.len(), |end| start + end);
    let host = authority[..end - start].rfind('@').map_or(start, |at| start + at + 1);
    Some(host..end)
}

/// Decodes an `application/x-www-form-urlencoded` query, keeping blank values and order.
pub fn parse_query_string(query: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(query.as_bytes()).into_owned().collect()
}
