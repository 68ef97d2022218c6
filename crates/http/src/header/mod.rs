//! Typed decoders for individual header field values.
//!
//! Each decoder evaluates the value against its grammar family from [`crate::grammar`] and walks
//! the resulting tree into an owned value:
//!
//! - [`parse_connection`]: `Connection` options, case as written
//! - [`parse_content_type`]: `Content-Type` into a [`MediaType`]
//! - [`parse_user_agent`]: `User-Agent` products and comments
//! - [`parse_host`]: `Host` into a [`HostValue`]
//! - [`parse_forwarded`] / [`parse_forwarded_values`]: `Forwarded` elements, raw or resolved
//!
//! Decoders accept anything that is `AsRef<[u8]>`, so both raw header bytes and `&str` work.
//! Every decoder fails with [`ParseError::GrammarMismatch`](crate::protocol::ParseError::GrammarMismatch)
//! when the value does not match its grammar.

use std::borrow::Cow;

mod connection;
mod content_type;
mod forwarded;
mod host;
mod user_agent;

pub use connection::parse_connection;
pub use content_type::{parse_content_type, MediaType};
pub use forwarded::{
    parse_forwarded, parse_forwarded_values, parse_node, ForwardedElement, ForwardedNode, NodeIdentity, NodePort,
    ParsedForwardedElement,
};
pub use host::{parse_host, HostAddress, HostValue};
pub use user_agent::{parse_user_agent, Product, UserAgent};

/// Strips the enclosing quotes of a matched quoted-string.
///
/// Escapes inside are left as written.
fn unquote(quoted: &[u8]) -> Cow<'_, str> {
    let inner = match quoted {
        [b'"', inner @ .., b'"'] => inner,
        other => other,
    };
    String::from_utf8_lossy(inner)
}
