//! Grammar evaluation layer.
//!
//! Every syntactic unit this crate understands is a named rule of a closed enum, one enum per
//! grammar family:
//!
//! - [`HostRule`]: `Host` / URI authority host with optional port (RFC 3986, RFC 9110)
//! - [`MessageRule`]: start-line, field-lines, message body and chunked framing (RFC 9112)
//! - [`ContentTypeRule`]: media type with parameters (RFC 9110)
//! - [`ConnectionRule`]: connection options (RFC 9110)
//! - [`UserAgentRule`]: products and comments (RFC 9110)
//! - [`ForwardedRule`]: forwarded elements and the `node` sub-grammar (RFC 7239)
//!
//! [`evaluate`] matches a rule against a whole input and yields a tree of [`Node`]s; the header
//! decoders and the message model walk that tree with exhaustive matches over the rule enum.
//!
//! # Example
//!
//! ```
//! use http_grammar::grammar::{evaluate, ConnectionRule};
//!
//! let root = evaluate(ConnectionRule::Connection, b"keep-alive, Upgrade").unwrap();
//! let options: Vec<_> = root.search(&[ConnectionRule::ConnectionOption], Some(1)).iter().map(|n| n.text()).collect();
//! assert_eq!(options, ["keep-alive", "Upgrade"]);
//! ```

use std::fmt::Debug;

use tracing::trace;

use crate::protocol::ParseError;

pub(crate) mod chars;
mod connection;
mod content_type;
mod forwarded;
mod host;
mod input;
mod message;
mod node;
mod user_agent;

pub use connection::ConnectionRule;
pub use content_type::ContentTypeRule;
pub use forwarded::ForwardedRule;
pub use host::HostRule;
pub use input::Input;
pub use message::MessageRule;
pub(crate) use message::field_pair;
pub use node::Node;
pub use user_agent::UserAgentRule;

/// A named production of one grammar family.
pub trait Rule: Copy + Eq + Debug {
    /// The ABNF name of this rule.
    fn name(self) -> &'static str;

    /// Matches this rule's definition at the input cursor.
    ///
    /// Implementations consume input only through [`Input`] combinators, which rewind on
    /// failure; they never record their own node, [`Input::rule`] does that.
    fn matches(self, input: &mut Input<'_, Self>) -> bool;
}

/// Matches `rule` against the whole of `source`.
///
/// Bytes left unconsumed by the rule are a mismatch.
pub fn evaluate<R: Rule>(rule: R, source: &[u8]) -> Result<Node<'_, R>, ParseError> {
    evaluate_inner(rule, source, true)
}

/// Matches `rule` against a prefix of `source`, leaving trailing input unmatched.
pub fn evaluate_prefix<R: Rule>(rule: R, source: &[u8]) -> Result<Node<'_, R>, ParseError> {
    evaluate_inner(rule, source, false)
}

fn evaluate_inner<R: Rule>(rule: R, source: &[u8], whole: bool) -> Result<Node<'_, R>, ParseError> {
    let mut input = Input::new(source);
    let matched = input.rule(rule);
    let complete = !whole || input.is_eof();
    let offset = input.furthest();

    match input.finish() {
        (_, Some(fatal)) => Err(fatal),
        (Some(node), None) if matched && complete => Ok(node),
        _ => {
            trace!(rule = rule.name(), offset, len = source.len(), "grammar mismatch");
            Err(ParseError::mismatch(rule.name(), offset))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_input_required() {
        assert!(evaluate(ConnectionRule::Connection, b"close").is_ok());
        assert!(matches!(
            evaluate(ConnectionRule::Connection, b"close;"),
            Err(ParseError::GrammarMismatch { rule: "Connection", offset: 5 })
        ));
    }

    #[test]
    fn prefix_allows_trailing_input() {
        let node = evaluate_prefix(ConnectionRule::Connection, b"close;rest").unwrap();
        assert_eq!(node.as_bytes(), b"close");
        assert_eq!(node.span(), 0..5);
    }

    #[test]
    fn empty_input_is_a_mismatch_for_required_rules() {
        assert!(matches!(
            evaluate(ConnectionRule::Connection, b""),
            Err(ParseError::GrammarMismatch { rule: "Connection", offset: 0 })
        ));
    }
}
