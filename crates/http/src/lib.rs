//! An HTTP/1.1 message grammar engine.
//!
//! This crate turns raw bytes, buffered or streamed, into structured protocol values: start-lines,
//! header fields and framed bodies. It further decodes the values of `Host`, `Content-Type`,
//! `Connection`, `Forwarded` and `User-Agent` into typed structures, each by its own grammar.
//!
//! # Example
//!
//! ```
//! use http_grammar::header::{parse_forwarded_values, NodeIdentity};
//! use http_grammar::protocol::Message;
//!
//! let source = "GET / HTTP/1.1\r\nHost: example.com\r\nForwarded: for=192.0.2.60;proto=http\r\n\r\n";
//! let message = Message::parse_request(source, false).unwrap();
//!
//! let forwarded = message.headers().get("forwarded").unwrap();
//! let elements = parse_forwarded_values(forwarded).unwrap();
//! assert!(matches!(elements[0].r#for.as_ref().unwrap().identity, NodeIdentity::Ipv4(_)));
//! assert_eq!(elements[0].proto.as_deref(), Some("http"));
//! ```
//!
//! # Architecture
//!
//! - [`grammar`]: rule enums, the [`evaluate`](grammar::evaluate) entry point and the [`Node`](grammar::Node) tree
//! - [`header`]: typed decoders for individual header values
//! - [`protocol`]: start-lines, fields, buffered messages, body framing and [`ParseError`](protocol::ParseError)
//! - [`codec`]: streamed framing over an async transport, with per-read timeouts
//! - [`uri`]: URI decomposition with an optional public suffix list
//! - [`content`]: body decompression by MIME type
//!
//! # Framing
//!
//! A message carrying `Content-Length`, `Transfer-Encoding` or `Trailers` more than once is
//! rejected with [`ParseError::FramingAmbiguity`](protocol::ParseError::FramingAmbiguity) rather
//! than guessed at. When both `Transfer-Encoding: chunked` and `Content-Length` are present, chunked
//! framing wins.
//!
//! # Limitations
//!
//! - HTTP/1.x only
//! - Bodies are framed, never decoded: chunk framing and trailers are kept verbatim
//! - No message serialization beyond the `Display` form of start-lines and header values

pub mod codec;
pub mod content;
pub mod grammar;
pub mod header;
pub mod protocol;
pub mod uri;

mod utils;
pub(crate) use utils::ensure;
