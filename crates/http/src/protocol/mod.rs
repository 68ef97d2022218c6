//! HTTP/1.1 message model, framing policy and error types.
//!
//! # Components
//!
//! - **Start-lines** ([`start_line`]): [`StartLine`], a [`RequestLine`] or a [`StatusLine`]
//!   with its [`Version`]
//! - **Fields** ([`header`]): [`Headers`], an ordered list keeping repeated fields, and
//!   [`parse_header_section`]
//! - **Messages** ([`message`]): [`Message`], a buffered request or response
//! - **Framing** ([`payload`]): [`PayloadSize`], how the body of a message is delimited
//! - **Errors** ([`error`]): [`ParseError`], shared by every module of this crate
//!
//! # Example
//!
//! ```
//! use http_grammar::protocol::Message;
//!
//! let message = Message::parse_request("POST /form HTTP/1.1\r\nContent-Length: 3\r\n\r\na=1", false).unwrap();
//! assert_eq!(message.request_line().unwrap().target, "/form");
//! assert_eq!(message.headers().get("content-length"), Some("3"));
//! assert_eq!(&message.body()[..], b"a=1");
//! ```

pub mod error;
pub use error::ParseError;

pub mod header;
pub use header::parse_header_section;
pub use header::Headers;

pub mod message;
pub use message::Message;

pub mod payload;
pub use payload::PayloadSize;

pub mod start_line;
pub use start_line::RequestLine;
pub use start_line::StartLine;
pub use start_line::StatusLine;
pub use start_line::Version;
