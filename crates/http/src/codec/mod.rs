//! Streamed message framing.
//!
//! Where [`Message::parse`](crate::protocol::Message::parse) needs the whole message in memory,
//! this module reads it incrementally from a live source, each read bounded by its own timeout.
//!
//! # Architecture
//!
//! - [`LocalTransport`] / [`Transport`]: the two sequenced reads the framer needs
//! - [`FramedTransport`]: a transport over any [`AsyncRead`](tokio::io::AsyncRead)
//! - [`MessageReader`]: start-line, header section, then body units
//!
//! # Example
//!
//! ```
//! use http_grammar::codec::{FramedTransport, MessageReader};
//!
//! # tokio_test();
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn tokio_test() {
//! let source = &b"POST /upload HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWiki\r\n0\r\n\r\n"[..];
//! let mut reader = MessageReader::new(FramedTransport::new(source));
//!
//! let (start_line, _headers, payload_size) = reader.read_head(None).await.unwrap();
//! assert!(start_line.is_request());
//! assert!(payload_size.is_chunked());
//!
//! assert_eq!(reader.read_body_unit(None).await.unwrap().unwrap(), "4\r\nWiki\r\n");
//! assert_eq!(reader.read_body_unit(None).await.unwrap().unwrap(), "0\r\n\r\n");
//! assert_eq!(reader.read_body_unit(None).await.unwrap(), None);
//! # }
//! ```

mod reader;
mod transport;

pub use reader::MessageReader;
pub use reader::ReadLimits;
pub use transport::FramedTransport;
pub use transport::LocalTransport;
pub use transport::Transport;
