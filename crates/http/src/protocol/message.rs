//! Buffered HTTP messages.
//!
//! [`Message::parse`] evaluates a complete buffer against `HTTP-message` and keeps, in source
//! order, the start-line, every field-line and the body bytes. How many bytes belong to the body
//! is decided by the field-lines before it, see [`PayloadSize`](crate::protocol::PayloadSize).
//!
//! The body is kept verbatim: a chunked body still carries its chunk framing and trailers.

use bytes::Bytes;
use tracing::debug;

use crate::grammar::{evaluate, field_pair, MessageRule};
use crate::protocol::{Headers, ParseError, RequestLine, StartLine, StatusLine};

/// A request or a response, told apart by its [`StartLine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    start_line: StartLine,
    headers: Headers,
    body: Bytes,
    raw: Option<Bytes>,
}

impl Message {
    /// Parses a complete message. With `store_raw`, the whole source is kept as [`Message::raw`].
    ///
    /// # Errors
    ///
    /// - [`ParseError::GrammarMismatch`] if the buffer is not exactly one `HTTP-message`
    /// - [`ParseError::FramingAmbiguity`] or [`ParseError::InvalidContentLength`] if the framing
    ///   fields cannot decide the body length
    pub fn parse<B: Into<Bytes>>(source: B, store_raw: bool) -> Result<Self, ParseError> {
        let source = source.into();
        let root = evaluate(MessageRule::HttpMessage, &source)?;

        let mut start_line = None;
        let mut headers = Headers::new();
        let mut body = Bytes::new();

        for node in root.search(&[MessageRule::StartLine, MessageRule::FieldLine, MessageRule::MessageBody], Some(1)) {
            match node.rule() {
                MessageRule::StartLine => start_line = Some(StartLine::from_node(node)?),
                MessageRule::FieldLine => {
                    if let Some((name, value)) = field_pair(node) {
                        headers.push(name, value);
                    }
                }
                MessageRule::MessageBody => body = source.slice(node.span()),
                _ => {}
            }
        }

        let Some(start_line) = start_line else {
            return Err(ParseError::mismatch("start-line", 0));
        };

        debug!(start_line = %start_line, headers = headers.len(), body = body.len(), "parsed message");
        Ok(Message { start_line, headers, body, raw: store_raw.then(|| source.clone()) })
    }

    /// Parses a complete message that must be a request.
    ///
    /// # Errors
    ///
    /// Those of [`Message::parse`], and [`ParseError::TypeMismatch`] for a response.
    pub fn parse_request<B: Into<Bytes>>(source: B, store_raw: bool) -> Result<Self, ParseError> {
        Self::parse(source, store_raw)?.expect_kind("request")
    }

    /// Parses a complete message that must be a response.
    ///
    /// # Errors
    ///
    /// Those of [`Message::parse`], and [`ParseError::TypeMismatch`] for a request.
    pub fn parse_response<B: Into<Bytes>>(source: B, store_raw: bool) -> Result<Self, ParseError> {
        Self::parse(source, store_raw)?.expect_kind("response")
    }

    fn expect_kind(self, expected: &'static str) -> Result<Self, ParseError> {
        let found = self.start_line.kind();
        if found == expected { Ok(self) } else { Err(ParseError::type_mismatch(expected, found)) }
    }

    #[inline]
    pub fn start_line(&self) -> &StartLine {
        &self.start_line
    }

    #[inline]
    pub fn is_request(&self) -> bool {
        self.start_line.is_request()
    }

    pub fn request_line(&self) -> Option<&RequestLine> {
        match &self.start_line {
            StartLine::Request(line) => Some(line),
            StartLine::Status(_) => None,
        }
    }

    pub fn status_line(&self) -> Option<&StatusLine> {
        match &self.start_line {
            StartLine::Status(line) => Some(line),
            StartLine::Request(_) => None,
        }
    }

    #[inline]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// The message-body as received.
    #[inline]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The full source, when parsed with `store_raw`.
    #[inline]
    pub fn raw(&self) -> Option<&Bytes> {
        self.raw.as_ref()
    }

    pub fn into_parts(self) -> (StartLine, Headers, Bytes) {
        (self.start_line, self.headers, self.body)
    }
}
