//! Incremental message framing over a [`LocalTransport`].
//!
//! A [`MessageReader`] walks one message at a time through fixed steps:
//!
//! 1. [`read_start_line`](MessageReader::read_start_line): raw start-line bytes, CRLF included
//! 2. [`read_headers`](MessageReader::read_headers): raw field-lines up to and including the
//!    empty line
//! 3. [`set_headers`](MessageReader::set_headers): the decoded fields, which pick the body framing
//! 4. [`read_body_unit`](MessageReader::read_body_unit), until it returns `None`
//!
//! Body units are re-emitted verbatim. A chunked body comes out one chunk at a time with its
//! size line and trailing CRLF, so concatenating every unit reproduces the bytes on the wire.
//!
//! Any failed step leaves the reader unusable; the transport should be dropped or reset with
//! [`into_inner`](MessageReader::into_inner).

use std::mem;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures::Stream;
use tracing::{debug, trace};

use crate::codec::LocalTransport;
use crate::ensure;
use crate::protocol::{parse_header_section, Headers, ParseError, PayloadSize, StartLine};

const CRLF: &[u8] = b"\r\n";

const DEFAULT_MAX_LINE_BYTES: usize = 8 * 1024;
const DEFAULT_MAX_HEADER_BYTES: usize = 8 * 1024;

/// Size bounds applied while reading the head of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadLimits {
    /// Longest accepted start-line, CRLF included.
    pub max_line_bytes: usize,
    /// Longest accepted header section, and separately the longest trailer section.
    pub max_header_bytes: usize,
}

impl Default for ReadLimits {
    fn default() -> Self {
        Self { max_line_bytes: DEFAULT_MAX_LINE_BYTES, max_header_bytes: DEFAULT_MAX_HEADER_BYTES }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    StartLine,
    Headers,
    AwaitingHeaders,
    Body(BodyState),
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyState {
    Length(u64),
    ChunkSize { trailers: bool },
    Trailers { read: usize },
}

impl State {
    fn next_step(self) -> &'static str {
        match self {
            State::StartLine | State::Done => "read_start_line",
            State::Headers => "read_headers",
            State::AwaitingHeaders => "set_headers",
            State::Body(_) => "read_body_unit",
            State::Failed => "into_inner",
        }
    }
}

/// Reads messages from a transport step by step, each read bounded by an optional timeout.
///
/// Once a body is complete the reader accepts the start-line of the next message on the same
/// transport.
#[derive(Debug)]
pub struct MessageReader<T> {
    transport: T,
    limits: ReadLimits,
    state: State,
}

impl<T: LocalTransport> MessageReader<T> {
    pub fn new(transport: T) -> Self {
        Self::with_limits(transport, ReadLimits::default())
    }

    pub fn with_limits(transport: T, limits: ReadLimits) -> Self {
        Self { transport, limits, state: State::StartLine }
    }

    /// Reads the start-line, returned with its CRLF.
    ///
    /// # Errors
    ///
    /// - [`ParseError::TooLargeHeader`] past [`ReadLimits::max_line_bytes`]
    /// - [`ParseError::Timeout`] or an I/O error from the transport
    /// - [`ParseError::OutOfOrder`] while a message is still being read
    pub async fn read_start_line(&mut self, timeout: Option<Duration>) -> Result<Bytes, ParseError> {
        self.begin(|state| matches!(state, State::StartLine | State::Done))?;

        let line = self.transport.read_until(CRLF, self.limits.max_line_bytes, timeout).await?;

        trace!(len = line.len(), "read start-line");
        self.state = State::Headers;
        Ok(line)
    }

    /// Reads field-lines up to and including the empty line ending the header section.
    ///
    /// The timeout bounds each line separately.
    ///
    /// # Errors
    ///
    /// - [`ParseError::TooLargeHeader`] past [`ReadLimits::max_header_bytes`]
    /// - [`ParseError::Timeout`] or an I/O error from the transport
    /// - [`ParseError::OutOfOrder`] unless the start-line was just read
    pub async fn read_headers(&mut self, timeout: Option<Duration>) -> Result<Bytes, ParseError> {
        self.begin(|state| state == State::Headers)?;

        let mut section = BytesMut::new();
        loop {
            let remaining = self.limits.max_header_bytes.saturating_sub(section.len());
            let line = self.transport.read_until(CRLF, remaining, timeout).await?;

            section.extend_from_slice(&line);
            if line.as_ref() == CRLF {
                break;
            }
        }

        trace!(len = section.len(), "read header section");
        self.state = State::AwaitingHeaders;
        Ok(section.freeze())
    }

    /// Hands over the decoded header fields and returns the body framing they announce.
    ///
    /// # Errors
    ///
    /// - [`ParseError::FramingAmbiguity`] or [`ParseError::InvalidContentLength`], see
    ///   [`PayloadSize::from_headers`]
    /// - [`ParseError::OutOfOrder`] unless the header section was just read
    pub fn set_headers(&mut self, headers: &Headers) -> Result<PayloadSize, ParseError> {
        self.begin(|state| state == State::AwaitingHeaders)?;

        let payload_size = headers.payload_size()?;
        self.state = match payload_size {
            PayloadSize::Length(0) | PayloadSize::Empty => State::Done,
            PayloadSize::Length(length) => State::Body(BodyState::Length(length)),
            PayloadSize::Chunked { trailers } => State::Body(BodyState::ChunkSize { trailers }),
        };
        Ok(payload_size)
    }

    /// Runs the three head steps, decoding the start-line and the header section on the way.
    pub async fn read_head(&mut self, timeout: Option<Duration>) -> Result<(StartLine, Headers, PayloadSize), ParseError> {
        let start_line = self.read_start_line(timeout).await?;
        let section = self.read_headers(timeout).await?;

        let decoded = StartLine::parse(&start_line).and_then(|line| Ok((line, parse_header_section(&section)?)));
        let (start_line, headers) = decoded.inspect_err(|_| self.state = State::Failed)?;

        let payload_size = self.set_headers(&headers)?;
        debug!(start_line = %start_line, headers = headers.len(), ?payload_size, "read message head");
        Ok((start_line, headers, payload_size))
    }

    /// Reads the next body unit, or `None` once the body is complete.
    ///
    /// A `Content-Length` body is a single unit. A chunked body yields one unit per chunk, the
    /// last-chunk line with what follows it, then each trailer field-line and the final CRLF.
    ///
    /// # Errors
    ///
    /// - [`ParseError::InvalidBody`] for a malformed chunk size or missing chunk CRLF
    /// - [`ParseError::TooLargeHeader`] if trailers exceed [`ReadLimits::max_header_bytes`]
    /// - [`ParseError::Timeout`] or an I/O error from the transport
    /// - [`ParseError::OutOfOrder`] before [`set_headers`](Self::set_headers)
    pub async fn read_body_unit(&mut self, timeout: Option<Duration>) -> Result<Option<Bytes>, ParseError> {
        let state = self.begin(|state| matches!(state, State::Body(_) | State::Done))?;

        let (unit, next) = match state {
            State::Body(body) => self.read_body_state(body, timeout).await?,
            _ => (None, State::Done),
        };

        if let Some(unit) = &unit {
            trace!(len = unit.len(), "read body unit");
        }
        self.state = next;
        Ok(unit)
    }

    /// Turns the rest of the body into a stream of units.
    pub fn into_body_stream(self, timeout: Option<Duration>) -> impl Stream<Item = Result<Bytes, ParseError>> {
        futures::stream::try_unfold(self, move |mut reader| async move {
            Ok(reader.read_body_unit(timeout).await?.map(|unit| (unit, reader)))
        })
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Checks that the current state allows a step, then marks the reader failed until the step
    /// completes.
    fn begin(&mut self, allowed: impl FnOnce(State) -> bool) -> Result<State, ParseError> {
        ensure!(allowed(self.state), ParseError::out_of_order(self.state.next_step()));
        Ok(mem::replace(&mut self.state, State::Failed))
    }

    async fn read_body_state(
        &mut self,
        body: BodyState,
        timeout: Option<Duration>,
    ) -> Result<(Option<Bytes>, State), ParseError> {
        match body {
            BodyState::Length(length) => {
                let length = usize::try_from(length)
                    .map_err(|e| ParseError::invalid_content_length(format!("{length} does not fit in memory: {e}")))?;
                let unit = self.transport.read_exact(length, timeout).await?;
                Ok((Some(unit), State::Done))
            }

            BodyState::ChunkSize { trailers } => {
                let size_line = self.transport.read_until(CRLF, self.limits.max_line_bytes, timeout).await?;
                let size = chunk_size(&size_line)?;

                if size > 0 {
                    let Some(framed) = size.checked_add(CRLF.len()) else {
                        return Err(ParseError::invalid_body(format!("chunk size {size} is too large")));
                    };
                    let data = self.transport.read_exact(framed, timeout).await?;
                    ensure!(data.ends_with(CRLF), ParseError::invalid_body("chunk data is not followed by CRLF"));
                    let unit = concat(&size_line, &data);
                    return Ok((Some(unit), State::Body(BodyState::ChunkSize { trailers })));
                }

                let max = if trailers { self.limits.max_header_bytes } else { self.limits.max_line_bytes };
                let line = self.transport.read_until(CRLF, max, timeout).await?;
                let unit = concat(&size_line, &line);
                if line.as_ref() == CRLF {
                    trace!("read last chunk");
                    return Ok((Some(unit), State::Done));
                }

                ensure!(trailers, ParseError::invalid_body("last chunk is not followed by CRLF"));
                Ok((Some(unit), State::Body(BodyState::Trailers { read: line.len() })))
            }

            BodyState::Trailers { read } => {
                let remaining = self.limits.max_header_bytes.saturating_sub(read);
                let line = self.transport.read_until(CRLF, remaining, timeout).await?;
                let read = read + line.len();

                let next = if line.as_ref() == CRLF { State::Done } else { State::Body(BodyState::Trailers { read }) };
                Ok((Some(line), next))
            }
        }
    }
}

/// Decodes a `chunk-size [ chunk-ext ] CRLF` line.
fn chunk_size(line: &[u8]) -> Result<usize, ParseError> {
    match httparse::parse_chunk_size(line) {
        Ok(httparse::Status::Complete((consumed, size))) if consumed == line.len() => usize::try_from(size)
            .map_err(|e| ParseError::invalid_body(format!("chunk size {size} does not fit in memory: {e}"))),
        Ok(_) => Err(ParseError::invalid_body("incomplete chunk size line")),
        Err(_invalid) => Err(ParseError::invalid_body("invalid chunk size")),
    }
}

fn concat(head: &[u8], tail: &[u8]) -> Bytes {
    let mut unit = BytesMut::with_capacity(head.len() + tail.len());
    unit.extend_from_slice(head);
    unit.extend_from_slice(tail);
    unit.freeze()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bytes::Bytes;
    use futures::TryStreamExt;
    use indoc::indoc;
    use tokio::io::AsyncWriteExt;

    use super::{MessageReader, ReadLimits};
    use crate::codec::FramedTransport;
    use crate::protocol::{parse_header_section, Headers, ParseError, PayloadSize};

    fn crlf(text: &str) -> String {
        text.replace('\n', "\r\n")
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt().with_max_level(tracing::Level::TRACE).with_test_writer().try_init();
    }

    fn reader(source: &[u8]) -> MessageReader<FramedTransport<&[u8]>> {
        MessageReader::new(FramedTransport::new(source))
    }

    async fn drain<T: super::LocalTransport>(reader: &mut MessageReader<T>) -> Result<Vec<Bytes>, ParseError> {
        let mut units = vec![];
        while let Some(unit) = reader.read_body_unit(None).await? {
            units.push(unit);
        }
        Ok(units)
    }

    #[tokio::test]
    async fn chunked_units_are_verbatim() {
        let source = crlf(indoc! {r##"
        POST /wiki HTTP/1.1
        Transfer-Encoding: chunked

        4
        Wiki
        0

        "##});
        let mut reader = reader(source.as_bytes());

        assert_eq!(reader.read_start_line(None).await.unwrap(), "POST /wiki HTTP/1.1\r\n");
        let section = reader.read_headers(None).await.unwrap();
        assert_eq!(section, "Transfer-Encoding: chunked\r\n\r\n");

        let headers = parse_header_section(&section).unwrap();
        assert_eq!(reader.set_headers(&headers).unwrap(), PayloadSize::Chunked { trailers: false });

        assert_eq!(drain(&mut reader).await.unwrap(), ["4\r\nWiki\r\n", "0\r\n\r\n"]);
        assert_eq!(reader.read_body_unit(None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn chunk_extensions_are_kept() {
        let source = b"4;name=value\r\nWiki\r\n0\r\n\r\n";
        let mut reader = reader(source);
        reader.state = super::State::Body(super::BodyState::ChunkSize { trailers: false });

        assert_eq!(drain(&mut reader).await.unwrap(), ["4;name=value\r\nWiki\r\n", "0\r\n\r\n"]);
    }

    #[tokio::test]
    async fn content_length_body() {
        let source = crlf(indoc! {r##"
        POST /form HTTP/1.1
        Host: example.com
        Content-Length: 9

        a=1&b=two"##});
        let mut reader = reader(source.as_bytes());

        let (start_line, headers, payload_size) = reader.read_head(None).await.unwrap();
        assert!(start_line.is_request());
        assert_eq!(headers.get("host"), Some("example.com"));
        assert_eq!(payload_size, PayloadSize::Length(9));

        assert_eq!(drain(&mut reader).await.unwrap(), ["a=1&b=two"]);
    }

    #[tokio::test]
    async fn zero_content_length_emits_nothing() {
        let mut reader = reader(b"HTTP/1.1 204 No Content\r\nContent-Length: 0\r\n\r\n");
        let (_, _, payload_size) = reader.read_head(None).await.unwrap();
        assert_eq!(payload_size, PayloadSize::Length(0));
        assert!(drain(&mut reader).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn no_framing_headers_means_no_body() {
        let mut reader = reader(b"GET / HTTP/1.1\r\nHost: a\r\n\r\n");
        let (_, _, payload_size) = reader.read_head(None).await.unwrap();
        assert_eq!(payload_size, PayloadSize::Empty);
        assert_eq!(reader.read_body_unit(None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn trailers_follow_the_last_chunk() {
        init_tracing();
        let source = crlf(indoc! {r##"
        HTTP/1.1 200 OK
        Transfer-Encoding: chunked
        Trailers: Expires

        4
        Wiki
        0
        Expires: never

        "##});
        let mut reader = reader(source.as_bytes());
        let (_, _, payload_size) = reader.read_head(None).await.unwrap();
        assert_eq!(payload_size, PayloadSize::Chunked { trailers: true });

        let units = drain(&mut reader).await.unwrap();
        assert_eq!(units, ["4\r\nWiki\r\n", "0\r\nExpires: never\r\n", "\r\n"]);
        assert_eq!(units.concat(), b"4\r\nWiki\r\n0\r\nExpires: never\r\n\r\n");
    }

    #[tokio::test]
    async fn declared_trailers_may_be_absent() {
        let source = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nTrailers: Expires\r\n\r\n0\r\n\r\n";
        let mut reader = reader(source);
        reader.read_head(None).await.unwrap();
        assert_eq!(drain(&mut reader).await.unwrap(), ["0\r\n\r\n"]);
    }

    #[tokio::test]
    async fn chunk_data_without_crlf() {
        let source = b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWikiXY0\r\n\r\n";
        let mut reader = reader(source);
        reader.read_head(None).await.unwrap();
        assert!(matches!(reader.read_body_unit(None).await, Err(ParseError::InvalidBody { .. })));
    }

    #[tokio::test]
    async fn data_after_last_chunk_without_trailers() {
        let source = b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n0\r\nExpires: never\r\n\r\n";
        let mut reader = reader(source);
        reader.read_head(None).await.unwrap();
        assert!(matches!(reader.read_body_unit(None).await, Err(ParseError::InvalidBody { .. })));
    }

    #[tokio::test]
    async fn invalid_chunk_size() {
        let source = b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\nzz\r\n";
        let mut reader = reader(source);
        reader.read_head(None).await.unwrap();
        assert!(matches!(reader.read_body_unit(None).await, Err(ParseError::InvalidBody { .. })));
    }

    #[tokio::test]
    async fn oversized_chunk_sizes_fail_cleanly() {
        for size in ["FFFFFFFFFFFFFFFF", "7FFFFFFFFFFFFFFF"] {
            let source = format!("POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n{size}\r\nab");
            let mut reader = reader(source.as_bytes());
            reader.read_head(None).await.unwrap();
            assert!(matches!(reader.read_body_unit(None).await, Err(ParseError::InvalidBody { .. })), "{size}");
        }

        let source = b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\nFFFFFFFFFFFFFFF\r\nab";
        let mut reader = reader(source);
        reader.read_head(None).await.unwrap();
        let error = reader.read_body_unit(None).await.unwrap_err();
        assert!(error.is_eof(), "{error}");
    }

    #[tokio::test]
    async fn oversized_content_length_fails_cleanly() {
        let mut reader = reader(b"POST / HTTP/1.1\r\nContent-Length: 9223372036854775800\r\n\r\nab");
        let (_, _, payload_size) = reader.read_head(None).await.unwrap();
        assert_eq!(payload_size, PayloadSize::Length(9_223_372_036_854_775_800));

        let error = reader.read_body_unit(None).await.unwrap_err();
        assert!(error.is_eof() || matches!(error, ParseError::InvalidContentLength { .. }), "{error}");
    }

    #[tokio::test]
    async fn ambiguous_framing() {
        init_tracing();
        let mut reader = reader(b"POST / HTTP/1.1\r\nContent-Length: 1\r\nContent-Length: 2\r\n\r\na");
        reader.read_start_line(None).await.unwrap();
        let headers = parse_header_section(&reader.read_headers(None).await.unwrap()).unwrap();
        assert!(matches!(
            reader.set_headers(&headers),
            Err(ParseError::FramingAmbiguity { header: "Content-Length" })
        ));
    }

    #[tokio::test]
    async fn steps_out_of_order() {
        let mut reader = reader(b"GET / HTTP/1.1\r\n\r\n");
        assert!(matches!(
            reader.read_body_unit(None).await,
            Err(ParseError::OutOfOrder { expected: "read_start_line" })
        ));
        assert!(matches!(
            reader.set_headers(&Headers::new()),
            Err(ParseError::OutOfOrder { expected: "read_start_line" })
        ));

        reader.read_start_line(None).await.unwrap();
        assert!(matches!(
            reader.read_start_line(None).await,
            Err(ParseError::OutOfOrder { expected: "read_headers" })
        ));
    }

    #[tokio::test]
    async fn timeout_is_distinct_and_fatal() {
        init_tracing();
        let (mut client, server) = tokio::io::duplex(64);
        let mut reader = MessageReader::new(FramedTransport::new(server));

        client.write_all(b"GET / HT").await.unwrap();
        let error = reader.read_start_line(Some(Duration::from_millis(20))).await.unwrap_err();
        assert!(error.is_timeout(), "{error}");
        assert!(!error.is_eof());

        assert!(matches!(
            reader.read_start_line(None).await,
            Err(ParseError::OutOfOrder { expected: "into_inner" })
        ));
    }

    #[tokio::test]
    async fn end_of_stream_in_headers() {
        let mut reader = reader(b"GET / HTTP/1.1\r\nHost: a\r\n");
        reader.read_start_line(None).await.unwrap();
        let error = reader.read_headers(None).await.unwrap_err();
        assert!(error.is_eof(), "{error}");
        assert!(!error.is_timeout());
    }

    #[tokio::test]
    async fn head_limits() {
        let limits = ReadLimits { max_line_bytes: 16, ..ReadLimits::default() };
        let mut reader = MessageReader::with_limits(FramedTransport::new(&b"GET /a-long-target HTTP/1.1\r\n\r\n"[..]), limits);
        assert!(matches!(reader.read_start_line(None).await, Err(ParseError::TooLargeHeader { .. })));

        let endless = vec![b'a'; 64 * 1024];
        let mut reader = MessageReader::with_limits(FramedTransport::new(&endless[..]), limits);
        assert!(matches!(
            reader.read_start_line(None).await,
            Err(ParseError::TooLargeHeader { max_size: 16, .. })
        ));

        let limits = ReadLimits { max_header_bytes: 20, ..ReadLimits::default() };
        let source = b"GET / HTTP/1.1\r\nA: 1234567890\r\nB: 1234567890\r\n\r\n";
        let mut reader = MessageReader::with_limits(FramedTransport::new(&source[..]), limits);
        reader.read_start_line(None).await.unwrap();
        assert!(matches!(reader.read_headers(None).await, Err(ParseError::TooLargeHeader { .. })));
    }

    #[tokio::test]
    async fn body_stream_and_next_message() {
        let source = crlf(indoc! {r##"
        POST /a HTTP/1.1
        Transfer-Encoding: gzip, chunked

        3
        abc
        2
        de
        0

        GET /b HTTP/1.1

        "##});
        let mut reader = reader(source.as_bytes());
        reader.read_head(None).await.unwrap();

        let mut units = vec![];
        while let Some(unit) = reader.read_body_unit(None).await.unwrap() {
            units.push(unit);
        }
        assert_eq!(units, ["3\r\nabc\r\n", "2\r\nde\r\n", "0\r\n\r\n"]);

        let (start_line, _, payload_size) = reader.read_head(None).await.unwrap();
        assert_eq!(start_line.to_string(), "GET /b HTTP/1.1");
        assert_eq!(payload_size, PayloadSize::Empty);

        let mut reader = self::reader(b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n1\r\na\r\n0\r\n\r\n");
        reader.read_head(None).await.unwrap();
        let units: Vec<Bytes> = reader.into_body_stream(None).try_collect().await.unwrap();
        assert_eq!(units, ["1\r\na\r\n", "0\r\n\r\n"]);
    }
}
