//! The byte source a [`MessageReader`](crate::codec::MessageReader) pulls from.
//!
//! A transport offers two sequenced reads, each bounded by an optional deadline:
//!
//! - `read_until`: up to and including a delimiter, at most `max` bytes
//! - `read_exact`: exactly `n` bytes
//!
//! An expired deadline fails with [`ParseError::Timeout`]; end-of-stream in the middle of a read
//! fails with an [`io::ErrorKind::UnexpectedEof`](std::io::ErrorKind::UnexpectedEof) I/O error.
//! The two are never conflated.
//!
//! [`FramedTransport`] adapts any [`AsyncRead`] through [`FramedRead`]. Bytes already buffered
//! stay buffered across reads, so a timed-out read loses nothing that a later read could use.

use std::future::Future;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::codec::{Decoder, FramedRead};
use tracing::trace;

use crate::ensure;
use crate::protocol::ParseError;

/// Initial read buffer size of a [`FramedTransport`], and the most an exact read reserves ahead.
const DEFAULT_CAPACITY: usize = 8 * 1024;

#[allow(async_fn_in_trait, reason = "the Send-bound variant is generated as `Transport`")]
#[trait_variant::make(Transport: Send)]
pub trait LocalTransport {
    /// Reads up to and including the first occurrence of `delimiter`.
    ///
    /// Fails with [`ParseError::TooLargeHeader`] as soon as the result would exceed `max` bytes.
    async fn read_until(&mut self, delimiter: &[u8], max: usize, timeout: Option<Duration>) -> Result<Bytes, ParseError>;

    /// Reads exactly `n` bytes.
    async fn read_exact(&mut self, n: usize, timeout: Option<Duration>) -> Result<Bytes, ParseError>;
}

/// A [`Transport`] over any [`AsyncRead`].
#[derive(Debug)]
pub struct FramedTransport<R> {
    framed: FramedRead<R, ReadCodec>,
}

impl<R: AsyncRead> FramedTransport<R> {
    pub fn new(reader: R) -> Self {
        Self::with_capacity(reader, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self { framed: FramedRead::with_capacity(reader, ReadCodec::default(), capacity) }
    }

    /// Returns the reader and the bytes read from it that no read has consumed yet.
    pub fn into_parts(self) -> (R, BytesMut) {
        let parts = self.framed.into_parts();
        (parts.io, parts.read_buf)
    }
}

impl<R> Transport for FramedTransport<R>
where
    R: AsyncRead + Unpin + Send,
{
    async fn read_until(&mut self, delimiter: &[u8], max: usize, timeout: Option<Duration>) -> Result<Bytes, ParseError> {
        self.framed.decoder_mut().want = Want::Until { delimiter: Bytes::copy_from_slice(delimiter), max };
        self.next_frame(timeout).await
    }

    async fn read_exact(&mut self, n: usize, timeout: Option<Duration>) -> Result<Bytes, ParseError> {
        self.framed.decoder_mut().want = Want::Exact(n);
        self.next_frame(timeout).await
    }
}

impl<R: AsyncRead + Unpin> FramedTransport<R> {
    async fn next_frame(&mut self, timeout: Option<Duration>) -> Result<Bytes, ParseError> {
        match with_deadline(timeout, self.framed.next()).await? {
            Some(frame) => frame,
            None => Err(ParseError::unexpected_eof()),
        }
    }
}

/// Runs `future`, failing with [`ParseError::Timeout`] once `timeout` has passed.
pub(crate) async fn with_deadline<F: Future>(timeout: Option<Duration>, future: F) -> Result<F::Output, ParseError> {
    match timeout {
        Some(timeout) => tokio::time::timeout(timeout, future).await.map_err(|_elapsed| {
            trace!(?timeout, "read deadline expired");
            ParseError::timeout(timeout)
        }),
        None => Ok(future.await),
    }
}

#[derive(Debug, Default)]
enum Want {
    Until { delimiter: Bytes, max: usize },
    Exact(usize),
    #[default]
    Nothing,
}

/// Splits whatever the next read asked for off the front of the buffer.
#[derive(Debug, Default)]
struct ReadCodec {
    want: Want,
}

impl Decoder for ReadCodec {
    type Item = Bytes;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match &self.want {
            Want::Until { delimiter, .. } if delimiter.is_empty() => {
                self.want = Want::Nothing;
                Ok(Some(Bytes::new()))
            }
            Want::Until { delimiter, max } => {
                let max = *max;
                let Some(index) = src.windows(delimiter.len()).position(|window| window == delimiter.as_ref()) else {
                    // a frame found later is at least one byte longer than what is buffered
                    ensure!(src.len() < max, ParseError::too_large_header(src.len() + 1, max));
                    return Ok(None);
                };
                let size = index + delimiter.len();
                ensure!(size <= max, ParseError::too_large_header(size, max));

                let frame = src.split_to(size).freeze();
                self.want = Want::Nothing;
                Ok(Some(frame))
            }
            Want::Exact(n) => {
                let n = *n;
                if src.len() < n {
                    src.reserve((n - src.len()).min(DEFAULT_CAPACITY));
                    return Ok(None);
                }
                self.want = Want::Nothing;
                Ok(Some(src.split_to(n).freeze()))
            }
            Want::Nothing => Ok(None),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() => Ok(None),
            None => Err(ParseError::unexpected_eof()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::AsyncWriteExt;

    use super::{FramedTransport, Transport};
    use crate::protocol::ParseError;

    const LINE: usize = 1024;

    #[tokio::test]
    async fn delimited_then_exact() {
        let mut transport = FramedTransport::new(&b"line one\r\nline two\r\nabc"[..]);
        assert_eq!(transport.read_until(b"\r\n", LINE, None).await.unwrap(), "line one\r\n");
        assert_eq!(transport.read_exact(4, None).await.unwrap(), "line");
        assert_eq!(transport.read_until(b"\r\n", LINE, None).await.unwrap(), " two\r\n");
        assert_eq!(transport.read_exact(3, None).await.unwrap(), "abc");
    }

    #[tokio::test]
    async fn end_of_stream_mid_read() {
        let mut transport = FramedTransport::new(&b"no delimiter"[..]);
        let error = transport.read_until(b"\r\n", LINE, None).await.unwrap_err();
        assert!(error.is_eof(), "{error}");

        let mut transport = FramedTransport::new(&b"ab"[..]);
        assert!(transport.read_exact(3, None).await.unwrap_err().is_eof());
    }

    #[tokio::test]
    async fn huge_exact_read_waits_for_bytes_instead_of_allocating() {
        let mut transport = FramedTransport::new(&b"ab"[..]);
        let error = transport.read_exact(usize::MAX, None).await.unwrap_err();
        assert!(error.is_eof(), "{error}");

        let mut transport = FramedTransport::new(&b"ab"[..]);
        assert!(transport.read_exact(usize::MAX / 2, None).await.unwrap_err().is_eof());
    }

    #[tokio::test]
    async fn deadline_expires_and_keeps_buffered_bytes() {
        let (mut client, server) = tokio::io::duplex(64);
        let mut transport = FramedTransport::new(server);

        client.write_all(b"partial").await.unwrap();
        let error = transport.read_until(b"\r\n", LINE, Some(Duration::from_millis(20))).await.unwrap_err();
        assert!(error.is_timeout());

        client.write_all(b" line\r\n").await.unwrap();
        let line = transport.read_until(b"\r\n", LINE, Some(Duration::from_secs(5))).await.unwrap();
        assert_eq!(line, "partial line\r\n");
    }

    #[tokio::test]
    async fn delimited_read_is_bounded() {
        let mut transport = FramedTransport::new(&b"12345678\r\n"[..]);
        assert_eq!(transport.read_until(b"\r\n", 10, None).await.unwrap(), "12345678\r\n");

        let mut transport = FramedTransport::new(&b"123456789\r\n"[..]);
        assert!(matches!(
            transport.read_until(b"\r\n", 10, None).await,
            Err(ParseError::TooLargeHeader { current_size: 11, max_size: 10 })
        ));

        let source = vec![b'a'; 64 * 1024];
        let mut transport = FramedTransport::new(&source[..]);
        assert!(matches!(
            transport.read_until(b"\r\n", 16, None).await,
            Err(ParseError::TooLargeHeader { max_size: 16, .. })
        ));
    }
}
