//! Body transforms selected by MIME type.
//!
//! Only decompression is provided: [`decompress_body`] undoes `application/gzip` and
//! `application/zstd` bodies and leaves every other type alone.

use std::io::Write;

use bytes::{BufMut, Bytes, BytesMut};
use flate2::write::GzDecoder;
use mime::Mime;
use tracing::trace;
use zstd::stream::write::Decoder as ZstdDecoder;

use crate::protocol::ParseError;

/// Turns a message body into another representation of it.
pub trait BodyTransform {
    fn transform(&self, body: &[u8]) -> Result<Bytes, ParseError>;
}

/// The compression formats a body can be restored from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decompression {
    Gzip,
    Zstd,
}

impl Decompression {
    /// Picks the format for a MIME type, ignoring its parameters.
    pub fn from_mime_type(mime_type: &str) -> Option<Self> {
        let mime: Mime = mime_type.trim().parse().ok()?;
        match (mime.type_().as_str(), mime.subtype().as_str()) {
            ("application", "gzip" | "x-gzip") => Some(Self::Gzip),
            ("application", "zstd") => Some(Self::Zstd),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Decompression::Gzip => "gzip",
            Decompression::Zstd => "zstd",
        }
    }
}

impl BodyTransform for Decompression {
    fn transform(&self, body: &[u8]) -> Result<Bytes, ParseError> {
        let writer = BytesMut::with_capacity(body.len()).writer();

        let result = match self {
            Decompression::Gzip => {
                let mut decoder = GzDecoder::new(writer);
                decoder.write_all(body).and_then(|()| decoder.finish())
            }
            Decompression::Zstd => ZstdDecoder::new(writer).and_then(|mut decoder| {
                decoder.write_all(body)?;
                decoder.flush()?;
                Ok(decoder.into_inner())
            }),
        };

        match result {
            Ok(writer) => {
                let decoded = writer.into_inner().freeze();
                trace!(encoding = self.name(), from = body.len(), to = decoded.len(), "decompressed body");
                Ok(decoded)
            }
            Err(e) => Err(ParseError::invalid_body(format!("{} decompression failed: {e}", self.name()))),
        }
    }
}

/// Decompresses `body` according to `mime_type`.
///
/// Returns `None` for MIME types that are not a supported compression format.
///
/// # Errors
///
/// [`ParseError::InvalidBody`] if the body is not valid data of that format.
pub fn decompress_body<B: AsRef<[u8]>>(body: B, mime_type: &str) -> Result<Option<Bytes>, ParseError> {
    Decompression::from_mime_type(mime_type).map(|decompression| decompression.transform(body.as_ref())).transpose()
}
