//! Body framing decision, RFC 9112 section 6.
//!
//! Framing headers are request-smuggling territory: a message carrying the same framing
//! header twice is rejected outright instead of picking one of the values.

use tracing::{debug, warn};

use crate::ensure;
use crate::protocol::ParseError;

/// How the body of a message is delimited.
///
/// - Known length: exactly that many bytes follow the header section
/// - Chunked: size-prefixed chunks ending with a zero-size chunk, optionally followed by trailers
/// - Empty: no body is read
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PayloadSize {
    /// Payload with known length in bytes
    Length(u64),
    /// Payload using chunked transfer encoding
    Chunked {
        /// Whether a `Trailers` header announced trailer fields after the last chunk
        trailers: bool,
    },
    /// Empty payload (no body)
    Empty,
}

impl PayloadSize {
    /// Picks the framing for a message from its decoded header fields.
    ///
    /// # Errors
    ///
    /// - [`ParseError::FramingAmbiguity`] if `Content-Length`, `Transfer-Encoding` or `Trailers`
    ///   appears more than once
    /// - [`ParseError::InvalidContentLength`] if the single `Content-Length` is not a decimal `u64`
    pub fn from_headers<I, N, V>(headers: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<str>,
        V: AsRef<str>,
    {
        let mut content_length: Option<String> = None;
        let mut transfer_encoding: Option<String> = None;
        let mut trailers = false;

        for (name, value) in headers {
            let name = name.as_ref();
            if name.eq_ignore_ascii_case("content-length") {
                ensure!(content_length.is_none(), ParseError::framing_ambiguity("Content-Length"));
                content_length = Some(value.as_ref().to_owned());
            } else if name.eq_ignore_ascii_case("transfer-encoding") {
                ensure!(transfer_encoding.is_none(), ParseError::framing_ambiguity("Transfer-Encoding"));
                transfer_encoding = Some(value.as_ref().to_owned());
            } else if name.eq_ignore_ascii_case("trailers") {
                ensure!(!trailers, ParseError::framing_ambiguity("Trailers"));
                trailers = true;
            }
        }

        let size = match (transfer_encoding, content_length) {
            (Some(te), cl) if is_chunked(&te) => {
                if cl.is_some() {
                    warn!(transfer_encoding = %te, "both transfer-encoding and content-length present, using chunked framing");
                }
                PayloadSize::Chunked { trailers }
            }
            (_, Some(cl)) => PayloadSize::Length(parse_content_length(&cl)?),
            (_, None) => PayloadSize::Empty,
        };

        debug!(?size, "resolved message framing");
        Ok(size)
    }

    /// Returns true if the payload uses chunked transfer encoding
    #[inline]
    pub fn is_chunked(&self) -> bool {
        matches!(self, PayloadSize::Chunked { .. })
    }

    /// Returns true if the payload is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, PayloadSize::Empty)
    }
}

fn parse_content_length(value: &str) -> Result<u64, ParseError> {
    let value = value.trim_matches([' ', '\t']);
    ensure!(
        !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()),
        ParseError::invalid_content_length(format!("value {value:?} is not a decimal length"))
    );
    value.parse::<u64>().map_err(|e| ParseError::invalid_content_length(format!("value {value} is not u64: {e}")))
}

/// Checks if the Transfer-Encoding value indicates chunked encoding.
///
/// According to RFC 9112, chunked must be the final coding when present.
fn is_chunked(value: &str) -> bool {
    value.rsplit(',').next().is_some_and(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn framing(headers: &[(&str, &str)]) -> Result<PayloadSize, ParseError> {
        PayloadSize::from_headers(headers.iter().copied())
    }

    #[test]
    fn check_is_chunked() {
        assert!(is_chunked("chunked"));
        assert!(is_chunked("CHUNKED"));
        assert!(is_chunked("gzip, chunked"));
        assert!(!is_chunked("chunked, gzip"));
        assert!(!is_chunked("gzip"));
    }

    #[test]
    fn picks_strategy() {
        assert_eq!(framing(&[("Host", "a")]).unwrap(), PayloadSize::Empty);
        assert_eq!(framing(&[("content-length", "42")]).unwrap(), PayloadSize::Length(42));
        assert_eq!(framing(&[("Transfer-Encoding", "Chunked")]).unwrap(), PayloadSize::Chunked { trailers: false });
        assert_eq!(
            framing(&[("Trailers", "Expires"), ("Transfer-Encoding", "chunked")]).unwrap(),
            PayloadSize::Chunked { trailers: true }
        );
        assert_eq!(framing(&[("Transfer-Encoding", "gzip")]).unwrap(), PayloadSize::Empty);
    }

    #[test]
    fn chunked_wins_over_single_content_length() {
        let size = framing(&[("Content-Length", "10"), ("Transfer-Encoding", "chunked")]).unwrap();
        assert!(size.is_chunked());
    }

    #[test]
    fn duplicated_framing_headers_are_ambiguous() {
        assert!(matches!(
            framing(&[("Content-Length", "1"), ("content-length", "1")]),
            Err(ParseError::FramingAmbiguity { header: "Content-Length" })
        ));
        assert!(matches!(
            framing(&[("Content-Length", "abc"), ("Content-Length", "2")]),
            Err(ParseError::FramingAmbiguity { header: "Content-Length" })
        ));
        assert!(matches!(
            framing(&[("Content-Length", "5"), ("Transfer-Encoding", "chunked"), ("Transfer-Encoding", "chunked")]),
            Err(ParseError::FramingAmbiguity { header: "Transfer-Encoding" })
        ));
        assert!(matches!(
            framing(&[("Trailers", "a"), ("TRAILERS", "b")]),
            Err(ParseError::FramingAmbiguity { header: "Trailers" })
        ));
    }

    #[test]
    fn invalid_content_length() {
        assert!(matches!(framing(&[("Content-Length", "+5")]), Err(ParseError::InvalidContentLength { .. })));
        assert!(matches!(framing(&[("Content-Length", "")]), Err(ParseError::InvalidContentLength { .. })));
        assert!(matches!(
            framing(&[("Content-Length", "99999999999999999999999")]),
            Err(ParseError::InvalidContentLength { .. })
        ));
    }
}
