//! Request-line and status-line, RFC 9112 sections 3 and 4.
//!
//! A [`StartLine`] decides which kind of message it opens. Every type here renders back to its
//! wire form with [`Display`](fmt::Display), and parsing the rendered text yields an equal value.

use std::fmt;

use http::{Method, StatusCode};

use crate::grammar::{evaluate, MessageRule, Node, Rule};
use crate::protocol::ParseError;

/// `HTTP-version = "HTTP" "/" DIGIT "." DIGIT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Version {
    pub const HTTP_10: Version = Version { major: 1, minor: 0 };
    pub const HTTP_11: Version = Version { major: 1, minor: 1 };

    /// The matching [`http::Version`], for the versions that crate names.
    pub fn to_http(self) -> Option<http::Version> {
        match (self.major, self.minor) {
            (0, 9) => Some(http::Version::HTTP_09),
            (1, 0) => Some(http::Version::HTTP_10),
            (1, 1) => Some(http::Version::HTTP_11),
            (2, 0) => Some(http::Version::HTTP_2),
            (3, 0) => Some(http::Version::HTTP_3),
            _ => None,
        }
    }

    fn from_node(node: &Node<'_, MessageRule>) -> Result<Self, ParseError> {
        match node.as_bytes() {
            [b'H', b'T', b'T', b'P', b'/', major @ b'0'..=b'9', b'.', minor @ b'0'..=b'9'] => {
                Ok(Version { major: major - b'0', minor: minor - b'0' })
            }
            _ => Err(ParseError::mismatch(MessageRule::HttpVersion.name(), node.span().start)),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP/{}.{}", self.major, self.minor)
    }
}

/// `request-line = method SP request-target SP HTTP-version`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: Method,
    /// The request-target as written, not normalized. `obs-text` bytes that are not valid UTF-8
    /// are replaced with U+FFFD, so only a UTF-8 target renders back to its original bytes.
    pub target: String,
    pub version: Version,
}

/// `status-line = HTTP-version SP status-code SP [ reason-phrase ]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub version: Version,
    pub status: StatusCode,
    /// Possibly empty. Decoded like [`RequestLine::target`].
    pub reason: String,
}

/// The first line of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartLine {
    Request(RequestLine),
    Status(StatusLine),
}

impl StartLine {
    /// Parses a start-line, with or without its terminating CRLF.
    pub fn parse(line: &[u8]) -> Result<Self, ParseError> {
        let line = line.strip_suffix(b"\r\n").unwrap_or(line);
        let root = evaluate(MessageRule::StartLine, line)?;
        Self::from_node(&root)
    }

    #[inline]
    pub fn is_request(&self) -> bool {
        matches!(self, StartLine::Request(_))
    }

    #[inline]
    pub fn version(&self) -> Version {
        match self {
            StartLine::Request(line) => line.version,
            StartLine::Status(line) => line.version,
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            StartLine::Request(_) => "request",
            StartLine::Status(_) => "response",
        }
    }

    /// Builds the start-line from a `start-line` node.
    pub(crate) fn from_node(node: &Node<'_, MessageRule>) -> Result<Self, ParseError> {
        let Some(line) = node.children().first() else {
            return Err(ParseError::mismatch(MessageRule::StartLine.name(), node.span().start));
        };

        match line.rule() {
            MessageRule::RequestLine => RequestLine::from_node(line).map(StartLine::Request),
            MessageRule::StatusLine => StatusLine::from_node(line).map(StartLine::Status),
            rule => Err(ParseError::mismatch(rule.name(), line.span().start)),
        }
    }
}

impl RequestLine {
    /// Parses a request-line, with or without its terminating CRLF.
    ///
    /// # Errors
    ///
    /// [`ParseError::TypeMismatch`] if the line is a status-line.
    pub fn parse(line: &[u8]) -> Result<Self, ParseError> {
        match StartLine::parse(line)? {
            StartLine::Request(line) => Ok(line),
            StartLine::Status(_) => Err(ParseError::type_mismatch("request-line", "status-line")),
        }
    }

    fn from_node(node: &Node<'_, MessageRule>) -> Result<Self, ParseError> {
        let (Some(method), Some(target), Some(version)) = (
            node.find(MessageRule::Method, 1),
            node.find(MessageRule::RequestTarget, 1),
            node.find(MessageRule::HttpVersion, 1),
        ) else {
            return Err(ParseError::mismatch(MessageRule::RequestLine.name(), node.span().start));
        };

        let method = Method::from_bytes(method.as_bytes())
            .map_err(|_e| ParseError::mismatch(MessageRule::Method.name(), method.span().start))?;

        Ok(RequestLine { method, target: target.text().into_owned(), version: Version::from_node(version)? })
    }
}

impl StatusLine {
    /// Parses a status-line, with or without its terminating CRLF.
    ///
    /// # Errors
    ///
    /// [`ParseError::TypeMismatch`] if the line is a request-line.
    pub fn parse(line: &[u8]) -> Result<Self, ParseError> {
        match StartLine::parse(line)? {
            StartLine::Status(line) => Ok(line),
            StartLine::Request(_) => Err(ParseError::type_mismatch("status-line", "request-line")),
        }
    }

    fn from_node(node: &Node<'_, MessageRule>) -> Result<Self, ParseError> {
        let (Some(version), Some(status)) =
            (node.find(MessageRule::HttpVersion, 1), node.find(MessageRule::StatusCode, 1))
        else {
            return Err(ParseError::mismatch(MessageRule::StatusLine.name(), node.span().start));
        };

        let status = StatusCode::from_bytes(status.as_bytes())
            .map_err(|_e| ParseError::mismatch(MessageRule::StatusCode.name(), status.span().start))?;
        let reason = node.find(MessageRule::ReasonPhrase, 1).map(|n| n.text().into_owned()).unwrap_or_default();

        Ok(StatusLine { version: Version::from_node(version)?, status, reason })
    }
}

impl fmt::Display for RequestLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.method, self.target, self.version)
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.version, self.status.as_str(), self.reason)
    }
}

impl fmt::Display for StartLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartLine::Request(line) => fmt::Display::fmt(line, f),
            StartLine::Status(line) => fmt::Display::fmt(line, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_line() {
        let line = RequestLine::parse(b"GET /index.html?a=1 HTTP/1.1\r\n").unwrap();
        assert_eq!(line.method, Method::GET);
        assert_eq!(line.target, "/index.html?a=1");
        assert_eq!(line.version, Version::HTTP_11);
        assert_eq!(line.version.to_http(), Some(http::Version::HTTP_11));
    }

    #[test]
    fn status_line() {
        let line = StatusLine::parse(b"HTTP/1.0 404 Not Found").unwrap();
        assert_eq!(line.version, Version::HTTP_10);
        assert_eq!(line.status, StatusCode::NOT_FOUND);
        assert_eq!(line.reason, "Not Found");

        let line = StatusLine::parse(b"HTTP/1.1 204").unwrap();
        assert_eq!(line.reason, "");
    }

    #[test]
    fn extension_method_is_kept() {
        let line = RequestLine::parse(b"PURGE * HTTP/1.1").unwrap();
        assert_eq!(line.method.as_str(), "PURGE");
        assert_eq!(line.target, "*");
    }

    #[test]
    fn render_then_parse_is_identity() {
        let lines = [
            "GET / HTTP/1.1",
            "OPTIONS * HTTP/1.0",
            "CONNECT example.com:443 HTTP/1.1",
            "HTTP/1.1 200 OK",
            "HTTP/1.1 500 Internal Server Error",
            "HTTP/2.0 101 ",
        ];
        for source in lines {
            let parsed = StartLine::parse(source.as_bytes()).unwrap();
            assert_eq!(StartLine::parse(parsed.to_string().as_bytes()).unwrap(), parsed, "{source}");
        }

        let status = StartLine::parse(b"HTTP/1.1 204").unwrap();
        assert_eq!(StartLine::parse(status.to_string().as_bytes()).unwrap(), status);
    }

    #[test]
    fn obs_text_is_decoded_as_utf8() {
        let line = StartLine::parse("GET /caf\u{e9} HTTP/1.1".as_bytes()).unwrap();
        assert_eq!(line.to_string(), "GET /caf\u{e9} HTTP/1.1");
        assert_eq!(StartLine::parse(line.to_string().as_bytes()).unwrap(), line);

        let line = RequestLine::parse(b"GET /caf\xE9 HTTP/1.1").unwrap();
        assert_eq!(line.target, "/caf\u{fffd}");

        let line = StatusLine::parse(b"HTTP/1.1 200 \xFFok").unwrap();
        assert_eq!(line.reason, "\u{fffd}ok");
    }

    #[test]
    fn wrong_kind_is_a_type_mismatch() {
        assert!(matches!(RequestLine::parse(b"HTTP/1.1 200 OK"), Err(ParseError::TypeMismatch { .. })));
        assert!(matches!(StatusLine::parse(b"GET / HTTP/1.1"), Err(ParseError::TypeMismatch { .. })));
    }

    #[test]
    fn malformed_lines() {
        assert!(matches!(StartLine::parse(b"GET /"), Err(ParseError::GrammarMismatch { .. })));
        assert!(StartLine::parse(b"GET / HTTP/1.1\r\n\r\n").is_err());
        assert!(StartLine::parse(b"").is_err());
    }
}
