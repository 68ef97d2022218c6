use std::io;
use std::time::Duration;
use thiserror::Error;

/// Errors produced while matching grammars, framing bodies or decoding header values.
///
/// None of these are recovered internally: every error is surfaced to the immediate caller,
/// and any retry policy belongs to the transport.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("input does not match grammar rule `{rule}` at offset {offset}")]
    GrammarMismatch { rule: &'static str, offset: usize },

    #[error("ambiguous message framing: `{header}` header present more than once")]
    FramingAmbiguity { header: &'static str },

    #[error("duplicate parameter `{name}` within one element")]
    DuplicateParameter { name: String },

    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: &'static str, found: &'static str },

    #[error("read timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("malformed address `{value}`: {reason}")]
    MalformedAddress { value: String, reason: String },

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("invalid uri: {reason}")]
    InvalidUri { reason: String },

    #[error("message step called out of order, expected {expected}")]
    OutOfOrder { expected: &'static str },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn mismatch(rule: &'static str, offset: usize) -> Self {
        Self::GrammarMismatch { rule, offset }
    }

    pub fn framing_ambiguity(header: &'static str) -> Self {
        Self::FramingAmbiguity { header }
    }

    pub fn duplicate_parameter<S: ToString>(name: S) -> Self {
        Self::DuplicateParameter { name: name.to_string() }
    }

    pub fn type_mismatch(expected: &'static str, found: &'static str) -> Self {
        Self::TypeMismatch { expected, found }
    }

    pub fn timeout(timeout: Duration) -> Self {
        Self::Timeout { timeout }
    }

    pub fn malformed_address<V: ToString, R: ToString>(value: V, reason: R) -> Self {
        Self::MalformedAddress { value: value.to_string(), reason: reason.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn invalid_uri<S: ToString>(str: S) -> Self {
        Self::InvalidUri { reason: str.to_string() }
    }

    pub fn out_of_order(expected: &'static str) -> Self {
        Self::OutOfOrder { expected }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    pub fn unexpected_eof() -> Self {
        Self::io(io::Error::new(io::ErrorKind::UnexpectedEof, "stream ended before the message was complete"))
    }

    /// Returns true if this error was caused by a read deadline expiring.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ParseError::Timeout { .. })
    }

    /// Returns true if the transport reached end-of-stream in the middle of a read.
    pub fn is_eof(&self) -> bool {
        matches!(self, ParseError::Io { source } if source.kind() == io::ErrorKind::UnexpectedEof)
    }
}
