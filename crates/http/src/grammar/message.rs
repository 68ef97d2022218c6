use std::borrow::Cow;

use crate::grammar::chars;
use crate::grammar::node::Node;
use crate::grammar::{Input, Rule};
use crate::protocol::{ParseError, PayloadSize};

/// HTTP/1.1 message syntax, RFC 9112.
///
/// ```text
/// HTTP-message   = start-line CRLF *( field-line CRLF ) CRLF [ message-body ]
/// start-line     = request-line / status-line
/// request-line   = method SP request-target SP HTTP-version
/// status-line    = HTTP-version SP status-code [ SP [ reason-phrase ] ]
/// HTTP-version   = %s"HTTP" "/" DIGIT "." DIGIT
/// status-code    = %x31-35 2DIGIT
/// reason-phrase  = 1*( HTAB / SP / VCHAR / obs-text )
/// field-section  = *( field-line CRLF ) CRLF
/// field-line     = field-name ":" OWS field-value OWS
/// chunked-body   = *chunk last-chunk trailer-section CRLF
/// chunk          = chunk-size [ chunk-ext ] CRLF chunk-data CRLF
/// last-chunk     = 1*"0" [ chunk-ext ] CRLF
/// chunk-ext      = *( OWS ";" OWS token [ OWS "=" OWS ( token / quoted-string ) ] )
/// trailer-section = *( field-line CRLF )
/// ```
///
/// The length of `message-body` inside `HTTP-message` is decided by the field-lines matched
/// before it, see [`PayloadSize::from_headers`]. Matched on its own, `message-body` takes
/// whatever input remains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageRule {
    HttpMessage,
    StartLine,
    RequestLine,
    StatusLine,
    Method,
    RequestTarget,
    HttpVersion,
    StatusCode,
    ReasonPhrase,
    FieldSection,
    FieldLine,
    FieldName,
    FieldValue,
    MessageBody,
    ChunkedBody,
    Chunk,
    ChunkSize,
    ChunkExt,
    ChunkData,
    LastChunk,
    TrailerSection,
}

impl Rule for MessageRule {
    fn name(self) -> &'static str {
        match self {
            MessageRule::HttpMessage => "HTTP-message",
            MessageRule::StartLine => "start-line",
            MessageRule::RequestLine => "request-line",
            MessageRule::StatusLine => "status-line",
            MessageRule::Method => "method",
            MessageRule::RequestTarget => "request-target",
            MessageRule::HttpVersion => "HTTP-version",
            MessageRule::StatusCode => "status-code",
            MessageRule::ReasonPhrase => "reason-phrase",
            MessageRule::FieldSection => "field-section",
            MessageRule::FieldLine => "field-line",
            MessageRule::FieldName => "field-name",
            MessageRule::FieldValue => "field-value",
            MessageRule::MessageBody => "message-body",
            MessageRule::ChunkedBody => "chunked-body",
            MessageRule::Chunk => "chunk",
            MessageRule::ChunkSize => "chunk-size",
            MessageRule::ChunkExt => "chunk-ext",
            MessageRule::ChunkData => "chunk-data",
            MessageRule::LastChunk => "last-chunk",
            MessageRule::TrailerSection => "trailer-section",
        }
    }

    fn matches(self, input: &mut Input<'_, Self>) -> bool {
        match self {
            MessageRule::HttpMessage => http_message(input),
            MessageRule::StartLine => input.rule(MessageRule::RequestLine) || input.rule(MessageRule::StatusLine),
            MessageRule::RequestLine => {
                input.rule(MessageRule::Method)
                    && input.byte(b' ')
                    && input.rule(MessageRule::RequestTarget)
                    && input.byte(b' ')
                    && input.rule(MessageRule::HttpVersion)
            }
            MessageRule::StatusLine => {
                input.rule(MessageRule::HttpVersion)
                    && input.byte(b' ')
                    && input.rule(MessageRule::StatusCode)
                    && input.optional(|input| input.byte(b' ') && input.optional(|i| i.rule(MessageRule::ReasonPhrase)))
            }
            MessageRule::Method => input.token(),
            MessageRule::RequestTarget => input.bytes_while1(chars::is_field_vchar),
            MessageRule::HttpVersion => {
                input.literal(b"HTTP/")
                    && input.byte_if(chars::is_digit)
                    && input.byte(b'.')
                    && input.byte_if(chars::is_digit)
            }
            MessageRule::StatusCode => {
                input.byte_if(|b| matches!(b, b'1'..=b'5'))
                    && input.byte_if(chars::is_digit)
                    && input.byte_if(chars::is_digit)
            }
            MessageRule::ReasonPhrase => input.bytes_while1(|b| chars::is_ws(b) || chars::is_field_vchar(b)),
            MessageRule::FieldSection => field_lines(input) && input.crlf(),
            MessageRule::FieldLine => {
                input.rule(MessageRule::FieldName)
                    && input.byte(b':')
                    && input.ows()
                    && input.rule(MessageRule::FieldValue)
                    && input.ows()
            }
            MessageRule::FieldName => input.token(),
            MessageRule::FieldValue => field_value(input),
            MessageRule::MessageBody => input.take_rest(),
            MessageRule::ChunkedBody => {
                input.many0(|input| input.rule(MessageRule::Chunk))
                    && input.rule(MessageRule::LastChunk)
                    && input.rule(MessageRule::TrailerSection)
                    && input.crlf()
            }
            MessageRule::Chunk => chunk(input),
            MessageRule::ChunkSize => input.bytes_while1(chars::is_hexdig),
            MessageRule::ChunkExt => chunk_ext(input),
            MessageRule::ChunkData => input.take_rest(),
            MessageRule::LastChunk => {
                input.bytes_while1(|b| b == b'0')
                    && input.optional(|input| input.rule(MessageRule::ChunkExt))
                    && input.crlf()
            }
            MessageRule::TrailerSection => field_lines(input),
        }
    }
}

fn http_message(input: &mut Input<'_, MessageRule>) -> bool {
    let mark = input.mark();
    if !(input.rule(MessageRule::StartLine) && input.crlf() && field_lines(input) && input.crlf()) {
        return false;
    }

    let nodes = input.nodes_since(mark);
    let is_request = nodes
        .first()
        .and_then(|start_line| start_line.children().first())
        .is_some_and(|line| line.rule() == MessageRule::RequestLine);

    let size = match PayloadSize::from_headers(nodes.iter().filter_map(field_pair)) {
        Ok(size) => size,
        Err(e) => return input.abort(e),
    };

    match size {
        PayloadSize::Chunked { .. } => input.node(MessageRule::MessageBody, |input| input.rule(MessageRule::ChunkedBody)),
        PayloadSize::Length(length) => match usize::try_from(length) {
            Ok(length) => input.node(MessageRule::MessageBody, |input| input.take(length)),
            Err(_) => input.abort(ParseError::invalid_content_length(format!("{length} exceeds addressable memory"))),
        },
        // without framing headers a request has no body, a response runs until the connection closes
        PayloadSize::Empty if is_request => true,
        PayloadSize::Empty => input.node(MessageRule::MessageBody, |input| input.take_rest()),
    }
}

/// The name and value of a `field-line`, decoded with [`Node::text`].
pub(crate) fn field_pair<'a>(node: &Node<'a, MessageRule>) -> Option<(Cow<'a, str>, Cow<'a, str>)> {
    if node.rule() != MessageRule::FieldLine {
        return None;
    }
    let name = node.find(MessageRule::FieldName, 1)?;
    let value = node.find(MessageRule::FieldValue, 1)?;
    Some((name.text(), value.text()))
}

fn field_lines(input: &mut Input<'_, MessageRule>) -> bool {
    input.many0(|input| input.rule(MessageRule::FieldLine) && input.crlf())
}

/// `field-value = *field-content`, without the trailing whitespace that belongs to OWS.
fn field_value(input: &mut Input<'_, MessageRule>) -> bool {
    let rest = input.remaining();
    let line = rest.iter().take_while(|b| chars::is_ws(**b) || chars::is_field_vchar(**b)).count();
    let trailing = rest[..line].iter().rev().take_while(|b| chars::is_ws(**b)).count();
    input.take(line - trailing)
}

fn chunk(input: &mut Input<'_, MessageRule>) -> bool {
    let start = input.position();
    if !input.rule(MessageRule::ChunkSize) {
        return false;
    }

    let size = match chunk_size_value(input.matched_since(start)) {
        Some(0) | None => return false,
        Some(size) => size,
    };

    input.optional(|input| input.rule(MessageRule::ChunkExt))
        && input.crlf()
        && input.node(MessageRule::ChunkData, |input| input.take(size))
        && input.crlf()
}

fn chunk_size_value(digits: &[u8]) -> Option<usize> {
    digits.iter().try_fold(0usize, |size, b| {
        let digit = char::from(*b).to_digit(16)?;
        size.checked_mul(16)?.checked_add(digit as usize)
    })
}

fn chunk_ext(input: &mut Input<'_, MessageRule>) -> bool {
    input.many1(|input| {
        input.ows()
            && input.byte(b';')
            && input.ows()
            && input.token()
            && input.optional(|input| {
                input.ows() && input.byte(b'=') && input.ows() && (input.token() || input.quoted_string())
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::evaluate;

    #[test]
    fn start_line_alternatives() {
        let root = evaluate(MessageRule::StartLine, b"GET /index.html HTTP/1.1").unwrap();
        assert_eq!(root.children()[0].rule(), MessageRule::RequestLine);

        let root = evaluate(MessageRule::StartLine, b"HTTP/1.1 404 Not Found").unwrap();
        let status = &root.children()[0];
        assert_eq!(status.rule(), MessageRule::StatusLine);
        assert_eq!(status.find(MessageRule::ReasonPhrase, 1).unwrap().as_bytes(), b"Not Found");

        assert!(evaluate(MessageRule::StartLine, b"HTTP/1.1 200").is_ok());
        assert!(evaluate(MessageRule::StartLine, b"HTTP/1.1 200 ").is_ok());
        assert!(evaluate(MessageRule::StartLine, b"HTTP/1.1 600 Nope").is_err());
        assert!(evaluate(MessageRule::StartLine, b"GET  / HTTP/1.1").is_err());
        assert!(evaluate(MessageRule::StartLine, b"GET / http/1.1").is_err());
    }

    #[test]
    fn field_value_excludes_surrounding_whitespace() {
        let root = evaluate(MessageRule::FieldLine, b"Accept:  text/html, */*  \t").unwrap();
        assert_eq!(root.find(MessageRule::FieldName, 1).unwrap().as_bytes(), b"Accept");
        assert_eq!(root.find(MessageRule::FieldValue, 1).unwrap().as_bytes(), b"text/html, */*");

        let root = evaluate(MessageRule::FieldLine, b"X-Empty:").unwrap();
        assert_eq!(root.find(MessageRule::FieldValue, 1).unwrap().as_bytes(), b"");

        assert!(evaluate(MessageRule::FieldLine, b"Bad Name: x").is_err());
        assert!(evaluate(MessageRule::FieldLine, b"Name : x").is_err());
    }

    #[test]
    fn chunked_body_nodes() {
        let source = b"4\r\nWiki\r\n6;ext=\"v\"\r\npedia \r\n0\r\nExpires: never\r\n\r\n";
        let root = evaluate(MessageRule::ChunkedBody, source).unwrap();

        let data: Vec<_> = root.search(&[MessageRule::ChunkData], None).iter().map(|n| n.as_bytes()).collect();
        assert_eq!(data, [&b"Wiki"[..], &b"pedia "[..]]);

        let trailers = root.find(MessageRule::TrailerSection, 1).unwrap();
        assert_eq!(trailers.as_bytes(), b"Expires: never\r\n");
    }

    #[test]
    fn chunk_data_length_is_exact() {
        assert!(evaluate(MessageRule::ChunkedBody, b"4\r\nWik\r\n0\r\n\r\n").is_err());
        assert!(evaluate(MessageRule::ChunkedBody, b"4\r\nWikii\r\n0\r\n\r\n").is_err());
        assert!(evaluate(MessageRule::ChunkedBody, b"4\r\nWiki\r\n0\r\n").is_err());
    }

    #[test]
    fn message_body_follows_framing() {
        let source = b"POST / HTTP/1.1\r\nContent-Length: 3\r\n\r\nabc";
        let root = evaluate(MessageRule::HttpMessage, source).unwrap();
        assert_eq!(root.find(MessageRule::MessageBody, 1).unwrap().as_bytes(), b"abc");

        let source = b"POST / HTTP/1.1\r\nContent-Length: 3\r\n\r\nabcd";
        assert!(matches!(evaluate(MessageRule::HttpMessage, source), Err(ParseError::GrammarMismatch { .. })));

        let source = b"GET / HTTP/1.1\r\nHost: a\r\n\r\n";
        let root = evaluate(MessageRule::HttpMessage, source).unwrap();
        assert!(root.find(MessageRule::MessageBody, 1).is_none());

        let source = b"HTTP/1.0 200 OK\r\n\r\nuntil close";
        let root = evaluate(MessageRule::HttpMessage, source).unwrap();
        assert_eq!(root.find(MessageRule::MessageBody, 1).unwrap().as_bytes(), b"until close");
    }

    #[test]
    fn duplicated_content_length_aborts_matching() {
        let source = b"POST / HTTP/1.1\r\nContent-Length: 3\r\nContent-Length: 3\r\n\r\nabc";
        assert!(matches!(
            evaluate(MessageRule::HttpMessage, source),
            Err(ParseError::FramingAmbiguity { header: "Content-Length" })
        ));
    }
}
