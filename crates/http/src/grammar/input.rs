//! Recursive-descent matching state shared by every rule family.
//!
//! An [`Input`] walks a byte slice with a cursor. Named rules are applied with
//! [`Input::rule`], which records a [`Node`] on success and rewinds both the cursor
//! and any partially built children on failure, giving PEG ordered-choice semantics
//! when alternatives are chained with `||`.

use crate::grammar::chars;
use crate::grammar::node::Node;
use crate::grammar::Rule;
use crate::protocol::ParseError;

/// Maximum nesting of named rules, bounds recursion on inputs like `((((((...`.
const MAX_NESTING: usize = 64;

#[derive(Debug)]
pub struct Input<'a, R> {
    source: &'a [u8],
    pos: usize,
    furthest: usize,
    depth: usize,
    nodes: Vec<Node<'a, R>>,
    fatal: Option<ParseError>,
}

impl<'a, R: Rule> Input<'a, R> {
    pub(crate) fn new(source: &'a [u8]) -> Self {
        Self { source, pos: 0, furthest: 0, depth: 0, nodes: Vec::new(), fatal: None }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    /// Unconsumed input, for lookahead.
    #[inline]
    pub fn remaining(&self) -> &'a [u8] {
        &self.source[self.pos..]
    }

    /// The bytes consumed since `start`.
    #[inline]
    pub fn matched_since(&self, start: usize) -> &'a [u8] {
        &self.source[start..self.pos]
    }

    /// Offset of the furthest terminal failure seen so far.
    pub(crate) fn furthest(&self) -> usize {
        self.furthest.max(self.pos)
    }

    /// Nodes completed at the current nesting level since `mark`.
    pub(crate) fn nodes_since(&self, mark: usize) -> &[Node<'a, R>] {
        &self.nodes[mark..]
    }

    pub(crate) fn mark(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn finish(mut self) -> (Option<Node<'a, R>>, Option<ParseError>) {
        (self.nodes.pop(), self.fatal)
    }

    /// Applies `rule` at the cursor, recording a node on success.
    pub fn rule(&mut self, rule: R) -> bool {
        self.node(rule, |input| rule.matches(input))
    }

    /// Records a node tagged `rule` spanning whatever `body` consumes.
    ///
    /// Used where a rule needs context its standalone definition does not have, such as
    /// a message body whose length depends on headers matched earlier.
    pub fn node(&mut self, rule: R, body: impl FnOnce(&mut Self) -> bool) -> bool {
        if self.fatal.is_some() || self.depth >= MAX_NESTING {
            return false;
        }

        let start = self.pos;
        let mark = self.nodes.len();

        self.depth += 1;
        let matched = body(self);
        self.depth -= 1;

        if matched && self.fatal.is_none() {
            let children = self.nodes.split_off(mark);
            self.nodes.push(Node::new(rule, start, &self.source[start..self.pos], children));
            true
        } else {
            self.rewind(start, mark);
            false
        }
    }

    /// Runs `f`, rewinding the cursor and discarding its nodes if it fails.
    pub fn attempt(&mut self, f: impl FnOnce(&mut Self) -> bool) -> bool {
        let start = self.pos;
        let mark = self.nodes.len();
        if f(self) && self.fatal.is_none() {
            true
        } else {
            self.rewind(start, mark);
            false
        }
    }

    /// `[ f ]`
    #[inline]
    pub fn optional(&mut self, f: impl FnOnce(&mut Self) -> bool) -> bool {
        self.attempt(f);
        self.fatal.is_none()
    }

    /// `min*max f`, stopping early when an iteration consumes nothing.
    pub fn repeat(&mut self, min: usize, max: Option<usize>, mut f: impl FnMut(&mut Self) -> bool) -> bool {
        let start = self.pos;
        let mark = self.nodes.len();
        let mut count = 0;

        while max.is_none_or(|max| count < max) {
            let before = self.pos;
            if !self.attempt(&mut f) {
                break;
            }
            count += 1;
            if self.pos == before {
                break;
            }
        }

        if count >= min && self.fatal.is_none() {
            true
        } else {
            self.rewind(start, mark);
            false
        }
    }

    /// `*f`
    #[inline]
    pub fn many0(&mut self, f: impl FnMut(&mut Self) -> bool) -> bool {
        self.repeat(0, None, f)
    }

    /// `1*f`
    #[inline]
    pub fn many1(&mut self, f: impl FnMut(&mut Self) -> bool) -> bool {
        self.repeat(1, None, f)
    }

    pub fn byte(&mut self, expected: u8) -> bool {
        self.byte_if(|b| b == expected)
    }

    pub fn byte_if(&mut self, pred: impl Fn(u8) -> bool) -> bool {
        match self.peek() {
            Some(b) if pred(b) => {
                self.pos += 1;
                true
            }
            _ => self.miss(),
        }
    }

    /// Consumes bytes while `pred` holds and returns how many were consumed.
    pub fn bytes_while(&mut self, pred: impl Fn(u8) -> bool) -> usize {
        let count = self.source[self.pos..].iter().take_while(|b| pred(**b)).count();
        self.pos += count;
        if !self.is_eof() {
            self.furthest = self.furthest.max(self.pos);
        }
        count
    }

    /// `1*pred`
    pub fn bytes_while1(&mut self, pred: impl Fn(u8) -> bool) -> bool {
        self.bytes_while(pred) > 0 || self.miss()
    }

    /// Case-sensitive literal.
    pub fn literal(&mut self, literal: &[u8]) -> bool {
        if self.source[self.pos..].starts_with(literal) {
            self.pos += literal.len();
            true
        } else {
            self.miss()
        }
    }

    /// Case-insensitive literal, the default for ABNF quoted strings.
    pub fn literal_ignore_case(&mut self, literal: &[u8]) -> bool {
        match self.source[self.pos..].get(..literal.len()) {
            Some(head) if head.eq_ignore_ascii_case(literal) => {
                self.pos += literal.len();
                true
            }
            _ => self.miss(),
        }
    }

    /// Consumes exactly `n` bytes of any value.
    pub fn take(&mut self, n: usize) -> bool {
        if self.source.len() - self.pos >= n {
            self.pos += n;
            true
        } else {
            self.furthest = self.source.len();
            false
        }
    }

    /// Consumes the rest of the input.
    pub fn take_rest(&mut self) -> bool {
        self.pos = self.source.len();
        true
    }

    #[inline]
    pub fn crlf(&mut self) -> bool {
        self.literal(b"\r\n")
    }

    /// `OWS = *( SP / HTAB )`
    #[inline]
    pub fn ows(&mut self) -> bool {
        self.bytes_while(chars::is_ws);
        true
    }

    /// `RWS = 1*( SP / HTAB )`
    #[inline]
    pub fn rws(&mut self) -> bool {
        self.bytes_while1(chars::is_ws)
    }

    /// `token = 1*tchar`
    #[inline]
    pub fn token(&mut self) -> bool {
        self.bytes_while1(chars::is_tchar)
    }

    /// `quoted-string = DQUOTE *( qdtext / quoted-pair ) DQUOTE`
    pub fn quoted_string(&mut self) -> bool {
        self.attempt(|input| {
            if !input.byte(b'"') {
                return false;
            }
            loop {
                match input.peek() {
                    Some(b'"') => {
                        input.pos += 1;
                        return true;
                    }
                    Some(b'\\') => {
                        input.pos += 1;
                        if !input.byte_if(chars::is_quoted_pair_byte) {
                            return false;
                        }
                    }
                    Some(b) if chars::is_qdtext(b) => input.pos += 1,
                    _ => return input.miss(),
                }
            }
        })
    }

    /// Recipient-side `1#element`:
    /// `*( "," OWS ) element *( OWS "," [ OWS element ] )`
    pub fn list1(&mut self, mut element: impl FnMut(&mut Self) -> bool) -> bool {
        self.attempt(|input| {
            input.many0(|input| input.byte(b',') && input.ows())
                && element(input)
                && input.many0(|input| {
                    input.ows() && input.byte(b',') && input.optional(|input| input.ows() && element(input))
                })
        })
    }

    /// Aborts evaluation with an error that is not a grammar mismatch.
    pub fn abort(&mut self, error: ParseError) -> bool {
        if self.fatal.is_none() {
            self.fatal = Some(error);
        }
        false
    }

    fn miss(&mut self) -> bool {
        self.furthest = self.furthest.max(self.pos);
        false
    }

    fn rewind(&mut self, pos: usize, mark: usize) {
        self.pos = pos;
        self.nodes.truncate(mark);
    }
}
