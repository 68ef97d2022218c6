use std::borrow::Cow;
use std::ops::Range;

/// A node of a parse tree, tagged with the rule that produced it.
///
/// Each node borrows the exact source bytes it matched. Children are ordered, do not
/// overlap, and lie within the parent's span. Literal terminals matched directly by a rule
/// are covered by that rule's span rather than materialized as children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node<'a, R> {
    rule: R,
    offset: usize,
    bytes: &'a [u8],
    children: Vec<Node<'a, R>>,
}

impl<'a, R: Copy + PartialEq> Node<'a, R> {
    pub(crate) fn new(rule: R, offset: usize, bytes: &'a [u8], children: Vec<Node<'a, R>>) -> Self {
        Self { rule, offset, bytes, children }
    }

    #[inline]
    pub fn rule(&self) -> R {
        self.rule
    }

    /// Byte range of this node within the evaluated source.
    #[inline]
    pub fn span(&self) -> Range<usize> {
        self.offset..self.offset + self.bytes.len()
    }

    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Decodes the matched bytes as text; bytes outside UTF-8 are replaced.
    pub fn text(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.bytes)
    }

    #[inline]
    pub fn children(&self) -> &[Node<'a, R>] {
        &self.children
    }

    /// First descendant tagged `rule` in document order, looking at most `max_depth` levels
    /// below this node (direct children are depth 1).
    pub fn find(&self, rule: R, max_depth: usize) -> Option<&Node<'a, R>> {
        self.walk(&[rule], Some(max_depth)).next()
    }

    /// All descendants tagged with any of `rules`, in document order.
    ///
    /// A matched node is reported but not descended into, so nested matches (a comment inside a
    /// comment) are covered by their outermost match. `None` means unbounded depth.
    pub fn search(&self, rules: &[R], max_depth: Option<usize>) -> Vec<&Node<'a, R>> {
        self.walk(rules, max_depth).collect()
    }

    fn walk<'n, 'r>(&'n self, rules: &'r [R], max_depth: Option<usize>) -> Walk<'n, 'r, 'a, R> {
        let mut stack = Vec::with_capacity(self.children.len());
        stack.extend(self.children.iter().rev().map(|child| (child, 1)));
        Walk { stack, rules, max_depth }
    }
}

/// Iterative pre-order traversal, bounded by depth.
struct Walk<'n, 'r, 'a, R> {
    stack: Vec<(&'n Node<'a, R>, usize)>,
    rules: &'r [R],
    max_depth: Option<usize>,
}

impl<'n, 'a, R: Copy + PartialEq> Iterator for Walk<'n, '_, 'a, R> {
    type Item = &'n Node<'a, R>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((node, depth)) = self.stack.pop() {
            if self.rules.contains(&node.rule) {
                return Some(node);
            }
            if self.max_depth.is_none_or(|max| depth < max) {
                self.stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
            }
        }
        None
    }
}
