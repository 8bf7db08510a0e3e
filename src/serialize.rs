//! Text form of a tree.
//!
//! ```text
//! tree := "()" | "(" weight " " symbol " " tree " " tree ")"
//! ```
//!
//! `"aaab"` builds a two-leaf tree which is written as
//! `(4 36 (1 98 () ()) (3 97 () ()))`. Internal nodes have no symbol of
//! their own and are written with `36` (`'$'`).

use std::fmt;
use std::io::{Read, Write};

use crate::error::{Error, Result};
use crate::tree::Node;

const INTERNAL_SYMBOL: u8 = b'$';

/// No tree built from 256 symbols nests deeper than this.
const MAX_DEPTH: usize = 255;

/// Display adapter writing a tree in its text form.
pub struct TreeText<'a>(pub &'a Node);

enum Step<'a> {
    Node(&'a Node),
    Space,
    Close,
}

impl fmt::Display for TreeText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![Step::Node(self.0)];
        while let Some(step) = stack.pop() {
            match step {
                Step::Node(Node::Leaf { weight, symbol }) => {
                    write!(f, "({weight} {symbol} () ())")?;
                }
                Step::Node(Node::Internal { weight, left, right }) => {
                    write!(f, "({weight} {INTERNAL_SYMBOL} ")?;
                    stack.push(Step::Close);
                    stack.push(Step::Node(right));
                    stack.push(Step::Space);
                    stack.push(Step::Node(left));
                }
                Step::Space => f.write_str(" ")?,
                Step::Close => f.write_str(")")?,
            }
        }
        Ok(())
    }
}

pub fn to_text(root: &Node) -> String {
    TreeText(root).to_string()
}

pub fn write_tree<W: Write>(root: &Node, mut sink: W) -> Result<()> {
    write!(sink, "{}", TreeText(root))?;
    sink.flush()?;
    Ok(())
}

pub fn from_text(text: &str) -> Result<Node> {
    parse(text.as_bytes())
}

pub fn read_tree<R: Read>(mut source: R) -> Result<Node> {
    let mut text = Vec::new();
    source.read_to_end(&mut text)?;
    parse(&text)
}

fn parse(text: &[u8]) -> Result<Node> {
    let mut parser = Parser { text, pos: 0 };
    let root = parser
        .tree(0)?
        .ok_or_else(|| Error::parse(0, "tree has no root node"))?;
    while parser.peek().is_some_and(|b| b.is_ascii_whitespace()) {
        parser.pos += 1;
    }
    if parser.pos < text.len() {
        return Err(parser.error("unexpected data after the tree"));
    }
    Ok(root)
}

struct Parser<'a> {
    text: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<u8> {
        self.text.get(self.pos).copied()
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::parse(self.pos, message)
    }

    fn expect(&mut self, want: u8) -> Result<()> {
        match self.peek() {
            Some(b) if b == want => {
                self.pos += 1;
                Ok(())
            }
            Some(b) => Err(self.error(format!(
                "expected '{}', found '{}'",
                want as char,
                b.escape_ascii()
            ))),
            None => Err(self.error(format!("expected '{}', found end of input", want as char))),
        }
    }

    fn digits(&mut self, what: &str) -> Result<u64> {
        let start = self.pos;
        let mut value: u64 = 0;
        while let Some(b) = self.peek().filter(u8::is_ascii_digit) {
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(u64::from(b - b'0')))
                .ok_or_else(|| Error::parse(start, format!("{what} does not fit in 64 bits")))?;
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error(format!("expected a number for the {what}")));
        }
        Ok(value)
    }

    fn symbol(&mut self) -> Result<u8> {
        let start = self.pos;
        let negative = self.peek() == Some(b'-');
        if negative {
            self.pos += 1;
        }
        let value = self.digits("symbol")?;
        match (negative, value) {
            (false, 0..=255) => Ok(value as u8),
            // bytes printed through a signed char
            (true, 1..=128) => Ok((-(value as i16)) as i8 as u8),
            _ => Err(Error::parse(start, "symbol is not a byte value")),
        }
    }

    /// Parse one `tree` production; `None` is the empty marker `()`.
    fn tree(&mut self, depth: usize) -> Result<Option<Node>> {
        let start = self.pos;
        self.expect(b'(')?;
        if self.peek() == Some(b')') {
            self.pos += 1;
            return Ok(None);
        }
        if depth > MAX_DEPTH {
            return Err(Error::parse(
                start,
                format!("tree is nested deeper than {MAX_DEPTH} levels"),
            ));
        }

        let weight = self.digits("weight")?;
        self.expect(b' ')?;
        let symbol = self.symbol()?;
        self.expect(b' ')?;
        let left = self.tree(depth + 1)?;
        self.expect(b' ')?;
        let right = self.tree(depth + 1)?;
        self.expect(b')')?;

        match (left, right) {
            (None, None) => Ok(Some(Node::Leaf { weight, symbol })),
            (Some(left), Some(right)) => Ok(Some(Node::Internal {
                weight,
                left: Box::new(left),
                right: Box::new(right),
            })),
            _ => Err(Error::parse(start, "node has exactly one child")),
        }
    }
}
