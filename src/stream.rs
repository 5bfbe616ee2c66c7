//! Cursors over the raw input handed to the decoders.
//!
//! Both stream kinds are `Copy`: a decoder takes a stream by value and hands
//! back the advanced copy on success, so a failed decode never disturbs the
//! caller's stream.

use nom::InputLength;

pub trait Stream {
    type Element: Copy;

    fn peek(&self) -> Option<Self::Element>;

    /// Consumes the next element, or returns `None` once the stream is exhausted.
    fn advance(&mut self) -> Option<Self::Element>;

    /// Offset of the next element, in bytes from the start of the input.
    fn position(&self) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteStream<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> ByteStream<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    pub fn remaining(&self) -> &'a [u8] {
        &self.bytes[self.position..]
    }

    pub fn is_empty(&self) -> bool {
        self.position >= self.bytes.len()
    }

    /// Splits off a window over the next `len` bytes.
    ///
    /// The window keeps absolute positions, so errors raised while decoding it
    /// still point into the original buffer. Returns `None` if fewer than `len`
    /// bytes remain.
    pub fn split_at(&self, len: usize) -> Option<(ByteStream<'a>, ByteStream<'a>)> {
        let end = self.position.checked_add(len)?;
        if end > self.bytes.len() {
            return None;
        }
        let window = ByteStream {
            bytes: &self.bytes[..end],
            position: self.position,
        };
        let rest = ByteStream {
            bytes: self.bytes,
            position: end,
        };
        Some((window, rest))
    }
}

impl Stream for ByteStream<'_> {
    type Element = u8;

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.position).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.position += 1;
        Some(byte)
    }

    fn position(&self) -> usize {
        self.position
    }
}

impl InputLength for ByteStream<'_> {
    fn input_len(&self) -> usize {
        self.bytes.len() - self.position
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharStream<'a> {
    source: &'a str,
    position: usize,
}

impl<'a> CharStream<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            position: 0,
        }
    }

    /// Source text between `start` and the current position.
    pub fn slice_from(&self, start: usize) -> &'a str {
        &self.source[start..self.position]
    }
}

impl Stream for CharStream<'_> {
    type Element = char;

    fn peek(&self) -> Option<char> {
        self.source[self.position..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position += c.len_utf8();
        Some(c)
    }

    fn position(&self) -> usize {
        self.position
    }
}
