use super::token::LexicalToken;
use crate::stream::{CharStream, Stream};
use log::trace;
use std::iter::FusedIterator;

fn is_idchar(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-./:<=>?@\\^_`|~".contains(c)
}

pub struct WastLexer<'a> {
    stream: CharStream<'a>,
    halted: bool,
}

impl<'a> WastLexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            stream: CharStream::new(source),
            halted: false,
        }
    }

    /// Byte offset of the next unread character.
    pub fn position(&self) -> usize {
        self.stream.position()
    }

    fn scan(&mut self) -> Option<LexicalToken> {
        loop {
            let start = self.stream.position();
            let c = self.stream.peek()?;
            match c {
                ' ' | '\t' | '\n' | '\r' => {
                    self.stream.advance();
                }
                ';' => {
                    self.stream.advance();
                    if self.stream.peek() != Some(';') {
                        return Some(self.halt(start));
                    }
                    self.skip_line_comment();
                }
                '(' => {
                    self.stream.advance();
                    if self.stream.peek() != Some(';') {
                        return Some(LexicalToken::LeftParen);
                    }
                    self.stream.advance();
                    if !self.skip_block_comment() {
                        return Some(self.halt(start));
                    }
                }
                ')' => {
                    self.stream.advance();
                    return Some(LexicalToken::RightParen);
                }
                '"' => return Some(self.string(start)),
                '0'..='9' => return Some(self.number(start)),
                c if is_idchar(c) => return Some(self.keyword(start)),
                _ => {
                    self.stream.advance();
                    return Some(self.halt(start));
                }
            }
        }
    }

    fn halt(&mut self, start: usize) -> LexicalToken {
        let text = self.stream.slice_from(start).to_owned();
        trace!("lexer halted at offset {start} on {text:?}");
        self.halted = true;
        LexicalToken::Unknown(text)
    }

    // Stops before the newline.
    fn skip_line_comment(&mut self) {
        while self.stream.peek().is_some_and(|c| c != '\n') {
            self.stream.advance();
        }
    }

    // Block comments do not nest: the first `;)` closes the comment.
    fn skip_block_comment(&mut self) -> bool {
        while let Some(c) = self.stream.advance() {
            if c == ';' && self.stream.peek() == Some(')') {
                self.stream.advance();
                return true;
            }
        }
        false
    }

    fn keyword(&mut self, start: usize) -> LexicalToken {
        while self.stream.peek().is_some_and(is_idchar) {
            self.stream.advance();
        }
        LexicalToken::Keyword(self.stream.slice_from(start).to_owned())
    }

    fn number(&mut self, start: usize) -> LexicalToken {
        // `0x` only opens a hex literal when a hex digit follows; otherwise
        // the `0` stands alone and scanning resumes at the `x`.
        let mut tentative = self.stream;
        if tentative.advance() == Some('0')
            && tentative.advance() == Some('x')
            && tentative.peek().is_some_and(|c| c.is_ascii_hexdigit())
        {
            self.stream = tentative;
            return self.digits(start, 16);
        }
        self.digits(start, 10)
    }

    // Digits with single `_` separators between them. An `_` that is not
    // followed by a digit ends the literal.
    fn digits(&mut self, start: usize, radix: u32) -> LexicalToken {
        let mut value = Some(0u64);
        while let Some(c) = self.stream.peek() {
            if let Some(digit) = c.to_digit(radix) {
                self.stream.advance();
                value = value
                    .and_then(|v| v.checked_mul(u64::from(radix)))
                    .and_then(|v| v.checked_add(u64::from(digit)));
            } else if c == '_' {
                let mut tentative = self.stream;
                tentative.advance();
                if !tentative.peek().is_some_and(|n| n.is_digit(radix)) {
                    break;
                }
                self.stream = tentative;
            } else {
                break;
            }
        }
        match value {
            Some(value) => LexicalToken::Unsigned(value),
            None => self.halt(start),
        }
    }

    fn string(&mut self, start: usize) -> LexicalToken {
        self.stream.advance();
        let mut bytes = vec![];
        loop {
            let Some(c) = self.stream.advance() else {
                return self.halt(start);
            };
            match c {
                '"' => return LexicalToken::String(bytes),
                '\\' => {
                    if self.escape(&mut bytes).is_none() {
                        return self.halt(start);
                    }
                }
                c if c.is_control() => return self.halt(start),
                c => {
                    let mut buf = [0; 4];
                    bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                }
            }
        }
    }

    fn escape(&mut self, bytes: &mut Vec<u8>) -> Option<()> {
        match self.stream.advance()? {
            't' => bytes.push(b'\t'),
            'n' => bytes.push(b'\n'),
            'r' => bytes.push(b'\r'),
            '"' => bytes.push(b'"'),
            '\'' => bytes.push(b'\''),
            '\\' => bytes.push(b'\\'),
            'u' => {
                if self.stream.advance()? != '{' {
                    return None;
                }
                let mut code = 0u32;
                let mut len = 0;
                loop {
                    match self.stream.advance()? {
                        '}' if len > 0 => break,
                        '_' if len > 0 => {}
                        c => {
                            code = code.checked_mul(16)?.checked_add(c.to_digit(16)?)?;
                            len += 1;
                        }
                    }
                }
                let c = char::from_u32(code)?;
                let mut buf = [0; 4];
                bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
            high => {
                let high = high.to_digit(16)?;
                let low = self.stream.advance()?.to_digit(16)?;
                bytes.push((high * 16 + low) as u8);
            }
        }
        Some(())
    }
}

impl Iterator for WastLexer<'_> {
    type Item = LexicalToken;

    fn next(&mut self) -> Option<LexicalToken> {
        if self.halted {
            return None;
        }
        self.scan()
    }
}

impl FusedIterator for WastLexer<'_> {}
