#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexicalToken {
    Keyword(String),
    Unsigned(u64),
    /// String literal contents with escapes resolved.
    String(Vec<u8>),
    LeftParen,
    RightParen,
    /// Text the lexer could not place. Always the last token produced.
    Unknown(String),
}
