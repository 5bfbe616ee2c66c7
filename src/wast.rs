//! Lexical analysis of the WebAssembly text format.
//!
//! ```
//! use wasmscan::wast::{LexicalToken, WastLexer};
//!
//! let tokens: Vec<_> = WastLexer::new("(memory 0x1_0)").collect();
//! assert_eq!(
//!     tokens,
//!     vec![
//!         LexicalToken::LeftParen,
//!         LexicalToken::Keyword("memory".into()),
//!         LexicalToken::Unsigned(16),
//!         LexicalToken::RightParen,
//!     ]
//! );
//! ```
//!
//! Scanning stops for good at the first character the lexer cannot place,
//! which is reported as a final [`LexicalToken::Unknown`].

mod lexer;
mod token;

pub use lexer::WastLexer;
pub use token::LexicalToken;
