//! Decoding of the WebAssembly binary format.
//!
//! Every decoder is a nom parser over a [`ByteStream`]: it returns the decoded
//! value together with the advanced stream, or the first [`DecodeError`] it
//! hit together with the offset of the offending byte.

pub mod combinator;
pub mod error;
pub mod grammar;
pub mod instruction;
pub mod leb128;
pub mod module;
pub mod opcode;
pub mod section;
pub mod types;
pub mod values;

pub use error::{DecodeError, DecodeResult};

use crate::stream::ByteStream;
use nom::Parser;

/// Runs `decoder` over a fresh stream on `bytes`. Trailing input is left unread.
pub fn decode<'a, T>(
    bytes: &'a [u8],
    mut decoder: impl Parser<ByteStream<'a>, T, DecodeError>,
) -> Result<T, DecodeError> {
    match decoder.parse(ByteStream::new(bytes)) {
        Ok((_, value)) => Ok(value),
        Err(nom::Err::Error(err) | nom::Err::Failure(err)) => Err(err),
        Err(nom::Err::Incomplete(_)) => Err(DecodeError::UnexpectedEnd),
    }
}
