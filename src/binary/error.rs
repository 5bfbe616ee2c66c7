use crate::stream::{ByteStream, Stream};
use nom::{IResult, error::ErrorKind, error::ParseError};
use thiserror::Error;

pub type DecodeResult<'a, T> = IResult<ByteStream<'a>, T, DecodeError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("unexpected byte 0x{byte:02X} at offset {location}")]
    Unexpected { byte: u8, location: usize },
    #[error("invalid vector length {length} at offset {location}")]
    VectorInvalidLength { length: u32, location: usize },
}

impl DecodeError {
    /// Error for whatever sits at the stream's current position.
    pub fn at(input: &ByteStream<'_>) -> Self {
        match input.peek() {
            Some(byte) => DecodeError::Unexpected {
                byte,
                location: input.position(),
            },
            None => DecodeError::UnexpectedEnd,
        }
    }
}

// nom combinators wrap failures on the way up; the first failure must reach
// the caller untouched, so `append` and `or` keep the inner error.
impl<'a> ParseError<ByteStream<'a>> for DecodeError {
    fn from_error_kind(input: ByteStream<'a>, _kind: ErrorKind) -> Self {
        DecodeError::at(&input)
    }

    fn append(_input: ByteStream<'a>, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

pub(crate) fn fail<'a, T>(error: DecodeError) -> DecodeResult<'a, T> {
    Err(nom::Err::Error(error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nom::{branch::alt, combinator::all_consuming};

    fn never(input: ByteStream<'_>) -> DecodeResult<'_, ()> {
        fail(DecodeError::VectorInvalidLength {
            length: 0,
            location: input.position(),
        })
    }

    #[test]
    fn combinators_propagate_inner_error() {
        let input = ByteStream::new(&[0x01]);
        assert_eq!(
            alt((never, never))(input),
            Err(nom::Err::Error(DecodeError::VectorInvalidLength {
                length: 0,
                location: 0
            }))
        );
    }

    #[test]
    fn leftover_input_is_reported_at_first_unread_byte() {
        fn skip_one(mut input: ByteStream<'_>) -> DecodeResult<'_, ()> {
            input.advance();
            Ok((input, ()))
        }
        let result = all_consuming(skip_one)(ByteStream::new(&[0x01, 0x02]));
        assert_eq!(
            result,
            Err(nom::Err::Error(DecodeError::Unexpected {
                byte: 0x02,
                location: 1
            }))
        );
    }

    #[test]
    fn display_names_the_offending_byte() {
        let err = DecodeError::Unexpected {
            byte: 0x7B,
            location: 3,
        };
        assert_eq!(err.to_string(), "unexpected byte 0x7B at offset 3");
    }
}
