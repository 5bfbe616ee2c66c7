use super::{
    error::{DecodeError, DecodeResult, fail},
    leb128::uint32,
};
use crate::stream::{ByteStream, Stream};
use nom::{Parser, multi::count};

/// A length-prefixed vector whose length must be non-zero.
///
/// A zero length fails with `VectorInvalidLength` at the offset of the prefix.
pub fn vector<'a, O, F>(mut element: F) -> impl FnMut(ByteStream<'a>) -> DecodeResult<'a, Vec<O>>
where
    F: Parser<ByteStream<'a>, O, DecodeError>,
{
    move |input| {
        let location = input.position();
        let (input, length) = uint32(input)?;
        if length == 0 {
            return fail(DecodeError::VectorInvalidLength { length, location });
        }
        count(|i| element.parse(i), length as usize)(input)
    }
}

/// A length-prefixed vector that may be empty, for grammar positions where
/// the format allows zero elements.
pub fn vector_or_empty<'a, O, F>(
    mut element: F,
) -> impl FnMut(ByteStream<'a>) -> DecodeResult<'a, Vec<O>>
where
    F: Parser<ByteStream<'a>, O, DecodeError>,
{
    move |input| {
        let (input, length) = uint32(input)?;
        count(|i| element.parse(i), length as usize)(input)
    }
}
