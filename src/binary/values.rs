//! Byte-level primitive decoders.
//!
//! Each decoder consumes elements one at a time and fails at the first element
//! that does not match, reporting that element's offset.

use super::{
    error::{DecodeError, DecodeResult, fail},
    leb128::uint32,
};
use crate::stream::{ByteStream, Stream};
use std::ops::RangeBounds;

/// Consumes one byte and maps it through `f`, failing on `None`.
pub fn byte_map<'a, T>(
    mut f: impl FnMut(u8) -> Option<T>,
) -> impl FnMut(ByteStream<'a>) -> DecodeResult<'a, T> {
    move |input| {
        let mut stream = input;
        let location = stream.position();
        let Some(byte) = stream.advance() else {
            return fail(DecodeError::UnexpectedEnd);
        };
        match f(byte) {
            Some(value) => Ok((stream, value)),
            None => fail(DecodeError::Unexpected { byte, location }),
        }
    }
}

pub fn byte_if<'a>(
    mut predicate: impl FnMut(u8) -> bool,
) -> impl FnMut(ByteStream<'a>) -> DecodeResult<'a, u8> {
    byte_map(move |b| predicate(b).then_some(b))
}

pub fn byte<'a>(expected: u8) -> impl FnMut(ByteStream<'a>) -> DecodeResult<'a, u8> {
    byte_if(move |b| b == expected)
}

pub fn byte_in<'a>(range: impl RangeBounds<u8>) -> impl FnMut(ByteStream<'a>) -> DecodeResult<'a, u8> {
    byte_if(move |b| range.contains(&b))
}

pub fn byte_in_set<'a>(set: &[u8]) -> impl FnMut(ByteStream<'a>) -> DecodeResult<'a, u8> {
    byte_if(move |b| set.contains(&b))
}

/// Matches `expected` byte by byte and returns the matched slice of the input.
pub fn bytes<'a>(expected: &[u8]) -> impl FnMut(ByteStream<'a>) -> DecodeResult<'a, &'a [u8]> {
    move |input| {
        let mut stream = input;
        for &b in expected {
            (stream, _) = byte(b)(stream)?;
        }
        let matched = &input.remaining()[..expected.len()];
        Ok((stream, matched))
    }
}

/// Splits the next `len` bytes off as a window with absolute positions.
pub fn take<'a>(len: u32) -> impl FnMut(ByteStream<'a>) -> DecodeResult<'a, ByteStream<'a>> {
    move |input| match input.split_at(len as usize) {
        Some((window, rest)) => Ok((rest, window)),
        None => fail(DecodeError::UnexpectedEnd),
    }
}

fn array<const N: usize>(input: ByteStream<'_>) -> DecodeResult<'_, [u8; N]> {
    let (rest, window) = take(N as u32)(input)?;
    let mut buf = [0u8; N];
    buf.copy_from_slice(window.remaining());
    Ok((rest, buf))
}

pub fn float32(input: ByteStream<'_>) -> DecodeResult<'_, f32> {
    let (input, raw) = array::<4>(input)?;
    Ok((input, f32::from_le_bytes(raw)))
}

pub fn float64(input: ByteStream<'_>) -> DecodeResult<'_, f64> {
    let (input, raw) = array::<8>(input)?;
    Ok((input, f64::from_le_bytes(raw)))
}

/// Length-prefixed raw bytes.
pub fn byte_vector(input: ByteStream<'_>) -> DecodeResult<'_, Vec<u8>> {
    let (input, len) = uint32(input)?;
    let (input, window) = take(len)(input)?;
    Ok((input, window.remaining().to_vec()))
}

/// Length-prefixed UTF-8 text.
///
/// The declared length alone decides how much input is consumed, so a sequence
/// cut short by the end of input is `UnexpectedEnd` rather than an encoding
/// error.
pub fn name(input: ByteStream<'_>) -> DecodeResult<'_, String> {
    let (input, len) = uint32(input)?;
    let (input, window) = take(len)(input)?;
    let raw = window.remaining();
    match std::str::from_utf8(raw) {
        Ok(text) => Ok((input, text.to_owned())),
        Err(err) => {
            let valid = err.valid_up_to();
            fail(DecodeError::Unexpected {
                byte: raw[valid],
                location: window.position() + valid,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::decode;
    use pretty_assertions::assert_eq;

    const UNEXPECTED_END: DecodeError = DecodeError::UnexpectedEnd;

    fn unexpected(byte: u8, location: usize) -> DecodeError {
        DecodeError::Unexpected { byte, location }
    }

    #[test]
    fn decode_byte() {
        assert_eq!(decode(&[0x01], byte(0x01)), Ok(0x01));
        assert_eq!(decode(&[], byte(0x01)), Err(UNEXPECTED_END));
        assert_eq!(decode(&[0x02], byte(0x01)), Err(unexpected(0x02, 0)));
    }

    #[test]
    fn decode_byte_in_range() {
        assert_eq!(decode(&[0x02], byte_in(0x01..0x03)), Ok(0x02));
        assert_eq!(decode(&[], byte_in(0x01..0x03)), Err(UNEXPECTED_END));
        assert_eq!(decode(&[0x00], byte_in(0x01..0x03)), Err(unexpected(0x00, 0)));
        assert_eq!(decode(&[0x03], byte_in(0x01..0x03)), Err(unexpected(0x03, 0)));
    }

    #[test]
    fn decode_byte_in_set() {
        let set = [0x01, 0x02, 0x03];
        assert_eq!(decode(&[0x02], byte_in_set(&set)), Ok(0x02));
        assert_eq!(decode(&[], byte_in_set(&set)), Err(UNEXPECTED_END));
        assert_eq!(decode(&[0x00], byte_in_set(&set)), Err(unexpected(0x00, 0)));
    }

    #[test]
    fn decode_bytes() {
        let expected = [0x01, 0x02, 0x03];
        assert_eq!(decode(&[0x01], bytes(&expected)), Err(UNEXPECTED_END));
        assert_eq!(
            decode(&[0x01, 0x02, 0x03], bytes(&expected)),
            Ok(&[0x01, 0x02, 0x03][..])
        );
        assert_eq!(
            decode(&[0x01, 0x09], bytes(&expected)),
            Err(unexpected(0x09, 1))
        );
    }

    #[test]
    fn decode_float32() {
        assert_eq!(decode(&[0xFF, 0xFF], float32), Err(UNEXPECTED_END));
        assert_eq!(decode(&[0x00, 0x00, 0x80, 0x3F], float32), Ok(1.0));
        assert_eq!(
            decode(&[0xDB, 0x0F, 0x49, 0x40], float32),
            Ok(std::f32::consts::PI)
        );
    }

    #[test]
    fn decode_float32_keeps_nan_payload() {
        let bits = decode(&[0x01, 0x00, 0xC0, 0x7F], float32).unwrap().to_bits();
        assert_eq!(bits, 0x7FC0_0001);
    }

    #[test]
    fn decode_float64() {
        assert_eq!(
            decode(&[0xFF, 0xFF, 0xFF, 0xFF], float64),
            Err(UNEXPECTED_END)
        );
        assert_eq!(
            decode(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xF0, 0x3F], float64),
            Ok(1.0)
        );
        assert_eq!(
            decode(&[0x18, 0x2D, 0x44, 0x54, 0xFB, 0x21, 0x09, 0x40], float64),
            Ok(std::f64::consts::PI)
        );
    }

    #[test]
    fn decode_name() {
        assert_eq!(decode(&[0x01, 0x61], name), Ok("a".to_string()));
        assert_eq!(decode(&[0x01], name), Err(UNEXPECTED_END));
        assert_eq!(decode(&[0x02, 0xC3, 0xA6], name), Ok("æ".to_string()));
        assert_eq!(decode(&[0x02, 0xC3], name), Err(UNEXPECTED_END));
        assert_eq!(decode(&[0x03, 0xE3, 0x81, 0x82], name), Ok("あ".to_string()));
        assert_eq!(decode(&[0x03, 0xE3, 0x81], name), Err(UNEXPECTED_END));
        assert_eq!(
            decode(&[0x04, 0xF0, 0x9F, 0x8D, 0xA3], name),
            Ok("🍣".to_string())
        );
        assert_eq!(decode(&[0x04, 0xF0, 0x9F, 0x8D], name), Err(UNEXPECTED_END));
    }

    #[test]
    fn decode_name_rejects_invalid_utf8() {
        assert_eq!(
            decode(&[0x02, 0x61, 0xFF], name),
            Err(unexpected(0xFF, 2))
        );
    }

    #[test]
    fn decode_byte_vector() {
        assert_eq!(decode(&[0x00], byte_vector), Ok(vec![]));
        assert_eq!(decode(&[0x02, 0xAA, 0xBB], byte_vector), Ok(vec![0xAA, 0xBB]));
        assert_eq!(decode(&[0x03, 0xAA], byte_vector), Err(UNEXPECTED_END));
    }
}
