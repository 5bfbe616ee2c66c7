//! LEB128 integer decoding.
//!
//! Groups of 7 bits, least significant first, with bit 7 as the continuation
//! flag. The generic decoders accept any number of groups and only check the
//! range of single-byte widths (`bits <= 7`). The typed decoders used by the
//! module grammar take at most `ceil(bits / 7)` groups, and the last of those
//! must not carry bits the integer cannot hold.

use super::error::{DecodeError, DecodeResult, fail};
use crate::stream::{ByteStream, Stream};

const PAYLOAD_MASK: u8 = 0x7F;
const CONTINUATION_BIT: u8 = 0x80;
const SIGN_BIT: u8 = 0x40;
const MAX_BITS: u32 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extension {
    None,
    /// Sign bit is bit 6 of the final group.
    FinalGroup,
    /// Sign bit is the highest bit of the final group that lies below `bits`.
    Width,
}

fn read(input: ByteStream<'_>, bits: u32, extension: Extension) -> DecodeResult<'_, u64> {
    let bits = bits.min(MAX_BITS);
    if bits <= 7 {
        return read_single(input, bits, extension != Extension::None);
    }

    let mut stream = input;
    let mut result = 0u64;
    let mut shift = 0u32;
    loop {
        let Some(byte) = stream.advance() else {
            return fail(DecodeError::UnexpectedEnd);
        };
        let payload = byte & PAYLOAD_MASK;
        // groups past the 64th bit cannot contribute
        if let Some(group) = u64::from(payload).checked_shl(shift) {
            result |= group;
        }

        if byte & CONTINUATION_BIT == 0 {
            let sign = match extension {
                Extension::None => None,
                Extension::FinalGroup => Some(6),
                Extension::Width if bits > shift => Some((bits - shift - 1).min(6)),
                Extension::Width => Some(6),
            };
            if let Some(sign) = sign {
                let extend_from = shift.saturating_add(sign + 1);
                if (payload >> sign) & 1 != 0 && extend_from < MAX_BITS {
                    result |= !0u64 << extend_from;
                }
            }
            return Ok((stream, result));
        }
        shift = shift.saturating_add(7);
    }
}

// A width of at most seven bits is a single group whose payload must fit.
fn read_single(input: ByteStream<'_>, bits: u32, signed: bool) -> DecodeResult<'_, u64> {
    let mut stream = input;
    let location = stream.position();
    let Some(byte) = stream.advance() else {
        return fail(DecodeError::UnexpectedEnd);
    };
    let payload = byte & PAYLOAD_MASK;
    if byte & CONTINUATION_BIT != 0 || !fits(payload, bits, signed) {
        return fail(DecodeError::Unexpected { byte, location });
    }
    let mut result = u64::from(payload);
    if signed && payload & SIGN_BIT != 0 {
        result |= !0u64 << 7;
    }
    Ok((stream, result))
}

fn read_bounded(input: ByteStream<'_>, bits: u32, signed: bool) -> DecodeResult<'_, u64> {
    let max_groups = bits.div_ceil(7);

    let mut stream = input;
    let mut result = 0u64;
    let mut shift = 0u32;
    let mut group = 0u32;
    loop {
        let location = stream.position();
        let Some(byte) = stream.advance() else {
            return fail(DecodeError::UnexpectedEnd);
        };
        let payload = byte & PAYLOAD_MASK;

        if group + 1 == max_groups {
            if byte & CONTINUATION_BIT != 0 {
                return match stream.peek() {
                    None => fail(DecodeError::UnexpectedEnd),
                    Some(_) => fail(DecodeError::Unexpected { byte, location }),
                };
            }
            if !fits(payload, bits - shift, signed) {
                return fail(DecodeError::Unexpected { byte, location });
            }
        }

        result |= u64::from(payload) << shift;
        shift += 7;

        if byte & CONTINUATION_BIT == 0 {
            if signed && shift < MAX_BITS && byte & SIGN_BIT != 0 {
                result |= !0u64 << shift;
            }
            return Ok((stream, result));
        }
        group += 1;
    }
}

// Whether the final group's payload fits in the `remaining` low bits.
fn fits(payload: u8, remaining: u32, signed: bool) -> bool {
    if remaining >= 7 {
        return true;
    }
    if remaining == 0 {
        return payload == 0;
    }
    if signed {
        // bits from the sign bit upwards must all agree
        let mask = (PAYLOAD_MASK << (remaining - 1)) & PAYLOAD_MASK;
        let high = payload & mask;
        high == 0 || high == mask
    } else {
        payload >> remaining == 0
    }
}

/// Unsigned LEB128. Widths above 64 are read as 64.
pub fn uint<'a>(bits: u32) -> impl FnMut(ByteStream<'a>) -> DecodeResult<'a, u64> {
    move |input| read(input, bits, Extension::None)
}

/// Signed LEB128, sign-extended from bit 6 of the final group.
pub fn sint<'a>(bits: u32) -> impl FnMut(ByteStream<'a>) -> DecodeResult<'a, i64> {
    move |input| {
        let (input, raw) = read(input, bits, Extension::FinalGroup)?;
        Ok((input, raw as i64))
    }
}

/// The format's uninterpreted integer encoding. Sign-extended from the
/// highest bit of the final group that falls inside `bits`, so
/// `int(8)` reads `80 01` as -128 where `sint(8)` reads 128.
pub fn int<'a>(bits: u32) -> impl FnMut(ByteStream<'a>) -> DecodeResult<'a, i64> {
    move |input| {
        let (input, raw) = read(input, bits, Extension::Width)?;
        Ok((input, raw as i64))
    }
}

pub fn uint32(input: ByteStream<'_>) -> DecodeResult<'_, u32> {
    let (input, value) = read_bounded(input, 32, false)?;
    Ok((input, value as u32))
}

pub fn sint32(input: ByteStream<'_>) -> DecodeResult<'_, i32> {
    let (input, value) = read_bounded(input, 32, true)?;
    Ok((input, value as i32))
}

pub fn sint64(input: ByteStream<'_>) -> DecodeResult<'_, i64> {
    let (input, value) = read_bounded(input, 64, true)?;
    Ok((input, value as i64))
}
