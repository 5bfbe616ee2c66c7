//! Decoders for the type grammar, composed from the primitives.

use super::{
    combinator::vector_or_empty,
    error::DecodeResult,
    leb128::uint32,
    types::{
        ElemType, FuncType, GlobalType, Limits, MemoryType, Mutability, ResultType, TableType,
        ValueType,
    },
    values::{byte, byte_map},
};
use crate::stream::ByteStream;
use nom::{
    branch::alt,
    combinator::{map, value},
    sequence::{pair, preceded},
};
use num_traits::FromPrimitive as _;

const EMPTY_RESULT: u8 = 0x40;
const FUNC_TYPE: u8 = 0x60;

pub fn value_type(input: ByteStream<'_>) -> DecodeResult<'_, ValueType> {
    byte_map(ValueType::from_u8)(input)
}

pub fn result_type(input: ByteStream<'_>) -> DecodeResult<'_, ResultType> {
    alt((
        value(ResultType(None), byte(EMPTY_RESULT)),
        map(value_type, ResultType::from),
    ))(input)
}

// Parameter and result lists may be empty, unlike `vector`.
pub fn function_type(input: ByteStream<'_>) -> DecodeResult<'_, FuncType> {
    let (input, (params, results)) = preceded(
        byte(FUNC_TYPE),
        pair(vector_or_empty(value_type), vector_or_empty(value_type)),
    )(input)?;
    Ok((input, FuncType { params, results }))
}

pub fn limits(input: ByteStream<'_>) -> DecodeResult<'_, Limits> {
    let (input, has_max) = byte_map(|flag| match flag {
        0x00 => Some(false),
        0x01 => Some(true),
        _ => None,
    })(input)?;
    let (input, min) = uint32(input)?;
    if !has_max {
        return Ok((input, Limits { min, max: None }));
    }
    let (input, max) = uint32(input)?;
    Ok((input, Limits { min, max: Some(max) }))
}

pub fn memory_type(input: ByteStream<'_>) -> DecodeResult<'_, MemoryType> {
    limits(input)
}

pub fn table_type(input: ByteStream<'_>) -> DecodeResult<'_, TableType> {
    let (input, (elem_type, limits)) = pair(byte_map(ElemType::from_u8), limits)(input)?;
    Ok((input, TableType { elem_type, limits }))
}

pub fn global_type(input: ByteStream<'_>) -> DecodeResult<'_, GlobalType> {
    let (input, (value_type, mutability)) =
        pair(value_type, byte_map(Mutability::from_u8))(input)?;
    Ok((
        input,
        GlobalType {
            value_type,
            mutability,
        },
    ))
}

pub fn index(input: ByteStream<'_>) -> DecodeResult<'_, u32> {
    uint32(input)
}
