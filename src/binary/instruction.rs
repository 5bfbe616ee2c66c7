use super::{
    error::{DecodeError, DecodeResult, fail},
    grammar::index,
    leb128::{sint32, sint64},
    opcode::Opcode,
    types::GlobalIdx,
    values::{byte, byte_map, float32, float64},
};
use crate::stream::ByteStream;
use num_traits::FromPrimitive as _;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instruction {
    GlobalGet(GlobalIdx),
    I32Const(i32),
    I64Const(i64),
    F32Const(f32),
    F64Const(f64),
}

/// A single constant instruction terminated by `end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstExpr(pub Instruction);

pub fn const_expr(input: ByteStream<'_>) -> DecodeResult<'_, ConstExpr> {
    let start = input;
    let (input, opcode) = byte_map(Opcode::from_u8)(input)?;
    let (input, instruction) = match opcode {
        Opcode::GlobalGet => {
            let (rest, idx) = index(input)?;
            (rest, Instruction::GlobalGet(idx))
        }
        Opcode::I32Const => {
            let (rest, value) = sint32(input)?;
            (rest, Instruction::I32Const(value))
        }
        Opcode::I64Const => {
            let (rest, value) = sint64(input)?;
            (rest, Instruction::I64Const(value))
        }
        Opcode::F32Const => {
            let (rest, value) = float32(input)?;
            (rest, Instruction::F32Const(value))
        }
        Opcode::F64Const => {
            let (rest, value) = float64(input)?;
            (rest, Instruction::F64Const(value))
        }
        // an empty expression produces no value
        Opcode::End => return fail(DecodeError::at(&start)),
    };
    let (input, _) = byte(Opcode::End as u8)(input)?;
    Ok((input, ConstExpr(instruction)))
}
