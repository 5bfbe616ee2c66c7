use num_derive::FromPrimitive;

/// Opcodes allowed in constant expressions.
#[derive(Debug, Clone, Copy, FromPrimitive, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    End = 0x0B,
    GlobalGet = 0x23,
    I32Const = 0x41,
    I64Const = 0x42,
    F32Const = 0x43,
    F64Const = 0x44,
}
