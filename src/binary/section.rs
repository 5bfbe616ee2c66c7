use super::{
    instruction::ConstExpr,
    types::{ExportDesc, FuncIdx, FunctionLocal, GlobalType, ImportDesc, MemIdx, TableIdx},
};
use num_derive::FromPrimitive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, FromPrimitive)]
#[repr(u8)]
pub enum SectionCode {
    Custom = 0x00,
    Type = 0x01,
    Import = 0x02,
    Function = 0x03,
    Table = 0x04,
    Memory = 0x05,
    Global = 0x06,
    Export = 0x07,
    Start = 0x08,
    Element = 0x09,
    Code = 0x0a,
    Data = 0x0b,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Custom {
    pub name: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub module: String,
    pub field: String,
    pub desc: ImportDesc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Global {
    pub global_type: GlobalType,
    pub init: ConstExpr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub name: String,
    pub desc: ExportDesc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub table_idx: TableIdx,
    pub offset: ConstExpr,
    pub init: Vec<FuncIdx>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Data {
    pub memory_idx: MemIdx,
    pub offset: ConstExpr,
    pub init: Vec<u8>,
}

/// A code section entry. The body is kept as raw expression bytes, ending in
/// `end`, for the interpreter to decode.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub locals: Vec<FunctionLocal>,
    pub body: Vec<u8>,
}
