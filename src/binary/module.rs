use super::{
    combinator::vector_or_empty,
    decode,
    error::{DecodeError, DecodeResult, fail},
    grammar::{function_type, global_type, index, memory_type, table_type, value_type},
    instruction::const_expr,
    leb128::uint32,
    opcode::Opcode,
    section::{Custom, Data, Element, Export, Function, Global, Import, SectionCode},
    types::{ExportDesc, FuncIdx, FuncType, FunctionLocal, ImportDesc, MemoryType, TableType},
    values::{byte_in, byte_map, byte_vector, bytes, name, take},
};
use crate::stream::ByteStream;
use log::{debug, info};
use nom::{
    Parser,
    combinator::{all_consuming, map},
    sequence::pair,
};
use num_traits::FromPrimitive as _;

const MAGIC: &[u8] = b"\0asm";
const VERSION: &[u8] = &[0x01, 0x00, 0x00, 0x00];

#[derive(Debug, PartialEq)]
pub struct Module {
    pub version: u32,
    pub custom_sections: Vec<Custom>,
    pub type_section: Option<Vec<FuncType>>,
    pub import_section: Option<Vec<Import>>,
    pub function_section: Option<Vec<u32>>,
    pub table_section: Option<Vec<TableType>>,
    pub memory_section: Option<Vec<MemoryType>>,
    pub global_section: Option<Vec<Global>>,
    pub export_section: Option<Vec<Export>>,
    pub start_section: Option<FuncIdx>,
    pub element_section: Option<Vec<Element>>,
    pub code_section: Option<Vec<Function>>,
    pub data_section: Option<Vec<Data>>,
}

impl Default for Module {
    fn default() -> Self {
        Self {
            version: 1,
            custom_sections: vec![],
            type_section: None,
            import_section: None,
            function_section: None,
            table_section: None,
            memory_section: None,
            global_section: None,
            export_section: None,
            start_section: None,
            element_section: None,
            code_section: None,
            data_section: None,
        }
    }
}

impl Module {
    pub fn new(input: &[u8]) -> Result<Module, DecodeError> {
        info!("decoding module ({} bytes)", input.len());
        decode(input, Module::decode)
    }

    fn decode(input: ByteStream<'_>) -> DecodeResult<'_, Module> {
        let (input, _) = bytes(MAGIC)(input)?;
        let (input, _) = bytes(VERSION)(input)?;

        let mut module = Module::default();
        let mut last_code = None;
        let mut remaining = input;

        while !remaining.is_empty() {
            let header = remaining;
            let (input, (code, size)) = decode_section_header(remaining)?;
            if code != SectionCode::Custom {
                // non-custom sections appear at most once, in id order
                if last_code.is_some_and(|last| code <= last) {
                    return fail(DecodeError::at(&header));
                }
                last_code = Some(code);
            }
            let (rest, contents) = take(size)(input)?;
            debug!("decoding {code:?} section ({size} bytes)");

            match code {
                SectionCode::Custom => {
                    let custom = section(contents, decode_custom_section)?;
                    module.custom_sections.push(custom);
                }
                SectionCode::Type => {
                    let types = section(contents, vector_or_empty(function_type))?;
                    module.type_section = Some(types);
                }
                SectionCode::Import => {
                    let imports = section(contents, vector_or_empty(decode_import))?;
                    module.import_section = Some(imports);
                }
                SectionCode::Function => {
                    let func_idx_list = section(contents, vector_or_empty(index))?;
                    module.function_section = Some(func_idx_list);
                }
                SectionCode::Table => {
                    let tables = section(contents, vector_or_empty(table_type))?;
                    module.table_section = Some(tables);
                }
                SectionCode::Memory => {
                    let memories = section(contents, vector_or_empty(memory_type))?;
                    module.memory_section = Some(memories);
                }
                SectionCode::Global => {
                    let globals = section(contents, vector_or_empty(decode_global))?;
                    module.global_section = Some(globals);
                }
                SectionCode::Export => {
                    let exports = section(contents, vector_or_empty(decode_export))?;
                    module.export_section = Some(exports);
                }
                SectionCode::Start => {
                    let func_idx = section(contents, index)?;
                    module.start_section = Some(func_idx);
                }
                SectionCode::Element => {
                    let elements = section(contents, vector_or_empty(decode_element))?;
                    module.element_section = Some(elements);
                }
                SectionCode::Code => {
                    let funcs = section(contents, vector_or_empty(decode_code))?;
                    module.code_section = Some(funcs);
                }
                SectionCode::Data => {
                    let data = section(contents, vector_or_empty(decode_data))?;
                    module.data_section = Some(data);
                }
            }

            remaining = rest;
        }

        Ok((remaining, module))
    }
}

// Decodes a section payload, which must be consumed exactly.
fn section<'a, T>(
    contents: ByteStream<'a>,
    decoder: impl Parser<ByteStream<'a>, T, DecodeError>,
) -> Result<T, nom::Err<DecodeError>> {
    let (_, value) = all_consuming(decoder)(contents)?;
    Ok(value)
}

fn decode_section_header(input: ByteStream<'_>) -> DecodeResult<'_, (SectionCode, u32)> {
    pair(byte_map(SectionCode::from_u8), uint32)(input)
}

fn decode_custom_section(input: ByteStream<'_>) -> DecodeResult<'_, Custom> {
    let (input, name) = name(input)?;
    let (rest, data) = take(input.remaining().len() as u32)(input)?;
    Ok((
        rest,
        Custom {
            name,
            data: data.remaining().to_vec(),
        },
    ))
}

fn decode_import(input: ByteStream<'_>) -> DecodeResult<'_, Import> {
    let (input, module) = name(input)?;
    let (input, field) = name(input)?;
    let (input, kind) = byte_in(0x00..=0x03)(input)?;
    let (input, desc) = match kind {
        0x00 => map(index, ImportDesc::Func)(input)?,
        0x01 => map(table_type, ImportDesc::Table)(input)?,
        0x02 => map(memory_type, ImportDesc::Memory)(input)?,
        _ => map(global_type, ImportDesc::Global)(input)?,
    };
    Ok((
        input,
        Import {
            module,
            field,
            desc,
        },
    ))
}

fn decode_global(input: ByteStream<'_>) -> DecodeResult<'_, Global> {
    let (input, (global_type, init)) = pair(global_type, const_expr)(input)?;
    Ok((input, Global { global_type, init }))
}

fn decode_export(input: ByteStream<'_>) -> DecodeResult<'_, Export> {
    let (input, name) = name(input)?;
    let (input, kind) = byte_in(0x00..=0x03)(input)?;
    let (input, idx) = index(input)?;
    let desc = match kind {
        0x00 => ExportDesc::Func(idx),
        0x01 => ExportDesc::Table(idx),
        0x02 => ExportDesc::Memory(idx),
        _ => ExportDesc::Global(idx),
    };
    Ok((input, Export { name, desc }))
}

fn decode_element(input: ByteStream<'_>) -> DecodeResult<'_, Element> {
    let (input, table_idx) = index(input)?;
    let (input, offset) = const_expr(input)?;
    let (input, init) = vector_or_empty(index)(input)?;
    Ok((
        input,
        Element {
            table_idx,
            offset,
            init,
        },
    ))
}

fn decode_code(input: ByteStream<'_>) -> DecodeResult<'_, Function> {
    let (input, size) = uint32(input)?;
    let (rest, body) = take(size)(input)?;
    let function = section(body, decode_function_body)?;
    Ok((rest, function))
}

fn decode_function_body(input: ByteStream<'_>) -> DecodeResult<'_, Function> {
    let (input, locals) = vector_or_empty(decode_function_local)(input)?;
    let expr = input.remaining();
    if expr.last() != Some(&(Opcode::End as u8)) {
        return fail(DecodeError::UnexpectedEnd);
    }
    let (rest, _) = take(expr.len() as u32)(input)?;
    Ok((
        rest,
        Function {
            locals,
            body: expr.to_vec(),
        },
    ))
}

fn decode_function_local(input: ByteStream<'_>) -> DecodeResult<'_, FunctionLocal> {
    let (input, (type_count, value_type)) = pair(uint32, value_type)(input)?;
    Ok((
        input,
        FunctionLocal {
            type_count,
            value_type,
        },
    ))
}

fn decode_data(input: ByteStream<'_>) -> DecodeResult<'_, Data> {
    let (input, memory_idx) = index(input)?;
    let (input, offset) = const_expr(input)?;
    let (input, init) = byte_vector(input)?;
    Ok((
        input,
        Data {
            memory_idx,
            offset,
            init,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::{
        instruction::{ConstExpr, Instruction},
        types::{ElemType, GlobalType, Limits, Mutability, ValueType},
    };
    use anyhow::Result;
    use pretty_assertions::assert_eq;

    fn unexpected(byte: u8, location: usize) -> DecodeError {
        DecodeError::Unexpected { byte, location }
    }

    #[test]
    fn decode_simplest_module() -> Result<()> {
        let wasm = wat::parse_str("(module)")?;
        let module = Module::new(&wasm)?;
        assert_eq!(module, Module::default());
        Ok(())
    }

    #[test]
    fn decode_func_add() -> Result<()> {
        let wasm = wat::parse_str(
            r#"(module
                (func (export "add") (param i32 i32) (result i32)
                    local.get 0
                    local.get 1
                    i32.add))"#,
        )?;
        let module = Module::new(&wasm)?;
        assert_eq!(
            module,
            Module {
                type_section: Some(vec![FuncType {
                    params: vec![ValueType::I32, ValueType::I32],
                    results: vec![ValueType::I32],
                }]),
                function_section: Some(vec![0]),
                export_section: Some(vec![Export {
                    name: "add".into(),
                    desc: ExportDesc::Func(0),
                }]),
                code_section: Some(vec![Function {
                    locals: vec![],
                    body: vec![0x20, 0x00, 0x20, 0x01, 0x6A, 0x0B],
                }]),
                ..Default::default()
            }
        );
        Ok(())
    }

    #[test]
    fn decode_func_local() -> Result<()> {
        let wasm = wat::parse_str("(module (func (local i32) (local i64 i64)))")?;
        let module = Module::new(&wasm)?;
        assert_eq!(
            module.code_section,
            Some(vec![Function {
                locals: vec![
                    FunctionLocal {
                        type_count: 1,
                        value_type: ValueType::I32,
                    },
                    FunctionLocal {
                        type_count: 2,
                        value_type: ValueType::I64,
                    },
                ],
                body: vec![0x0B],
            }])
        );
        Ok(())
    }

    #[test]
    fn decode_import() -> Result<()> {
        let wasm = wat::parse_str(
            r#"(module
                (import "env" "add" (func (param i32) (result i32)))
                (import "env" "mem" (memory 1))
                (import "env" "g" (global (mut f64))))"#,
        )?;
        let module = Module::new(&wasm)?;
        assert_eq!(
            module.import_section,
            Some(vec![
                Import {
                    module: "env".into(),
                    field: "add".into(),
                    desc: ImportDesc::Func(0),
                },
                Import {
                    module: "env".into(),
                    field: "mem".into(),
                    desc: ImportDesc::Memory(Limits { min: 1, max: None }),
                },
                Import {
                    module: "env".into(),
                    field: "g".into(),
                    desc: ImportDesc::Global(GlobalType {
                        value_type: ValueType::F64,
                        mutability: Mutability::Var,
                    }),
                },
            ])
        );
        Ok(())
    }

    #[test]
    fn decode_memory() -> Result<()> {
        let tests = vec![
            ("(module (memory 1))", Limits { min: 1, max: None }),
            (
                "(module (memory 1 2))",
                Limits {
                    min: 1,
                    max: Some(2),
                },
            ),
        ];
        for (wasm, limits) in tests {
            let module = Module::new(&wat::parse_str(wasm)?)?;
            assert_eq!(
                module,
                Module {
                    memory_section: Some(vec![limits]),
                    ..Default::default()
                }
            );
        }
        Ok(())
    }

    #[test]
    fn decode_data() -> Result<()> {
        let wasm = wat::parse_str(
            r#"(module (memory 1) (data (i32.const 0) "hello") (data (i32.const 5) "world"))"#,
        )?;
        let module = Module::new(&wasm)?;
        assert_eq!(
            module.data_section,
            Some(vec![
                Data {
                    memory_idx: 0,
                    offset: ConstExpr(Instruction::I32Const(0)),
                    init: b"hello".into(),
                },
                Data {
                    memory_idx: 0,
                    offset: ConstExpr(Instruction::I32Const(5)),
                    init: b"world".into(),
                },
            ])
        );
        Ok(())
    }

    #[test]
    fn decode_globals() -> Result<()> {
        let wasm = wat::parse_str(
            "(module (global (mut i32) (i32.const 42)) (global i64 (i64.const -1)))",
        )?;
        let module = Module::new(&wasm)?;
        assert_eq!(
            module.global_section,
            Some(vec![
                Global {
                    global_type: GlobalType {
                        value_type: ValueType::I32,
                        mutability: Mutability::Var,
                    },
                    init: ConstExpr(Instruction::I32Const(42)),
                },
                Global {
                    global_type: GlobalType {
                        value_type: ValueType::I64,
                        mutability: Mutability::Const,
                    },
                    init: ConstExpr(Instruction::I64Const(-1)),
                },
            ])
        );
        Ok(())
    }

    #[test]
    fn decode_table_elem_and_start() -> Result<()> {
        let wasm = wat::parse_str(
            "(module (table 2 funcref) (func) (func) (start 1) (elem (i32.const 0) 0 1))",
        )?;
        let module = Module::new(&wasm)?;
        assert_eq!(
            module.table_section,
            Some(vec![TableType {
                elem_type: ElemType::FuncRef,
                limits: Limits { min: 2, max: None },
            }])
        );
        assert_eq!(module.start_section, Some(1));
        assert_eq!(
            module.element_section,
            Some(vec![Element {
                table_idx: 0,
                offset: ConstExpr(Instruction::I32Const(0)),
                init: vec![0, 1],
            }])
        );
        Ok(())
    }

    #[test]
    fn decode_custom_section() -> Result<()> {
        let wasm = [
            0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00, // header
            0x00, 0x04, 0x02, b'h', b'i', 0xAA, // custom "hi" [0xAA]
        ];
        let module = Module::new(&wasm)?;
        assert_eq!(
            module.custom_sections,
            vec![Custom {
                name: "hi".into(),
                data: vec![0xAA],
            }]
        );
        Ok(())
    }

    #[test]
    fn reject_bad_header() {
        assert_eq!(
            Module::new(&[0x00, 0x61, 0x73, 0x6E]),
            Err(unexpected(0x6E, 3))
        );
        assert_eq!(
            Module::new(&[0x00, 0x61, 0x73, 0x6D, 0x02, 0x00, 0x00, 0x00]),
            Err(unexpected(0x02, 4))
        );
        assert_eq!(
            Module::new(&[0x00, 0x61, 0x73, 0x6D, 0x01]),
            Err(DecodeError::UnexpectedEnd)
        );
    }

    #[test]
    fn reject_malformed_sections() {
        let header = [0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00];
        let with = |section: &[u8]| [&header[..], section].concat();

        // unknown section id
        assert_eq!(Module::new(&with(&[0x0C, 0x00])), Err(unexpected(0x0C, 8)));
        // payload runs past the input
        assert_eq!(
            Module::new(&with(&[0x01, 0x05, 0x00])),
            Err(DecodeError::UnexpectedEnd)
        );
        // leftover byte inside the type section
        assert_eq!(
            Module::new(&with(&[0x01, 0x02, 0x00, 0xFF])),
            Err(unexpected(0xFF, 11))
        );
        // memory section followed by a type section
        assert_eq!(
            Module::new(&with(&[0x05, 0x01, 0x00, 0x01, 0x01, 0x00])),
            Err(unexpected(0x01, 11))
        );
        // duplicated section
        assert_eq!(
            Module::new(&with(&[0x03, 0x01, 0x00, 0x03, 0x01, 0x00])),
            Err(unexpected(0x03, 11))
        );
    }

    #[test]
    fn reject_code_body_without_end() {
        let wasm = [
            0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00, // header
            0x0A, 0x04, 0x01, 0x02, 0x00, 0x01, // code: one body [locals 0, nop]
        ];
        assert_eq!(Module::new(&wasm), Err(DecodeError::UnexpectedEnd));
    }
}
