use super::{trap::Trap, value::Value};
use crate::binary::{
    instruction::{ConstExpr, Instruction},
    module::Module,
    types::{GlobalIdx, GlobalType, ImportDesc, Mutability},
};
use anyhow::{Result, bail};
use log::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct GlobalInst {
    pub global_type: GlobalType,
    pub value: Value,
}

#[derive(Debug, Default)]
pub struct Store {
    pub globals: Vec<GlobalInst>,
}

impl Store {
    pub fn new(module: &Module) -> Result<Self> {
        if let Some(ref import_section) = module.import_section {
            for import in import_section {
                if let ImportDesc::Global(_) = import.desc {
                    bail!(
                        "imported global {}.{} is not supported",
                        import.module,
                        import.field
                    );
                }
            }
        }

        let mut globals: Vec<GlobalInst> = vec![];
        if let Some(ref global_section) = module.global_section {
            for global in global_section {
                let value = evaluate(&global.init, &globals)?;
                let expected = global.global_type.value_type;
                if value.value_type() != expected {
                    return Err(Trap::StackTypeMismatch {
                        expected,
                        actual: value.value_type(),
                    }
                    .into());
                }
                debug!("global {} initialized to {value:?}", globals.len());
                globals.push(GlobalInst {
                    global_type: global.global_type,
                    value,
                });
            }
        }

        Ok(Self { globals })
    }

    pub fn global_get(&self, index: GlobalIdx) -> Result<Value, Trap> {
        self.globals
            .get(index as usize)
            .map(|global| global.value)
            .ok_or(Trap::GlobalIndexOutOfRange { index })
    }

    pub fn global_set(&mut self, index: GlobalIdx, value: Value) -> Result<(), Trap> {
        let Some(global) = self.globals.get_mut(index as usize) else {
            return Err(Trap::GlobalIndexOutOfRange { index });
        };
        if global.global_type.mutability == Mutability::Const {
            return Err(Trap::GlobalImmutable { index });
        }
        let expected = global.global_type.value_type;
        if value.value_type() != expected {
            return Err(Trap::StackTypeMismatch {
                expected,
                actual: value.value_type(),
            });
        }
        global.value = value;
        Ok(())
    }
}

// `global.get` sees only the globals instantiated before this one.
fn evaluate(expr: &ConstExpr, globals: &[GlobalInst]) -> Result<Value, Trap> {
    let value = match expr.0 {
        Instruction::GlobalGet(index) => {
            globals
                .get(index as usize)
                .ok_or(Trap::GlobalIndexOutOfRange { index })?
                .value
        }
        Instruction::I32Const(value) => value.into(),
        Instruction::I64Const(value) => value.into(),
        Instruction::F32Const(value) => value.into(),
        Instruction::F64Const(value) => value.into(),
    };
    Ok(value)
}
