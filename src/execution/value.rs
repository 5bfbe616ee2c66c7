use super::trap::Trap;
use crate::binary::types::ValueType;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::I32(_) => ValueType::I32,
            Value::I64(_) => ValueType::I64,
            Value::F32(_) => ValueType::F32,
            Value::F64(_) => ValueType::F64,
        }
    }

    /// Zero of the given type, the initial value of a declared local.
    pub fn zero(value_type: ValueType) -> Self {
        match value_type {
            ValueType::I32 => Value::I32(0),
            ValueType::I64 => Value::I64(0),
            ValueType::F32 => Value::F32(0.0),
            ValueType::F64 => Value::F64(0.0),
        }
    }

    fn check_type(self, expected: ValueType) -> Result<Self, Trap> {
        let actual = self.value_type();
        if actual != expected {
            return Err(Trap::StackTypeMismatch { expected, actual });
        }
        Ok(self)
    }

    /// Nonzero test used by conditional branches. Only `i32` qualifies.
    pub fn is_true(self, instruction: &'static str) -> Result<bool, Trap> {
        match self {
            Value::I32(value) => Ok(value != 0),
            other => Err(Trap::InvalidTypeForInstruction {
                actual: other.value_type(),
                instruction,
            }),
        }
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::I32(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::I32(if value { 1 } else { 0 })
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::I64(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::F32(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::F64(value)
    }
}

macro_rules! impl_try_from_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl TryFrom<Value> for $ty {
                type Error = Trap;

                fn try_from(value: Value) -> Result<Self, Trap> {
                    match value {
                        Value::$variant(value) => Ok(value),
                        other => Err(Trap::StackTypeMismatch {
                            expected: ValueType::$variant,
                            actual: other.value_type(),
                        }),
                    }
                }
            }
        )*
    };
}

impl_try_from_value!(i32 => I32, i64 => I64, f32 => F32, f64 => F64);

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Stack {
    values: Vec<Value>,
}

impl Stack {
    pub fn push(&mut self, value: impl Into<Value>) {
        self.values.push(value.into());
    }

    /// Pops one value per entry of `expected`, the last entry matching the
    /// top of the stack. Nothing is popped on failure; `StackNotFound` reports
    /// how many values below the top were already matched.
    pub fn pop_values(&mut self, expected: &[ValueType]) -> Result<Vec<Value>, Trap> {
        for (depth, &value_type) in expected.iter().rev().enumerate() {
            let Some(index) = self.values.len().checked_sub(depth + 1) else {
                return Err(Trap::StackNotFound {
                    expected: value_type,
                    depth,
                });
            };
            self.values[index].check_type(value_type)?;
        }
        let base = self.values.len() - expected.len();
        Ok(self.values.split_off(base))
    }

    pub fn pop_value(&mut self, expected: ValueType) -> Result<Value, Trap> {
        let Some(value) = self.values.pop() else {
            return Err(Trap::StackNotFound { expected, depth: 0 });
        };
        match value.check_type(expected) {
            Ok(value) => Ok(value),
            Err(trap) => {
                self.values.push(value);
                Err(trap)
            }
        }
    }

    /// Pops a value and converts it to the Rust type of its kind.
    pub fn pop<T>(&mut self) -> Result<T, Trap>
    where
        T: TryFrom<Value, Error = Trap> + Typed,
    {
        self.pop_value(T::VALUE_TYPE)?.try_into()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Rust types that correspond to a single value type.
pub trait Typed {
    const VALUE_TYPE: ValueType;
}

impl Typed for i32 {
    const VALUE_TYPE: ValueType = ValueType::I32;
}

impl Typed for i64 {
    const VALUE_TYPE: ValueType = ValueType::I64;
}

impl Typed for f32 {
    const VALUE_TYPE: ValueType = ValueType::F32;
}

impl Typed for f64 {
    const VALUE_TYPE: ValueType = ValueType::F64;
}

/// Locals of an active call: parameters followed by declared locals.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Frame {
    locals: Vec<Value>,
}

impl Frame {
    pub fn new(args: Vec<Value>, locals: &[ValueType]) -> Self {
        let mut values = args;
        values.extend(locals.iter().copied().map(Value::zero));
        Self { locals: values }
    }

    pub fn local_get(&self, index: u32) -> Result<Value, Trap> {
        self.locals
            .get(index as usize)
            .copied()
            .ok_or(Trap::LocalIndexOutOfRange { index })
    }

    pub fn local_set(&mut self, index: u32, value: Value) -> Result<(), Trap> {
        let slot = self
            .locals
            .get_mut(index as usize)
            .ok_or(Trap::LocalIndexOutOfRange { index })?;
        *slot = value.check_type(slot.value_type())?;
        Ok(())
    }
}
