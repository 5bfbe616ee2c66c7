use crate::binary::types::ValueType;
use thiserror::Error;

/// Runtime faults an interpreter raises when decoded structures are misused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Trap {
    #[error("unreachable executed")]
    Unreachable,
    #[error("type mismatch: expected {expected:?}, found {actual:?}")]
    StackTypeMismatch {
        expected: ValueType,
        actual: ValueType,
    },
    #[error("expected {expected:?} on the stack, found nothing at depth {depth}")]
    StackNotFound { expected: ValueType, depth: usize },
    #[error("local index {index} out of range")]
    LocalIndexOutOfRange { index: u32 },
    #[error("global index {index} out of range")]
    GlobalIndexOutOfRange { index: u32 },
    #[error("global {index} is immutable")]
    GlobalImmutable { index: u32 },
    #[error("{instruction} cannot operate on {actual:?}")]
    InvalidTypeForInstruction {
        actual: ValueType,
        instruction: &'static str,
    },
}
