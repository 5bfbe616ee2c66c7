//! Runtime state an interpreter builds from a decoded module, and the traps
//! it raises when that state is misused.

pub mod store;
pub mod trap;
pub mod value;

pub use store::Store;
pub use trap::Trap;
pub use value::{Frame, Stack, Value};
