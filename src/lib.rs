pub mod binary;
pub mod execution;
pub mod stream;
pub mod wast;
