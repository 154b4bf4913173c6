//! P-code instruction set and word encoding.
//!
//! This crate provides the data structures shared by the machine and the
//! tools that produce or inspect code:
//!
//! - [`Command`]: the eight instruction commands
//! - [`Operation`]: the thirteen `opr` selectors
//! - [`Instruction`]: the decoded instruction with pack/unpack
//! - [`Program`]: a code segment of packed words and its file format
//! - [`DecodeError`] / [`EncodeError`]: codec failures
//! - [`LoadError`]: malformed code files

pub mod error;
pub mod instruction;
pub mod opcode;
pub mod program;

// Re-export commonly used types at the crate root.
pub use error::{DecodeError, EncodeError, LoadError};
pub use instruction::{Instruction, LEVEL_MAX, VALUE_MAX, VALUE_MIN};
pub use opcode::{Command, Operation, OPERATION_MAX};
pub use program::Program;
