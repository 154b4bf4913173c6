//! P-code virtual machine: executes packed instruction words.
//!
//! The machine has a single bounded stack of `i32` which holds operands,
//! procedure locals and call frames. A frame base register addresses
//! locals; `lod`/`sto` follow saved frame bases outward for enclosing
//! scopes. Execution stops successfully when the stack becomes empty.
//!
//! # Usage
//!
//! ```
//! use pcode_common::{Command, Instruction, Operation, Program};
//! use pcode_vm::{interpret, Stack};
//!
//! // lit 6; lit 7; opr mul; jpc 0 -- the product is non-zero, so jpc
//! // jumps, but the stack is already empty and the machine halts.
//! let program = Program::assemble(&[
//!     Instruction::new(Command::Lit, 0, 6),
//!     Instruction::new(Command::Lit, 0, 7),
//!     Instruction::op(Operation::Mul),
//!     Instruction::new(Command::Jpc, 0, 0),
//! ])
//! .unwrap();
//!
//! let mut storage = [0; 16];
//! let mut stack = Stack::new(&mut storage);
//! interpret(&program.words, &mut stack).unwrap();
//! assert!(stack.is_empty());
//! ```

pub mod budget;
pub mod dump;
pub mod error;
pub mod execute;
pub mod machine;
pub mod stack;

pub use budget::{run_bounded, Completion};
pub use dump::StackDump;
pub use error::RuntimeError;
pub use machine::{resolve_lexical, Machine, Step, DEFAULT_STACK_CAPACITY};
pub use stack::{Stack, StackError};

/// Execute `code` against `stack` until the stack is empty.
///
/// Program counter and frame base start at zero and are discarded when
/// the call returns. On failure `stack` holds the contents at the point
/// of failure.
///
/// # Errors
///
/// Returns [`RuntimeError`] on an empty code segment, a program counter
/// outside the code, an undecodable word, a stack fault or division by
/// zero.
pub fn interpret(code: &[i32], stack: &mut Stack<'_>) -> Result<(), RuntimeError> {
    Machine::new(code)?.run(stack)
}
