//! Built-in sample program for `pcode demo`.

use pcode_common::{Command, Instruction, Operation};

/// `lit 2; lit 512; lit 1024; opr add; opr div`
///
/// Leaves `2 / 1536 = 0` on the stack and then runs off the end of the
/// code, so running it always reports an error with a one-slot dump.
pub fn program() -> [Instruction; 5] {
    [
        Instruction::new(Command::Lit, 0, 2),
        Instruction::new(Command::Lit, 0, 512),
        Instruction::new(Command::Lit, 0, 1024),
        Instruction::op(Operation::Add),
        Instruction::op(Operation::Div),
    ]
}
