//! Command and operation selectors of the P-code instruction set.
//!
//! A packed word carries a 4-bit [`Command`] ordinal. When the command is
//! [`Command::Opr`], the word's value field selects an [`Operation`].

use crate::error::DecodeError;

/// Identifies what an instruction does.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Push the literal `value`.
    Lit = 0,
    /// Execute the arithmetic/control [`Operation`] selected by `value`.
    Opr = 1,
    /// Push the variable at offset `value`, `level` scopes outward.
    Lod = 2,
    /// Pop into the variable at offset `value`, `level` scopes outward.
    Sto = 3,
    /// Call the procedure at code offset `value`.
    Cal = 4,
    /// Grow the stack by `value` slots (may be negative).
    Inc = 5,
    /// Pop a condition, jump to `value` if it is non-zero.
    Jpc = 6,
    /// Jump to code offset `value`.
    Jmp = 7,
}

/// All commands, in ordinal order.
pub const ALL_COMMANDS: [Command; 8] = [
    Command::Lit,
    Command::Opr,
    Command::Lod,
    Command::Sto,
    Command::Cal,
    Command::Inc,
    Command::Jpc,
    Command::Jmp,
];

impl TryFrom<u8> for Command {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        ALL_COMMANDS
            .get(value as usize)
            .copied()
            .ok_or(DecodeError::InvalidCommand(value))
    }
}

impl Command {
    /// Returns the assembly mnemonic for this command.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Command::Lit => "lit",
            Command::Opr => "opr",
            Command::Lod => "lod",
            Command::Sto => "sto",
            Command::Cal => "cal",
            Command::Inc => "inc",
            Command::Jpc => "jpc",
            Command::Jmp => "jmp",
        }
    }
}

/// Operation selected by the value of an `opr` instruction.
///
/// Binary operations take their left operand from the slot below the top
/// and their right operand from the top: `lit A; lit B; opr sub` yields
/// `A - B`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Tear down the current frame and return to the caller.
    Return = 0,
    /// Negate the top of stack.
    Neg = 1,
    Add = 2,
    Sub = 3,
    Mul = 4,
    /// Truncating division. A zero divisor is a runtime error.
    Div = 5,
    /// Truncating remainder. A zero divisor is a runtime error.
    Mod = 6,
    Eq = 7,
    Neq = 8,
    Lt = 9,
    Gt = 10,
    Lte = 11,
    Gte = 12,
}

/// Highest valid operation selector.
pub const OPERATION_MAX: i32 = Operation::Gte as i32;

/// All operations, in selector order.
pub const ALL_OPERATIONS: [Operation; 13] = [
    Operation::Return,
    Operation::Neg,
    Operation::Add,
    Operation::Sub,
    Operation::Mul,
    Operation::Div,
    Operation::Mod,
    Operation::Eq,
    Operation::Neq,
    Operation::Lt,
    Operation::Gt,
    Operation::Lte,
    Operation::Gte,
];

impl TryFrom<i32> for Operation {
    type Error = DecodeError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        usize::try_from(value)
            .ok()
            .and_then(|i| ALL_OPERATIONS.get(i))
            .copied()
            .ok_or(DecodeError::InvalidOperation(value))
    }
}

impl Operation {
    /// Returns the assembly mnemonic for this operation.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Operation::Return => "ret",
            Operation::Neg => "neg",
            Operation::Add => "add",
            Operation::Sub => "sub",
            Operation::Mul => "mul",
            Operation::Div => "div",
            Operation::Mod => "mod",
            Operation::Eq => "eq",
            Operation::Neq => "neq",
            Operation::Lt => "lt",
            Operation::Gt => "gt",
            Operation::Lte => "lte",
            Operation::Gte => "gte",
        }
    }
}
