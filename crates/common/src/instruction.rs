//! Packing and unpacking of P-code instruction words.
//!
//! Every instruction is one signed 32-bit word:
//! ```text
//! Bits 0-3:   level   (u4, static nesting depth)
//! Bits 4-7:   command (u4, ordinal 0..=7)
//! Bits 8-31:  value   (i24, sign-extended on decode)
//! ```

use std::fmt;

use crate::error::{DecodeError, EncodeError};
use crate::opcode::{Command, Operation};

/// Highest static nesting level that fits the level field.
pub const LEVEL_MAX: u8 = 0xF;

/// Smallest value that fits the 24-bit value field.
pub const VALUE_MIN: i32 = -(1 << 23);

/// Largest value that fits the 24-bit value field.
pub const VALUE_MAX: i32 = (1 << 23) - 1;

const LEVEL_MASK: u32 = 0xF;
const COMMAND_SHIFT: u32 = 4;
const COMMAND_MASK: u32 = 0xF;
const VALUE_SHIFT: u32 = 8;
const VALUE_MASK: u32 = 0x00FF_FFFF;
const VALUE_SIGN_BIT: u32 = 0x0080_0000;

/// A single decoded P-code instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    /// The command to execute.
    pub command: Command,
    /// Number of static links to follow. Only `lod` and `sto` use it.
    pub level: u8,
    /// Operand. Meaning depends on `command`.
    pub value: i32,
}

impl Instruction {
    /// Create a new instruction.
    pub fn new(command: Command, level: u8, value: i32) -> Self {
        Self {
            command,
            level,
            value,
        }
    }

    /// An `opr` instruction selecting `op`.
    pub fn op(op: Operation) -> Self {
        Self::new(Command::Opr, 0, op as i32)
    }

    /// Pack this instruction into a word.
    ///
    /// Fails instead of truncating when `level` or `value` do not fit
    /// their fields.
    pub fn encode(&self) -> Result<i32, EncodeError> {
        if self.level > LEVEL_MAX {
            return Err(EncodeError::LevelOutOfRange(self.level));
        }
        if !(VALUE_MIN..=VALUE_MAX).contains(&self.value) {
            return Err(EncodeError::ValueOutOfRange(self.value));
        }

        let value = (self.value as u32) & VALUE_MASK;
        let word = (value << VALUE_SHIFT)
            | ((self.command as u32) << COMMAND_SHIFT)
            | self.level as u32;
        Ok(word as i32)
    }

    /// Unpack a word into an instruction.
    pub fn decode(word: i32) -> Result<Self, DecodeError> {
        let bits = word as u32;
        let level = (bits & LEVEL_MASK) as u8;
        let command = Command::try_from(((bits >> COMMAND_SHIFT) & COMMAND_MASK) as u8)?;
        let value = sign_extend((bits >> VALUE_SHIFT) & VALUE_MASK);

        Ok(Self {
            command,
            level,
            value,
        })
    }

    /// The operation of an `opr` instruction.
    ///
    /// Returns `None` for any other command.
    pub fn operation(&self) -> Option<Result<Operation, DecodeError>> {
        (self.command == Command::Opr).then(|| Operation::try_from(self.value))
    }
}

/// Widen a 24-bit two's complement field to `i32`.
fn sign_extend(field: u32) -> i32 {
    if field & VALUE_SIGN_BIT != 0 {
        (field | !VALUE_MASK) as i32
    } else {
        field as i32
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ", self.command.mnemonic(), self.level)?;
        match self.operation() {
            Some(Ok(op)) => write!(f, "{}", op.mnemonic()),
            _ => write!(f, "{}", self.value),
        }
    }
}
