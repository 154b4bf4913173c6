//! Code buffers for the P-code machine.
//!
//! A program is a sequence of packed instruction words. Binary files
//! (.pcb) are raw concatenations of 4-byte little-endian words with no
//! header.

use crate::error::{DecodeError, EncodeError, LoadError};
use crate::instruction::Instruction;

/// A P-code program: a sequence of packed words.
///
/// Words are kept packed. They are only decoded when executed or
/// disassembled, so a program may carry invalid words that are never
/// reached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    /// The code segment.
    pub words: Vec<i32>,
}

impl Program {
    /// Create a program from already packed words.
    pub fn new(words: Vec<i32>) -> Self {
        Self { words }
    }

    /// Pack a sequence of instructions.
    pub fn assemble(instructions: &[Instruction]) -> Result<Self, EncodeError> {
        let words = instructions
            .iter()
            .map(Instruction::encode)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { words })
    }

    /// Encode the code segment to bytes.
    ///
    /// The result length is always `words.len() * 4`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.words.len() * 4);
        for word in &self.words {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        bytes
    }

    /// Read a code segment from bytes.
    ///
    /// The byte slice length must be a multiple of 4. Words are not
    /// decoded here.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LoadError> {
        if bytes.len() % 4 != 0 {
            return Err(LoadError::InvalidLength(bytes.len()));
        }

        let words = bytes
            .chunks_exact(4)
            .map(|chunk| i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();

        Ok(Self { words })
    }

    /// Decode every word, in order.
    pub fn instructions(&self) -> impl Iterator<Item = Result<Instruction, DecodeError>> + '_ {
        self.words.iter().map(|&word| Instruction::decode(word))
    }

    /// Number of words in the program.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns true if the program has no words.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
