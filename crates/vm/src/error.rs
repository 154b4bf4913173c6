//! Runtime errors for the P-code machine.
//!
//! Every error aborts the run. Apart from `NoCode` and
//! `OutOfCodeSegment`, each variant records `at`, the code offset of the
//! instruction that failed. The caller's stack is left as it was at the
//! point of failure.

use pcode_common::DecodeError;
use thiserror::Error;

use crate::stack::StackError;

/// Errors that occur during program execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// The code segment is empty.
    #[error("no code")]
    NoCode,

    /// The program counter left the code segment.
    #[error("out of code segment (pc {pc})")]
    OutOfCodeSegment { pc: i64 },

    /// A word carried a command ordinal outside 0..=7.
    #[error("invalid command {ordinal} at instruction {at}")]
    InvalidCommand { at: usize, ordinal: u8 },

    /// An `opr` carried a selector outside 0..=12.
    #[error("unknown operation {selector} at instruction {at}")]
    InvalidOperation { at: usize, selector: i32 },

    #[error("stack overflow at instruction {at}")]
    StackOverflow { at: usize },

    #[error("stack underflow at instruction {at}")]
    StackUnderflow { at: usize },

    /// Indexed access, directly or through a static link, outside the
    /// live stack.
    #[error("stack index {index} out of bounds (size {size}) at instruction {at}")]
    OutOfBounds { at: usize, index: i64, size: usize },

    /// A binary operation found fewer than two operands.
    #[error("not two operands for binary operation at instruction {at}")]
    InsufficientOperands { at: usize },

    /// Division or modulo with a zero divisor.
    #[error("division by zero at instruction {at}")]
    DivideByZero { at: usize },
}

impl RuntimeError {
    /// Attach a code location to a stack error.
    pub(crate) fn from_stack(err: StackError, at: usize) -> Self {
        match err {
            StackError::Overflow => RuntimeError::StackOverflow { at },
            StackError::Underflow => RuntimeError::StackUnderflow { at },
            StackError::OutOfBounds { index, size } => {
                RuntimeError::OutOfBounds { at, index, size }
            }
            StackError::InsufficientOperands => RuntimeError::InsufficientOperands { at },
        }
    }

    /// Attach a code location to a decode error.
    pub(crate) fn from_decode(err: DecodeError, at: usize) -> Self {
        match err {
            DecodeError::InvalidCommand(ordinal) => RuntimeError::InvalidCommand { at, ordinal },
            DecodeError::InvalidOperation(selector) => {
                RuntimeError::InvalidOperation { at, selector }
            }
        }
    }

    /// Code offset of the failing instruction, when there is one.
    pub fn at(&self) -> Option<usize> {
        match *self {
            RuntimeError::NoCode | RuntimeError::OutOfCodeSegment { .. } => None,
            RuntimeError::InvalidCommand { at, .. }
            | RuntimeError::InvalidOperation { at, .. }
            | RuntimeError::StackOverflow { at }
            | RuntimeError::StackUnderflow { at }
            | RuntimeError::OutOfBounds { at, .. }
            | RuntimeError::InsufficientOperands { at }
            | RuntimeError::DivideByZero { at } => Some(at),
        }
    }
}
