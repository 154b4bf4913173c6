//! Encode, decode and load errors for packed P-code words.

use thiserror::Error;

/// Errors that occur while decoding a single packed word.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Command ordinal outside `0..=7`.
    #[error("invalid command ordinal: {0}")]
    InvalidCommand(u8),

    /// Operation selector of an `opr` outside `0..=12`.
    #[error("invalid operation selector: {0}")]
    InvalidOperation(i32),
}

/// Errors that occur while reading a code file into words.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// Byte stream length is not a multiple of 4.
    #[error("invalid byte stream length: {0} (must be multiple of 4)")]
    InvalidLength(usize),
}

/// Errors that occur while packing an instruction into a word.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Level does not fit the 4-bit level field.
    #[error("level {0} out of range (0..=15)")]
    LevelOutOfRange(u8),

    /// Value does not fit the 24-bit signed value field.
    #[error("value {0} out of range (-8388608..=8388607)")]
    ValueOutOfRange(i32),
}
