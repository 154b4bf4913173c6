//! Machine state: code segment, program counter, frame base.

use crate::error::RuntimeError;
use crate::stack::{Stack, StackError};

/// Stack capacity used when the caller has no preference.
pub const DEFAULT_STACK_CAPACITY: usize = 100;

/// Outcome of a single cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The stack still holds values; the program keeps running.
    Continue,
    /// The stack became empty; the program has finished.
    Halted,
}

/// The P-code machine.
///
/// Holds the registers for one run. The stack is borrowed per step so the
/// caller keeps it (and its contents) when the run ends, normally or not.
#[derive(Debug)]
pub struct Machine<'c> {
    /// The code segment being executed.
    pub(crate) code: &'c [i32],
    /// Offset of the next instruction. Signed because jump targets and
    /// return addresses come straight from operands and stack values.
    pub(crate) pc: i64,
    /// Stack index of the current frame's saved frame base.
    pub(crate) frame_base: i32,
    /// Instructions executed so far.
    pub(crate) steps: u64,
}

impl<'c> Machine<'c> {
    /// Create a machine positioned at the first instruction of `code`.
    pub fn new(code: &'c [i32]) -> Result<Self, RuntimeError> {
        if code.is_empty() {
            return Err(RuntimeError::NoCode);
        }
        Ok(Self {
            code,
            pc: 0,
            frame_base: 0,
            steps: 0,
        })
    }

    /// Offset of the next instruction to execute.
    pub fn pc(&self) -> i64 {
        self.pc
    }

    /// Current frame base register.
    pub fn frame_base(&self) -> i32 {
        self.frame_base
    }

    /// Number of instructions executed.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Fetch the word at the program counter along with its offset.
    pub(crate) fn fetch(&self) -> Result<(usize, i32), RuntimeError> {
        usize::try_from(self.pc)
            .ok()
            .and_then(|at| self.code.get(at).map(|&word| (at, word)))
            .ok_or(RuntimeError::OutOfCodeSegment { pc: self.pc })
    }
}

/// Locate the variable `index` slots above the frame `level` scopes out.
///
/// Starting from `frame_base`, follows `level` saved frame bases (each a
/// bounds-checked stack read), then returns the slot at
/// `frame_base + index`.
pub fn resolve_lexical<'s>(
    stack: &'s mut Stack<'_>,
    frame_base: i32,
    index: i32,
    level: u8,
) -> Result<&'s mut i32, StackError> {
    let mut base = frame_base;
    for _ in 0..level {
        base = stack.get(base.into())?;
    }
    stack.get_mut(i64::from(base) + i64::from(index))
}
