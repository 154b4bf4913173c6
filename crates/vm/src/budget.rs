//! Instruction-count budget around the unbounded interpreter.
//!
//! `interpret` runs until the stack empties, which for some programs is
//! never. `run_bounded` drives the same machine one step at a time and
//! gives up after a fixed number of instructions.

use log::debug;

use crate::error::RuntimeError;
use crate::machine::{Machine, Step};
use crate::stack::Stack;

/// How a bounded run ended, when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The stack emptied after `steps` instructions.
    Halted { steps: u64 },
    /// `steps` instructions ran without the stack emptying.
    BudgetExhausted { steps: u64 },
}

/// Execute `code` against `stack` for at most `max_steps` instructions.
pub fn run_bounded(
    code: &[i32],
    stack: &mut Stack<'_>,
    max_steps: u64,
) -> Result<Completion, RuntimeError> {
    let mut machine = Machine::new(code)?;

    while machine.steps() < max_steps {
        if machine.step(stack)? == Step::Halted {
            return Ok(Completion::Halted {
                steps: machine.steps(),
            });
        }
    }

    debug!(
        "budget of {max_steps} instructions exhausted at pc {}",
        machine.pc()
    );
    Ok(Completion::BudgetExhausted { steps: max_steps })
}
