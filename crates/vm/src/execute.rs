//! Main execution loop and command dispatch.

use log::{debug, trace};
use pcode_common::{Command, Instruction, Operation};

use crate::error::RuntimeError;
use crate::machine::{resolve_lexical, Machine, Step};
use crate::stack::Stack;

impl<'c> Machine<'c> {
    /// Execute until the stack is empty or an error occurs.
    ///
    /// At least one instruction always runs. A program that never empties
    /// its stack never returns.
    pub fn run(&mut self, stack: &mut Stack<'_>) -> Result<(), RuntimeError> {
        loop {
            match self.step(stack) {
                Ok(Step::Continue) => {}
                Ok(Step::Halted) => {
                    debug!("halted after {} instructions", self.steps);
                    return Ok(());
                }
                Err(e) => {
                    debug!("failed after {} instructions: {e}", self.steps);
                    return Err(e);
                }
            }
        }
    }

    /// Execute exactly one instruction.
    pub fn step(&mut self, stack: &mut Stack<'_>) -> Result<Step, RuntimeError> {
        let (at, word) = self.fetch()?;
        let instr = Instruction::decode(word).map_err(|e| RuntimeError::from_decode(e, at))?;
        self.pc += 1;
        trace!("{at:04}: {instr} (depth {})", stack.len());

        match instr.command {
            Command::Lit => self.exec_lit(at, &instr, stack)?,
            Command::Opr => self.exec_opr(at, &instr, stack)?,
            Command::Lod => self.exec_lod(at, &instr, stack)?,
            Command::Sto => self.exec_sto(at, &instr, stack)?,
            Command::Cal => self.exec_cal(at, &instr, stack)?,
            Command::Inc => self.exec_inc(at, &instr, stack)?,
            Command::Jpc => self.exec_jpc(at, &instr, stack)?,
            Command::Jmp => self.jump(instr.value),
        }
        self.steps += 1;

        if stack.is_empty() {
            Ok(Step::Halted)
        } else {
            Ok(Step::Continue)
        }
    }

    fn jump(&mut self, target: i32) {
        self.pc = target.into();
    }

    fn exec_lit(
        &mut self,
        at: usize,
        instr: &Instruction,
        stack: &mut Stack<'_>,
    ) -> Result<(), RuntimeError> {
        stack
            .push(instr.value)
            .map_err(|e| RuntimeError::from_stack(e, at))
    }

    fn exec_opr(
        &mut self,
        at: usize,
        instr: &Instruction,
        stack: &mut Stack<'_>,
    ) -> Result<(), RuntimeError> {
        let op = Operation::try_from(instr.value).map_err(|e| RuntimeError::from_decode(e, at))?;
        let stack_err = |e| RuntimeError::from_stack(e, at);

        // Binary closures receive (top, below); the result is `below op top`.
        match op {
            Operation::Return => self.exec_return(at, stack),
            Operation::Neg => stack.apply1(i32::wrapping_neg).map_err(stack_err),
            Operation::Add => stack.apply2(|b, a| a.wrapping_add(b)).map_err(stack_err),
            Operation::Sub => stack.apply2(|b, a| a.wrapping_sub(b)).map_err(stack_err),
            Operation::Mul => stack.apply2(|b, a| a.wrapping_mul(b)).map_err(stack_err),
            Operation::Div => self.exec_division(at, stack, i32::wrapping_div),
            Operation::Mod => self.exec_division(at, stack, i32::wrapping_rem),
            Operation::Eq => self.exec_comparison(at, stack, |a, b| a == b),
            Operation::Neq => self.exec_comparison(at, stack, |a, b| a != b),
            Operation::Lt => self.exec_comparison(at, stack, |a, b| a < b),
            Operation::Gt => self.exec_comparison(at, stack, |a, b| a > b),
            Operation::Lte => self.exec_comparison(at, stack, |a, b| a <= b),
            Operation::Gte => self.exec_comparison(at, stack, |a, b| a >= b),
        }
    }

    /// Drop the frame down to its saved frame base, then restore the
    /// caller's frame base and program counter.
    fn exec_return(&mut self, at: usize, stack: &mut Stack<'_>) -> Result<(), RuntimeError> {
        let stack_err = |e| RuntimeError::from_stack(e, at);

        let delta = i64::from(self.frame_base) + 1 - stack.len() as i64;
        stack.resize(delta).map_err(stack_err)?;
        self.frame_base = stack.pop().map_err(stack_err)?;
        let return_pc = stack.pop().map_err(stack_err)?;
        self.jump(return_pc);

        debug!(
            "return at {at} to {return_pc}, frame base {}",
            self.frame_base
        );
        Ok(())
    }

    /// Division and modulo. A zero divisor fails with both operands
    /// still on the stack.
    fn exec_division(
        &mut self,
        at: usize,
        stack: &mut Stack<'_>,
        f: fn(i32, i32) -> i32,
    ) -> Result<(), RuntimeError> {
        let stack_err = |e| RuntimeError::from_stack(e, at);

        if stack.len() < 2 {
            return Err(RuntimeError::InsufficientOperands { at });
        }
        if stack.peek().map_err(stack_err)? == 0 {
            return Err(RuntimeError::DivideByZero { at });
        }
        stack.apply2(|b, a| f(a, b)).map_err(stack_err)
    }

    fn exec_comparison(
        &mut self,
        at: usize,
        stack: &mut Stack<'_>,
        cmp: fn(i32, i32) -> bool,
    ) -> Result<(), RuntimeError> {
        stack
            .apply2(|b, a| i32::from(cmp(a, b)))
            .map_err(|e| RuntimeError::from_stack(e, at))
    }

    fn exec_lod(
        &mut self,
        at: usize,
        instr: &Instruction,
        stack: &mut Stack<'_>,
    ) -> Result<(), RuntimeError> {
        let stack_err = |e| RuntimeError::from_stack(e, at);

        let value = *resolve_lexical(stack, self.frame_base, instr.value, instr.level)
            .map_err(stack_err)?;
        stack.push(value).map_err(stack_err)
    }

    fn exec_sto(
        &mut self,
        at: usize,
        instr: &Instruction,
        stack: &mut Stack<'_>,
    ) -> Result<(), RuntimeError> {
        let stack_err = |e| RuntimeError::from_stack(e, at);

        // Pop first: the slot is resolved against the shrunken stack.
        let value = stack.pop().map_err(stack_err)?;
        *resolve_lexical(stack, self.frame_base, instr.value, instr.level).map_err(stack_err)? =
            value;
        Ok(())
    }

    /// Push the return address and the caller's frame base, then enter
    /// the callee with its frame anchored on the saved frame base.
    fn exec_cal(
        &mut self,
        at: usize,
        instr: &Instruction,
        stack: &mut Stack<'_>,
    ) -> Result<(), RuntimeError> {
        let stack_err = |e| RuntimeError::from_stack(e, at);

        let return_pc =
            i32::try_from(self.pc).map_err(|_| RuntimeError::OutOfCodeSegment { pc: self.pc })?;
        stack.push(return_pc).map_err(stack_err)?;
        stack.push(self.frame_base).map_err(stack_err)?;
        // Capacity is clamped to i32::MAX, so every index fits.
        self.frame_base = (stack.len() - 1) as i32;
        self.jump(instr.value);

        debug!(
            "call at {at} to {}, frame base {}",
            instr.value, self.frame_base
        );
        Ok(())
    }

    fn exec_inc(
        &mut self,
        at: usize,
        instr: &Instruction,
        stack: &mut Stack<'_>,
    ) -> Result<(), RuntimeError> {
        stack
            .resize(instr.value.into())
            .map_err(|e| RuntimeError::from_stack(e, at))
    }

    /// Jump if the popped condition is non-zero.
    fn exec_jpc(
        &mut self,
        at: usize,
        instr: &Instruction,
        stack: &mut Stack<'_>,
    ) -> Result<(), RuntimeError> {
        let condition = stack
            .pop()
            .map_err(|e| RuntimeError::from_stack(e, at))?;
        if condition != 0 {
            self.jump(instr.value);
        }
        Ok(())
    }
}
