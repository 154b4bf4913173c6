//! Fixed-capacity evaluation stack over caller-owned storage.
//!
//! The stack is the machine's only memory: operands, procedure locals and
//! call frames all live in it. Indices are signed because addresses are
//! computed from instruction operands and saved frame bases.

use thiserror::Error;

/// Errors from stack operations. They carry no code location; the
/// interpreter attaches one when lifting them into a
/// [`RuntimeError`](crate::RuntimeError).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StackError {
    #[error("stack overflow")]
    Overflow,

    #[error("stack underflow")]
    Underflow,

    #[error("index {index} out of bounds (size {size})")]
    OutOfBounds { index: i64, size: usize },

    #[error("not two operands for binary operation")]
    InsufficientOperands,
}

/// A bounded stack of `i32` borrowing its backing storage.
///
/// Capacity is the length of the storage slice (clamped to `i32::MAX`
/// so every position is addressable by a stack value). Growing with
/// [`resize`](Stack::resize) exposes whatever the storage already holds;
/// nothing is cleared.
#[derive(Debug)]
pub struct Stack<'a> {
    slots: &'a mut [i32],
    len: usize,
}

impl<'a> Stack<'a> {
    /// Creates an empty stack over `storage`.
    pub fn new(storage: &'a mut [i32]) -> Self {
        let capacity = storage.len().min(i32::MAX as usize);
        Stack {
            slots: &mut storage[..capacity],
            len: 0,
        }
    }

    /// Maximum number of elements.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Current number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    /// Live contents, bottom first.
    pub fn as_slice(&self) -> &[i32] {
        &self.slots[..self.len]
    }

    /// Pushes a value onto the stack.
    pub fn push(&mut self, value: i32) -> Result<(), StackError> {
        if self.is_full() {
            return Err(StackError::Overflow);
        }
        self.slots[self.len] = value;
        self.len += 1;
        Ok(())
    }

    /// Pops the top value.
    pub fn pop(&mut self) -> Result<i32, StackError> {
        if self.is_empty() {
            return Err(StackError::Underflow);
        }
        self.len -= 1;
        Ok(self.slots[self.len])
    }

    /// Reads the top value without removing it.
    pub fn peek(&self) -> Result<i32, StackError> {
        self.as_slice().last().copied().ok_or(StackError::Underflow)
    }

    /// Reads the element at absolute position `index`.
    pub fn get(&self, index: i64) -> Result<i32, StackError> {
        let i = self.position(index)?;
        Ok(self.slots[i])
    }

    /// Mutable access to the element at absolute position `index`.
    pub fn get_mut(&mut self, index: i64) -> Result<&mut i32, StackError> {
        let i = self.position(index)?;
        Ok(&mut self.slots[i])
    }

    /// Grows (`delta > 0`) or shrinks (`delta < 0`) the stack.
    pub fn resize(&mut self, delta: i64) -> Result<(), StackError> {
        let new_len = self.len as i64 + delta;
        if new_len < 0 {
            return Err(StackError::Underflow);
        }
        if new_len > self.capacity() as i64 {
            return Err(StackError::Overflow);
        }
        self.len = new_len as usize;
        Ok(())
    }

    /// Replaces the top element with `f(top)`.
    pub fn apply1(&mut self, f: impl FnOnce(i32) -> i32) -> Result<(), StackError> {
        let top = self.len.checked_sub(1).ok_or(StackError::Underflow)?;
        self.slots[top] = f(self.slots[top]);
        Ok(())
    }

    /// Pops the top `b` and replaces the new top `a` with `f(b, a)`.
    ///
    /// The first argument is the element that was on top.
    pub fn apply2(&mut self, f: impl FnOnce(i32, i32) -> i32) -> Result<(), StackError> {
        if self.len < 2 {
            return Err(StackError::InsufficientOperands);
        }
        let top = self.len - 1;
        self.slots[top - 1] = f(self.slots[top], self.slots[top - 1]);
        self.len = top;
        Ok(())
    }

    fn position(&self, index: i64) -> Result<usize, StackError> {
        usize::try_from(index)
            .ok()
            .filter(|&i| i < self.len)
            .ok_or(StackError::OutOfBounds {
                index,
                size: self.len,
            })
    }
}
