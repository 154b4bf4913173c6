//! Integration tests for the P-code machine.
//!
//! Organized by command group: literals and arithmetic, comparisons,
//! control flow, procedures and scoping, then failures.

use pcode_common::{Command, Instruction, Operation, Program};
use pcode_vm::{interpret, run_bounded, Completion, Machine, RuntimeError, Stack, Step};
use proptest::prelude::*;

// ============================================================
// Helper functions
// ============================================================

fn lit(value: i32) -> Instruction {
    Instruction::new(Command::Lit, 0, value)
}

fn op(op: Operation) -> Instruction {
    Instruction::op(op)
}

fn lod(level: u8, index: i32) -> Instruction {
    Instruction::new(Command::Lod, level, index)
}

fn sto(level: u8, index: i32) -> Instruction {
    Instruction::new(Command::Sto, level, index)
}

fn cal(target: i32) -> Instruction {
    Instruction::new(Command::Cal, 0, target)
}

fn inc(slots: i32) -> Instruction {
    Instruction::new(Command::Inc, 0, slots)
}

fn jpc(target: i32) -> Instruction {
    Instruction::new(Command::Jpc, 0, target)
}

fn jmp(target: i32) -> Instruction {
    Instruction::new(Command::Jmp, 0, target)
}

fn ret() -> Instruction {
    op(Operation::Return)
}

fn code(instructions: &[Instruction]) -> Vec<i32> {
    Program::assemble(instructions).unwrap().words
}

/// Run a program on a 100-slot stack, returning the outcome, the live
/// stack contents afterwards and the raw storage.
fn run_program(instructions: &[Instruction]) -> (Result<(), RuntimeError>, Vec<i32>, Vec<i32>) {
    let words = code(instructions);
    let mut storage = vec![0; 100];
    let mut stack = Stack::new(&mut storage);
    let result = interpret(&words, &mut stack);
    let live = stack.as_slice().to_vec();
    (result, live, storage)
}

/// Evaluate straight-line code that leaves a value behind. Such code runs
/// off the end of the code segment, so the expected outcome is
/// `OutOfCodeSegment` with the values still on the stack.
fn eval(instructions: &[Instruction]) -> Vec<i32> {
    let (result, live, _) = run_program(instructions);
    assert_eq!(
        result,
        Err(RuntimeError::OutOfCodeSegment {
            pc: instructions.len() as i64
        })
    );
    live
}

fn binary(a: i32, b: i32, operation: Operation) -> i32 {
    let live = eval(&[lit(a), lit(b), op(operation)]);
    assert_eq!(live.len(), 1);
    live[0]
}

// ============================================================
// Sample program
// ============================================================

#[test]
fn sample_program_leaves_quotient_and_runs_off_the_end() {
    let words = code(&[lit(2), lit(512), lit(1024), op(Operation::Add), op(Operation::Div)]);
    let mut storage = [0; 100];
    let mut stack = Stack::new(&mut storage);
    let mut machine = Machine::new(&words).unwrap();

    for _ in 0..4 {
        assert_eq!(machine.step(&mut stack), Ok(Step::Continue));
    }
    assert_eq!(stack.as_slice(), &[2, 1536]);

    // 2 / 1536 truncates to zero
    assert_eq!(machine.step(&mut stack), Ok(Step::Continue));
    assert_eq!(stack.as_slice(), &[0]);

    assert_eq!(
        machine.run(&mut stack),
        Err(RuntimeError::OutOfCodeSegment { pc: 5 })
    );
    assert_eq!(stack.as_slice(), &[0]);
}

// ============================================================
// Literals and arithmetic
// ============================================================

#[test]
fn lit_pushes_negative_values() {
    assert_eq!(eval(&[lit(-13), lit(0x7F_FFFF)]), vec![-13, 0x7F_FFFF]);
}

#[test]
fn add_and_multiply() {
    assert_eq!(binary(40, 2, Operation::Add), 42);
    assert_eq!(binary(6, -7, Operation::Mul), -42);
}

#[test]
fn subtract_is_below_minus_top() {
    assert_eq!(binary(10, 3, Operation::Sub), 7);
    assert_eq!(binary(3, 10, Operation::Sub), -7);
}

#[test]
fn divide_is_below_over_top() {
    assert_eq!(binary(1536, 2, Operation::Div), 768);
    assert_eq!(binary(2, 1536, Operation::Div), 0);
}

#[test]
fn division_truncates_toward_zero() {
    assert_eq!(binary(-7, 2, Operation::Div), -3);
    assert_eq!(binary(7, -2, Operation::Div), -3);
    assert_eq!(binary(-7, 2, Operation::Mod), -1);
    assert_eq!(binary(7, -2, Operation::Mod), 1);
}

#[test]
fn modulo_is_below_mod_top() {
    assert_eq!(binary(17, 5, Operation::Mod), 2);
    assert_eq!(binary(5, 17, Operation::Mod), 5);
}

#[test]
fn negate_top_only() {
    assert_eq!(eval(&[lit(4), lit(9), op(Operation::Neg)]), vec![4, -9]);
}

#[test]
fn arithmetic_wraps_at_i32_limits() {
    // -2^23 * 2^8 = i32::MIN
    let min = [lit(-(1 << 23)), lit(1 << 8), op(Operation::Mul)];

    let mut neg = min.to_vec();
    neg.push(op(Operation::Neg));
    assert_eq!(eval(&neg), vec![i32::MIN]);

    let mut div = min.to_vec();
    div.extend([lit(-1), op(Operation::Div)]);
    assert_eq!(eval(&div), vec![i32::MIN]);

    let mut rem = min.to_vec();
    rem.extend([lit(-1), op(Operation::Mod)]);
    assert_eq!(eval(&rem), vec![0]);
}

// ============================================================
// Comparisons
// ============================================================

#[test]
fn comparisons_use_below_as_left_operand() {
    assert_eq!(binary(1, 2, Operation::Lt), 1);
    assert_eq!(binary(2, 1, Operation::Lt), 0);
    assert_eq!(binary(1, 2, Operation::Gt), 0);
    assert_eq!(binary(2, 1, Operation::Gt), 1);
    assert_eq!(binary(2, 2, Operation::Lte), 1);
    assert_eq!(binary(3, 2, Operation::Lte), 0);
    assert_eq!(binary(2, 2, Operation::Gte), 1);
    assert_eq!(binary(1, 2, Operation::Gte), 0);
}

#[test]
fn equality_yields_one_or_zero() {
    assert_eq!(binary(5, 5, Operation::Eq), 1);
    assert_eq!(binary(5, -5, Operation::Eq), 0);
    assert_eq!(binary(5, 5, Operation::Neq), 0);
    assert_eq!(binary(5, -5, Operation::Neq), 1);
}

// ============================================================
// Control flow
// ============================================================

#[test]
fn at_least_one_instruction_runs() {
    // jmp on an empty stack: executes once, then the stack is empty
    let words = code(&[jmp(0)]);
    let mut storage = [0; 4];
    let mut stack = Stack::new(&mut storage);
    let mut machine = Machine::new(&words).unwrap();

    assert_eq!(machine.run(&mut stack), Ok(()));
    assert_eq!(machine.steps(), 1);
}

#[test]
fn first_instruction_failure_is_reported() {
    let (result, _, _) = run_program(&[op(Operation::Neg)]);
    assert_eq!(result, Err(RuntimeError::StackUnderflow { at: 0 }));
}

#[test]
fn jpc_jumps_on_non_zero() {
    let words = code(&[lit(9), lit(-1), jpc(5)]);
    let mut storage = [0; 4];
    let mut stack = Stack::new(&mut storage);
    let mut machine = Machine::new(&words).unwrap();

    machine.step(&mut stack).unwrap();
    machine.step(&mut stack).unwrap();
    assert_eq!(machine.step(&mut stack), Ok(Step::Continue));
    assert_eq!(machine.pc(), 5);
    assert_eq!(stack.as_slice(), &[9]);
}

#[test]
fn jpc_falls_through_on_zero() {
    let words = code(&[lit(9), lit(0), jpc(5)]);
    let mut storage = [0; 4];
    let mut stack = Stack::new(&mut storage);
    let mut machine = Machine::new(&words).unwrap();

    machine.step(&mut stack).unwrap();
    machine.step(&mut stack).unwrap();
    assert_eq!(machine.step(&mut stack), Ok(Step::Continue));
    assert_eq!(machine.pc(), 3);
    assert_eq!(stack.as_slice(), &[9]);
}

#[test]
fn jump_out_of_code_halts_when_stack_empties() {
    // the target is only checked on the next fetch, which never happens
    let (result, live, _) = run_program(&[lit(1), jpc(1000)]);
    assert_eq!(result, Ok(()));
    assert!(live.is_empty());
}

#[test]
fn jump_out_of_code_fails_on_next_fetch() {
    let (result, live, _) = run_program(&[lit(1), jmp(-3)]);
    assert_eq!(result, Err(RuntimeError::OutOfCodeSegment { pc: -3 }));
    assert_eq!(live, vec![1]);
}

#[test]
fn counting_loop_sums_with_jpc() {
    #[rustfmt::skip]
    let program = [
        cal(2),                 // 0: enter main
        jmp(0),                 // 1: not reached, main returns to an empty stack
        inc(2),                 // 2: i at 2, s at 3
        lit(5), sto(0, 1),      // 3: i := 5
        lit(0), sto(0, 2),      // 5: s := 0
        lod(0, 2), lod(0, 1),   // 7: loop
        op(Operation::Add),
        sto(0, 2),              // 10: s := s + i
        lod(0, 1), lit(1),
        op(Operation::Sub),
        sto(0, 1),              // 14: i := i - 1
        lod(0, 1), jpc(7),      // 15: while i != 0
        ret(),                  // 17
    ];
    let (result, live, storage) = run_program(&program);

    assert_eq!(result, Ok(()));
    assert!(live.is_empty());
    // locals survive in the caller's storage
    assert_eq!(storage[2], 0);
    assert_eq!(storage[3], 15);
}

#[test]
fn endless_program_is_bounded_by_budget() {
    let words = code(&[cal(2), jmp(0), jmp(2)]);
    let mut storage = [0; 8];
    let mut stack = Stack::new(&mut storage);

    assert_eq!(
        run_bounded(&words, &mut stack, 1_000),
        Ok(Completion::BudgetExhausted { steps: 1_000 })
    );
    assert_eq!(stack.as_slice(), &[1, 0]);
}

#[test]
fn bounded_run_reports_halt() {
    let words = code(&[cal(2), jmp(0), inc(1), ret()]);
    let mut storage = [0; 8];
    let mut stack = Stack::new(&mut storage);

    assert_eq!(
        run_bounded(&words, &mut stack, 1_000),
        Ok(Completion::Halted { steps: 3 })
    );
}

// ============================================================
// Procedures and scoping
// ============================================================

#[test]
fn cal_pushes_return_address_and_frame_base() {
    let words = code(&[lit(7), cal(3), jmp(0), inc(0)]);
    let mut storage = [0; 8];
    let mut stack = Stack::new(&mut storage);
    let mut machine = Machine::new(&words).unwrap();

    machine.step(&mut stack).unwrap();
    machine.step(&mut stack).unwrap();

    assert_eq!(stack.as_slice(), &[7, 2, 0]);
    assert_eq!(machine.frame_base(), 2);
    assert_eq!(machine.pc(), 3);
}

#[test]
fn return_from_outermost_frame_halts() {
    let (result, live, storage) = run_program(&[cal(2), jmp(0), inc(3), lit(9), sto(0, 3), ret()]);

    assert_eq!(result, Ok(()));
    assert!(live.is_empty());
    assert_eq!(storage[..2], [1, 0]);
    assert_eq!(storage[4], 9);
}

#[test]
fn return_discards_operand_residue() {
    let (result, live, _) = run_program(&[
        cal(2),
        jmp(0),
        inc(1),
        lit(1),
        lit(2),
        lit(3),
        ret(),
    ]);

    assert_eq!(result, Ok(()));
    assert!(live.is_empty());
}

#[test]
fn nested_call_reaches_outer_variable_through_link() {
    #[rustfmt::skip]
    let program = [
        cal(2),                 // 0: enter main, frame base 1
        jmp(0),                 // 1
        inc(1),                 // 2: x at 2
        lit(5), sto(0, 1),      // 3: x := 5
        cal(8),                 // 5: enter inner, frame base 4
        ret(),                  // 6: leave main
        jmp(0),                 // 7
        inc(1),                 // 8: inner local at 5
        lod(1, 1),              // 9: x, one scope out
        lit(3),
        op(Operation::Mul),
        sto(1, 1),              // 12: x := x * 3
        ret(),                  // 13
    ];
    let words = code(&program);
    let mut storage = [0; 16];
    {
        let mut stack = Stack::new(&mut storage);
        let mut machine = Machine::new(&words).unwrap();

        // run up to and including the inner return
        for _ in 0..11 {
            assert_eq!(machine.step(&mut stack), Ok(Step::Continue));
        }
        // back in main with the same depth as before the call
        assert_eq!(machine.pc(), 6);
        assert_eq!(machine.frame_base(), 1);
        assert_eq!(stack.as_slice(), &[1, 0, 15]);

        assert_eq!(machine.step(&mut stack), Ok(Step::Halted));
    }
    assert_eq!(storage[2], 15);
}

#[test]
fn call_return_balance_with_locals() {
    #[rustfmt::skip]
    let program = [
        cal(2), jmp(0),
        inc(2),                 // 2: main locals
        lit(11), lit(22),       // 3: operand residue before the call
        cal(8),                 // 5
        ret(),                  // 6
        jmp(0),
        inc(4),                 // 8: callee reserves four slots
        lit(1), lit(2),
        ret(),                  // 11
    ];
    let words = code(&program);
    let mut storage = [0; 32];
    let mut stack = Stack::new(&mut storage);
    let mut machine = Machine::new(&words).unwrap();

    for _ in 0..4 {
        machine.step(&mut stack).unwrap();
    }
    let depth_before_call = stack.len();
    assert_eq!(machine.pc(), 5);

    while machine.pc() != 6 {
        machine.step(&mut stack).unwrap();
    }
    assert_eq!(stack.len(), depth_before_call);
    assert_eq!(stack.as_slice()[depth_before_call - 2..], [11, 22]);
}

#[test]
fn recursive_activations_chain_through_saved_frame_bases() {
    // p: m := (caller's m) - 1; recurse while m != 0
    #[rustfmt::skip]
    let program = [
        cal(2), jmp(0),
        inc(1),                 // 2: main's m at 2
        lit(3), sto(0, 1),      // 3: m := 3
        cal(8),                 // 5
        ret(),                  // 6
        jmp(0),
        inc(1),                 // 8: p's m at frame base + 1
        lod(1, 1), lit(1),      // 9: caller's m
        op(Operation::Sub),
        sto(0, 1),              // 12
        lod(0, 1),
        jpc(16),                // 14: m != 0 -> recurse
        ret(),                  // 15
        cal(8),                 // 16
        ret(),                  // 17
    ];
    let (result, live, storage) = run_program(&program);

    assert_eq!(result, Ok(()));
    assert!(live.is_empty());
    // each activation is three slots above its caller's
    assert_eq!(
        [storage[2], storage[5], storage[8], storage[11]],
        [3, 2, 1, 0]
    );
}

// ============================================================
// Failures
// ============================================================

#[test]
fn empty_code_is_no_code() {
    let mut storage = [0; 4];
    let mut stack = Stack::new(&mut storage);
    assert_eq!(interpret(&[], &mut stack), Err(RuntimeError::NoCode));
}

#[test]
fn invalid_command_word() {
    let words = [0x0100, 0x0090];
    let mut storage = [0; 4];
    let mut stack = Stack::new(&mut storage);

    assert_eq!(
        interpret(&words, &mut stack),
        Err(RuntimeError::InvalidCommand { at: 1, ordinal: 9 })
    );
    assert_eq!(stack.as_slice(), &[1]);
}

#[test]
fn invalid_operation_selector() {
    let (result, live, _) = run_program(&[lit(1), Instruction::new(Command::Opr, 0, 13)]);
    assert_eq!(
        result,
        Err(RuntimeError::InvalidOperation {
            at: 1,
            selector: 13
        })
    );
    assert_eq!(live, vec![1]);
}

#[test]
fn push_past_capacity_overflows() {
    let words = code(&[lit(1), lit(2), lit(3)]);
    let mut storage = [0; 2];
    let mut stack = Stack::new(&mut storage);

    assert_eq!(
        interpret(&words, &mut stack),
        Err(RuntimeError::StackOverflow { at: 2 })
    );
    assert_eq!(stack.as_slice(), &[1, 2]);
}

#[test]
fn inc_past_capacity_overflows() {
    let words = code(&[inc(101)]);
    let mut storage = [0; 100];
    let mut stack = Stack::new(&mut storage);

    assert_eq!(
        interpret(&words, &mut stack),
        Err(RuntimeError::StackOverflow { at: 0 })
    );
}

#[test]
fn negative_inc_below_empty_underflows() {
    let (result, live, _) = run_program(&[lit(1), inc(-2)]);
    assert_eq!(result, Err(RuntimeError::StackUnderflow { at: 1 }));
    assert_eq!(live, vec![1]);
}

#[test]
fn return_without_frame_underflows() {
    // frame base 0: shrink to one slot, pop it as frame base, nothing left
    let (result, live, _) = run_program(&[lit(1), ret()]);
    assert_eq!(result, Err(RuntimeError::StackUnderflow { at: 1 }));
    assert!(live.is_empty());
}

#[test]
fn jpc_on_empty_stack_underflows() {
    let (result, _, _) = run_program(&[jpc(0)]);
    assert_eq!(result, Err(RuntimeError::StackUnderflow { at: 0 }));
}

#[test]
fn lod_outside_stack_is_out_of_bounds() {
    let (result, _, _) = run_program(&[lit(1), lod(0, 5)]);
    assert_eq!(
        result,
        Err(RuntimeError::OutOfBounds {
            at: 1,
            index: 5,
            size: 1
        })
    );
}

#[test]
fn sto_resolves_after_pop() {
    // after popping, slot 1 no longer exists
    let (result, live, _) = run_program(&[lit(1), lit(2), sto(0, 1)]);
    assert_eq!(
        result,
        Err(RuntimeError::OutOfBounds {
            at: 2,
            index: 1,
            size: 1
        })
    );
    assert_eq!(live, vec![1]);
}

#[test]
fn broken_static_link_is_out_of_bounds() {
    // frame base 0 holds 50, which is not a live slot
    let (result, _, _) = run_program(&[lit(50), lod(1, 0)]);
    assert_eq!(
        result,
        Err(RuntimeError::OutOfBounds {
            at: 1,
            index: 50,
            size: 1
        })
    );
}

#[test]
fn binary_with_one_operand_is_insufficient() {
    let (result, live, _) = run_program(&[lit(1), op(Operation::Add)]);
    assert_eq!(result, Err(RuntimeError::InsufficientOperands { at: 1 }));
    assert_eq!(live, vec![1]);
}

#[test]
fn division_by_zero_is_reported_with_operands() {
    let (result, live, _) = run_program(&[lit(1), lit(0), op(Operation::Div)]);
    assert_eq!(result, Err(RuntimeError::DivideByZero { at: 2 }));
    assert_eq!(live, vec![1, 0]);
}

#[test]
fn modulo_by_zero_is_reported() {
    let (result, _, _) = run_program(&[lit(1), lit(0), op(Operation::Mod)]);
    assert_eq!(result, Err(RuntimeError::DivideByZero { at: 2 }));
}

#[test]
fn division_with_one_operand_is_insufficient() {
    let (result, _, _) = run_program(&[lit(0), op(Operation::Div)]);
    assert_eq!(result, Err(RuntimeError::InsufficientOperands { at: 1 }));
}

// ============================================================
// Properties
// ============================================================

proptest! {
    #[test]
    fn subtraction_order(a in -(1i32 << 23)..(1 << 23), b in -(1i32 << 23)..(1 << 23)) {
        prop_assert_eq!(binary(a, b, Operation::Sub), a.wrapping_sub(b));
    }

    #[test]
    fn comparison_order(a in -100i32..100, b in -100i32..100) {
        prop_assert_eq!(binary(a, b, Operation::Lt), i32::from(a < b));
        prop_assert_eq!(binary(a, b, Operation::Gte), i32::from(a >= b));
    }

    #[test]
    fn division_matches_native(a in -(1i32 << 23)..(1 << 23), b in 1i32..1000) {
        prop_assert_eq!(binary(a, b, Operation::Div), a / b);
        prop_assert_eq!(binary(a, -b, Operation::Mod), a % -b);
    }

    #[test]
    fn jpc_jumps_iff_non_zero(condition in -(1i32 << 23)..(1 << 23)) {
        let words = code(&[lit(1), lit(condition), jpc(7)]);
        let mut storage = [0; 4];
        let mut stack = Stack::new(&mut storage);
        let mut machine = Machine::new(&words).unwrap();
        for _ in 0..3 {
            machine.step(&mut stack).unwrap();
        }
        let expected = if condition != 0 { 7 } else { 3 };
        prop_assert_eq!(machine.pc(), expected);
    }
}
