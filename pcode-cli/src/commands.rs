//! CLI command implementations.

use std::fs;
use std::path::Path;

use log::info;
use pcode_common::{DecodeError, Instruction, Program};
use pcode_vm::{run_bounded, Completion, Machine, RuntimeError, Stack, StackDump};

use crate::sample;

/// Read a .pcb file into a program.
fn read_binary(path: &Path) -> Result<Program, i32> {
    let bytes = fs::read(path).map_err(|e| {
        eprintln!("error: cannot read '{}': {e}", path.display());
        1
    })?;

    Program::from_bytes(&bytes).map_err(|e| {
        eprintln!("error: invalid binary: {e}");
        1
    })
}

/// Load and execute a .pcb program.
pub fn run(path: &Path, stack_size: usize, max_steps: Option<u64>) -> Result<(), i32> {
    let program = read_binary(path)?;
    info!("loaded {} words from {}", program.len(), path.display());
    execute(&program, stack_size, max_steps)
}

/// Run the sample program, or write it out with `--emit`.
pub fn demo(emit: Option<&Path>) -> Result<(), i32> {
    let program = Program::assemble(&sample::program()).map_err(|e| {
        eprintln!("error: {e}");
        1
    })?;

    match emit {
        Some(output) => {
            let bytes = program.to_bytes();
            fs::write(output, &bytes).map_err(|e| {
                eprintln!("error: cannot write '{}': {e}", output.display());
                1
            })?;
            eprintln!(
                "wrote {} instructions ({} bytes) -> {}",
                program.len(),
                bytes.len(),
                output.display()
            );
            Ok(())
        }
        None => execute(&program, pcode_vm::DEFAULT_STACK_CAPACITY, None),
    }
}

/// Print one line per word: index, raw word and decoded instruction.
pub fn disassemble(path: &Path) -> Result<(), i32> {
    let program = read_binary(path)?;
    let decoded = program.words.iter().zip(program.instructions());
    for (index, (word, decoded)) in decoded.enumerate() {
        println!("{}", disassemble_line(index, *word, decoded));
    }
    Ok(())
}

fn disassemble_line(
    index: usize,
    word: i32,
    decoded: Result<Instruction, DecodeError>,
) -> String {
    match decoded {
        Ok(instr) => format!("{index:04}  0x{word:08x}  {instr}"),
        Err(e) => format!("{index:04}  0x{word:08x}  <invalid: {e}>"),
    }
}

fn execute(program: &Program, stack_size: usize, max_steps: Option<u64>) -> Result<(), i32> {
    let mut storage = vec![0; stack_size];
    let mut stack = Stack::new(&mut storage);

    let outcome = match max_steps {
        Some(limit) => run_bounded(&program.words, &mut stack, limit),
        None => run_to_halt(&program.words, &mut stack),
    };

    match outcome {
        Ok(Completion::Halted { steps }) => {
            println!("halted after {steps} instructions");
            Ok(())
        }
        Ok(Completion::BudgetExhausted { steps }) => {
            eprintln!("step budget of {steps} instructions exhausted");
            eprintln!("stack:");
            eprint!("{}", StackDump(stack.as_slice()));
            Err(4)
        }
        Err(e) => {
            eprintln!("breaking with: {e}");
            if let Some(line) = failing_line(program, &e) {
                eprintln!("at: {line}");
            }
            eprintln!("stack:");
            eprint!("{}", StackDump(stack.as_slice()));
            Err(3)
        }
    }
}

/// Disassembly of the word an error points at, if it names one.
fn failing_line(program: &Program, err: &RuntimeError) -> Option<String> {
    let at = err.at()?;
    let word = *program.words.get(at)?;
    Some(disassemble_line(at, word, Instruction::decode(word)))
}

fn run_to_halt(code: &[i32], stack: &mut Stack<'_>) -> Result<Completion, RuntimeError> {
    let mut machine = Machine::new(code)?;
    machine.run(stack)?;
    Ok(Completion::Halted {
        steps: machine.steps(),
    })
}
