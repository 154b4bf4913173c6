//! P-code CLI: run packed programs, disassemble them, try the sample.
//!
//! Exit codes:
//! - 0: Success
//! - 1: Input, decode or usage error
//! - 3: Runtime error
//! - 4: Step budget exhausted

mod commands;
mod logger;
mod sample;

use std::path::PathBuf;
use std::process;

use clap::Parser;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(name = "pcode", about = "Packed P-code virtual machine")]
struct Args {
    /// Turn on verbose logging. Repeat to increase verbosity.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Sets the logging to write to a file.
    #[arg(short, long, global = true)]
    log_file: Option<PathBuf>,

    /// Selects the subcommand.
    #[command(subcommand)]
    action: Action,
}

#[derive(clap::Subcommand, Debug)]
enum Action {
    /// Loads and executes a packed program file (.pcb).
    Run {
        /// Path to the program file.
        file: PathBuf,

        /// Number of stack slots available to the program.
        #[arg(long, default_value_t = pcode_vm::DEFAULT_STACK_CAPACITY)]
        stack_size: usize,

        /// Stop after this many instructions (default: run until halt).
        #[arg(long)]
        max_steps: Option<u64>,
    },
    /// Runs the built-in sample program, or writes it to a file.
    Demo {
        /// Write the sample as a .pcb file instead of running it.
        #[arg(long)]
        emit: Option<PathBuf>,
    },
    /// Prints one line per instruction word of a program file.
    Disassemble {
        /// Path to the program file.
        file: PathBuf,
    },
    /// Prints the version number.
    Version,
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // --help and --version are not failures
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            process::exit(code);
        }
    };

    if let Err(e) = logger::configure(args.verbose, args.log_file) {
        eprintln!("error: {e}");
        process::exit(1);
    }

    let result = match args.action {
        Action::Run {
            file,
            stack_size,
            max_steps,
        } => commands::run(&file, stack_size, max_steps),
        Action::Demo { emit } => commands::demo(emit.as_deref()),
        Action::Disassemble { file } => commands::disassemble(&file),
        Action::Version => {
            println!("pcode version {VERSION}");
            Ok(())
        }
    };

    if let Err(code) = result {
        process::exit(code);
    }
}
