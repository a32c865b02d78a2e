//! LS-8 Emulator - CLI Entry Point
//!
//! Commands:
//! - `ls8-emu run <program>` - Run an .ls8 or .asm file
//! - `ls8-emu debug <program>` - Interactive debugger
//! - `ls8-emu asm <source>` - Assemble to .ls8
//! - `ls8-emu disasm <program>` - Disassemble an .ls8 file
//!
//! PRN output goes to stdout; everything else goes to stderr.

use clap::{Parser, Subcommand};
use ls8::{Cpu, CpuError, ProgramError};
use std::process::ExitCode;

/// Exit status when the program file cannot be found.
const EXIT_NOT_FOUND: u8 = 2;
/// Exit status for every other failure, including unknown instructions.
const EXIT_FAILURE: u8 = 1;

#[derive(Parser)]
#[command(name = "ls8-emu")]
#[command(version = "0.1.0")]
#[command(about = "An emulator for the LS-8 educational 8-bit CPU")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts
    Run {
        /// Path to the .ls8 or .asm file to execute
        program: String,
        /// Stop after this many instructions
        #[arg(short, long)]
        max_cycles: Option<u64>,
        /// Print a trace line before each instruction
        #[arg(short, long)]
        trace: bool,
        /// Print the final CPU state as JSON
        #[arg(long)]
        dump_state: bool,
    },
    /// Interactive debugger
    #[cfg(feature = "tui")]
    Debug {
        /// Path to the .ls8 or .asm file to debug
        program: String,
    },
    /// Assemble source to .ls8
    Asm {
        /// Path to the source file
        source: String,
        /// Output .ls8 file
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Disassemble an .ls8 file to readable text
    Disasm {
        /// Path to the .ls8 file
        program: String,
    },
}

/// Failures surfaced by the CLI, each mapped to an exit status.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Program(#[from] ProgramError),

    #[error("assembly error: {0}")]
    Assembler(#[from] ls8::AssemblerError),

    #[error("failed to load program: {0}")]
    Load(#[from] ls8::cpu::memory::MemoryError),

    #[error("CPU error at PC={pc:02X}: {source}")]
    Cpu { pc: u8, source: CpuError },

    #[error("no instructions to execute")]
    EmptyProgram,

    #[error("{0}")]
    Io(String),
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            CliError::Program(ProgramError::NotFound { .. }) => EXIT_NOT_FOUND,
            _ => EXIT_FAILURE,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Run { program, max_cycles, trace, dump_state }) => {
            run_program(&program, max_cycles, trace, dump_state)
        }
        #[cfg(feature = "tui")]
        Some(Commands::Debug { program }) => debug_program(&program),
        Some(Commands::Asm { source, output }) => assemble_file(&source, output),
        Some(Commands::Disasm { program }) => disassemble_file(&program),
        None => {
            println!("LS-8 Emulator v0.1.0");
            println!("An 8-bit educational CPU emulator");
            println!();
            println!("Use --help for available commands");
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

/// Read a program, assembling it first if it is `.asm` source.
fn read_program(path: &str) -> Result<Vec<u8>, CliError> {
    let program = if path.ends_with(".asm") {
        let source = std::fs::read_to_string(path)
            .map_err(|_| ProgramError::NotFound { path: path.to_string() })?;
        let bytes = ls8::assemble(&source)?;
        eprintln!("📝 Assembled {} bytes", bytes.len());
        bytes
    } else {
        let bytes = ls8::load_program(path)?;
        eprintln!("📂 Loaded {} bytes", bytes.len());
        bytes
    };

    if program.is_empty() {
        return Err(CliError::EmptyProgram);
    }
    Ok(program)
}

fn run_program(path: &str, max_cycles: Option<u64>, trace: bool, dump_state: bool) -> Result<(), CliError> {
    use std::io::Write;

    eprintln!("🔧 Running: {}", path);
    let program = read_program(path)?;

    let mut cpu = Cpu::new();
    cpu.load(&program)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let result = if trace {
        run_traced(&mut cpu, &mut out, max_cycles)
    } else {
        cpu.run_with_output(&mut out, max_cycles).map(|_| ())
    };

    if let Err(source) = result {
        return Err(CliError::Cpu { pc: cpu.regs.pc, source });
    }

    eprintln!("✓ {:?} after {} cycles", cpu.state, cpu.cycles);
    if cpu.is_running() {
        if let Some(max) = max_cycles {
            eprintln!("⚠️  Reached max cycles limit ({}). Use --max-cycles to increase.", max);
        }
    }

    if dump_state {
        let json = serde_json::to_string_pretty(&cpu).map_err(|e| CliError::Io(e.to_string()))?;
        writeln!(out, "{}", json).map_err(|e| CliError::Io(e.to_string()))?;
    }

    Ok(())
}

/// Step one instruction at a time, printing a trace line to stderr before
/// each and moving PRN values to `out` as they appear.
fn run_traced<W: std::io::Write>(cpu: &mut Cpu, out: &mut W, max_cycles: Option<u64>) -> Result<(), CpuError> {
    use ls8::asm::disasm::disassemble_instruction;
    use ls8::Instruction;

    let kept = cpu.output.len();
    while cpu.is_running() && max_cycles.map_or(true, |max| cpu.cycles < max) {
        let instr = Instruction::fetch(&cpu.mem, cpu.regs.pc);
        eprintln!(
            "{}  {}",
            cpu.trace(),
            disassemble_instruction(instr.opcode, instr.operand_a, instr.operand_b)
        );

        let step = cpu.step();
        for value in cpu.output.drain(kept..) {
            writeln!(out, "{}", value).map_err(|e| CpuError::Output(e.to_string()))?;
        }
        step?;
    }
    Ok(())
}

#[cfg(feature = "tui")]
fn debug_program(path: &str) -> Result<(), CliError> {
    eprintln!("🔍 Loading: {}", path);
    let program = read_program(path)?;

    eprintln!("🚀 Launching debugger...");
    ls8::run_debugger(program).map_err(|e| CliError::Io(format!("debugger error: {}", e)))
}

fn assemble_file(source_path: &str, output: Option<String>) -> Result<(), CliError> {
    let out_path = output.unwrap_or_else(|| {
        match source_path.strip_suffix(".asm") {
            Some(stem) => format!("{}.ls8", stem),
            None => format!("{}.ls8", source_path),
        }
    });

    eprintln!("📝 Assembling: {} → {}", source_path, out_path);

    let source = std::fs::read_to_string(source_path)
        .map_err(|_| ProgramError::NotFound { path: source_path.to_string() })?;
    let program = ls8::assemble(&source)?;
    eprintln!("✓ Assembled {} bytes", program.len());

    ls8::save_program(&out_path, &program)?;
    eprintln!("✓ Saved to {}", out_path);

    Ok(())
}

fn disassemble_file(path: &str) -> Result<(), CliError> {
    eprintln!("📖 Disassembling: {}", path);

    let program = ls8::load_program(path)?;
    println!("{}", ls8::disassemble(&program));

    Ok(())
}
