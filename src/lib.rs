//! # LS-8 Emulator
//!
//! An emulator for the LS-8, a small 8-bit educational CPU.
//!
//! Programs are loaded into a 256-byte memory at address 0 and executed by a
//! fetch-decode-dispatch loop until `HLT` runs or a fatal error occurs.

pub mod cpu;
pub mod asm;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use cpu::{Cpu, CpuState, CpuError, Memory, Registers, Flags, Instruction, Opcode};
pub use asm::{assemble, disassemble, AssemblerError, load_program, parse_program, save_program, ProgramError};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
