//! Program files, assembler and disassembler for the LS-8.
//!
//! This module provides:
//! - The `.ls8` loader/saver (binary text, one byte per line)
//! - A simple two-pass assembler (mnemonics → machine code)
//! - A disassembler (machine code → readable text)

pub mod assembler;
pub mod disasm;
pub mod program;

pub use assembler::{assemble, AssemblerError};
pub use disasm::{disassemble, disassemble_instruction};
pub use program::{load_program, parse_program, save_program, ProgramError};
