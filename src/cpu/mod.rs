//! CPU emulation for the LS-8.
//!
//! This module implements the complete LS-8 architecture:
//! - 256 bytes of memory
//! - 8 general-purpose registers, R7 doubling as the stack pointer
//! - PC and FL (`00000LGE`) registers
//! - A 13-instruction set dispatched through an opcode table

pub mod memory;
pub mod registers;
pub mod alu;
pub mod decode;
pub mod dispatch;
pub mod execute;
mod handlers;

pub use memory::Memory;
pub use registers::{Registers, Flags};
pub use alu::{AluOp, AluError};
pub use decode::{Instruction, Opcode, DecodeError};
pub use dispatch::{DispatchTable, Handler};
pub use execute::{Cpu, CpuError, CpuState};
