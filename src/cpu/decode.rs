//! Instruction decoder for the LS-8.
//!
//! Opcodes are one byte laid out as `AABCDDDD`:
//! - `AA`: number of operands (0-2)
//! - `B`: 1 if the instruction is an ALU operation
//! - `C`: 1 if the instruction sets the PC itself
//! - `DDDD`: instruction identifier
//!
//! An instruction is the opcode followed by up to two operand bytes.

use crate::cpu::Memory;
use crate::cpu::alu::AluOp;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Opcodes understood by the dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Opcode {
    // ==================== Data Transfer ====================

    /// Load immediate: `reg[a] := b`
    Ldi = 0b1000_0010,
    /// Print `reg[a]` to the output boundary
    Prn = 0b0100_0111,

    // ==================== Arithmetic ====================

    /// `reg[a] := reg[a] + reg[b]`
    Add = AluOp::ADD,
    /// `reg[a] := reg[a] * reg[b]`
    Mul = AluOp::MUL,
    /// Compare `reg[a]` with `reg[b]`, set FL
    Cmp = AluOp::CMP,

    // ==================== Stack ====================

    Push = 0b0100_0101,
    Pop = 0b0100_0110,

    // ==================== Control Flow ====================

    /// Push return address, jump to `reg[a]`
    Call = 0b0101_0000,
    /// Pop return address into PC
    Ret = 0b0001_0001,
    /// Jump to `reg[a]`
    Jmp = 0b0101_0100,
    /// Jump to `reg[a]` if E is set
    Jeq = 0b0101_0101,
    /// Jump to `reg[a]` if E is clear
    Jne = 0b0101_0110,
    /// Halt execution
    Hlt = 0b0000_0001,
}

impl Opcode {
    /// Every opcode, in dispatch-table order.
    pub const ALL: [Opcode; 13] = [
        Opcode::Ldi,
        Opcode::Prn,
        Opcode::Hlt,
        Opcode::Mul,
        Opcode::Push,
        Opcode::Pop,
        Opcode::Call,
        Opcode::Ret,
        Opcode::Add,
        Opcode::Cmp,
        Opcode::Jeq,
        Opcode::Jmp,
        Opcode::Jne,
    ];

    /// The opcode byte.
    #[inline]
    pub fn byte(self) -> u8 {
        self as u8
    }

    /// Assembly mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Ldi => "LDI",
            Opcode::Prn => "PRN",
            Opcode::Add => "ADD",
            Opcode::Mul => "MUL",
            Opcode::Cmp => "CMP",
            Opcode::Push => "PUSH",
            Opcode::Pop => "POP",
            Opcode::Call => "CALL",
            Opcode::Ret => "RET",
            Opcode::Jmp => "JMP",
            Opcode::Jeq => "JEQ",
            Opcode::Jne => "JNE",
            Opcode::Hlt => "HLT",
        }
    }

    /// Look up an opcode by mnemonic (case-insensitive).
    pub fn from_mnemonic(name: &str) -> Option<Opcode> {
        Self::ALL
            .into_iter()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(name))
    }

    /// Number of operand bytes following the opcode.
    #[inline]
    pub fn operand_count(self) -> u8 {
        operand_count(self.byte())
    }

    /// Whether the second operand is an immediate rather than a register.
    pub fn has_immediate(self) -> bool {
        matches!(self, Opcode::Ldi)
    }
}

impl TryFrom<u8> for Opcode {
    type Error = DecodeError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|op| op.byte() == byte)
            .ok_or(DecodeError::InvalidOpcode(byte))
    }
}

/// Operand count encoded in the top two bits of any opcode byte.
#[inline]
pub fn operand_count(opcode: u8) -> u8 {
    opcode >> 6
}

/// A fetched instruction: the byte at PC and the two bytes after it.
///
/// Both operand bytes are always fetched, whether or not the opcode uses
/// them; addresses wrap at the end of memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: u8,
    pub operand_a: u8,
    pub operand_b: u8,
}

impl Instruction {
    pub fn new(opcode: u8, operand_a: u8, operand_b: u8) -> Self {
        Self { opcode, operand_a, operand_b }
    }

    /// Fetch the instruction at `pc`.
    pub fn fetch(mem: &Memory, pc: u8) -> Self {
        Self {
            opcode: mem.read(pc),
            operand_a: mem.read(pc.wrapping_add(1)),
            operand_b: mem.read(pc.wrapping_add(2)),
        }
    }

    /// Decode the opcode byte.
    pub fn op(&self) -> Result<Opcode, DecodeError> {
        Opcode::try_from(self.opcode)
    }

    /// Encoded length in bytes (1-3). Unknown opcodes count as a single
    /// data byte.
    pub fn len(&self) -> usize {
        match self.op() {
            Ok(op) => 1 + op.operand_count() as usize,
            Err(_) => 1,
        }
    }
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid opcode: {0:#04x}")]
    InvalidOpcode(u8),
}
