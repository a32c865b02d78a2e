//! LS-8 CPU registers.
//!
//! The LS-8 has:
//! - R0-R7: eight 8-bit general-purpose registers (R7 doubles as SP)
//! - PC: 8-bit program counter
//! - FL: flags register, `00000LGE`

use std::cmp::Ordering;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Number of general-purpose registers.
pub const REGISTER_COUNT: usize = 8;

/// Index of the register reserved as the stack pointer.
pub const SP: u8 = 7;

/// Initial stack pointer: the top of the stack area, below the reserved
/// high-memory bytes.
pub const SP_INIT: u8 = 0xF4;

/// The FL register. Only the low three bits are meaningful.
#[derive(Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Flags(u8);

impl Flags {
    /// Equal.
    pub const EQUAL: u8 = 0b0000_0001;
    /// Greater-than.
    pub const GREATER: u8 = 0b0000_0010;
    /// Less-than.
    pub const LESS: u8 = 0b0000_0100;

    /// All flags clear.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Raw bit-field.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Record a comparison result. Exactly one bit ends up set.
    pub fn set_compare(&mut self, ordering: Ordering) {
        self.0 = match ordering {
            Ordering::Equal => Self::EQUAL,
            Ordering::Greater => Self::GREATER,
            Ordering::Less => Self::LESS,
        };
    }

    pub fn is_equal(self) -> bool {
        self.0 & Self::EQUAL != 0
    }

    pub fn is_greater(self) -> bool {
        self.0 & Self::GREATER != 0
    }

    pub fn is_less(self) -> bool {
        self.0 & Self::LESS != 0
    }
}

impl std::fmt::Debug for Flags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bit = |set: bool, c: char| if set { c } else { '-' };
        write!(
            f,
            "FL={}{}{}",
            bit(self.is_less(), 'L'),
            bit(self.is_greater(), 'G'),
            bit(self.is_equal(), 'E'),
        )
    }
}

/// The LS-8 register file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Registers {
    /// R0-R7.
    gpr: [u8; REGISTER_COUNT],

    /// PC: address of the next instruction to fetch.
    pub pc: u8,

    /// FL: result of the most recent CMP.
    pub fl: Flags,
}

impl Registers {
    /// Create a register file in its power-on state.
    pub fn new() -> Self {
        let mut gpr = [0; REGISTER_COUNT];
        gpr[SP as usize] = SP_INIT;

        Self {
            gpr,
            pc: 0,
            fl: Flags::empty(),
        }
    }

    /// Reset to the power-on state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Read a general-purpose register.
    #[inline]
    pub fn get(&self, index: u8) -> Result<u8, RegisterError> {
        self.gpr
            .get(index as usize)
            .copied()
            .ok_or(RegisterError::InvalidRegister(index))
    }

    /// Write a general-purpose register.
    #[inline]
    pub fn set(&mut self, index: u8, value: u8) -> Result<(), RegisterError> {
        let slot = self.gpr
            .get_mut(index as usize)
            .ok_or(RegisterError::InvalidRegister(index))?;
        *slot = value;
        Ok(())
    }

    /// All general-purpose registers, R0 first.
    pub fn all(&self) -> &[u8; REGISTER_COUNT] {
        &self.gpr
    }

    /// Current stack pointer.
    #[inline]
    pub fn sp(&self) -> u8 {
        self.gpr[SP as usize]
    }

    #[inline]
    pub fn set_sp(&mut self, value: u8) {
        self.gpr[SP as usize] = value;
    }

    /// Advance the program counter by `n` bytes, wrapping at 256.
    /// Returns the old value.
    pub fn advance_pc(&mut self, n: u8) -> u8 {
        let old = self.pc;
        self.pc = self.pc.wrapping_add(n);
        old
    }

    /// Set the program counter to an absolute address.
    pub fn jump(&mut self, addr: u8) {
        self.pc = addr;
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors raised by register access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("invalid register R{0} (expected R0-R7)")]
    InvalidRegister(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_on_state() {
        let regs = Registers::new();

        assert_eq!(regs.sp(), 0xF4);
        assert_eq!(regs.pc, 0);
        assert_eq!(regs.fl.bits(), 0);
        for i in 0..7 {
            assert_eq!(regs.get(i).unwrap(), 0);
        }
    }

    #[test]
    fn test_invalid_register() {
        let mut regs = Registers::new();

        assert_eq!(regs.get(8), Err(RegisterError::InvalidRegister(8)));
        assert_eq!(regs.set(200, 1), Err(RegisterError::InvalidRegister(200)));
    }

    #[test]
    fn test_flags_exactly_one_bit() {
        let mut fl = Flags::empty();

        fl.set_compare(Ordering::Equal);
        assert!(fl.is_equal() && !fl.is_less() && !fl.is_greater());

        fl.set_compare(Ordering::Less);
        assert_eq!(fl.bits(), Flags::LESS);

        fl.set_compare(Ordering::Greater);
        assert_eq!(fl.bits(), Flags::GREATER);
        assert_eq!(format!("{:?}", fl), "FL=-G-");
    }

    #[test]
    fn test_advance_pc_wraps() {
        let mut regs = Registers::new();
        regs.pc = 254;

        let old = regs.advance_pc(3);
        assert_eq!(old, 254);
        assert_eq!(regs.pc, 1);
    }

    #[test]
    fn test_reset() {
        let mut regs = Registers::new();
        regs.set(0, 9).unwrap();
        regs.set_sp(0x10);
        regs.jump(40);
        regs.fl.set_compare(Ordering::Less);

        regs.reset();
        assert_eq!(regs.get(0).unwrap(), 0);
        assert_eq!(regs.sp(), SP_INIT);
        assert_eq!(regs.pc, 0);
        assert_eq!(regs.fl, Flags::empty());
    }
}
