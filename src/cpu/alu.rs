//! Arithmetic/logic unit.
//!
//! Pure 8-bit operations selected by the ALU opcode byte. Results wrap at
//! 256, matching the memory cell width.

use std::cmp::Ordering;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// ALU operation kinds, keyed by the opcode byte that selects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AluOp {
    Add,
    Sub,
    Mul,
    Div,
    Cmp,
}

impl AluOp {
    pub const ADD: u8 = 0b1010_0000;
    pub const SUB: u8 = 0b1010_0001;
    pub const MUL: u8 = 0b1010_0010;
    pub const DIV: u8 = 0b1010_0011;
    pub const CMP: u8 = 0b1010_0111;

    /// Opcode byte for this operation.
    pub fn opcode(self) -> u8 {
        match self {
            AluOp::Add => Self::ADD,
            AluOp::Sub => Self::SUB,
            AluOp::Mul => Self::MUL,
            AluOp::Div => Self::DIV,
            AluOp::Cmp => Self::CMP,
        }
    }
}

impl TryFrom<u8> for AluOp {
    type Error = AluError;

    fn try_from(op: u8) -> Result<Self, Self::Error> {
        match op {
            Self::ADD => Ok(AluOp::Add),
            Self::SUB => Ok(AluOp::Sub),
            Self::MUL => Ok(AluOp::Mul),
            Self::DIV => Ok(AluOp::Div),
            Self::CMP => Ok(AluOp::Cmp),
            _ => Err(AluError::UnsupportedOperation(op)),
        }
    }
}

/// What an ALU operation produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOutput {
    /// New value for the destination register.
    Value(u8),
    /// Comparison of `a` against `b`, destined for FL.
    Compare(Ordering),
}

/// Apply `op` to `a` and `b`.
pub fn apply(op: AluOp, a: u8, b: u8) -> Result<AluOutput, AluError> {
    let out = match op {
        AluOp::Add => AluOutput::Value(add(a, b)),
        AluOp::Sub => AluOutput::Value(subtract(a, b)),
        AluOp::Mul => AluOutput::Value(multiply(a, b)),
        AluOp::Div => AluOutput::Value(divide(a, b)?),
        AluOp::Cmp => AluOutput::Compare(compare(a, b)),
    };
    Ok(out)
}

#[inline]
pub fn add(a: u8, b: u8) -> u8 {
    a.wrapping_add(b)
}

#[inline]
pub fn subtract(a: u8, b: u8) -> u8 {
    a.wrapping_sub(b)
}

/// Multiply, keeping the low byte of the product.
#[inline]
pub fn multiply(a: u8, b: u8) -> u8 {
    a.wrapping_mul(b)
}

/// Truncating integer division.
#[inline]
pub fn divide(a: u8, b: u8) -> Result<u8, AluError> {
    a.checked_div(b).ok_or(AluError::DivisionByZero)
}

#[inline]
pub fn compare(a: u8, b: u8) -> Ordering {
    a.cmp(&b)
}

/// Errors raised by the ALU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AluError {
    #[error("unsupported ALU operation: {0:#04x}")]
    UnsupportedOperation(u8),

    #[error("division by zero")]
    DivisionByZero,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic() {
        assert_eq!(apply(AluOp::Add, 5, 6).unwrap(), AluOutput::Value(11));
        assert_eq!(apply(AluOp::Sub, 9, 4).unwrap(), AluOutput::Value(5));
        assert_eq!(apply(AluOp::Mul, 4, 5).unwrap(), AluOutput::Value(20));
        assert_eq!(apply(AluOp::Div, 20, 6).unwrap(), AluOutput::Value(3));
    }

    #[test]
    fn test_wrapping() {
        assert_eq!(add(250, 10), 4);
        assert_eq!(subtract(3, 5), 254);
        assert_eq!(multiply(16, 17), 16);
    }

    #[test]
    fn test_divide_by_zero() {
        assert_eq!(apply(AluOp::Div, 1, 0), Err(AluError::DivisionByZero));
    }

    #[test]
    fn test_compare() {
        assert_eq!(apply(AluOp::Cmp, 3, 3).unwrap(), AluOutput::Compare(Ordering::Equal));
        assert_eq!(apply(AluOp::Cmp, 2, 3).unwrap(), AluOutput::Compare(Ordering::Less));
        assert_eq!(apply(AluOp::Cmp, 4, 3).unwrap(), AluOutput::Compare(Ordering::Greater));
    }

    #[test]
    fn test_opcode_mapping() {
        for op in [AluOp::Add, AluOp::Sub, AluOp::Mul, AluOp::Div, AluOp::Cmp] {
            assert_eq!(AluOp::try_from(op.opcode()), Ok(op));
        }
        assert_eq!(AluOp::try_from(0xA4), Err(AluError::UnsupportedOperation(0xA4)));
    }
}
