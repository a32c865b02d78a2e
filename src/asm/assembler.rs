//! Simple assembler for LS-8 programs.
//!
//! Syntax:
//! ```text
//! ; Comment
//! START:              ; Define a label
//!     LDI R0,8        ; Register and immediate
//!     LDI R1,PRINT    ; Immediate may be a label
//!     CALL R1
//!     HLT
//! PRINT:
//!     PRN R0
//!     RET
//!
//!     DB 0x2A         ; Define a data byte
//!     DS 4            ; Reserve 4 zero bytes
//! ```

use crate::cpu::decode::Opcode;
use crate::cpu::registers::REGISTER_COUNT;
use crate::cpu::memory::MEMORY_SIZE;
use std::collections::HashMap;
use thiserror::Error;

/// Assemble source code to machine code.
pub fn assemble(source: &str) -> Result<Vec<u8>, AssemblerError> {
    let mut asm = Assembler::new();
    asm.assemble(source)
}

/// The assembler state.
struct Assembler {
    /// Symbol table (label -> address).
    symbols: HashMap<String, u8>,
    /// Pending references: (output_index, label, source_line).
    pending: Vec<(usize, String, usize)>,
    /// Output bytes; the current address is its length.
    output: Vec<u8>,
}

impl Assembler {
    fn new() -> Self {
        Self {
            symbols: HashMap::new(),
            pending: Vec::new(),
            output: Vec::new(),
        }
    }

    fn assemble(&mut self, source: &str) -> Result<Vec<u8>, AssemblerError> {
        // Pass 1: Collect labels and generate code
        for (line_num, line) in source.lines().enumerate() {
            self.process_line(line, line_num + 1)?;
        }

        // Pass 2: Resolve forward references
        self.resolve_references()?;

        Ok(std::mem::take(&mut self.output))
    }

    fn process_line(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        // Remove comments (`#` is accepted too, to match .ls8 files)
        let line = line.split([';', '#']).next().unwrap_or("").trim();

        if line.is_empty() {
            return Ok(());
        }

        if let Some(colon_idx) = line.find(':') {
            let label = line[..colon_idx].trim().to_uppercase();
            if label.is_empty() || label.contains(char::is_whitespace) {
                return Err(AssemblerError::SyntaxError {
                    line: line_num,
                    message: format!("invalid label '{}'", &line[..colon_idx]),
                });
            }
            let addr = self.current_addr(line_num)?;
            if self.symbols.insert(label.clone(), addr).is_some() {
                return Err(AssemblerError::SyntaxError {
                    line: line_num,
                    message: format!("duplicate label '{}'", label),
                });
            }

            let rest = line[colon_idx + 1..].trim();
            if !rest.is_empty() {
                return self.process_instruction(rest, line_num);
            }
            return Ok(());
        }

        self.process_instruction(line, line_num)
    }

    fn process_instruction(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        let (mnemonic, rest) = match line.split_once(char::is_whitespace) {
            Some((m, r)) => (m.to_uppercase(), r.trim()),
            None => (line.to_uppercase(), ""),
        };
        let operands: Vec<&str> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split(',').map(str::trim).collect()
        };

        match mnemonic.as_str() {
            // Directives
            "DB" => {
                let [value] = self.expect_operands::<1>(&mnemonic, &operands, line_num)?;
                self.emit_value(value, line_num)?;
            }

            "DS" => {
                let [count] = self.expect_operands::<1>(&mnemonic, &operands, line_num)?;
                let count = parse_number(count)
                    .and_then(|n| usize::try_from(n).ok())
                    .ok_or_else(|| AssemblerError::SyntaxError {
                        line: line_num,
                        message: "DS requires a non-negative numeric size".into(),
                    })?;
                if self.output.len().saturating_add(count) > MEMORY_SIZE {
                    return Err(AssemblerError::ProgramTooLarge { line: line_num });
                }
                self.output.resize(self.output.len() + count, 0);
            }

            // Instructions
            _ => {
                let op = Opcode::from_mnemonic(&mnemonic).ok_or_else(|| {
                    AssemblerError::UnknownMnemonic { line: line_num, mnemonic: mnemonic.clone() }
                })?;
                self.emit_instruction(op, &operands, line_num)?;
            }
        }

        Ok(())
    }

    fn emit_instruction(&mut self, op: Opcode, operands: &[&str], line_num: usize)
        -> Result<(), AssemblerError>
    {
        self.emit(op.byte());

        match op.operand_count() {
            0 => {
                self.expect_operands::<0>(op.mnemonic(), operands, line_num)?;
            }
            1 => {
                let [reg] = self.expect_operands::<1>(op.mnemonic(), operands, line_num)?;
                let reg = parse_register(reg, line_num)?;
                self.emit(reg);
            }
            _ => {
                let [a, b] = self.expect_operands::<2>(op.mnemonic(), operands, line_num)?;
                let a = parse_register(a, line_num)?;
                self.emit(a);
                if op.has_immediate() {
                    self.emit_value(b, line_num)?;
                } else {
                    let b = parse_register(b, line_num)?;
                    self.emit(b);
                }
            }
        }

        Ok(())
    }

    fn expect_operands<'a, const N: usize>(&self, mnemonic: &str, operands: &[&'a str], line_num: usize)
        -> Result<[&'a str; N], AssemblerError>
    {
        <[&str; N]>::try_from(operands).map_err(|_| AssemblerError::SyntaxError {
            line: line_num,
            message: format!("{} expects {} operand(s), found {}", mnemonic, N, operands.len()),
        })
    }

    /// Emit a byte-sized immediate, deferring label references to pass 2.
    fn emit_value(&mut self, operand: &str, line_num: usize) -> Result<(), AssemblerError> {
        if let Some(value) = parse_number(operand) {
            let byte = u8::try_from(value)
                .map_err(|_| AssemblerError::ValueOutOfRange { line: line_num, value })?;
            self.emit(byte);
            return Ok(());
        }

        if !is_identifier(operand) {
            return Err(AssemblerError::SyntaxError {
                line: line_num,
                message: format!("invalid operand '{}'", operand),
            });
        }

        self.pending.push((self.output.len(), operand.to_uppercase(), line_num));
        self.emit(0); // Placeholder, resolved in pass 2
        Ok(())
    }

    fn emit(&mut self, byte: u8) {
        self.output.push(byte);
    }

    fn current_addr(&self, line_num: usize) -> Result<u8, AssemblerError> {
        u8::try_from(self.output.len())
            .map_err(|_| AssemblerError::ProgramTooLarge { line: line_num })
    }

    fn resolve_references(&mut self) -> Result<(), AssemblerError> {
        if self.output.len() > MEMORY_SIZE {
            return Err(AssemblerError::ProgramTooLarge { line: 0 });
        }

        for (out_idx, label, line_num) in &self.pending {
            let addr = self.symbols.get(label)
                .ok_or_else(|| AssemblerError::UndefinedLabel {
                    line: *line_num,
                    label: label.clone(),
                })?;
            self.output[*out_idx] = *addr;
        }
        Ok(())
    }
}

fn parse_register(operand: &str, line_num: usize) -> Result<u8, AssemblerError> {
    let index = operand
        .strip_prefix(['R', 'r'])
        .and_then(|n| n.parse::<u8>().ok())
        .ok_or_else(|| AssemblerError::SyntaxError {
            line: line_num,
            message: format!("expected register, found '{}'", operand),
        })?;

    if index as usize >= REGISTER_COUNT {
        return Err(AssemblerError::InvalidRegister { line: line_num, register: index });
    }
    Ok(index)
}

/// Parse a decimal, `0x` hex, or `0b` binary literal.
fn parse_number(operand: &str) -> Option<i64> {
    let operand = operand.trim();
    if let Some(hex) = operand.strip_prefix("0x").or_else(|| operand.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok();
    }
    if let Some(bin) = operand.strip_prefix("0b").or_else(|| operand.strip_prefix("0B")) {
        return i64::from_str_radix(bin, 2).ok();
    }
    operand.parse::<i64>().ok()
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("syntax error on line {line}: {message}")]
    SyntaxError { line: usize, message: String },

    #[error("unknown mnemonic on line {line}: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("undefined label on line {line}: {label}")]
    UndefinedLabel { line: usize, label: String },

    #[error("value out of range on line {line}: {value}")]
    ValueOutOfRange { line: usize, value: i64 },

    #[error("invalid register on line {line}: R{register}")]
    InvalidRegister { line: usize, register: u8 },

    #[error("program does not fit in 256 bytes (line {line})")]
    ProgramTooLarge { line: usize },
}
