//! Disassembler for LS-8 programs.
//!
//! Converts machine code back to readable assembly.

use crate::cpu::decode::{Instruction, Opcode};

/// Disassemble a single instruction from its opcode and operand bytes.
///
/// Bytes that are not a known opcode render as a `DB` data directive.
pub fn disassemble_instruction(opcode: u8, operand_a: u8, operand_b: u8) -> String {
    match Instruction::new(opcode, operand_a, operand_b).op() {
        Ok(op) => format_instruction(op, operand_a, operand_b),
        Err(_) => format!("DB {:#04x}", opcode),
    }
}

/// Length of the instruction starting with `opcode`. Unknown bytes are
/// treated as single data bytes.
pub fn instruction_len(opcode: u8) -> usize {
    Instruction::new(opcode, 0, 0).len()
}

/// Disassemble a program, one instruction per line.
pub fn disassemble(program: &[u8]) -> String {
    let mut output = String::new();
    output.push_str("; LS-8 Disassembly\n");
    output.push_str("; -----------------\n\n");

    let mut pc = 0;
    while pc < program.len() {
        let len = instruction_len(program[pc]);
        let bytes: Vec<u8> = (0..3)
            .map(|i| program.get(pc + i).copied().unwrap_or(0))
            .collect();
        let raw: Vec<String> = program[pc..(pc + len).min(program.len())]
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect();

        output.push_str(&format!(
            "{:03}: {:<12}  ; {}\n",
            pc,
            disassemble_instruction(bytes[0], bytes[1], bytes[2]),
            raw.join(" ")
        ));
        pc += len;
    }

    output
}

fn format_instruction(op: Opcode, a: u8, b: u8) -> String {
    match op.operand_count() {
        0 => op.mnemonic().to_string(),
        1 => format!("{} R{}", op.mnemonic(), a),
        _ if op.has_immediate() => format!("{} R{},{}", op.mnemonic(), a, b),
        _ => format!("{} R{},R{}", op.mnemonic(), a, b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disassemble_forms() {
        assert_eq!(disassemble_instruction(0x01, 0, 0), "HLT");
        assert_eq!(disassemble_instruction(0x47, 2, 0), "PRN R2");
        assert_eq!(disassemble_instruction(0x82, 0, 8), "LDI R0,8");
        assert_eq!(disassemble_instruction(0xA7, 0, 1), "CMP R0,R1");
        assert_eq!(disassemble_instruction(0x55, 2, 0), "JEQ R2");
    }

    #[test]
    fn test_disassemble_unknown() {
        assert_eq!(disassemble_instruction(0xFF, 0, 0), "DB 0xff");
        assert_eq!(instruction_len(0xFF), 1);
    }

    #[test]
    fn test_disassemble_program() {
        let listing = disassemble(&[0x82, 0, 8, 0x47, 0, 0x01]);

        assert!(listing.contains("000: LDI R0,8"));
        assert!(listing.contains("003: PRN R0"));
        assert!(listing.contains("005: HLT"));
        assert!(listing.contains("82 00 08"));
    }

    #[test]
    fn test_disassemble_truncated() {
        // LDI with its immediate cut off still renders.
        let listing = disassemble(&[0x82, 1]);
        assert!(listing.contains("LDI R1,0"));
    }
}
