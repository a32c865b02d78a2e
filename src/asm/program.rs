//! `.ls8` program file format.
//!
//! A simple text format:
//! - One byte per line, written as binary digits
//! - Everything after `#` is a comment
//! - Blank and comment-only lines are ignored

use crate::asm::disasm::{disassemble_instruction, instruction_len};
use std::path::Path;
use std::io::{BufRead, BufReader, Write};
use thiserror::Error;

/// Parse program text into the byte sequence it describes.
pub fn parse_program(source: &str) -> Result<Vec<u8>, ProgramError> {
    source
        .lines()
        .enumerate()
        .filter_map(|(line_num, line)| parse_line(line, line_num + 1).transpose())
        .collect()
}

/// Parse one line: `None` for blank/comment-only lines.
fn parse_line(line: &str, line_num: usize) -> Result<Option<u8>, ProgramError> {
    let digits = line.split('#').next().unwrap_or("").trim();

    if digits.is_empty() {
        return Ok(None);
    }

    u8::from_str_radix(digits, 2)
        .map(Some)
        .map_err(|e| ProgramError::Parse {
            line: line_num,
            message: format!("'{}' is not an 8-bit binary number: {}", digits, e),
        })
}

/// Load a `.ls8` file from disk.
pub fn load_program<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, ProgramError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .map_err(|_| ProgramError::NotFound { path: path.display().to_string() })?;
    let reader = BufReader::new(file);

    let mut program = Vec::new();
    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result.map_err(|e| ProgramError::Io(e.to_string()))?;
        if let Some(byte) = parse_line(&line, line_num + 1)? {
            program.push(byte);
        }
    }

    Ok(program)
}

/// Render a program in `.ls8` form, annotating each instruction with its
/// disassembly.
pub fn format_program(program: &[u8]) -> String {
    let mut output = String::new();
    let mut pc = 0;

    while pc < program.len() {
        let opcode = program[pc];
        let len = instruction_len(opcode);
        let a = program.get(pc + 1).copied().unwrap_or(0);
        let b = program.get(pc + 2).copied().unwrap_or(0);

        output.push_str(&format!(
            "{:08b} # {:03}: {}\n",
            opcode,
            pc,
            disassemble_instruction(opcode, a, b)
        ));
        for byte in program.iter().skip(pc + 1).take(len - 1) {
            output.push_str(&format!("{:08b}\n", byte));
        }

        pc += len;
    }

    output
}

/// Save a program to disk in `.ls8` form.
pub fn save_program<P: AsRef<Path>>(path: P, program: &[u8]) -> Result<(), ProgramError> {
    let mut file = std::fs::File::create(path.as_ref())
        .map_err(|e| ProgramError::Io(e.to_string()))?;

    writeln!(file, "# LS-8 program, {} bytes", program.len())
        .map_err(|e| ProgramError::Io(e.to_string()))?;
    file.write_all(format_program(program).as_bytes())
        .map_err(|e| ProgramError::Io(e.to_string()))?;

    Ok(())
}

/// Errors that can occur while reading or writing program files.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgramError {
    #[error("program not found: {path}")]
    NotFound { path: String },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_print8() {
        let source = "\
# print8.ls8
10000010 # LDI R0,8
00000000
00001000

01000111 # PRN R0
00000000
00000001 # HLT
";
        assert_eq!(parse_program(source).unwrap(), vec![0x82, 0, 8, 0x47, 0, 0x01]);
    }

    #[test]
    fn test_parse_whitespace_and_comments() {
        let source = "   101  \n#only comment\n\t\n11#x";
        assert_eq!(parse_program(source).unwrap(), vec![5, 3]);
    }

    #[test]
    fn test_parse_errors() {
        let err = parse_program("00000001\n00000002\n").unwrap_err();
        assert!(matches!(err, ProgramError::Parse { line: 2, .. }));

        // Nine digits overflow a byte.
        assert!(parse_program("111111111").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_program("/definitely/not/here.ls8").unwrap_err();
        assert!(matches!(err, ProgramError::NotFound { .. }));
    }

    #[test]
    fn test_format_parses_back() {
        let program = vec![0x82, 0, 8, 0x47, 0, 0x01];
        let text = format_program(&program);

        assert!(text.contains("LDI R0,8"));
        assert!(text.contains("HLT"));
        assert_eq!(parse_program(&text).unwrap(), program);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("ls8-save-{}.ls8", std::process::id()));
        let program = vec![0x82, 1, 3, 0x01];

        save_program(&path, &program).unwrap();
        let loaded = load_program(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, program);
    }
}
