//! CPU execution engine for the LS-8.
//!
//! Implements the fetch-decode-dispatch cycle. The per-opcode handlers live
//! in `handlers.rs`.

use crate::cpu::{Memory, Registers};
use crate::cpu::alu::AluError;
use crate::cpu::decode::Instruction;
use crate::cpu::dispatch::DispatchTable;
use crate::cpu::memory::MemoryError;
use crate::cpu::registers::RegisterError;
use serde::{Serialize, Deserialize};
use std::io::Write;
use thiserror::Error;

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// CPU is running normally.
    Running,
    /// CPU has halted (executed HLT instruction).
    Halted,
    /// CPU hit a fatal error and cannot continue.
    Faulted,
}

/// The LS-8 CPU.
#[derive(Clone, Serialize, Deserialize)]
pub struct Cpu {
    /// CPU registers.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    /// Current execution state.
    pub state: CpuState,
    /// Instruction count.
    pub cycles: u64,
    /// Values emitted by PRN that no writer has taken yet, oldest first.
    pub output: Vec<u8>,
    /// Last executed instruction (for debugging).
    last_instr: Option<Instruction>,
    #[serde(skip)]
    dispatch: DispatchTable,
}

impl Cpu {
    /// Create a new CPU in its power-on state.
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            state: CpuState::Running,
            cycles: 0,
            output: Vec::new(),
            last_instr: None,
            dispatch: DispatchTable::new(),
        }
    }

    /// Reset the CPU to its power-on state, clearing memory.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.clear();
        self.state = CpuState::Running;
        self.cycles = 0;
        self.output.clear();
        self.last_instr = None;
    }

    /// Load a program into memory starting at address 0.
    pub fn load(&mut self, program: &[u8]) -> Result<(), MemoryError> {
        self.mem.load_program(0, program)
    }

    /// Execute a single instruction.
    ///
    /// Returns the instruction that was executed, or an error. Any error
    /// leaves the CPU faulted.
    pub fn step(&mut self) -> Result<Instruction, CpuError> {
        if self.state != CpuState::Running {
            return Err(CpuError::NotRunning(self.state));
        }

        // Fetch
        let pc = self.regs.pc;
        let instr = Instruction::fetch(&self.mem, pc);

        // Dispatch
        let Some(handler) = self.dispatch.get(instr.opcode) else {
            self.state = CpuState::Faulted;
            return Err(CpuError::UnknownInstruction { opcode: instr.opcode, pc });
        };

        // Execute
        if let Err(e) = handler(self, instr.operand_a, instr.operand_b) {
            self.state = CpuState::Faulted;
            return Err(e);
        }

        self.cycles += 1;
        self.last_instr = Some(instr);

        Ok(instr)
    }

    /// Run until halt or error.
    ///
    /// Returns the number of instructions executed.
    pub fn run(&mut self) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;

        while self.state == CpuState::Running {
            self.step()?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Run for at most `max_cycles` instructions.
    pub fn run_limited(&mut self, max_cycles: u64) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;
        let limit = self.cycles + max_cycles;

        while self.state == CpuState::Running && self.cycles < limit {
            self.step()?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Run until halt, error, or `max_cycles`, writing each PRN value to
    /// `out` as a decimal line as soon as it is emitted.
    ///
    /// Written values are removed from `output`; values already buffered
    /// before the call are left in place.
    pub fn run_with_output<W: Write>(
        &mut self,
        out: &mut W,
        max_cycles: Option<u64>,
    ) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;
        let kept = self.output.len();

        while self.state == CpuState::Running {
            if max_cycles.is_some_and(|max| self.cycles - start_cycles >= max) {
                break;
            }

            let result = self.step();

            for value in self.output.drain(kept..) {
                writeln!(out, "{}", value).map_err(|e| CpuError::Output(e.to_string()))?;
            }

            result?;
        }

        out.flush().map_err(|e| CpuError::Output(e.to_string()))?;
        Ok(self.cycles - start_cycles)
    }

    /// Render the CPU state as a one-line trace:
    /// `TRACE: PC | OP A B | R0 .. R7`, all in hex.
    pub fn trace(&self) -> String {
        let instr = Instruction::fetch(&self.mem, self.regs.pc);
        let mut line = format!(
            "TRACE: {:02X} | {:02X} {:02X} {:02X} |",
            self.regs.pc, instr.opcode, instr.operand_a, instr.operand_b
        );

        for value in self.regs.all() {
            line.push_str(&format!(" {:02X}", value));
        }

        line
    }

    /// Get the last executed instruction.
    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instr
    }

    /// Check if the CPU is halted.
    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    /// Check if the CPU is running.
    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .finish()
    }
}

/// Errors that can occur during CPU execution. All of them are fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("CPU not running: {0:?}")]
    NotRunning(CpuState),

    #[error("unknown instruction {opcode:#04x} at address {pc}")]
    UnknownInstruction { opcode: u8, pc: u8 },

    #[error("ALU error: {0}")]
    Alu(#[from] AluError),

    #[error("register error: {0}")]
    Register(#[from] RegisterError),

    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("output error: {0}")]
    Output(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::registers::SP_INIT;

    #[test]
    fn test_power_on() {
        let cpu = Cpu::new();

        assert!(cpu.is_running());
        assert_eq!(cpu.regs.pc, 0);
        assert_eq!(cpu.regs.sp(), SP_INIT);
        assert_eq!(cpu.cycles, 0);
    }

    #[test]
    fn test_print8() {
        let mut cpu = Cpu::new();
        cpu.load(&[0x82, 0, 8, 0x47, 0, 0x01]).unwrap();

        let executed = cpu.run().unwrap();

        assert_eq!(executed, 3);
        assert!(cpu.is_halted());
        assert_eq!(cpu.regs.get(0).unwrap(), 8);
        assert_eq!(cpu.output, vec![8]);
        assert_eq!(cpu.regs.pc, 6);
    }

    #[test]
    fn test_unknown_instruction_is_fatal() {
        let mut cpu = Cpu::new();
        cpu.load(&[0x82, 0, 8, 0xFF]).unwrap();

        let err = cpu.run().unwrap_err();

        assert_eq!(err, CpuError::UnknownInstruction { opcode: 0xFF, pc: 3 });
        assert_eq!(cpu.state, CpuState::Faulted);
        assert_eq!(cpu.cycles, 1);
        assert!(matches!(cpu.step(), Err(CpuError::NotRunning(CpuState::Faulted))));
    }

    #[test]
    fn test_step_after_halt() {
        let mut cpu = Cpu::new();
        cpu.load(&[0x01]).unwrap();
        cpu.run().unwrap();

        assert_eq!(cpu.step(), Err(CpuError::NotRunning(CpuState::Halted)));
    }

    #[test]
    fn test_run_limited() {
        let mut cpu = Cpu::new();
        // LDI R0,0; JMP R0 -- loops forever
        cpu.load(&[0x82, 0, 0, 0x54, 0]).unwrap();

        let executed = cpu.run_limited(10).unwrap();

        assert_eq!(executed, 10);
        assert!(cpu.is_running());
    }

    #[test]
    fn test_run_with_output() {
        let mut cpu = Cpu::new();
        cpu.load(&[0x82, 0, 5, 0x82, 1, 6, 0xA0, 0, 1, 0x47, 0, 0x01]).unwrap();

        let mut out = Vec::new();
        cpu.run_with_output(&mut out, None).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "11\n");
    }

    #[test]
    fn test_run_with_output_flushes_before_error() {
        let mut cpu = Cpu::new();
        cpu.load(&[0x82, 0, 7, 0x47, 0, 0xFF]).unwrap();

        let mut out = Vec::new();
        let err = cpu.run_with_output(&mut out, None).unwrap_err();

        assert!(matches!(err, CpuError::UnknownInstruction { opcode: 0xFF, pc: 5 }));
        assert_eq!(String::from_utf8(out).unwrap(), "7\n");
    }

    #[test]
    fn test_run_with_output_does_not_retain_values() {
        let mut cpu = Cpu::new();
        // LDI R1,3; PRN R0; JMP R1 -- prints forever
        cpu.load(&[0x82, 1, 3, 0x47, 0, 0x54, 1]).unwrap();

        let mut out = Vec::new();
        cpu.run_with_output(&mut out, Some(20_001)).unwrap();

        assert!(cpu.output.is_empty());
        assert_eq!(out.len(), 10_000 * 2);
    }

    #[test]
    fn test_run_with_output_keeps_earlier_values() {
        let mut cpu = Cpu::new();
        cpu.load(&[0x82, 0, 4, 0x47, 0, 0x47, 0, 0x01]).unwrap();
        cpu.step().unwrap();
        cpu.step().unwrap();

        let mut out = Vec::new();
        cpu.run_with_output(&mut out, None).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "4\n");
        assert_eq!(cpu.output, vec![4]);
    }

    #[test]
    fn test_trace_format() {
        let mut cpu = Cpu::new();
        cpu.load(&[0x82, 0, 8]).unwrap();

        assert_eq!(cpu.trace(), "TRACE: 00 | 82 00 08 | 00 00 00 00 00 00 00 F4");
    }

    #[test]
    fn test_reset() {
        let mut cpu = Cpu::new();
        cpu.load(&[0x82, 0, 8, 0x47, 0, 0x01]).unwrap();
        cpu.run().unwrap();

        cpu.reset();
        assert!(cpu.is_running());
        assert!(cpu.output.is_empty());
        assert_eq!(cpu.mem.read(0), 0);
        assert_eq!(cpu.last_instruction(), None);
    }
}
