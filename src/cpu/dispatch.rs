//! Opcode dispatch table.
//!
//! Maps each opcode byte to the handler implementing it. Handlers share one
//! signature: they receive the CPU and the two operand bytes fetched after
//! the opcode, and are responsible for moving the PC.

use crate::cpu::{Cpu, CpuError};
use crate::cpu::decode::Opcode;

/// An instruction handler.
pub type Handler = fn(&mut Cpu, u8, u8) -> Result<(), CpuError>;

/// Lookup from opcode byte to handler.
#[derive(Clone, Copy)]
pub struct DispatchTable {
    handlers: [Option<Handler>; 256],
}

impl DispatchTable {
    /// Build the table covering every LS-8 opcode.
    pub fn new() -> Self {
        let mut table = Self::empty();

        for op in Opcode::ALL {
            table.register(op, handler_for(op));
        }

        table
    }

    /// A table with no handlers registered.
    pub fn empty() -> Self {
        Self { handlers: [None; 256] }
    }

    /// Install `handler` for `op`, replacing any previous entry.
    pub fn register(&mut self, op: Opcode, handler: Handler) {
        self.handlers[op.byte() as usize] = Some(handler);
    }

    /// Handler for an opcode byte, if one is registered.
    #[inline]
    pub fn get(&self, opcode: u8) -> Option<Handler> {
        self.handlers[opcode as usize]
    }

    pub fn contains(&self, opcode: u8) -> bool {
        self.handlers[opcode as usize].is_some()
    }

    /// Number of registered opcodes.
    pub fn len(&self) -> usize {
        self.handlers.iter().filter(|h| h.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn handler_for(op: Opcode) -> Handler {
    match op {
        Opcode::Ldi => Cpu::handle_ldi,
        Opcode::Prn => Cpu::handle_prn,
        Opcode::Hlt => Cpu::handle_hlt,
        Opcode::Mul => Cpu::handle_mul,
        Opcode::Add => Cpu::handle_add,
        Opcode::Cmp => Cpu::handle_cmp,
        Opcode::Push => Cpu::handle_push,
        Opcode::Pop => Cpu::handle_pop,
        Opcode::Call => Cpu::handle_call,
        Opcode::Ret => Cpu::handle_ret,
        Opcode::Jeq => Cpu::handle_jeq,
        Opcode::Jmp => Cpu::handle_jmp,
        Opcode::Jne => Cpu::handle_jne,
    }
}

impl Default for DispatchTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let opcodes: Vec<String> = (0..=255u8)
            .filter(|&b| self.contains(b))
            .map(|b| format!("{:#04x}", b))
            .collect();

        f.debug_struct("DispatchTable")
            .field("opcodes", &opcodes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::alu::AluOp;

    #[test]
    fn test_covers_exactly_the_instruction_set() {
        let table = DispatchTable::new();

        assert_eq!(table.len(), 13);
        for op in Opcode::ALL {
            assert!(table.contains(op.byte()), "{} missing", op.mnemonic());
        }
        assert!(!table.contains(0xFF));
        assert!(!table.contains(AluOp::SUB));
        assert!(!table.contains(AluOp::DIV));
    }

    #[test]
    fn test_register_overrides() {
        fn nop(cpu: &mut Cpu, _: u8, _: u8) -> Result<(), CpuError> {
            cpu.regs.advance_pc(1);
            Ok(())
        }

        let mut table = DispatchTable::empty();
        assert!(table.is_empty());

        table.register(Opcode::Hlt, nop);
        assert_eq!(table.len(), 1);
        assert!(table.get(Opcode::Hlt.byte()).is_some());
    }
}
