//! Instruction handlers.
//!
//! Each handler takes the two bytes fetched after the opcode and either
//! advances the PC by its instruction length or sets it outright.

use crate::cpu::{Cpu, CpuError, CpuState};
use crate::cpu::alu::{self, AluOp, AluOutput};

impl Cpu {
    /// Run ALU operation `op` (an ALU opcode byte) on `reg[reg_a]` and
    /// `reg[reg_b]`.
    pub fn alu(&mut self, op: u8, reg_a: u8, reg_b: u8) -> Result<(), CpuError> {
        let op = AluOp::try_from(op)?;
        let a = self.regs.get(reg_a)?;
        let b = self.regs.get(reg_b)?;

        match alu::apply(op, a, b)? {
            AluOutput::Value(result) => self.regs.set(reg_a, result)?,
            AluOutput::Compare(ordering) => self.regs.fl.set_compare(ordering),
        }

        Ok(())
    }

    /// Push a byte onto the stack.
    pub fn push_value(&mut self, value: u8) {
        let sp = self.regs.sp().wrapping_sub(1);
        self.regs.set_sp(sp);
        self.mem.write(sp, value);
    }

    /// Pop a byte off the stack.
    pub fn pop_value(&mut self) -> u8 {
        let sp = self.regs.sp();
        let value = self.mem.read(sp);
        self.regs.set_sp(sp.wrapping_add(1));
        value
    }

    /// Register named by the raw operand byte at `pc + 1`.
    fn branch_target(&self) -> Result<u8, CpuError> {
        let reg_num = self.mem.read(self.regs.pc.wrapping_add(1));
        Ok(self.regs.get(reg_num)?)
    }

    // ==================== Data Transfer ====================

    pub(crate) fn handle_ldi(&mut self, reg_a: u8, value: u8) -> Result<(), CpuError> {
        self.regs.set(reg_a, value)?;
        self.regs.advance_pc(3);
        Ok(())
    }

    pub(crate) fn handle_prn(&mut self, reg_a: u8, _: u8) -> Result<(), CpuError> {
        let value = self.regs.get(reg_a)?;
        self.output.push(value);
        self.regs.advance_pc(2);
        Ok(())
    }

    pub(crate) fn handle_hlt(&mut self, _: u8, _: u8) -> Result<(), CpuError> {
        self.regs.advance_pc(1);
        self.state = CpuState::Halted;
        Ok(())
    }

    // ==================== Arithmetic ====================

    pub(crate) fn handle_mul(&mut self, reg_a: u8, reg_b: u8) -> Result<(), CpuError> {
        self.alu(AluOp::MUL, reg_a, reg_b)?;
        self.regs.advance_pc(3);
        Ok(())
    }

    pub(crate) fn handle_add(&mut self, reg_a: u8, reg_b: u8) -> Result<(), CpuError> {
        self.alu(AluOp::ADD, reg_a, reg_b)?;
        self.regs.advance_pc(3);
        Ok(())
    }

    pub(crate) fn handle_cmp(&mut self, reg_a: u8, reg_b: u8) -> Result<(), CpuError> {
        self.alu(AluOp::CMP, reg_a, reg_b)?;
        self.regs.advance_pc(3);
        Ok(())
    }

    // ==================== Stack ====================

    pub(crate) fn handle_push(&mut self, reg_a: u8, _: u8) -> Result<(), CpuError> {
        let value = self.regs.get(reg_a)?;
        self.push_value(value);
        self.regs.advance_pc(2);
        Ok(())
    }

    pub(crate) fn handle_pop(&mut self, reg_a: u8, _: u8) -> Result<(), CpuError> {
        // Validate before touching SP so a bad operand leaves the stack intact.
        self.regs.get(reg_a)?;
        let value = self.pop_value();
        self.regs.set(reg_a, value)?;
        self.regs.advance_pc(2);
        Ok(())
    }

    // ==================== Control Flow ====================

    pub(crate) fn handle_call(&mut self, _: u8, _: u8) -> Result<(), CpuError> {
        let target = self.branch_target()?;
        let return_addr = self.regs.pc.wrapping_add(2);
        self.push_value(return_addr);
        self.regs.jump(target);
        Ok(())
    }

    pub(crate) fn handle_ret(&mut self, _: u8, _: u8) -> Result<(), CpuError> {
        let return_addr = self.pop_value();
        self.regs.jump(return_addr);
        Ok(())
    }

    pub(crate) fn handle_jmp(&mut self, _: u8, _: u8) -> Result<(), CpuError> {
        let target = self.branch_target()?;
        self.regs.jump(target);
        Ok(())
    }

    pub(crate) fn handle_jeq(&mut self, _: u8, _: u8) -> Result<(), CpuError> {
        self.jump_if(self.regs.fl.is_equal())
    }

    pub(crate) fn handle_jne(&mut self, _: u8, _: u8) -> Result<(), CpuError> {
        self.jump_if(!self.regs.fl.is_equal())
    }

    fn jump_if(&mut self, condition: bool) -> Result<(), CpuError> {
        if condition {
            let target = self.branch_target()?;
            self.regs.jump(target);
        } else {
            self.regs.advance_pc(2);
        }
        Ok(())
    }
}
