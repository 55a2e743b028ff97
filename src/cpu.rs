use tracing::{error, trace};

use crate::diagnostics::{HaltReason, Snapshot};
use crate::error::{CpuError, CpuResult};
use crate::memory::Memory;
use crate::opcodes::{self, Condition, Operand};
use crate::registers::{Flag, Registers};
use crate::stack;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuState {
    Running,
    /// Terminal. Nothing moves the CPU back to `Running`.
    Halted,
}

/// Result of [`Cpu::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Halted(Snapshot),
    BudgetExhausted { executed: u64 },
}

pub struct Cpu {
    pub registers: Registers,
    pub memory: Memory,
    /// Interrupt master enable. Exposed only; interrupts are never dispatched.
    pub ime: bool,
    state: CpuState,
    opcode: u8,
    opcode_address: u16,
    prefixed: bool,
    executed: u64,
    halt: Option<Snapshot>,
}

impl Cpu {
    pub fn new() -> Self {
        Cpu {
            registers: Registers::new(),
            memory: Memory::new(),
            ime: false,
            state: CpuState::Running,
            opcode: 0x00,
            opcode_address: 0x0000,
            prefixed: false,
            executed: 0,
            halt: None,
        }
    }

    /// A CPU whose memory holds `image` from 0x0000.
    pub fn with_image(image: &[u8]) -> Self {
        let mut cpu = Cpu::new();
        cpu.memory.load(image);
        cpu
    }

    pub fn state(&self) -> CpuState {
        self.state
    }

    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    /// Completed instructions since construction.
    pub fn executed(&self) -> u64 {
        self.executed
    }

    /// The opcode register: last byte fetched at PC.
    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    /// Diagnostics recorded when the CPU halted.
    pub fn halt_snapshot(&self) -> Option<&Snapshot> {
        self.halt.as_ref()
    }

    /// Live register view.
    pub fn snapshot(&self) -> Snapshot {
        self.halt.clone().unwrap_or_else(|| {
            Snapshot::capture(
                &self.registers,
                None,
                self.opcode,
                self.opcode_address,
                self.prefixed,
                self.executed,
            )
        })
    }

    /// Read the byte at PC into the opcode register and advance PC.
    pub fn fetch(&mut self) {
        if self.is_halted() {
            return;
        }
        let pc = self.registers.pc;
        self.opcode_address = pc;
        self.opcode = self.memory.read_byte(pc);
        self.prefixed = false;
        match pc.checked_add(1) {
            Some(next) => self.registers.pc = next,
            None => self.fail(CpuError::PcOverflow { pc }),
        }
    }

    /// Execute the instruction whose opcode was fetched last.
    pub fn decode(&mut self) {
        if self.is_halted() {
            return;
        }
        trace!(
            pc = format_args!("0x{:04X}", self.opcode_address),
            opcode = format_args!("0x{:02X}", self.opcode),
            a = format_args!("0x{:02X}", self.registers.a),
            f = format_args!("0x{:02X}", self.registers.f()),
            "execute"
        );
        let opcode = self.opcode;
        let handler = opcodes::BASE_TABLE[opcode as usize];
        match handler(self, opcode) {
            Ok(()) => {
                if !self.is_halted() {
                    self.executed += 1;
                }
            }
            Err(err) => self.fail(err),
        }
    }

    pub fn step(&mut self) {
        self.fetch();
        self.decode();
    }

    /// Step until halted, or until `limit` instructions have completed.
    pub fn run(&mut self, limit: Option<u64>) -> RunOutcome {
        let start = self.executed;
        while !self.is_halted() {
            if limit.is_some_and(|max| self.executed - start >= max) {
                return RunOutcome::BudgetExhausted {
                    executed: self.executed - start,
                };
            }
            self.step();
        }
        RunOutcome::Halted(self.snapshot())
    }

    fn fail(&mut self, err: CpuError) {
        if let CpuError::UnknownOpcode { opcode, address, prefixed } = err {
            self.opcode = opcode;
            self.opcode_address = address;
            self.prefixed = prefixed;
        }
        error!(%err, "cpu halted");
        self.record_halt(HaltReason::from(&err));
    }

    /// HALT and STOP end execution: nothing can wake the CPU.
    pub(crate) fn enter_halt(&mut self, reason: HaltReason) {
        error!(?reason, pc = format_args!("0x{:04X}", self.registers.pc), "cpu halted");
        self.record_halt(reason);
    }

    fn record_halt(&mut self, reason: HaltReason) {
        if self.is_halted() {
            return;
        }
        let snapshot = Snapshot::capture(
            &self.registers,
            Some(reason),
            self.opcode,
            self.opcode_address,
            self.prefixed,
            self.executed,
        );
        self.halt = Some(snapshot);
        self.state = CpuState::Halted;
    }

    // Helper methods used by the opcode handlers

    pub(crate) fn read_imm8(&mut self) -> CpuResult<u8> {
        let pc = self.registers.pc;
        let byte = self.memory.read_byte(pc);
        self.registers.pc = pc.checked_add(1).ok_or(CpuError::PcOverflow { pc })?;
        Ok(byte)
    }

    /// Little-endian: low byte first.
    pub(crate) fn read_imm16(&mut self) -> CpuResult<u16> {
        let low = self.read_imm8()? as u16;
        let high = self.read_imm8()? as u16;
        Ok((high << 8) | low)
    }

    pub(crate) fn begin_prefixed(&mut self, opcode: u8, address: u16) {
        self.opcode = opcode;
        self.opcode_address = address;
        self.prefixed = true;
    }

    pub(crate) fn push(&mut self, value: u16) -> CpuResult<()> {
        stack::push(&mut self.registers, &mut self.memory, value)
    }

    pub(crate) fn pop(&mut self) -> CpuResult<u16> {
        stack::pop(&mut self.registers, &self.memory)
    }

    pub(crate) fn read_operand(&self, operand: Operand) -> u8 {
        match operand {
            Operand::Reg(reg) => self.registers.get8(reg),
            Operand::IndirectHl => self.memory.read_byte(self.registers.hl()),
        }
    }

    pub(crate) fn write_operand(&mut self, operand: Operand, value: u8) {
        match operand {
            Operand::Reg(reg) => self.registers.set8(reg, value),
            Operand::IndirectHl => {
                let addr = self.registers.hl();
                self.memory.write_byte(addr, value);
            }
        }
    }

    pub(crate) fn condition(&self, cond: Condition) -> bool {
        match cond {
            Condition::NotZero => !self.registers.get_flag(Flag::Zero),
            Condition::Zero => self.registers.get_flag(Flag::Zero),
            Condition::NotCarry => !self.registers.get_flag(Flag::Carry),
            Condition::Carry => self.registers.get_flag(Flag::Carry),
        }
    }

    pub(crate) fn jump_relative(&mut self, offset: i8) -> CpuResult<()> {
        let pc = self.registers.pc;
        self.registers.pc = pc
            .checked_add_signed(offset as i16)
            .ok_or(CpuError::PcOverflow { pc })?;
        Ok(())
    }

    /// Push the return address (current PC) and jump.
    pub(crate) fn call(&mut self, target: u16) -> CpuResult<()> {
        self.push(self.registers.pc)?;
        self.registers.pc = target;
        Ok(())
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu_with_program(program: &[u8]) -> Cpu {
        let mut cpu = Cpu::new();
        cpu.memory.load_at(0x0100, program);
        cpu
    }

    #[test]
    fn fetch_advances_pc_by_one() {
        let mut cpu = cpu_with_program(&[0x3E, 0x42]);
        cpu.fetch();
        assert_eq!(cpu.opcode(), 0x3E);
        assert_eq!(cpu.registers.pc, 0x0101);
        cpu.decode();
        assert_eq!(cpu.registers.a, 0x42);
        assert_eq!(cpu.registers.pc, 0x0102);
        assert_eq!(cpu.executed(), 1);
    }

    #[test]
    fn unknown_opcode_halts_one_past_the_byte() {
        let mut cpu = cpu_with_program(&[0x00, 0xD3, 0x00]);
        cpu.step();
        cpu.step();
        assert!(cpu.is_halted());
        assert_eq!(cpu.registers.pc, 0x0102);
        let snap = cpu.halt_snapshot().unwrap();
        assert_eq!(snap.reason, Some(HaltReason::UnknownOpcode));
        assert_eq!(snap.opcode, 0xD3);
        assert_eq!(snap.opcode_address, 0x0101);
        assert!(!snap.prefixed);
        assert_eq!(snap.executed, 1);
    }

    #[test]
    fn halted_cpu_does_not_advance() {
        let mut cpu = cpu_with_program(&[0xDB, 0x3C]);
        cpu.step();
        let a = cpu.registers.a;
        cpu.step();
        cpu.step();
        assert_eq!(cpu.registers.pc, 0x0101);
        assert_eq!(cpu.registers.a, a);
        assert_eq!(cpu.state(), CpuState::Halted);
    }

    #[test]
    fn fetch_at_top_of_memory_halts() {
        let mut cpu = Cpu::new();
        cpu.registers.pc = 0xFFFF;
        cpu.step();
        assert!(cpu.is_halted());
        assert_eq!(cpu.halt_snapshot().unwrap().reason, Some(HaltReason::PcOverflow));
    }

    #[test]
    fn immediate_past_top_of_memory_halts() {
        let mut cpu = Cpu::new();
        cpu.registers.pc = 0xFFFE;
        cpu.memory.write_byte(0xFFFE, 0x06); // LD B,n
        cpu.step();
        assert!(cpu.is_halted());
        assert_eq!(cpu.halt_snapshot().unwrap().reason, Some(HaltReason::PcOverflow));
    }

    #[test]
    fn run_respects_budget() {
        let mut cpu = Cpu::new();
        // JR -2 spins forever
        cpu.memory.load_at(0x0100, &[0x18, 0xFE]);
        assert_eq!(cpu.run(Some(10)), RunOutcome::BudgetExhausted { executed: 10 });
        assert_eq!(cpu.registers.pc, 0x0100);
    }

    #[test]
    fn run_stops_on_halt() {
        let mut cpu = cpu_with_program(&[0x00, 0x00, 0xFD]);
        match cpu.run(None) {
            RunOutcome::Halted(snap) => {
                assert_eq!(snap.opcode, 0xFD);
                assert_eq!(snap.pc, 0x0103);
                assert_eq!(snap.executed, 2);
            }
            other => panic!("expected halt, got {other:?}"),
        }
    }

    #[test]
    fn instances_are_independent() {
        let mut first = cpu_with_program(&[0x3E, 0x11]);
        let mut second = cpu_with_program(&[0x3E, 0x22]);
        first.step();
        second.step();
        assert_eq!(first.registers.a, 0x11);
        assert_eq!(second.registers.a, 0x22);
    }

    #[test]
    fn live_snapshot_has_no_reason() {
        let cpu = Cpu::new();
        let snap = cpu.snapshot();
        assert_eq!(snap.reason, None);
        assert_eq!(snap.a, 0x01);
        assert_eq!(snap.sp, 0xFFFE);
    }
}
