use std::fmt;

use serde::Serialize;

use crate::error::CpuError;
use crate::registers::{Flag, Registers};

/// Why the interpreter stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HaltReason {
    UnknownOpcode,
    HaltInstruction,
    StopInstruction,
    PcOverflow,
    StackOverflow,
    StackUnderflow,
}

impl From<&CpuError> for HaltReason {
    fn from(err: &CpuError) -> Self {
        match err {
            CpuError::UnknownOpcode { .. } => HaltReason::UnknownOpcode,
            CpuError::PcOverflow { .. } => HaltReason::PcOverflow,
            CpuError::StackOverflow { .. } => HaltReason::StackOverflow,
            CpuError::StackUnderflow { .. } => HaltReason::StackUnderflow,
        }
    }
}

/// Register, flag and decode state at one instruction boundary.
///
/// `reason` is `Some` once the CPU has halted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub reason: Option<HaltReason>,
    pub a: u8,
    pub f: u8,
    pub zero: bool,
    pub subtract: bool,
    pub half_carry: bool,
    pub carry: bool,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub sp: u16,
    pub pc: u16,
    /// Last opcode fetched (the second byte for CB-prefixed instructions).
    pub opcode: u8,
    pub opcode_address: u16,
    pub prefixed: bool,
    pub executed: u64,
}

impl Snapshot {
    pub(crate) fn capture(
        regs: &Registers,
        reason: Option<HaltReason>,
        opcode: u8,
        opcode_address: u16,
        prefixed: bool,
        executed: u64,
    ) -> Self {
        Snapshot {
            reason,
            a: regs.a,
            f: regs.f(),
            zero: regs.get_flag(Flag::Zero),
            subtract: regs.get_flag(Flag::Subtract),
            half_carry: regs.get_flag(Flag::HalfCarry),
            carry: regs.get_flag(Flag::Carry),
            b: regs.b,
            c: regs.c,
            d: regs.d,
            e: regs.e,
            h: regs.h,
            l: regs.l,
            sp: regs.sp,
            pc: regs.pc,
            opcode,
            opcode_address,
            prefixed,
            executed,
        }
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "-------------------------")?;
        writeln!(f, "|       REGISTERS       |")?;
        writeln!(f, "-------------------------")?;
        writeln!(f, "|  A: 0x{:02X}   F: 0x{:02X}    |", self.a, self.f)?;
        writeln!(f, "|  B: 0x{:02X}   C: 0x{:02X}    |", self.b, self.c)?;
        writeln!(f, "|  D: 0x{:02X}   E: 0x{:02X}    |", self.d, self.e)?;
        writeln!(f, "|  H: 0x{:02X}   L: 0x{:02X}    |", self.h, self.l)?;
        writeln!(
            f,
            "|  Z:{} N:{} H:{} C:{}       |",
            self.zero as u8, self.subtract as u8, self.half_carry as u8, self.carry as u8
        )?;
        writeln!(f, "-------------------------")?;
        writeln!(f, " SP: 0x{:04X}", self.sp)?;
        writeln!(f, " PC: 0x{:04X}", self.pc)?;
        writeln!(f, " Instructions executed: {}", self.executed)?;
        let prefix = if self.prefixed { "0xCB " } else { "" };
        match self.reason {
            Some(HaltReason::UnknownOpcode) => write!(
                f,
                " Instruction {}0x{:02X} at 0x{:04X} not recognized",
                prefix, self.opcode, self.opcode_address
            ),
            Some(reason) => write!(
                f,
                " Halted ({:?}) after {}0x{:02X} at 0x{:04X}",
                reason, prefix, self.opcode, self.opcode_address
            ),
            None => write!(f, " Running"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_splits_flags() {
        let regs = Registers::new();
        let snap = Snapshot::capture(&regs, Some(HaltReason::UnknownOpcode), 0xD3, 0x0150, false, 7);
        assert_eq!(snap.f, 0xB0);
        assert!(snap.zero);
        assert!(!snap.subtract);
        assert!(snap.half_carry);
        assert!(snap.carry);
        assert_eq!(snap.pc, 0x0100);
        assert_eq!(snap.executed, 7);
    }

    #[test]
    fn display_names_the_bad_opcode() {
        let regs = Registers::new();
        let snap = Snapshot::capture(&regs, Some(HaltReason::UnknownOpcode), 0xD3, 0x0150, false, 0);
        let text = snap.to_string();
        assert!(text.contains("0xD3 at 0x0150 not recognized"));
        assert!(text.contains("A: 0x01"));
    }

    #[test]
    fn serializes_to_json() {
        let regs = Registers::new();
        let snap = Snapshot::capture(&regs, Some(HaltReason::StackOverflow), 0xC5, 0x0200, false, 3);
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["reason"], "stack_overflow");
        assert_eq!(json["sp"], 0xFFFE);
        assert_eq!(json["carry"], true);
    }

    #[test]
    fn error_maps_to_reason() {
        let err = CpuError::PcOverflow { pc: 0xFFFF };
        assert_eq!(HaltReason::from(&err), HaltReason::PcOverflow);
    }
}
