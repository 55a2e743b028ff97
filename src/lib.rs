//! Sharp LR35902 (Game Boy) CPU interpreter.
//!
//! The core is [`Cpu`]: flat 64 KiB [`Memory`], the register file, and a
//! fetch/decode loop over 256-entry handler tables. Anything it cannot execute
//! moves it to a terminal halted state with a [`Snapshot`] of the registers.

pub mod alu;
pub mod config;
pub mod cpu;
pub mod diagnostics;
pub mod disasm;
pub mod display;
pub mod dump;
pub mod error;
pub mod memory;
pub mod opcodes;
pub mod registers;
pub mod rom;
pub mod stack;

pub use cpu::{Cpu, CpuState, RunOutcome};
pub use diagnostics::{HaltReason, Snapshot};
pub use error::{CpuError, CpuResult, RegisterError, RomError};
pub use memory::Memory;
pub use registers::{Flag, Reg16, Reg8, Registers};
pub use rom::Rom;
